//! Définition et implémentation des commandes CLI
//!
//! - (défaut) : enrichit le jeu de données
//! - `fetch` : télécharge les couches fylker/kommuner

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::{info, warn};

use np_enrich::bootstrap::{self, FetchOutcome};
use np_enrich::pipeline::{self, RunOptions};
use np_enrich::{Config, EnrichReport};

#[derive(Subcommand)]
pub enum Commands {
    /// Download the county and municipality boundary layers
    Fetch {
        /// Download even if the files already exist
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        paths: PathArgs,
    },
}

/// Chemins et sources, communs aux deux commandes
#[derive(Args, Debug, Default, Clone)]
pub struct PathArgs {
    /// Park dataset, rewritten in place (défaut : env NP_DATASET / np_database.json)
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// County layer GeoJSON (défaut : env NP_COUNTIES / fylker2018.geojson)
    #[arg(long)]
    pub counties: Option<PathBuf>,

    /// Municipality layer GeoJSON (défaut : env NP_MUNICIPALITIES / kommuner2018.geojson)
    #[arg(long)]
    pub municipalities: Option<PathBuf>,

    /// Park hints JSON, optional (défaut : env NP_HINTS / park_hints.json)
    #[arg(long)]
    pub hints: Option<PathBuf>,

    /// Download URL for the county layer (défaut : env NP_COUNTIES_URL)
    #[arg(long)]
    pub counties_url: Option<String>,

    /// Download URL for the municipality layer (défaut : env NP_MUNICIPALITIES_URL)
    #[arg(long)]
    pub municipalities_url: Option<String>,

    /// JSON config file (same keys, snake_case)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments de l'enrichissement (commande par défaut)
#[derive(Args, Debug, Default, Clone)]
pub struct EnrichArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Never download missing boundary layers
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Compute and report, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Save the run report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Fichier de config, puis environnement, puis options CLI
fn resolve_config(paths: &PathArgs) -> Result<Config> {
    let mut config = Config::resolve(paths.config.as_deref())?;
    apply_overrides(&mut config, paths.clone());
    Ok(config)
}

fn apply_overrides(config: &mut Config, paths: PathArgs) {
    if let Some(dataset) = paths.dataset {
        config.dataset = dataset;
    }
    if let Some(counties) = paths.counties {
        config.counties = counties;
    }
    if let Some(municipalities) = paths.municipalities {
        config.municipalities = municipalities;
    }
    if let Some(hints) = paths.hints {
        config.hints = hints;
    }
    if let Some(url) = paths.counties_url {
        config.counties_url = url;
    }
    if let Some(url) = paths.municipalities_url {
        config.municipalities_url = url;
    }
}

/// Exécute l'enrichissement
pub async fn cmd_enrich(args: &EnrichArgs, verbose: u8) -> Result<()> {
    let mut config = resolve_config(&args.paths)?;
    if args.no_bootstrap {
        config.bootstrap = false;
    }

    info!(
        dataset = %config.dataset.display(),
        counties = %config.counties.display(),
        municipalities = %config.municipalities.display(),
        hints = %config.hints.display(),
        dry_run = args.dry_run,
        "Starting enrichment"
    );

    let options = RunOptions {
        dry_run: args.dry_run,
    };
    let report = match pipeline::run(&config, options).await {
        Ok(report) => report,
        Err(err) => {
            // Le rapport JSON est écrit même en cas d'échec
            if let Some(ref path) = args.report {
                let mut failed = EnrichReport::new(&config.dataset.display().to_string());
                failed.dry_run = args.dry_run;
                failed.record_fatal(&format!("{:#}", err));
                failed.finalize();
                if let Err(e) = failed.save_to_file(path) {
                    warn!(path = %path.display(), error = %e, "Failed to save report");
                }
            }
            return Err(err);
        }
    };

    if verbose > 0 {
        report.display();
    }
    if let Some(ref path) = args.report {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report: {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }

    println!("{}", report.summary());
    Ok(())
}

/// Exécute la commande fetch
pub async fn cmd_fetch(paths: &PathArgs, force: bool) -> Result<()> {
    let config = resolve_config(paths)?;

    for (label, outcome) in bootstrap::ensure_layers(&config, force).await {
        match outcome {
            FetchOutcome::Present => println!("{}: already present", label),
            FetchOutcome::Downloaded { bytes } => println!("{}: downloaded {} bytes", label, bytes),
            FetchOutcome::TooSmall { bytes } => {
                println!("{}: response too small ({} bytes), not saved", label, bytes)
            }
            FetchOutcome::Failed(reason) => println!("{}: failed ({})", label, reason),
        }
    }

    pipeline::ensure_layers_present(&config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_config() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            PathArgs {
                dataset: Some(PathBuf::from("data/parks.json")),
                counties_url: Some("http://localhost/f.geojson".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(config.dataset, PathBuf::from("data/parks.json"));
        assert_eq!(config.counties_url, "http://localhost/f.geojson");
        assert_eq!(config.hints, PathBuf::from("park_hints.json"));
    }
}
