//! Déroulement d'un run : chargement, enrichissement, écriture unique
//!
//! 1. le jeu de données doit exister ;
//! 2. les couches manquantes sont téléchargées (si activé) ;
//! 3. tout est chargé, puis le moteur calcule tous les parcs ;
//! 4. s'il y a des changements : sauvegarde puis remplacement du fichier.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use parkgeo::{RegionIndex, RegionLayer};
use tracing::info;

use crate::bootstrap;
use crate::config::Config;
use crate::error::PipelineError;
use crate::report::EnrichReport;
use crate::store;

/// Options d'exécution qui ne font pas partie de la configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Calculer et rapporter sans rien écrire
    pub dry_run: bool,
}

/// Vérifie la présence du jeu de données
pub fn ensure_dataset(config: &Config) -> Result<(), PipelineError> {
    if config.dataset.exists() {
        Ok(())
    } else {
        Err(PipelineError::DatasetMissing(config.dataset.clone()))
    }
}

/// Vérifie la présence des deux couches administratives
pub fn ensure_layers_present(config: &Config) -> Result<(), PipelineError> {
    let missing: Vec<PathBuf> = [&config.counties, &config.municipalities]
        .into_iter()
        .filter(|p| !p.exists())
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::LayersMissing(missing))
    }
}

/// Charge les deux couches et les ajoute au rapport
pub fn load_regions(config: &Config, report: &mut EnrichReport) -> Result<RegionIndex> {
    let counties = RegionLayer::load_from_file("counties", &config.counties)
        .with_context(|| format!("Failed to load counties: {}", config.counties.display()))?;
    let municipalities = RegionLayer::load_from_file("municipalities", &config.municipalities)
        .with_context(|| {
            format!(
                "Failed to load municipalities: {}",
                config.municipalities.display()
            )
        })?;

    report.record_layer(&counties);
    report.record_layer(&municipalities);
    Ok(RegionIndex::new(counties, municipalities))
}

/// Exécute un run complet
pub async fn run(config: &Config, options: RunOptions) -> Result<EnrichReport> {
    let started_at = Instant::now();
    let mut report = EnrichReport::new(&config.dataset.display().to_string());
    report.dry_run = options.dry_run;

    ensure_dataset(config)?;

    if config.bootstrap {
        for (label, outcome) in bootstrap::ensure_layers(config, false).await {
            report.record_download(label, outcome);
        }
    }
    ensure_layers_present(config)?;

    let mut dataset = store::load_dataset(&config.dataset)?;
    let regions = load_regions(config, &mut report)?;
    let hints = store::load_hints(&config.hints)?;

    info!(
        counties = regions.counties.len(),
        municipalities = regions.municipalities.len(),
        hints = hints.parks.len(),
        "Inputs loaded"
    );

    let outcome = parkgeo::enrich(&mut dataset.document, &regions, &hints);
    report.record_outcome(&outcome);

    if !outcome.has_changes() {
        info!("No park feature needed an update");
    } else if options.dry_run {
        info!(updated = outcome.features_updated, "Dry run, dataset left untouched");
    } else {
        let backup = store::persist(
            &config.dataset,
            &dataset.original,
            &dataset.document,
            Local::now(),
        )?;
        report.set_backup(&backup);
    }

    report.set_duration(started_at.elapsed());
    report.finalize();
    Ok(report)
}
