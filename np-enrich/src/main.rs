//! Point d'entrée CLI pour np-enrich

use anyhow::Result;
use clap::Parser;
use np_enrich::PipelineError;
use tracing::{error, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::{Commands, EnrichArgs};

/// Enrichir le jeu de données des parcs nationaux
#[derive(Parser)]
#[command(name = "np-enrich")]
#[command(author, version)]
#[command(about = "Enrich national-park features with area, counties, municipalities and establishment year")]
#[command(long_about = "Computes derived metadata for every park of the dataset and fills empty fields only.\n\nBy default, enriches the dataset. Use 'fetch' to download the boundary layers.")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Sous-commande (défaut: enrichissement)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments de l'enrichissement (commande par défaut)
    #[command(flatten)]
    enrich: EnrichArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Some(Commands::Fetch { force, paths }) => cli::cmd_fetch(&paths, force).await,
        None => cli::cmd_enrich(&cli.enrich, cli.verbose).await,
    };

    if let Err(err) = result {
        // Codes de sortie dédiés : 1 = jeu de données absent, 2 = couches absentes
        if let Some(missing) = err.downcast_ref::<PipelineError>() {
            error!(error = %missing, "Run aborted");
            eprintln!("{}", missing);
            std::process::exit(missing.exit_code());
        }
        return Err(err);
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
