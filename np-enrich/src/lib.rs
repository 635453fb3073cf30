//! # np-enrich
//!
//! Enrichissement du jeu de données des parcs nationaux norvégiens.
//!
//! ## Features
//!
//! - Surface, fylker, kommuner et année de création pour chaque parc
//! - Téléchargement des couches administratives manquantes
//! - Sauvegarde horodatée puis remplacement atomique du jeu de données
//! - Rapport de run (console ou JSON)
//!
//! ## Usage CLI
//!
//! ```bash
//! # Enrichir np_database.json (fichiers par défaut dans le dossier courant)
//! np-enrich
//! np-enrich --dataset data/np_database.json --dry-run -v
//!
//! # Télécharger les couches fylker/kommuner
//! np-enrich fetch --force
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod store;

pub use config::Config;
pub use error::PipelineError;
pub use pipeline::{run, RunOptions};
pub use report::{EnrichReport, EnrichStatus};
