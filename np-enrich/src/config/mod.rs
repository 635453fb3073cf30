//! Configuration du run d'enrichissement
//!
//! Ordre de priorité : valeurs par défaut < fichier JSON < variables d'environnement
//! (.env chargé par dotenvy) < options CLI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Couche des fylker (comtés) publiée par robhop/fylker-og-kommuner
pub const DEFAULT_COUNTIES_URL: &str =
    "https://raw.githubusercontent.com/robhop/fylker-og-kommuner/main/Fylker-L.geojson";

/// Couche des kommuner (communes)
pub const DEFAULT_MUNICIPALITIES_URL: &str =
    "https://raw.githubusercontent.com/robhop/fylker-og-kommuner/main/Kommuner-L.geojson";

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Jeu de données des parcs (lu puis réécrit)
    pub dataset: PathBuf,

    /// Couche des fylker
    pub counties: PathBuf,

    /// Couche des kommuner
    pub municipalities: PathBuf,

    /// Indices textuels (optionnel : absent = aucun indice)
    pub hints: PathBuf,

    /// URL de téléchargement des fylker si le fichier manque
    pub counties_url: String,

    /// URL de téléchargement des kommuner si le fichier manque
    pub municipalities_url: String,

    /// Télécharger les couches manquantes
    pub bootstrap: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("np_database.json"),
            counties: PathBuf::from("fylker2018.geojson"),
            municipalities: PathBuf::from("kommuner2018.geojson"),
            hints: PathBuf::from("park_hints.json"),
            counties_url: DEFAULT_COUNTIES_URL.to_string(),
            municipalities_url: DEFAULT_MUNICIPALITIES_URL.to_string(),
            bootstrap: true,
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Applique les variables d'environnement `NP_*`
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Variante testable de [`Config::apply_env`]
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("NP_DATASET") {
            self.dataset = PathBuf::from(v);
        }
        if let Some(v) = var("NP_COUNTIES") {
            self.counties = PathBuf::from(v);
        }
        if let Some(v) = var("NP_MUNICIPALITIES") {
            self.municipalities = PathBuf::from(v);
        }
        if let Some(v) = var("NP_HINTS") {
            self.hints = PathBuf::from(v);
        }
        if let Some(v) = var("NP_COUNTIES_URL") {
            self.counties_url = v;
        }
        if let Some(v) = var("NP_MUNICIPALITIES_URL") {
            self.municipalities_url = v;
        }
        if let Some(v) = var("NP_BOOTSTRAP") {
            // Tout sauf une valeur explicitement négative garde le téléchargement actif
            self.bootstrap = !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
    }

    /// Défauts, puis fichier optionnel, puis environnement
    pub fn resolve(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }
}
