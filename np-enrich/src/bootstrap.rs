//! Téléchargement des couches administratives manquantes
//!
//! Un échec n'est jamais fatal ici : il est loggé, et c'est le chargement des
//! couches qui décide ensuite si le run peut continuer.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;

/// Un corps plus petit est une page d'erreur, pas une couche GeoJSON
pub const MIN_LAYER_BYTES: usize = 1000;

/// Délai maximal d'un téléchargement
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Résultat pour une couche
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FetchOutcome {
    /// Le fichier existe déjà, rien à faire
    Present,
    /// Téléchargé et écrit
    Downloaded { bytes: usize },
    /// Réponse trop courte, fichier non écrit
    TooSmall { bytes: usize },
    /// Erreur réseau, HTTP ou disque
    Failed(String),
}

impl FetchOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Present | Self::Downloaded { .. })
    }
}

/// Client HTTP partagé par les téléchargements
pub fn http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("np-enrich/", env!("CARGO_PKG_VERSION")))
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
}

/// Télécharge `url` vers `path` si le fichier manque (ou toujours avec `force`)
pub async fn ensure_layer(client: &Client, path: &Path, url: &str, force: bool) -> FetchOutcome {
    if !force && path.exists() {
        return FetchOutcome::Present;
    }

    info!(path = %path.display(), url = url, "Downloading boundary layer");
    let outcome = match download(client, url).await {
        Ok(body) if body.len() <= MIN_LAYER_BYTES => FetchOutcome::TooSmall { bytes: body.len() },
        Ok(body) => match tokio::fs::write(path, &body).await {
            Ok(()) => FetchOutcome::Downloaded { bytes: body.len() },
            Err(e) => FetchOutcome::Failed(format!("Failed to write {}: {}", path.display(), e)),
        },
        Err(e) => FetchOutcome::Failed(e.to_string()),
    };

    match &outcome {
        FetchOutcome::Downloaded { bytes } => {
            info!(path = %path.display(), bytes = bytes, "Boundary layer saved");
        }
        FetchOutcome::TooSmall { bytes } => {
            warn!(url = url, bytes = bytes, "Response too small, layer not saved");
        }
        FetchOutcome::Failed(reason) => {
            warn!(url = url, error = %reason, "Download failed");
        }
        FetchOutcome::Present => {}
    }
    outcome
}

async fn download(client: &Client, url: &str) -> reqwest::Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Assure la présence des deux couches ; retourne le résultat par libellé
pub async fn ensure_layers(config: &Config, force: bool) -> Vec<(&'static str, FetchOutcome)> {
    let client = match http_client() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to create HTTP client");
            let reason = e.to_string();
            return vec![
                ("counties", layer_without_client(&config.counties, &reason)),
                ("municipalities", layer_without_client(&config.municipalities, &reason)),
            ];
        }
    };

    vec![
        (
            "counties",
            ensure_layer(&client, &config.counties, &config.counties_url, force).await,
        ),
        (
            "municipalities",
            ensure_layer(&client, &config.municipalities, &config.municipalities_url, force).await,
        ),
    ]
}

fn layer_without_client(path: &Path, reason: &str) -> FetchOutcome {
    if path.exists() {
        FetchOutcome::Present
    } else {
        FetchOutcome::Failed(reason.to_string())
    }
}
