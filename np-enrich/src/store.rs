//! Lecture et écriture des fichiers du run
//!
//! Le jeu de données n'est réécrit qu'une fois, à la fin : sauvegarde horodatée
//! des octets d'origine, puis remplacement atomique (fichier temporaire voisin
//! renommé par-dessus l'original).

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use parkgeo::{DatasetDocument, HintsStore};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Jeu de données chargé, avec son contenu brut pour la sauvegarde
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub document: DatasetDocument,
    /// Octets lus sur disque, avant tout enrichissement
    pub original: Vec<u8>,
}

/// Charge le jeu de données (fatal s'il manque ou est illisible)
pub fn load_dataset(path: &Path) -> Result<LoadedDataset> {
    let original = std::fs::read(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    let document: DatasetDocument = serde_json::from_slice(&original)
        .with_context(|| format!("Failed to parse dataset JSON: {}", path.display()))?;

    info!(
        path = %path.display(),
        features = document.dataset.features.len(),
        "Dataset loaded"
    );
    Ok(LoadedDataset { document, original })
}

/// Charge les indices ; un fichier absent donne un store vide
pub fn load_hints(path: &Path) -> Result<HintsStore> {
    if !path.exists() {
        info!(path = %path.display(), "No hints file, establishment years disabled");
        return Ok(HintsStore::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read hints: {}", path.display()))?;
    let store: HintsStore = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse hints JSON: {}", path.display()))?;

    debug!(path = %path.display(), entries = store.parks.len(), "Hints loaded");
    Ok(store)
}

/// `<dossier>/<stem>.enriched_<YYYYmmdd_HHMMSS>.json`
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let name = format!("{}.enriched_{}.json", stem, now.format("%Y%m%d_%H%M%S"));
    path.with_file_name(name)
}

/// JSON indenté (2 espaces), caractères non ASCII écrits tels quels
pub fn render(document: &DatasetDocument) -> Result<String> {
    serde_json::to_string_pretty(document).context("Failed to serialize dataset")
}

/// Écrit la sauvegarde puis remplace le jeu de données ; retourne le chemin de la sauvegarde
pub fn persist(
    path: &Path,
    original: &[u8],
    document: &DatasetDocument,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    let rendered = render(document)?;

    let backup = backup_path(path, now);
    std::fs::write(&backup, original)
        .with_context(|| format!("Failed to write backup: {}", backup.display()))?;
    debug!(backup = %backup.display(), bytes = original.len(), "Backup written");

    replace_file(path, rendered.as_bytes())?;
    info!(path = %path.display(), backup = %backup.display(), "Dataset written");
    Ok(backup)
}

/// Remplacement atomique : fichier temporaire dans le même dossier, puis rename
fn replace_file(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(content)
        .with_context(|| format!("Failed to write temporary file for {}", path.display()))?;
    tmp.flush()?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync temporary file for {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
