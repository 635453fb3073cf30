//! Rapport d'enrichissement avec graceful degradation
//!
//! Les unités ignorées par le moteur (features, parcs, régions) sont collectées
//! ici au lieu d'interrompre le run, puis affichées ou sauvegardées en JSON.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use parkgeo::crs::LayerCrs;
use parkgeo::{EnrichOutcome, ParkSummary, RegionLayer, Skip, SkipUnit};
use serde::Serialize;

use crate::bootstrap::FetchOutcome;

/// Statut global du run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnrichStatus {
    /// Run réussi sans erreur
    Success,
    /// Run réussi, certaines unités ignorées
    PartialSuccess,
    /// Run échoué, rien n'a été écrit
    Failed,
}

/// Niveau de sévérité des problèmes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueLevel {
    /// Erreur fatale : run abandonné
    Fatal,
    /// Erreur : unité ignorée
    Error,
    /// Warning : donnée dégradée mais utilisée
    Warning,
}

/// Problème rencontré pendant le run
#[derive(Debug, Clone, Serialize)]
pub struct EnrichIssue {
    pub level: IssueLevel,
    /// Unité concernée (absente pour une erreur fatale)
    pub unit: Option<SkipUnit>,
    /// Identifiant de l'unité
    pub id: Option<String>,
    pub message: String,
}

impl EnrichIssue {
    fn from_skip(skip: &Skip) -> Self {
        let level = match skip.unit {
            SkipUnit::Feature | SkipUnit::Group => IssueLevel::Error,
            SkipUnit::Region | SkipUnit::Reprojection => IssueLevel::Warning,
        };
        Self {
            level,
            unit: Some(skip.unit),
            id: Some(skip.id.clone()),
            message: skip.reason.clone(),
        }
    }
}

/// Statistiques d'une couche administrative
#[derive(Debug, Clone, Serialize)]
pub struct LayerStats {
    pub label: String,
    /// EPSG détecté dans la couche source
    pub source_epsg: Option<u32>,
    pub regions: usize,
    pub skipped: usize,
}

/// Téléchargement d'une couche manquante
#[derive(Debug, Clone, Serialize)]
pub struct LayerDownload {
    pub label: String,
    pub outcome: FetchOutcome,
}

/// Rapport complet d'un run
#[derive(Debug, Clone, Serialize)]
pub struct EnrichReport {
    /// Jeu de données traité
    pub dataset: String,
    /// Durée du run
    pub duration_secs: f64,
    /// Statut global
    pub status: EnrichStatus,
    /// Aucun fichier écrit
    pub dry_run: bool,

    // Compteurs globaux
    /// Nombre de parcs logiques
    pub parks_total: usize,
    /// Parcs calculés
    pub parks_enriched: usize,
    /// Parcs ignorés
    pub parks_skipped: usize,
    /// Features modifiées
    pub features_updated: usize,
    /// Features déjà complètes
    pub features_unchanged: usize,

    /// Sauvegarde écrite avant remplacement
    pub backup: Option<String>,

    /// Couches administratives chargées
    pub layers: Vec<LayerStats>,
    /// Couches téléchargées au démarrage
    pub downloads: Vec<LayerDownload>,
    /// Nombre d'unités ignorées par type
    pub skipped_by_unit: HashMap<String, usize>,
    /// Détail par parc
    pub parks: Vec<ParkSummary>,

    /// Liste des problèmes
    pub issues: Vec<EnrichIssue>,
}

impl Default for EnrichReport {
    fn default() -> Self {
        Self {
            dataset: String::new(),
            duration_secs: 0.0,
            status: EnrichStatus::Success,
            dry_run: false,
            parks_total: 0,
            parks_enriched: 0,
            parks_skipped: 0,
            features_updated: 0,
            features_unchanged: 0,
            backup: None,
            layers: Vec::new(),
            downloads: Vec::new(),
            skipped_by_unit: HashMap::new(),
            parks: Vec::new(),
            issues: Vec::new(),
        }
    }
}

impl EnrichReport {
    /// Crée un nouveau rapport pour un jeu de données
    pub fn new(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            ..Default::default()
        }
    }

    /// Enregistre le résultat d'un téléchargement
    pub fn record_download(&mut self, label: &str, outcome: FetchOutcome) {
        if let FetchOutcome::Failed(ref reason) = outcome {
            self.issues.push(EnrichIssue {
                level: IssueLevel::Warning,
                unit: None,
                id: Some(label.to_string()),
                message: format!("Download failed: {}", reason),
            });
        }
        self.downloads.push(LayerDownload {
            label: label.to_string(),
            outcome,
        });
    }

    /// Enregistre une couche chargée et ses unités ignorées
    pub fn record_layer(&mut self, layer: &RegionLayer) {
        self.layers.push(LayerStats {
            label: layer.label.clone(),
            source_epsg: layer.source_crs.map(LayerCrs::epsg),
            regions: layer.len(),
            skipped: layer.skipped.len(),
        });
        for skip in &layer.skipped {
            self.record_skip(skip);
        }
    }

    /// Enregistre une unité ignorée
    pub fn record_skip(&mut self, skip: &Skip) {
        *self
            .skipped_by_unit
            .entry(format!("{:?}", skip.unit))
            .or_default() += 1;
        self.issues.push(EnrichIssue::from_skip(skip));
    }

    /// Enregistre le résultat du moteur
    pub fn record_outcome(&mut self, outcome: &EnrichOutcome) {
        self.parks_total = outcome.groups_total;
        self.parks_enriched = outcome.groups_enriched;
        self.parks_skipped = outcome.groups_skipped;
        self.features_updated = outcome.features_updated;
        self.features_unchanged = outcome.features_unchanged;
        self.parks = outcome.parks.clone();
        for skip in &outcome.skipped {
            self.record_skip(skip);
        }
    }

    /// Enregistre une erreur fatale
    pub fn record_fatal(&mut self, message: &str) {
        self.issues.push(EnrichIssue {
            level: IssueLevel::Fatal,
            unit: None,
            id: None,
            message: message.to_string(),
        });
    }

    /// Enregistre la sauvegarde écrite
    pub fn set_backup(&mut self, backup: &Path) {
        self.backup = Some(backup.display().to_string());
    }

    /// Définit la durée du run
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final basé sur les problèmes
    pub fn finalize(&mut self) {
        let has_fatal = self.issues.iter().any(|e| e.level == IssueLevel::Fatal);
        let has_errors = self.issues.iter().any(|e| e.level == IssueLevel::Error);
        let has_warnings = !self.issues.is_empty();
        let has_success = self.parks_enriched > 0;

        self.status = if has_fatal || (has_errors && !has_success) {
            EnrichStatus::Failed
        } else if has_warnings {
            EnrichStatus::PartialSuccess
        } else {
            EnrichStatus::Success
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("ENRICH REPORT - {}", self.dataset);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        if self.dry_run {
            println!("Dry run: nothing written");
        }

        println!("\n--- SUMMARY ---");
        println!(
            "Parks: {} found, {} enriched, {} skipped",
            self.parks_total, self.parks_enriched, self.parks_skipped
        );
        println!(
            "Features: {} updated, {} unchanged",
            self.features_updated, self.features_unchanged
        );
        if let Some(ref backup) = self.backup {
            println!("Backup: {}", backup);
        }

        if !self.layers.is_empty() {
            println!("\n--- LAYERS ---");
            for layer in &self.layers {
                let crs = layer
                    .source_epsg
                    .map(|e| format!("EPSG:{}", e))
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "  {}: {} regions, {} skipped ({})",
                    layer.label, layer.regions, layer.skipped, crs
                );
            }
        }

        if !self.downloads.is_empty() {
            println!("\n--- DOWNLOADS ---");
            for d in &self.downloads {
                println!("  {}: {:?}", d.label, d.outcome);
            }
        }

        if !self.skipped_by_unit.is_empty() {
            println!("\n--- SKIPPED BY UNIT ---");
            let mut units: Vec<_> = self.skipped_by_unit.iter().collect();
            units.sort_by_key(|(k, _)| k.as_str());
            for (unit, count) in units {
                println!("  {}: {}", unit, count);
            }
        }

        if !self.issues.is_empty() {
            println!("\n--- ISSUES ({}) ---", self.issues.len());
            for e in self.issues.iter().take(20) {
                let location = e.id.as_deref().map(|id| format!("[{}]", id)).unwrap_or_default();
                println!("  {:?} {} {}", e.level, location, e.message);
            }
            if self.issues.len() > 20 {
                println!("  ... and {} more", self.issues.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Ligne de résumé affichée en fin de run
    pub fn summary(&self) -> String {
        if self.dry_run {
            return format!(
                "Dry run: {} park features would be updated",
                self.features_updated
            );
        }
        match self.backup {
            Some(ref backup) => {
                let name = Path::new(backup)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| backup.clone());
                format!(
                    "Updated {} park features. Backup written to {}",
                    self.features_updated, name
                )
            }
            None => "No changes: all park features already have metadata".to_string(),
        }
    }
}
