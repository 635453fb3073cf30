//! # parkgeo
//!
//! Moteur d'enrichissement géométrique d'un jeu de données de parcs nationaux.
//!
//! ## Features
//!
//! - Regroupement des features en parcs logiques (code, sinon nom) et union des géométries
//! - Surface géodésique sur l'ellipsoïde WGS84
//! - Fylker/kommuner intersectés, avec reprojection UTM 33N -> WGS84 des couches
//! - Année de création extraite des indices textuels
//! - Réécriture en ajout seulement : un champ déjà renseigné n'est jamais remplacé
//!
//! ## Usage
//!
//! ```rust,ignore
//! use parkgeo::{enrich, HintsStore, RegionIndex, RegionLayer};
//!
//! let regions = RegionIndex::new(
//!     RegionLayer::load_from_file("fylker", "fylker2018.geojson")?,
//!     RegionLayer::load_from_file("kommuner", "kommuner2018.geojson")?,
//! );
//! let outcome = enrich(&mut document, &regions, &HintsStore::default());
//! println!("{} features mises à jour", outcome.features_updated);
//! ```

pub mod area;
pub mod crs;
pub mod error;
pub mod geometry;
pub mod grouping;
pub mod hints;
pub mod membership;
pub mod merge;
pub mod regions;
pub mod types;

pub use error::{GeometryError, ParkGeoError};
pub use grouping::{group_parks, park_key, GroupFailure, ParkGroup, ParkGroups};
pub use membership::Memberships;
pub use merge::ParkMetadata;
pub use regions::{RegionIndex, RegionLayer};
pub use types::{
    Dataset, DatasetDocument, Derived, HintEntry, HintsStore, ParkProperties, RawFeature,
    RegionRecord, Skip, SkipUnit,
};

use serde::Serialize;
use tracing::{debug, info, warn};

/// Résumé d'un parc logique traité
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkSummary {
    pub key: String,
    pub members: usize,
    pub area_km2: f64,
    pub counties: Vec<String>,
    pub municipalities: Vec<String>,
    pub established_year: Option<i32>,
    /// Features de ce parc effectivement modifiées
    pub updated: usize,
}

/// Résultat d'un enrichissement
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichOutcome {
    /// Nombre de parcs logiques trouvés
    pub groups_total: usize,
    /// Parcs pour lesquels des valeurs ont été calculées
    pub groups_enriched: usize,
    /// Parcs ignorés (aucune géométrie, union impossible)
    pub groups_skipped: usize,
    /// Features modifiées
    pub features_updated: usize,
    /// Features déjà complètes
    pub features_unchanged: usize,
    pub parks: Vec<ParkSummary>,
    /// Unités ignorées pendant le run
    pub skipped: Vec<Skip>,
}

impl EnrichOutcome {
    /// Le document a-t-il été modifié ?
    pub fn has_changes(&self) -> bool {
        self.features_updated > 0
    }
}

/// Calcule les valeurs d'un parc à partir de sa géométrie canonique
fn park_metadata(
    group: &ParkGroup,
    geometry: &geo::MultiPolygon<f64>,
    regions: &RegionIndex,
    hints_store: &HintsStore,
) -> ParkMetadata {
    let memberships = regions.memberships(geometry);
    let rep = &group.representative;
    ParkMetadata {
        area_km2: area::geodesic_area_km2(geometry),
        counties: memberships.counties,
        municipalities: memberships.municipalities,
        established_year: hints::establishment_year(
            hints_store,
            rep.code.as_deref(),
            rep.name.as_deref(),
        ),
    }
}

/// Enrichit le document en place
///
/// Toutes les valeurs sont calculées d'abord, puis réécrites dans les features.
/// Un parc en erreur est ignoré sans interrompre les autres.
pub fn enrich(
    document: &mut DatasetDocument,
    regions: &RegionIndex,
    hints_store: &HintsStore,
) -> EnrichOutcome {
    let features = &document.dataset.features;
    let groups = group_parks(features);

    let mut outcome = EnrichOutcome {
        groups_total: groups.len(),
        skipped: groups.skipped.clone(),
        ..Default::default()
    };

    let mut computed = Vec::with_capacity(groups.len());
    for group in groups.iter() {
        let merged = match grouping::merge_group_geometry(group, features) {
            Ok(m) => m,
            Err(failure) => {
                warn!(park = %group.key, error = %failure.error, "Skipping park");
                outcome.groups_skipped += 1;
                outcome.skipped.extend(failure.skipped);
                outcome
                    .skipped
                    .push(Skip::new(SkipUnit::Group, group.key.clone(), failure.error));
                continue;
            }
        };
        outcome.skipped.extend(merged.skipped);

        let metadata = park_metadata(group, &merged.geometry, regions, hints_store);
        debug!(
            park = %group.key,
            parts = merged.parts,
            area_km2 = metadata.area_km2,
            counties = ?metadata.counties,
            municipalities = ?metadata.municipalities,
            year = ?metadata.established_year,
            "Computed park metadata"
        );
        computed.push((group, metadata));
    }

    let features = &mut document.dataset.features;
    for (group, metadata) in computed {
        let count = merge::apply_to_members(features, &group.members, &metadata);
        outcome.groups_enriched += 1;
        outcome.features_updated += count.updated;
        outcome.features_unchanged += count.unchanged;
        outcome.skipped.extend(count.skipped);
        outcome.parks.push(ParkSummary {
            key: group.key.clone(),
            members: group.members.len(),
            area_km2: metadata.area_km2,
            counties: metadata.counties,
            municipalities: metadata.municipalities,
            established_year: metadata.established_year,
            updated: count.updated,
        });
    }

    info!(
        parks = outcome.groups_total,
        enriched = outcome.groups_enriched,
        skipped = outcome.groups_skipped,
        updated = outcome.features_updated,
        "Enrichment computed"
    );
    outcome
}
