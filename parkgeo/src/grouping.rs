//! Regroupement des features en parcs logiques et fusion des géométries
//!
//! Un parc découpé en plusieurs polygones disjoints (îles, enclaves) apparaît
//! comme plusieurs features partageant le même code : elles forment un seul
//! parc logique, dont la géométrie canonique est l'union de toutes les parties.

use std::collections::HashMap;

use geo::MultiPolygon;
use tracing::{debug, warn};

use crate::geometry::{parse_polygonal, union_all};
use crate::types::{ParkProperties, RawFeature, Skip, SkipUnit};
use crate::GeometryError;

/// Clé d'identité d'un parc logique
///
/// Le code est prioritaire, le nom sert de repli. Minuscules, puis on ne garde que
/// les lettres/chiffres ASCII et æ, ø, å.
pub fn park_key(code: Option<&str>, name: Option<&str>) -> String {
    let source = [code, name]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    source
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, 'æ' | 'ø' | 'å'))
        .collect()
}

/// Un parc logique : ses features membres (indices dans le jeu de données)
#[derive(Debug, Clone, PartialEq)]
pub struct ParkGroup {
    pub key: String,
    /// Indices des features, dans l'ordre du document
    pub members: Vec<usize>,
    /// Propriétés de la première feature (code/nom pour les recherches)
    pub representative: ParkProperties,
}

/// Résultat du regroupement : table immuable clé -> groupe, ordre de première apparition
#[derive(Debug, Clone, Default)]
pub struct ParkGroups {
    groups: Vec<ParkGroup>,
    index: HashMap<String, usize>,
    /// Features ignorées (propriétés illisibles)
    pub skipped: Vec<Skip>,
}

impl ParkGroups {
    pub fn get(&self, key: &str) -> Option<&ParkGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParkGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Nombre total de features dans les groupes
    pub fn member_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }
}

/// Regroupe les features de parcs actives (`source == "park"`, non supprimées)
pub fn group_parks(features: &[RawFeature]) -> ParkGroups {
    let mut result = ParkGroups::default();

    for (i, feature) in features.iter().enumerate() {
        let props = match feature.park_properties() {
            Ok(p) => p,
            Err(e) => {
                // Seules les features qui se déclarent comme parc comptent
                if feature.properties.get("source").and_then(|v| v.as_str()) == Some("park") {
                    warn!(feature = %feature.label(i), error = %e, "Unreadable park properties");
                    result.skipped.push(Skip::new(SkipUnit::Feature, feature.label(i), e));
                }
                continue;
            }
        };

        if !props.is_active_park() {
            continue;
        }

        let key = park_key(props.code.as_deref(), props.name.as_deref());
        match result.index.get(&key) {
            Some(&g) => result.groups[g].members.push(i),
            None => {
                result.index.insert(key.clone(), result.groups.len());
                result.groups.push(ParkGroup {
                    key,
                    members: vec![i],
                    representative: props,
                });
            }
        }
    }

    debug!(
        groups = result.groups.len(),
        features = result.member_count(),
        "Grouped park features"
    );
    result
}

/// Géométrie canonique d'un parc
#[derive(Debug, Clone)]
pub struct MergedGeometry {
    pub geometry: MultiPolygon<f64>,
    /// Nombre de parties utilisées
    pub parts: usize,
    /// Membres dont la géométrie n'a pas pu être lue
    pub skipped: Vec<Skip>,
}

/// Échec de la fusion d'un groupe, avec les membres déjà écartés
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFailure {
    pub error: GeometryError,
    pub skipped: Vec<Skip>,
}

/// Fusionne les géométries des membres d'un groupe
///
/// Les géométries illisibles sont ignorées ; sans aucune géométrie lisible, ou si
/// l'union échoue, le groupe entier est en erreur.
pub fn merge_group_geometry(
    group: &ParkGroup,
    features: &[RawFeature],
) -> Result<MergedGeometry, GroupFailure> {
    let mut parts = Vec::with_capacity(group.members.len());
    let mut skipped = Vec::new();

    for &i in &group.members {
        let Some(feature) = features.get(i) else {
            continue;
        };
        match parse_polygonal(feature.geometry_value()) {
            Ok(g) => parts.push(g),
            Err(e) => {
                warn!(park = %group.key, feature = %feature.label(i), error = %e, "Skipping member geometry");
                skipped.push(Skip::new(SkipUnit::Feature, feature.label(i), e));
            }
        }
    }

    let count = parts.len();
    match union_all(parts) {
        Ok(geometry) => Ok(MergedGeometry {
            geometry,
            parts: count,
            skipped,
        }),
        Err(error) => Err(GroupFailure { error, skipped }),
    }
}
