//! Réécriture des valeurs dérivées dans les features (ajout seulement)
//!
//! Un champ dérivé déjà renseigné n'est jamais recalculé ni remplacé, même si la
//! géométrie a changé depuis : les corrections manuelles faites via l'API
//! d'administration sont protégées.

use serde_json::Number;
use tracing::warn;

use crate::types::{Derived, ParkProperties, RawFeature, Skip, SkipUnit};

/// Valeurs calculées pour un parc logique
#[derive(Debug, Clone, PartialEq)]
pub struct ParkMetadata {
    pub area_km2: f64,
    pub counties: Vec<String>,
    pub municipalities: Vec<String>,
    pub established_year: Option<i32>,
}

/// Complète les propriétés vides ; retourne `true` si au moins un champ a changé
///
/// Une valeur déjà là mais du mauvais type compte comme renseignée si elle est
/// non vide, sauf pour les listes de régions : seule une liste non vide protège le champ.
pub fn fill_missing(props: &mut ParkProperties, metadata: &ParkMetadata) -> bool {
    let mut changed = false;

    let current_area = props
        .area_km2
        .as_ref()
        .and_then(Derived::typed)
        .and_then(Number::as_f64);
    if !props.has_area() && current_area != Some(metadata.area_km2) {
        // Une surface non finie ne peut pas être écrite en JSON
        if let Some(area) = Number::from_f64(metadata.area_km2) {
            props.area_km2 = Some(Derived::Typed(area));
            changed = true;
        }
    }
    // Une liste vide déjà présente et un résultat vide ne comptent pas comme un changement
    if !props.has_counties() && !holds(props.counties.as_ref(), &metadata.counties) {
        props.counties = Some(Derived::Typed(metadata.counties.clone()));
        changed = true;
    }
    if !props.has_municipalities() && !holds(props.municipalities.as_ref(), &metadata.municipalities) {
        props.municipalities = Some(Derived::Typed(metadata.municipalities.clone()));
        changed = true;
    }
    if let Some(year) = metadata.established_year.filter(|&y| y != 0) {
        if !props.has_established_year() {
            props.established_year = Some(Derived::Typed(i64::from(year)));
            changed = true;
        }
    }

    changed
}

fn holds(current: Option<&Derived<Vec<String>>>, computed: &[String]) -> bool {
    current
        .and_then(Derived::typed)
        .is_some_and(|items| items.as_slice() == computed)
}

/// Bilan de la réécriture pour un groupe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeCount {
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: Vec<Skip>,
}

/// Écrit les valeurs d'un parc dans chacune de ses features
pub fn apply_to_members(
    features: &mut [RawFeature],
    members: &[usize],
    metadata: &ParkMetadata,
) -> MergeCount {
    let mut count = MergeCount::default();

    for &i in members {
        let Some(feature) = features.get_mut(i) else {
            continue;
        };
        let mut props = match feature.park_properties() {
            Ok(p) => p,
            Err(e) => {
                warn!(feature = %feature.label(i), error = %e, "Unreadable properties, not updated");
                count.skipped.push(Skip::new(SkipUnit::Feature, feature.label(i), e));
                continue;
            }
        };

        if fill_missing(&mut props, metadata) {
            props.store_derived(&mut feature.properties);
            count.updated += 1;
        } else {
            count.unchanged += 1;
        }
    }

    count
}
