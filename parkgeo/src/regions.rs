//! Chargement des couches administratives (fylker et kommuner)

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::crs::{detect_layer_crs, LayerCrs, Reprojector};
use crate::geometry::parse_polygonal;
use crate::types::{null_as_default, value_to_string, RegionRecord, Skip, SkipUnit};
use crate::ParkGeoError;

/// Clés probées, dans l'ordre, pour trouver le nom d'une région
pub const NAME_KEYS: [&str; 8] = [
    "n",
    "N",
    "navn",
    "NAVN",
    "fylkesnavn",
    "kommunenavn",
    "KOMNAVN",
    "name",
];

/// Document GeoJSON d'une couche, lu de façon tolérante
#[derive(Debug, Deserialize)]
struct LayerDocument {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    crs: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    features: Vec<LayerFeature>,
}

#[derive(Debug, Deserialize)]
struct LayerFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Value,
}

/// Une couche chargée et normalisée en WGS84
#[derive(Debug, Clone, Default)]
pub struct RegionLayer {
    /// Nom de la couche (pour les logs et le rapport)
    pub label: String,
    /// Système de coordonnées détecté dans le document source
    pub source_crs: Option<LayerCrs>,
    /// Régions, dans l'ordre du document (les doublons de nom sont conservés)
    pub records: Vec<RegionRecord>,
    /// Features ignorées ou reprojections en échec
    pub skipped: Vec<Skip>,
}

impl RegionLayer {
    /// Charge une couche depuis un fichier GeoJSON
    pub fn load_from_file<P: AsRef<Path>>(label: &str, path: P) -> Result<Self, ParkGeoError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ParkGeoError::io(path.display().to_string(), e))?;
        Self::load_from_json(label, &json)
    }

    /// Charge une couche depuis une chaîne GeoJSON
    pub fn load_from_json(label: &str, json: &str) -> Result<Self, ParkGeoError> {
        let document: LayerDocument =
            serde_json::from_str(json).map_err(|e| ParkGeoError::json(label, e))?;

        if let Some(kind) = document.kind.as_deref() {
            if kind != "FeatureCollection" {
                return Err(ParkGeoError::NotFeatureCollection(label.to_string()));
            }
        }

        let source_crs = detect_layer_crs(
            document.crs.as_ref(),
            document.features.iter().map(|f| &f.geometry),
        );
        let reprojector = Reprojector::for_layer(source_crs)?;
        debug!(
            layer = label,
            crs = source_crs.epsg(),
            reprojection = reprojector.description(),
            "Layer CRS detected"
        );

        let mut layer = RegionLayer {
            label: label.to_string(),
            source_crs: Some(source_crs),
            ..Default::default()
        };

        for (index, feature) in document.features.iter().enumerate() {
            let name = feature
                .properties
                .as_ref()
                .map(region_name)
                .unwrap_or_default();
            let id = if name.is_empty() {
                format!("{label} #{index}")
            } else {
                format!("{label} #{index} {name}")
            };

            let geometry = match parse_polygonal(&feature.geometry) {
                Ok(g) => g,
                Err(e) => {
                    warn!(region = %id, error = %e, "Skipping region");
                    layer.skipped.push(Skip::new(SkipUnit::Region, id, e));
                    continue;
                }
            };

            // Une reprojection en échec garde la géométrie d'origine
            let geometry = match reprojector.transform(&geometry) {
                Ok(g) => g,
                Err(e) => {
                    warn!(region = %id, error = %e, "Reprojection failed, keeping source coordinates");
                    layer.skipped.push(Skip::new(SkipUnit::Reprojection, id, e));
                    geometry
                }
            };

            layer.records.push(RegionRecord::new(name, geometry));
        }

        info!(
            layer = label,
            regions = layer.records.len(),
            skipped = layer.skipped.len(),
            crs = source_crs.epsg(),
            "Loaded region layer"
        );
        Ok(layer)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Nom d'affichage d'une région : première clé non nulle de [`NAME_KEYS`]
pub fn region_name(properties: &Map<String, Value>) -> String {
    NAME_KEYS
        .iter()
        .filter_map(|key| properties.get(*key))
        .find(|value| !value.is_null())
        .map(value_to_string)
        .unwrap_or_default()
}

/// Les deux index administratifs d'un run
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    pub counties: RegionLayer,
    pub municipalities: RegionLayer,
}

impl RegionIndex {
    pub fn new(counties: RegionLayer, municipalities: RegionLayer) -> Self {
        Self {
            counties,
            municipalities,
        }
    }
}
