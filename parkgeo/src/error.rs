//! Types d'erreurs pour le crate parkgeo

use thiserror::Error;

/// Erreurs fatales : elles rendent l'enrichissement impossible
#[derive(Debug, Error)]
pub enum ParkGeoError {
    /// Erreur d'I/O lors de la lecture d'un document
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Document JSON illisible
    #[error("Invalid JSON in {document}: {source}")]
    Json {
        document: String,
        #[source]
        source: serde_json::Error,
    },

    /// Une couche administrative qui n'est pas une FeatureCollection
    #[error("{0} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection(String),

    /// Reprojection non supportée
    #[error("Unsupported reprojection EPSG:{source_epsg} -> EPSG:{target_epsg}")]
    UnsupportedCrs { source_epsg: u32, target_epsg: u32 },
}

impl ParkGeoError {
    /// Crée une erreur JSON avec contexte
    pub fn json(document: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            document: document.into(),
            source,
        }
    }

    /// Crée une erreur d'I/O avec contexte
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Erreurs par unité (feature, région, groupe) : l'unité est ignorée, le run continue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Pas de géométrie
    #[error("missing geometry")]
    Missing,

    /// Géométrie GeoJSON invalide
    #[error("malformed geometry: {0}")]
    Malformed(String),

    /// Géométrie non surfacique (Point, LineString...)
    #[error("{0} is not a polygonal geometry")]
    NotPolygonal(String),

    /// Aucun polygone exploitable
    #[error("empty polygonal geometry")]
    Empty,

    /// Échec de l'union des géométries d'un parc
    #[error("union failed: {0}")]
    UnionFailed(String),

    /// Échec de la reprojection
    #[error("reprojection failed: {0}")]
    Reprojection(String),
}
