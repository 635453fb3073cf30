//! Normalisation du système de coordonnées des couches administratives
//!
//! Les couches fylker/kommuner sont publiées soit en WGS84 (EPSG:4326), soit en
//! UTM 33N (EPSG:32633). La détection se fait en deux temps :
//! - le membre `crs` du document, s'il mentionne EPSG:32633 ;
//! - sinon, une heuristique sur les premières coordonnées (|x| ou |y| > 1000
//!   ne peut pas être une longitude/latitude).
//!
//! La reprojection UTM 33N -> WGS84 est faite en Rust pur ; le feature `reproject`
//! permet d'utiliser PROJ à la place.

mod ellipsoid;
#[cfg(feature = "reproject")]
mod proj_backend;
mod utm;

pub use ellipsoid::WGS84;

use geo::{Coord, MapCoords, MultiPolygon};
use serde_json::Value;

use crate::GeometryError;

/// EPSG des coordonnées géographiques
pub const EPSG_WGS84: u32 = 4326;

/// EPSG de la projection UTM 33N
pub const EPSG_UTM33N: u32 = 32633;

/// Nombre de features inspectées par l'heuristique
const HEURISTIC_SAMPLE: usize = 3;

/// Au-delà, une coordonnée est forcément métrique
const PROJECTED_THRESHOLD: f64 = 1000.0;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }
}

/// Système de coordonnées d'une couche
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum LayerCrs {
    /// Longitude/latitude WGS84
    Geographic,
    /// UTM zone 33N en mètres
    Utm33North,
}

impl LayerCrs {
    pub fn epsg(self) -> u32 {
        match self {
            Self::Geographic => EPSG_WGS84,
            Self::Utm33North => EPSG_UTM33N,
        }
    }

    pub fn is_projected(self) -> bool {
        self == Self::Utm33North
    }
}

/// Détecte le système de coordonnées d'une couche
///
/// `crs` est le membre `crs` du document (s'il existe), `geometries` les géométries
/// brutes des features dans l'ordre du document.
pub fn detect_layer_crs<'a>(
    crs: Option<&Value>,
    geometries: impl IntoIterator<Item = &'a Value>,
) -> LayerCrs {
    if crs.is_some_and(declares_utm33) {
        return LayerCrs::Utm33North;
    }

    let looks_projected = geometries
        .into_iter()
        .take(HEURISTIC_SAMPLE)
        .filter_map(|g| g.get("coordinates"))
        .filter_map(first_xy)
        .any(|(x, y)| x.abs() > PROJECTED_THRESHOLD || y.abs() > PROJECTED_THRESHOLD);

    if looks_projected {
        LayerCrs::Utm33North
    } else {
        LayerCrs::Geographic
    }
}

/// `crs.properties.name` contient EPSG:32633 (formes `EPSG:32633` et `urn:ogc:def:crs:EPSG::32633`)
fn declares_utm33(crs: &Value) -> bool {
    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_uppercase();
    name.contains("EPSG::32633") || name.contains("EPSG:32633")
}

/// Première paire numérique (parcours en profondeur)
fn first_xy(coords: &Value) -> Option<(f64, f64)> {
    let items = coords.as_array()?;
    if let [x, y, ..] = items.as_slice() {
        if let (Some(x), Some(y)) = (x.as_f64(), y.as_f64()) {
            return Some((x, y));
        }
    }
    items.iter().find_map(first_xy)
}

/// Reprojection d'une couche vers WGS84
pub enum Reprojector {
    /// Pas de reprojection (couche déjà en WGS84)
    Identity,
    /// UTM 33N -> WGS84 en Rust pur
    #[cfg_attr(feature = "reproject", allow(dead_code))]
    Utm33Lite,
    /// UTM 33N -> WGS84 via PROJ
    #[cfg(feature = "reproject")]
    Proj(proj_backend::ProjReprojector),
}

impl Reprojector {
    /// Choisit la reprojection pour une couche
    pub fn for_layer(crs: LayerCrs) -> Result<Self, crate::ParkGeoError> {
        match crs {
            LayerCrs::Geographic => Ok(Self::Identity),
            #[cfg(feature = "reproject")]
            LayerCrs::Utm33North => Ok(Self::Proj(proj_backend::ProjReprojector::new(
                EPSG_UTM33N,
                EPSG_WGS84,
            )?)),
            #[cfg(not(feature = "reproject"))]
            LayerCrs::Utm33North => Ok(Self::Utm33Lite),
        }
    }

    /// Transforme une coordonnée (x, y) -> (lon, lat)
    pub fn transform_coord(&self, c: Coord<f64>) -> Result<Coord<f64>, GeometryError> {
        let (x, y) = match self {
            Self::Identity => return Ok(c),
            Self::Utm33Lite => utm::utm33n_to_geographic(c.x, c.y).to_degrees(),
            #[cfg(feature = "reproject")]
            Self::Proj(p) => p.convert(c.x, c.y)?,
        };

        if !x.is_finite() || !y.is_finite() || y.abs() > 90.0 {
            return Err(GeometryError::Reprojection(format!(
                "({}, {}) has no geographic equivalent",
                c.x, c.y
            )));
        }
        Ok(Coord { x, y })
    }

    /// Transforme une géométrie complète (échoue si un seul point échoue)
    pub fn transform(&self, geometry: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
        if matches!(self, Self::Identity) {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(|c| self.transform_coord(c))
    }

    /// Retourne une description de la reprojection utilisée
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (WGS84)",
            Self::Utm33Lite => "utm33n -> wgs84 (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "utm33n -> wgs84 (PROJ library)",
        }
    }
}
