//! Reprojection via PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

use proj::Proj;

use crate::{GeometryError, ParkGeoError};

/// Reprojection de coordonnées entre deux EPSG avec PROJ
pub struct ProjReprojector {
    proj: Proj,
}

impl ProjReprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    ///
    /// `new_known_crs` normalise l'ordre des axes en (lon, lat).
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, ParkGeoError> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        let proj = Proj::new_known_crs(&source, &target, None).map_err(|_| {
            ParkGeoError::UnsupportedCrs {
                source_epsg,
                target_epsg,
            }
        })?;

        Ok(Self { proj })
    }

    /// Transforme une coordonnée unique
    pub fn convert(&self, x: f64, y: f64) -> Result<(f64, f64), GeometryError> {
        self.proj
            .convert((x, y))
            .map_err(|e| GeometryError::Reprojection(e.to_string()))
    }
}
