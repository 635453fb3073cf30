//! Conversion GeoJSON -> `geo` et union des géométries surfaciques

use std::panic::{self, AssertUnwindSafe};

use geo::{BooleanOps, Geometry, MultiPolygon, Polygon};
use serde_json::Value;

use crate::GeometryError;

/// Parse une géométrie GeoJSON brute en MultiPolygon
///
/// Accepte Polygon, MultiPolygon et les GeometryCollection de polygones.
/// Les polygones dégénérés (anneau extérieur de moins de 4 points) sont écartés.
pub fn parse_polygonal(value: &Value) -> Result<MultiPolygon<f64>, GeometryError> {
    if value.is_null() {
        return Err(GeometryError::Missing);
    }

    let geojson: geojson::Geometry = serde_json::from_value(value.clone())
        .map_err(|e| GeometryError::Malformed(e.to_string()))?;
    let geometry: Geometry<f64> = geojson
        .value
        .try_into()
        .map_err(|e: geojson::Error| GeometryError::Malformed(e.to_string()))?;

    let mut polygons = Vec::new();
    collect_polygons(geometry, &mut polygons)?;
    polygons.retain(|p| p.exterior().0.len() >= 4);

    if polygons.is_empty() {
        return Err(GeometryError::Empty);
    }
    Ok(MultiPolygon::new(polygons))
}

fn collect_polygons(geometry: Geometry<f64>, out: &mut Vec<Polygon<f64>>) -> Result<(), GeometryError> {
    match geometry {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp.0),
        Geometry::GeometryCollection(gc) => {
            for g in gc.0 {
                collect_polygons(g, out)?;
            }
        }
        other => return Err(GeometryError::NotPolygonal(geometry_kind(&other).to_string())),
    }
    Ok(())
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Union de toutes les parties en une seule géométrie
///
/// Les opérations booléennes de `geo` peuvent paniquer sur des entrées
/// pathologiques : la panique est convertie en erreur pour n'ignorer que ce parc.
pub fn union_all(parts: Vec<MultiPolygon<f64>>) -> Result<MultiPolygon<f64>, GeometryError> {
    let mut parts = parts.into_iter();
    let Some(first) = parts.next() else {
        return Err(GeometryError::Empty);
    };

    let merged = panic::catch_unwind(AssertUnwindSafe(move || {
        parts.fold(first, |acc, part| acc.union(&part))
    }))
    .map_err(|payload| GeometryError::UnionFailed(panic_message(payload.as_ref())))?;

    if merged.0.is_empty() {
        return Err(GeometryError::Empty);
    }
    Ok(merged)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "boolean operation panicked".to_string()
    }
}
