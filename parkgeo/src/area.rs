//! Surface géodésique sur l'ellipsoïde WGS84

use geo::orient::{Direction, Orient};
use geo::{GeodesicArea, MultiPolygon};

/// Surface en km², arrondie au dixième
///
/// Calcul géodésique (algorithme de Karney), pas une approximation plane.
/// Les trous sont soustraits et le sens d'enroulement n'a pas d'effet.
pub fn geodesic_area_km2(geometry: &MultiPolygon<f64>) -> f64 {
    round_to_tenth(geodesic_area_m2(geometry) / 1_000_000.0)
}

/// Surface brute en m² (non arrondie)
///
/// Les anneaux sont réorientés (extérieur anti-horaire, trous horaires) avant le calcul signé.
pub fn geodesic_area_m2(geometry: &MultiPolygon<f64>) -> f64 {
    geometry
        .orient(Direction::Default)
        .geodesic_area_signed()
        .abs()
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
