//! Projection UTM 33N inverse (EPSG:32633 -> géographique)
//!
//! Série de Krüger à l'ordre n³ : précision millimétrique dans la zone, largement
//! suffisant pour des tests d'intersection avec des limites administratives.

use super::ellipsoid::WGS84;
use super::Geographic;

/// Méridien central de la zone 33 (degrés)
const CENTRAL_MERIDIAN: f64 = 15.0;

const SCALE: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;

/// Coefficients de la série, dérivés du troisième aplatissement n
struct Series {
    /// Rayon rectifiant
    radius: f64,
    beta: [f64; 3],
    delta: [f64; 3],
}

impl Series {
    fn wgs84() -> Self {
        let n = WGS84::F / (2.0 - WGS84::F);
        let (n2, n3) = (n * n, n * n * n);
        Self {
            radius: WGS84::A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        }
    }
}

/// Convertit des coordonnées UTM 33N (easting, northing en mètres) vers WGS84
pub fn utm33n_to_geographic(easting: f64, northing: f64) -> Geographic {
    let series = Series::wgs84();

    let xi = northing / (SCALE * series.radius);
    let eta = (easting - FALSE_EASTING) / (SCALE * series.radius);

    let (mut xi_p, mut eta_p) = (xi, eta);
    for (j, beta) in series.beta.iter().enumerate() {
        let k = 2.0 * (j as f64 + 1.0);
        xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
        eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
    }

    // Latitude conforme, puis correction vers la latitude géodésique
    let chi = (xi_p.sin() / eta_p.cosh()).asin();
    let lat = series
        .delta
        .iter()
        .enumerate()
        .fold(chi, |acc, (j, delta)| acc + delta * (2.0 * (j as f64 + 1.0) * chi).sin());

    let lon = CENTRAL_MERIDIAN.to_radians() + eta_p.sinh().atan2(xi_p.cos());

    Geographic::new(lon, lat)
}
