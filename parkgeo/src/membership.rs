//! Appartenance d'un parc aux régions administratives

use std::collections::BTreeSet;

use geo::{BoundingRect, Intersects, MultiPolygon};

use crate::regions::{RegionIndex, RegionLayer};

/// Noms des régions qui intersectent la géométrie (intérieur ou bord)
///
/// Un simple contact (point ou arête) suffit : un parc à cheval sur une frontière
/// est attribué aux deux côtés. Noms dédoublonnés, vides exclus, triés.
pub fn overlapping_regions(park: &MultiPolygon<f64>, layer: &RegionLayer) -> Vec<String> {
    let park_bbox = park.bounding_rect();

    let names: BTreeSet<&str> = layer
        .records
        .iter()
        .filter(|r| !r.name.is_empty())
        .filter(|r| match (park_bbox, r.bbox) {
            (Some(a), Some(b)) => a.intersects(&b),
            _ => false,
        })
        .filter(|r| park.intersects(&r.geometry))
        .map(|r| r.name.as_str())
        .collect();

    names.into_iter().map(str::to_string).collect()
}

/// Fylker et kommuner d'un parc
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memberships {
    pub counties: Vec<String>,
    pub municipalities: Vec<String>,
}

impl RegionIndex {
    /// Résout les deux listes indépendantes pour un parc
    pub fn memberships(&self, park: &MultiPolygon<f64>) -> Memberships {
        Memberships {
            counties: overlapping_regions(park, &self.counties),
            municipalities: overlapping_regions(park, &self.municipalities),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegionRecord;
    use geo::polygon;

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ]])
    }

    fn layer(records: Vec<RegionRecord>) -> RegionLayer {
        RegionLayer {
            label: "test".to_string(),
            records,
            ..Default::default()
        }
    }

    #[test]
    fn test_overlap_sorted_and_deduplicated() {
        let layer = layer(vec![
            RegionRecord::new("Vestland", square(5.0, 60.0, 2.0)),
            RegionRecord::new("Innlandet", square(7.0, 60.0, 2.0)),
            RegionRecord::new("Vestland", square(5.0, 62.0, 2.0)),
            RegionRecord::new("Nordland", square(12.0, 66.0, 2.0)),
        ]);
        let park = square(6.5, 61.5, 1.0);

        assert_eq!(overlapping_regions(&park, &layer), ["Innlandet", "Vestland"]);
    }

    #[test]
    fn test_single_point_touch_counts() {
        let layer = layer(vec![RegionRecord::new("Troms", square(1.0, 1.0, 1.0))]);
        let park = square(0.0, 0.0, 1.0);

        assert_eq!(overlapping_regions(&park, &layer), ["Troms"]);
    }

    #[test]
    fn test_shared_edge_counts() {
        let layer = layer(vec![RegionRecord::new("Finnmark", square(1.0, 0.0, 1.0))]);
        let park = square(0.0, 0.0, 1.0);

        assert_eq!(overlapping_regions(&park, &layer), ["Finnmark"]);
    }

    #[test]
    fn test_park_inside_region() {
        let layer = layer(vec![RegionRecord::new("Innlandet", square(0.0, 0.0, 10.0))]);
        let park = square(4.0, 4.0, 1.0);

        assert_eq!(overlapping_regions(&park, &layer), ["Innlandet"]);
    }

    #[test]
    fn test_empty_names_and_disjoint_excluded() {
        let layer = layer(vec![
            RegionRecord::new("", square(0.0, 0.0, 10.0)),
            RegionRecord::new("Far away", square(50.0, 50.0, 1.0)),
        ]);
        let park = square(4.0, 4.0, 1.0);

        assert!(overlapping_regions(&park, &layer).is_empty());
    }

    #[test]
    fn test_index_keeps_layers_independent() {
        let index = RegionIndex::new(
            layer(vec![RegionRecord::new("Viken", square(0.0, 0.0, 10.0))]),
            layer(vec![
                RegionRecord::new("Hvaler", square(0.0, 0.0, 5.0)),
                RegionRecord::new("Fredrikstad", square(5.0, 5.0, 5.0)),
            ]),
        );
        let m = index.memberships(&square(1.0, 1.0, 1.0));

        assert_eq!(m.counties, ["Viken"]);
        assert_eq!(m.municipalities, ["Hvaler"]);
    }
}
