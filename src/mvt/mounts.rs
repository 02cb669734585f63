use std::collections::HashMap;

use crate::dem::DemRaster;
use crate::feature::{Feature, FeatureCollection, PropertyValue};
use crate::mvt::Collections;

/// Detects summits and appends them to the `mount` layer, sorted by
/// ascending elevation.
pub fn build_mounts(
    raster: &DemRaster,
    elevation_offset: f64,
    collections: &mut Collections,
) -> anyhow::Result<()> {
    let (columns, rows) = raster.dimensions();
    let mut mounts = FeatureCollection::new();

    for row in 1..rows.saturating_sub(1) {
        for col in 1..columns.saturating_sub(1) {
            let elevation = raster.z(col, row);

            // peaks below the water line are not interesting
            if elevation <= 0.0 {
                continue;
            }

            let mut has_higher = false;
            let mut has_lower = false;

            'neighbours: for compare_row in row - 1..=row + 1 {
                for compare_col in col - 1..=col + 1 {
                    if compare_row == row && compare_col == col {
                        continue;
                    }

                    let compare = raster.z(compare_col, compare_row);

                    // a neighbour at the exact same elevation counts as both
                    // higher and lower, so cells inside a plateau never
                    // become a peak
                    if compare == elevation {
                        has_higher = true;
                        has_lower = true;
                        break 'neighbours;
                    }

                    has_higher = has_higher || compare > elevation;
                    has_lower = has_lower || compare < elevation;

                    if has_higher && has_lower {
                        break 'neighbours;
                    }
                }
            }

            if has_lower && !has_higher {
                let corrected = elevation + elevation_offset;

                mounts.push(Feature {
                    geometry: geo::Point::new(raster.x(col), raster.y(row)).into(),
                    properties: HashMap::from([
                        (
                            "elevation".to_string(),
                            PropertyValue::Number(corrected),
                        ),
                        (
                            "text".to_string(),
                            PropertyValue::String(format!("{:.0}", corrected.round())),
                        ),
                    ]),
                });
            }
        }
    }

    mounts.sort_by(|a, b| {
        let elev_a = a.properties.get("elevation").and_then(PropertyValue::as_f64);
        let elev_b = b.properties.get("elevation").and_then(PropertyValue::as_f64);
        elev_a.partial_cmp(&elev_b).unwrap_or(std::cmp::Ordering::Equal)
    });

    collections.insert("mount".to_string(), mounts);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::build_mounts;
    use crate::dem::{DemRaster, Origin};
    use crate::feature::PropertyValue;
    use crate::mvt::Collections;
    use geo::Geometry;

    fn raster(size: usize, data: Vec<f64>) -> DemRaster {
        DemRaster::new(size, size, Origin::Corner(0.0, 0.0), 1.0, -9999.0, data)
    }

    #[test]
    fn single_peak_is_detected_at_its_world_coordinate() {
        let r = raster(
            3,
            vec![
                1.0, 1.0, 1.0, //
                1.0, 5.0, 1.0, //
                1.0, 1.0, 1.0,
            ],
        );
        let mut collections = Collections::new();

        build_mounts(&r, 10.0, &mut collections).unwrap();

        let mounts = collections.get("mount").unwrap();
        assert_eq!(mounts.len(), 1);

        let feature = &mounts[0];
        match &feature.geometry {
            Geometry::Point(p) => {
                assert_eq!(p.x(), r.x(1));
                assert_eq!(p.y(), r.y(1));
            }
            _ => panic!("expected a point"),
        }
        assert_eq!(
            feature.properties.get("elevation"),
            Some(&PropertyValue::Number(15.0))
        );
        assert_eq!(
            feature.properties.get("text"),
            Some(&PropertyValue::String("15".to_string()))
        );
    }

    #[test]
    fn plateau_cells_are_suppressed() {
        let r = raster(
            4,
            vec![
                1.0, 1.0, 1.0, 1.0, //
                1.0, 5.0, 5.0, 1.0, //
                1.0, 5.0, 5.0, 1.0, //
                1.0, 1.0, 1.0, 1.0,
            ],
        );
        let mut collections = Collections::new();

        build_mounts(&r, 0.0, &mut collections).unwrap();

        assert!(collections.get("mount").unwrap().is_empty());
    }

    #[test]
    fn cells_at_or_below_zero_are_ignored() {
        let r = raster(
            3,
            vec![
                -3.0, -3.0, -3.0, //
                -3.0, -1.0, -3.0, //
                -3.0, -3.0, -3.0,
            ],
        );
        let mut collections = Collections::new();

        build_mounts(&r, 0.0, &mut collections).unwrap();

        assert!(collections.get("mount").unwrap().is_empty());
    }

    #[test]
    fn mounts_are_sorted_by_ascending_elevation() {
        let r = raster(
            5,
            vec![
                0.0, 0.0, 0.0, 0.0, 0.0, //
                0.0, 7.0, 0.0, 3.0, 0.0, //
                0.0, 0.0, 0.0, 0.0, 0.0, //
                0.0, 9.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 0.0, 0.0,
            ],
        );
        let mut collections = Collections::new();

        build_mounts(&r, 0.0, &mut collections).unwrap();

        let elevations: Vec<f64> = collections
            .get("mount")
            .unwrap()
            .iter()
            .map(|f| f.properties.get("elevation").unwrap().as_f64().unwrap())
            .collect();

        assert_eq!(elevations, vec![1.0, 3.0, 7.0, 9.0]);
    }

    #[test]
    fn edge_cells_are_never_peaks() {
        let r = raster(
            3,
            vec![
                9.0, 1.0, 1.0, //
                1.0, 0.5, 1.0, //
                1.0, 1.0, 1.0,
            ],
        );
        let mut collections = Collections::new();

        build_mounts(&r, 0.0, &mut collections).unwrap();

        assert!(collections.get("mount").unwrap().is_empty());
    }
}
