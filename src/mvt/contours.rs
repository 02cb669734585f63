use std::collections::HashMap;

use anyhow::Context;
use geo::LineString;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::dem::{marching_squares, DemRaster};
use crate::feature::{Feature, FeatureCollection, PropertyValue};
use crate::mvt::water::build_water;
use crate::mvt::Collections;

/// Intervals for which a dedicated contour layer is emitted. The layers are
/// created empty here and filled per LOD from the internal `contours` layer.
pub const CONTOUR_INTERVAL_LAYERS: [(&str, i64); 5] = [
    ("contours/01", 1),
    ("contours/05", 5),
    ("contours/10", 10),
    ("contours/50", 50),
    ("contours/100", 100),
];

/// Extracts contour lines for every integer elevation of the DEM into the
/// internal `contours` layer and promotes the 0-elevation lines into the
/// `water` layer.
pub fn build_contours(
    raster: &DemRaster,
    elevation_offset: f64,
    world_size: f64,
    collections: &mut Collections,
) -> anyhow::Result<()> {
    let (min_elevation, max_elevation) = raster
        .elevation_range()
        .context("no elevation samples in DEM raster")?;

    let elevations: Vec<i64> =
        (min_elevation.floor() as i64 - 1..=max_elevation.ceil() as i64 + 1).collect();

    // elevations are independent; the rayon pool bounds the in-flight work
    // and the ordered collect keeps the result deterministic
    let lines_per_elevation: Vec<(i64, Vec<LineString<f64>>)> = elevations
        .into_par_iter()
        .map(|elevation| (elevation, marching_squares(raster, elevation as f64)))
        .collect();

    let mut contours = FeatureCollection::new();
    let mut water_lines: Vec<LineString<f64>> = Vec::new();

    for (elevation, lines) in lines_per_elevation {
        if elevation == 0 {
            water_lines = lines.clone();
        }

        for line in lines {
            contours.push(Feature {
                geometry: geo::Geometry::LineString(line),
                properties: HashMap::from([
                    (
                        "elevation".to_string(),
                        PropertyValue::Number(elevation as f64 + elevation_offset),
                    ),
                    (
                        "dem_elevation".to_string(),
                        PropertyValue::Number(elevation as f64),
                    ),
                ]),
            });
        }
    }

    collections.insert("contours".to_string(), contours);
    for (name, _) in CONTOUR_INTERVAL_LAYERS {
        collections.insert(name.to_string(), FeatureCollection::new());
    }

    if !water_lines.is_empty() {
        collections.insert(
            "water".to_string(),
            build_water(&water_lines, world_size, raster),
        );
    }

    Ok(())
}
