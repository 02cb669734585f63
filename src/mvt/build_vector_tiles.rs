use std::fs;
use std::path::Path;
use std::time::Instant;

use geo::area::Area;
use geo::euclidean_distance::EuclideanDistance;
use geo::euclidean_length::EuclideanLength;
use geo::map_coords::MapCoordsInplace;
use geo::{Coordinate, Geometry, LineString, Point, Polygon, Rect};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon::iter::IntoParallelRefMutIterator;

use crate::coords::TILE_EXTENT;
use crate::feature::{Feature, FeatureCollection, Simplifiable};
use crate::mvt::clip_feature::Clip;
use crate::mvt::encode::encode_tile;
use crate::mvt::layer_settings::{find_lod_layers, LayerSetting};
use crate::mvt::lod_projection::LodProjection;
use crate::mvt::Collections;

/// Writes one vector tile tree per LOD, walking from the maximum LOD down to
/// zero. Simplification for a LOD always runs before its tiles are cut, and
/// the coordinate halving towards the next LOD only happens after that.
pub fn build_vector_tiles(
    output_path: &Path,
    collections: Collections,
    max_lod: usize,
    world_size: f64,
    settings: &[LayerSetting],
) -> anyhow::Result<()> {
    let mut projection = LodProjection::new(collections, world_size, max_lod)?;

    loop {
        let lod = projection.lod();
        let started = Instant::now();
        let lod_dir = output_path.join(lod.to_string());

        // the maximum LOD keeps its full detail
        if !projection.is_max_lod() {
            simplify_layers(projection.collections_mut());
        }

        let layer_names = find_lod_layers(projection.collections(), settings, lod, max_lod);
        let tile_layers = materialize_lod_layers(projection.collections(), &layer_names);

        if let Err(err) = build_lod_tiles(&tile_layers, lod, &lod_dir) {
            println!("❌  Error while building tiles for LOD {}: {}", lod, err);
        }

        println!(
            "    ✔️  Finished tiles for LOD {} in {}ms",
            lod,
            started.elapsed().as_millis()
        );

        if projection.decrease_lod().is_err() {
            break;
        }
    }

    Ok(())
}

/// The per-layer simplification policy, applied between LODs. Layers are
/// independent, so they are processed in parallel.
fn simplify_layers(collections: &mut Collections) {
    collections.par_iter_mut().for_each(|(name, collection)| {
        // location labels keep every vertex at every zoom
        if name.starts_with("locations") {
            return;
        }

        match name.as_str() {
            "bunker" | "chapel" | "church" | "cross" | "fuelstation" | "lighthouse" | "rock"
            | "shipwreck" | "transmitter" | "watertower" | "fortress" | "fountain"
            | "view-tower" | "quay" | "hospital" | "busstop" | "stack" | "ruin" | "tourism"
            | "powersolar" | "powerwave" | "powerwind" | "tree" | "bush" => {}
            "mount" => thin_mounts(collection, 1000.0),
            "railway" | "powerline" => collection.simplify(1.0),
            "house" => collection.remove_empty(0.0, 200.0),
            "contours" => {
                collection.simplify(2.0);
                collection.remove_empty(100.0, 0.0);
            }
            "water" => {
                collection.simplify(2.0);
                remove_zero_area_polygons(collection);
                strip_short_rings(collection, 150.0);
            }
            _ => {
                collection.simplify(1.0);
                collection.remove_empty(100.0, 200.0);
            }
        }
    });
}

/// Keeps a peak only if it is at least `min_distance` away from every
/// already retained peak. The layer is sorted by ascending elevation, so
/// iteration order is deterministic.
fn thin_mounts(collection: &mut FeatureCollection, min_distance: f64) {
    let mut retained: Vec<Point<f64>> = Vec::new();

    collection.retain(|feature| match &feature.geometry {
        Geometry::Point(point) => {
            let keep = retained
                .iter()
                .all(|kept| kept.euclidean_distance(point) >= min_distance);
            if keep {
                retained.push(*point);
            }
            keep
        }
        _ => true,
    });
}

fn remove_zero_area_polygons(collection: &mut FeatureCollection) {
    collection.retain(|feature| match &feature.geometry {
        Geometry::Polygon(pg) => pg.unsigned_area() > 0.0,
        Geometry::MultiPolygon(mpg) => mpg.unsigned_area() > 0.0,
        _ => true,
    });
}

/// Drops polygon rings whose perimeter falls below `min_perimeter`.
/// Simplification never removes collapsed holes itself; and when the outer
/// ring collapses, the whole feature goes.
fn strip_short_rings(collection: &mut FeatureCollection, min_perimeter: f64) {
    let features = std::mem::take(&mut collection.0);

    collection.0 = features
        .into_iter()
        .filter_map(|feature| {
            let geometry = match feature.geometry {
                Geometry::Polygon(pg) => strip_polygon(pg, min_perimeter).map(Geometry::Polygon),
                Geometry::MultiPolygon(mpg) => {
                    let polygons: Vec<Polygon<f64>> = mpg
                        .0
                        .into_iter()
                        .filter_map(|pg| strip_polygon(pg, min_perimeter))
                        .collect();

                    if polygons.is_empty() {
                        None
                    } else {
                        Some(Geometry::MultiPolygon(geo::MultiPolygon(polygons)))
                    }
                }
                other => Some(other),
            };

            geometry.map(|geometry| Feature {
                geometry,
                properties: feature.properties,
            })
        })
        .collect();
}

fn strip_polygon(polygon: Polygon<f64>, min_perimeter: f64) -> Option<Polygon<f64>> {
    let (exterior, interiors) = polygon.into_inner();

    if exterior.euclidean_length() < min_perimeter {
        return None;
    }

    let interiors: Vec<LineString<f64>> = interiors
        .into_iter()
        .filter(|ring| ring.euclidean_length() >= min_perimeter)
        .collect();

    Some(Polygon::new(exterior, interiors))
}

fn contour_interval(layer_name: &str) -> Option<i64> {
    layer_name
        .strip_prefix("contours/")?
        .parse::<i64>()
        .ok()
        .filter(|interval| *interval > 0)
}

/// Snapshots the layers selected for one LOD. The `contours/NN` layers are
/// filled from the internal `contours` layer by elevation interval; all
/// other layers are cloned as they are.
fn materialize_lod_layers(
    collections: &Collections,
    layer_names: &[String],
) -> Vec<(String, FeatureCollection)> {
    layer_names
        .iter()
        .map(|name| {
            let collection = match contour_interval(name) {
                Some(interval) => fill_contour_layer(collections, interval),
                None => collections.get(name).cloned().unwrap_or_default(),
            };

            (name.clone(), collection)
        })
        .collect()
}

fn fill_contour_layer(collections: &Collections, interval: i64) -> FeatureCollection {
    let contours = match collections.get("contours") {
        Some(contours) => contours,
        None => return FeatureCollection::new(),
    };

    contours
        .iter()
        .filter(|feature| {
            feature
                .properties
                .get("dem_elevation")
                .and_then(|v| v.as_f64())
                .map_or(false, |elevation| elevation as i64 % interval == 0)
        })
        .cloned()
        .collect()
}

/// Cuts and writes all tiles of one LOD. Tiles are independent, the rayon
/// pool bounds the in-flight work. A failed tile is logged and skipped so
/// its siblings still get written.
fn build_lod_tiles(
    layers: &[(String, FeatureCollection)],
    lod: usize,
    lod_dir: &Path,
) -> anyhow::Result<()> {
    let tiles_per_dimension = 1_u64 << lod;

    fs::create_dir_all(lod_dir)?;
    for col in 0..tiles_per_dimension {
        fs::create_dir_all(lod_dir.join(col.to_string()))?;
    }

    let tiles: Vec<(u64, u64)> = (0..tiles_per_dimension)
        .flat_map(|col| (0..tiles_per_dimension).map(move |row| (col, row)))
        .collect();

    tiles.into_par_iter().for_each(|(col, row)| {
        let tile_path = lod_dir.join(col.to_string()).join(format!("{}.pbf", row));

        match create_tile(col, row, layers) {
            Ok(data) => {
                if let Err(err) = fs::write(&tile_path, data) {
                    println!(
                        "❌  Error while writing tile {}/{}/{}: {}",
                        lod, col, row, err
                    );
                }
            }
            Err(err) => {
                println!(
                    "❌  Error while creating tile {}/{}/{}: {}",
                    lod, col, row, err
                );
            }
        }
    });

    Ok(())
}

/// Clips all layers to the tile's bounds, shifts them into tile-local
/// coordinates and encodes the payload.
fn create_tile(
    col: u64,
    row: u64,
    layers: &[(String, FeatureCollection)],
) -> anyhow::Result<Vec<u8>> {
    let x_offset = (col * TILE_EXTENT) as f64;
    let y_offset = (row * TILE_EXTENT) as f64;

    let bounds = Rect::new(
        Coordinate {
            x: x_offset,
            y: y_offset,
        },
        Coordinate {
            x: x_offset + TILE_EXTENT as f64,
            y: y_offset + TILE_EXTENT as f64,
        },
    );

    let tile_layers: Vec<(String, FeatureCollection)> = layers
        .iter()
        .map(|(name, collection)| {
            let clipped: FeatureCollection = collection
                .iter()
                .filter_map(|feature| {
                    feature.geometry.clip(&bounds).map(|mut geometry| {
                        geometry.map_coords_inplace(|&(x, y)| (x - x_offset, y - y_offset));
                        Feature {
                            geometry,
                            properties: feature.properties.clone(),
                        }
                    })
                })
                .collect();

            (name.clone(), clipped)
        })
        .collect();

    encode_tile(&tile_layers)
}
