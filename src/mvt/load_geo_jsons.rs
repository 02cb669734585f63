use std::convert::TryInto;
use std::{
    collections::HashMap,
    fs::{read_dir, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use flate2::bufread::GzDecoder;
use geo::Geometry;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::feature::{make_clockwise, Feature, FeatureCollection, PropertyValue};
use crate::mvt::Collections;

/// Loads every `*.geojson.gz` below `input_path` into the registry, keyed by
/// its path relative to `input_path` with the suffix stripped.
pub fn load_geo_jsons(input_path: &Path, collections: &mut Collections) -> anyhow::Result<()> {
    let files = find_geo_json_files(input_path)?;

    let results: Vec<anyhow::Result<(String, FeatureCollection)>> = files
        .into_par_iter()
        .map(|path| {
            let layer_name = path_to_layer_name(&path, input_path)?;
            let mut collection = read_zipped_geo_json(&path)
                .with_context(|| format!("could not load {}", path.display()))?;

            if layer_name == "house" {
                normalize_houses(&mut collection)
                    .with_context(|| format!("could not normalize {}", path.display()))?;
            }

            Ok((layer_name, collection))
        })
        .collect();

    for result in results {
        let (name, collection) = result?;
        collections.insert(name, collection);
    }

    Ok(())
}

fn find_geo_json_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if dir.is_dir() {
        for entry in read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                files.extend(find_geo_json_files(&path)?);
            } else if path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.ends_with(".geojson.gz"))
            {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn path_to_layer_name(file_path: &Path, input_path: &Path) -> anyhow::Result<String> {
    let rel_path = file_path.strip_prefix(input_path)?;

    // forward slashes on every platform
    let joined = rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    Ok(joined.trim_end_matches(".geojson.gz").to_string())
}

fn read_zipped_geo_json(path: &Path) -> anyhow::Result<FeatureCollection> {
    let file = File::open(path)?;

    let buf = BufReader::new(file);
    let dec = GzDecoder::new(buf);

    let geojson_features: Vec<geojson::Feature> = serde_json::from_reader(dec)?;

    let mut collection = FeatureCollection::new();
    for feature in geojson_features {
        let geometry = match feature.geometry {
            Some(g) => g,
            None => continue,
        };

        let geometry: Geometry<f64> = geometry
            .try_into()
            .map_err(|e: geojson::Error| anyhow::Error::new(e))?;

        let properties: HashMap<String, PropertyValue> = match feature.properties {
            Some(map) => map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            None => HashMap::new(),
        };

        collection.push(Feature {
            geometry,
            properties,
        });
    }

    Ok(collection)
}

/// The `house` layer carries its color as `[r, g, b]`; the web map wants a
/// CSS `rgb()` string. Ring winding is normalized to clockwise while we're
/// at it.
fn normalize_houses(collection: &mut FeatureCollection) -> anyhow::Result<()> {
    for feature in collection.iter_mut() {
        let color = match feature.properties.get("color") {
            Some(PropertyValue::Array(values)) => values
                .iter()
                .map(|v| v.as_f64().context("house color component is not a number"))
                .collect::<anyhow::Result<Vec<f64>>>()?,
            _ => bail!("house feature has no color list"),
        };

        if color.len() < 3 {
            bail!("house color has fewer than 3 components");
        }

        feature.properties.insert(
            "color".to_string(),
            PropertyValue::String(format!(
                "rgb({:.0}, {:.0}, {:.0})",
                color[0], color[1], color[2]
            )),
        );

        match &mut feature.geometry {
            Geometry::Polygon(polygon) => normalize_polygon_winding(polygon),
            Geometry::MultiPolygon(polygons) => {
                polygons.0.iter_mut().for_each(normalize_polygon_winding)
            }
            _ => {}
        }
    }

    Ok(())
}

fn normalize_polygon_winding(polygon: &mut geo::Polygon<f64>) {
    polygon.exterior_mut(make_clockwise);
    polygon.interiors_mut(|rings| rings.iter_mut().for_each(make_clockwise));
}

#[cfg(test)]
mod tests {
    use super::load_geo_jsons;
    use crate::feature::{is_clockwise, PropertyValue};
    use crate::mvt::Collections;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use geo::Geometry;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempdir::TempDir;

    fn write_gz(path: &Path, contents: &str) {
        let file = fs::File::create(path).unwrap();
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(contents.as_bytes()).unwrap();
        enc.finish().unwrap();
    }

    #[test]
    fn layer_names_mirror_the_directory_layout() {
        let dir = TempDir::new("terratile-geojson").unwrap();
        let roads = dir.path().join("roads");
        fs::create_dir_all(&roads).unwrap();

        write_gz(
            &roads.join("main_road.geojson.gz"),
            r#"[{"type":"Feature","geometry":{"type":"LineString","coordinates":[[0,0],[10,10]]},"properties":{}}]"#,
        );
        write_gz(
            &dir.path().join("forest.geojson.gz"),
            r#"[{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[0,5],[5,5],[5,0],[0,0]]]},"properties":{}}]"#,
        );

        let mut collections = Collections::new();
        load_geo_jsons(dir.path(), &mut collections).unwrap();

        assert!(collections.contains_key("roads/main_road"));
        assert!(collections.contains_key("forest"));
        assert_eq!(collections.get("roads/main_road").unwrap().len(), 1);
    }

    #[test]
    fn house_color_becomes_a_css_string() {
        let dir = TempDir::new("terratile-geojson").unwrap();

        write_gz(
            &dir.path().join("house.geojson.gz"),
            r#"[{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[4,0],[4,4],[0,4],[0,0]]]},"properties":{"color":[10,20,30]}}]"#,
        );

        let mut collections = Collections::new();
        load_geo_jsons(dir.path(), &mut collections).unwrap();

        let houses = collections.get("house").unwrap();
        assert_eq!(
            houses[0].properties.get("color"),
            Some(&PropertyValue::String("rgb(10, 20, 30)".to_string()))
        );

        match &houses[0].geometry {
            Geometry::Polygon(poly) => assert!(is_clockwise(poly.exterior())),
            _ => panic!("expected a polygon"),
        }
    }

    #[test]
    fn house_without_color_is_fatal() {
        let dir = TempDir::new("terratile-geojson").unwrap();

        write_gz(
            &dir.path().join("house.geojson.gz"),
            r#"[{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[4,0],[4,4],[0,0]]]},"properties":{}}]"#,
        );

        let mut collections = Collections::new();

        assert!(load_geo_jsons(dir.path(), &mut collections).is_err());
    }

    #[test]
    fn features_without_geometry_are_skipped() {
        let dir = TempDir::new("terratile-geojson").unwrap();

        write_gz(
            &dir.path().join("runway.geojson.gz"),
            r#"[{"type":"Feature","geometry":null,"properties":{}},{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]},"properties":{}}]"#,
        );

        let mut collections = Collections::new();
        load_geo_jsons(dir.path(), &mut collections).unwrap();

        assert_eq!(collections.get("runway").unwrap().len(), 1);
    }

    #[test]
    fn properties_survive_the_ingest() {
        let dir = TempDir::new("terratile-geojson").unwrap();

        write_gz(
            &dir.path().join("locations_namecity.geojson.gz"),
            r#"[{"type":"Feature","geometry":{"type":"Point","coordinates":[128,256]},"properties":{"name":"Harbor","angle":12.5}}]"#,
        );

        let mut collections = Collections::new();
        load_geo_jsons(dir.path(), &mut collections).unwrap();

        let layer = collections.get("locations_namecity").unwrap();
        assert_eq!(
            layer[0].properties.get("name"),
            Some(&PropertyValue::String("Harbor".to_string()))
        );
        assert_eq!(
            layer[0].properties.get("angle"),
            Some(&PropertyValue::Number(12.5))
        );
    }

    #[test]
    fn missing_geojson_directory_is_empty_not_fatal() {
        let dir = TempDir::new("terratile-geojson").unwrap();

        let mut collections = Collections::new();
        load_geo_jsons(&dir.path().join("geojson"), &mut collections).unwrap();

        assert!(collections.is_empty());
    }
}
