use serde::Serialize;

use crate::metajson::MetaJson;
use serde_json::to_string_pretty;
use std::io::Write;
use std::{collections::HashMap, fs::File, path::Path};

#[derive(Debug, Serialize)]
pub struct TileJsonLayer {
    pub id: String,
    pub fields: HashMap<String, String>,
}

/// https://github.com/mapbox/tilejson-spec
#[derive(Debug, Serialize)]
pub struct TileJson {
    pub tilejson: String,
    pub name: String,
    pub description: String,
    pub scheme: String,
    pub minzoom: usize,
    pub maxzoom: usize,
    pub vector_layers: Vec<TileJsonLayer>,
}

pub fn write(
    dir: &Path,
    max_lod: usize,
    meta: &MetaJson,
    type_display_name: &str,
    vector_layer_names: &[String],
) -> anyhow::Result<()> {
    let vector_layers: Vec<TileJsonLayer> = vector_layer_names
        .iter()
        .map(|name| TileJsonLayer {
            id: name.clone(),
            fields: layer_fields(name),
        })
        .collect();

    let tile_json = TileJson {
        tilejson: String::from("2.2.0"),
        name: format!("{} {} Tiles", meta.display_name, type_display_name),
        description: format!(
            "{} Tiles of the map '{}' from {}",
            type_display_name, meta.display_name, meta.author
        ),
        scheme: String::from("xyz"),
        minzoom: 0,
        maxzoom: max_lod,
        vector_layers,
    };

    let mut file = File::create(dir.join("tile.json"))?;
    let json = to_string_pretty(&tile_json)?;

    file.write_all(json.as_bytes())?;

    Ok(())
}

fn layer_fields(layer_name: &str) -> HashMap<String, String> {
    if layer_name == "house" {
        return [
            ("color", "House color as a CSS rgb() string."),
            ("height", "Bounding box height in meters"),
            ("position", "Array of three floats [x, y, z]"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    }

    if layer_name == "mount" {
        return [
            ("elevation", "Elevation as float"),
            ("text", "Rounded elevation as a string"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    }

    if layer_name.starts_with("contours/") {
        return [
            (
                "elevation",
                "Corrected elevation of contour. (Includes elevationOffset)",
            ),
            ("dem_elevation", "DEM elevation of contour."),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    }

    if layer_name.starts_with("locations/") {
        return [
            ("name", "Corresponds to name value in map config."),
            ("radiusA", "Corresponds to radiusA value in map config."),
            ("radiusB", "Corresponds to radiusB value in map config."),
            ("angle", "Corresponds to angle value in map config."),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    }

    HashMap::new()
}

#[cfg(test)]
mod tests {
    use crate::metajson::{DummyMetaJsonParser, MetaJsonParser};
    use crate::tilejson::write;
    use std::fs::read_to_string;
    use std::path::Path;
    use tempdir::TempDir;

    #[test]
    fn tile_json_gets_written_correctly() {
        let dir = TempDir::new("terratile-tilejson").unwrap();
        let meta = DummyMetaJsonParser {
            succeeds: true,
            world_size: 2048.0,
        }
        .parse(Path::new("unused"))
        .unwrap();

        let layers = vec!["water".to_string(), "mount".to_string()];
        write(dir.path(), 5, &meta, "Vector", &layers).unwrap();

        let written = read_to_string(dir.path().join("tile.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();

        assert_eq!(parsed["tilejson"], "2.2.0");
        assert_eq!(parsed["scheme"], "xyz");
        assert_eq!(parsed["minzoom"], 0);
        assert_eq!(parsed["maxzoom"], 5);
        assert_eq!(parsed["vector_layers"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["vector_layers"][1]["id"], "mount");
        assert!(parsed["vector_layers"][1]["fields"]["elevation"].is_string());
    }

    #[test]
    fn raster_tile_json_has_empty_vector_layers() {
        let dir = TempDir::new("terratile-tilejson").unwrap();
        let meta = DummyMetaJsonParser {
            succeeds: true,
            world_size: 2048.0,
        }
        .parse(Path::new("unused"))
        .unwrap();

        write(dir.path(), 3, &meta, "Satellite", &[]).unwrap();

        let written = read_to_string(dir.path().join("tile.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();

        assert_eq!(parsed["vector_layers"].as_array().unwrap().len(), 0);
        assert!(written.contains("Satellite Tiles"));
    }
}
