use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct Grid {
    pub format: String,
    pub format_x: String,
    pub format_y: String,
    pub step_x: f64,
    pub step_y: f64,
    pub zoom_max: f64,
}

/// The world export's `meta.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct MetaJson {
    pub author: String,
    pub display_name: String,
    pub elevation_offset: f64,
    pub grid_offset_x: f64,
    pub grid_offset_y: f64,
    #[serde(default)]
    pub grids: Vec<Grid>,
    pub latitude: f64,
    pub longitude: f64,
    pub version: f64,
    pub world_name: String,
    /// side length of the world plane; must be positive
    pub world_size: f64,
}

pub trait MetaJsonParser {
    fn parse(&self, path: &Path) -> anyhow::Result<MetaJson>;
}

pub struct SerdeMetaJsonParser;

impl MetaJsonParser for SerdeMetaJsonParser {
    fn parse(&self, path: &Path) -> anyhow::Result<MetaJson> {
        if !path.is_file() {
            bail!("couldn't find {}", path.display());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let meta: MetaJson = serde_json::from_reader(reader)
            .with_context(|| format!("malformed {}", path.display()))?;

        Ok(meta)
    }
}

/// Test double that hands out a fixed meta.json or fails.
pub struct DummyMetaJsonParser {
    pub succeeds: bool,
    pub world_size: f64,
}

impl MetaJsonParser for DummyMetaJsonParser {
    fn parse(&self, _: &Path) -> anyhow::Result<MetaJson> {
        if !self.succeeds {
            bail!("dummy error");
        }

        Ok(MetaJson {
            author: "author".to_string(),
            display_name: "display_name".to_string(),
            elevation_offset: 0.0,
            grid_offset_x: 0.0,
            grid_offset_y: 0.0,
            grids: vec![],
            latitude: 0.0,
            longitude: 0.0,
            version: 0.1,
            world_name: "world_name".to_string(),
            world_size: self.world_size,
        })
    }
}
