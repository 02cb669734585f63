use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::mvt::Collections;

/// Zoom bounds for one layer. Missing bounds leave the layer unbounded in
/// that direction.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerSetting {
    pub layer: String,
    pub minzoom: Option<usize>,
    pub maxzoom: Option<usize>,
}

const DEFAULT_LAYER_SETTINGS: &str = r#"
[
    { "layer": "debug", "minzoom": 6 },
    { "layer": "locations/hill", "minzoom": 0 },
    { "layer": "locations/vegetationbroadleaf", "minzoom": 0 },
    { "layer": "locations/vegetationvineyard", "minzoom": 0 },
    { "layer": "locations/viewpoint", "minzoom": 0 },
    { "layer": "locations/namecity", "minzoom": 0 },
    { "layer": "locations/namecitycapital", "minzoom": 0 },
    { "layer": "locations/namevillage", "minzoom": 0 },
    { "layer": "locations/namelocal", "minzoom": 0 },
    { "layer": "locations/namemarine", "minzoom": 0 },
    { "layer": "locations/airport", "minzoom": 0 },
    { "layer": "bunker", "minzoom": 0 },
    { "layer": "chapel", "minzoom": 4 },
    { "layer": "church", "minzoom": 4 },
    { "layer": "cross", "minzoom": 4 },
    { "layer": "fuelstation", "minzoom": 4 },
    { "layer": "lighthouse", "minzoom": 4 },
    { "layer": "rock", "minzoom": 5 },
    { "layer": "shipwreck", "minzoom": 4 },
    { "layer": "transmitter", "minzoom": 4 },
    { "layer": "tree", "minzoom": 6 },
    { "layer": "bush", "minzoom": 8 },
    { "layer": "watertower", "minzoom": 4 },
    { "layer": "fortress", "minzoom": 4 },
    { "layer": "fountain", "minzoom": 4 },
    { "layer": "quay", "minzoom": 4 },
    { "layer": "hospital", "minzoom": 4 },
    { "layer": "busstop", "minzoom": 4 },
    { "layer": "stack", "minzoom": 4 },
    { "layer": "ruin", "minzoom": 4 },
    { "layer": "tourism", "minzoom": 4 },
    { "layer": "powersolar", "minzoom": 4 },
    { "layer": "powerwave", "minzoom": 4 },
    { "layer": "powerwind", "minzoom": 4 },
    { "layer": "view-tower", "minzoom": 4 },
    { "layer": "runway", "minzoom": 0 },
    { "layer": "powerline", "minzoom": 4 },
    { "layer": "railway", "minzoom": 4 },
    { "layer": "house", "minzoom": 2 },
    { "layer": "roads/main_road", "minzoom": 3 },
    { "layer": "roads/main_road-bridge", "minzoom": 3 },
    { "layer": "roads/road", "minzoom": 3 },
    { "layer": "roads/road-bridge", "minzoom": 3 },
    { "layer": "roads/track", "minzoom": 3 },
    { "layer": "roads/track-bridge", "minzoom": 3 },
    { "layer": "roads/trail", "minzoom": 4 },
    { "layer": "roads/trail-bridge", "minzoom": 4 },
    { "layer": "water", "minzoom": 0 },
    { "layer": "forest", "minzoom": 3 },
    { "layer": "rocks", "minzoom": 3 },
    { "layer": "mount", "minzoom": 2 },
    { "layer": "contours/01", "minzoom": 8 },
    { "layer": "contours/05", "minzoom": 7, "maxzoom": 7 },
    { "layer": "contours/10", "minzoom": 5, "maxzoom": 6 },
    { "layer": "contours/50", "minzoom": 3, "maxzoom": 4 },
    { "layer": "contours/100", "minzoom": 0, "maxzoom": 2 }
]"#;

/// Parses the zoom policy, either from the given file or from the built-in
/// default policy.
pub fn load_layer_settings(path: Option<&Path>) -> anyhow::Result<Vec<LayerSetting>> {
    let contents = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?,
        None => DEFAULT_LAYER_SETTINGS.to_string(),
    };

    let settings: Vec<LayerSetting> =
        serde_json::from_str(&contents).context("malformed layer settings")?;

    Ok(settings)
}

/// Names of the layers to emit at `lod`. The internal `contours` layer is
/// never emitted; a layer's minzoom is clamped to the map's max LOD so high
/// thresholds don't drop the layer from small maps entirely.
pub fn find_lod_layers(
    all_layers: &Collections,
    settings: &[LayerSetting],
    lod: usize,
    max_lod: usize,
) -> Vec<String> {
    let mut names: Vec<String> = all_layers
        .keys()
        .filter(|name| name.as_str() != "contours")
        .filter(|name| {
            let (min_zoom, max_zoom) = match settings.iter().find(|s| &s.layer == *name) {
                Some(setting) => (
                    setting.minzoom.unwrap_or(0),
                    setting.maxzoom.unwrap_or(usize::MAX),
                ),
                None => (0, usize::MAX),
            };

            let min_zoom = min_zoom.min(max_lod);

            lod >= min_zoom && lod <= max_zoom
        })
        .cloned()
        .collect();

    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::{find_lod_layers, load_layer_settings};
    use crate::feature::FeatureCollection;
    use crate::mvt::Collections;
    use std::fs;
    use tempdir::TempDir;

    fn collections_with_layers(layer_names: &[&str]) -> Collections {
        let mut collections = Collections::new();
        for name in layer_names {
            collections.insert(name.to_string(), FeatureCollection::new());
        }
        collections
    }

    #[test]
    fn default_settings_parse() {
        let settings = load_layer_settings(None).unwrap();

        assert!(settings.iter().any(|s| s.layer == "water"));
        let contours_05 = settings
            .iter()
            .find(|s| s.layer == "contours/05")
            .unwrap();
        assert_eq!(contours_05.minzoom, Some(7));
        assert_eq!(contours_05.maxzoom, Some(7));
    }

    #[test]
    fn settings_file_overrides_the_default_policy() {
        let dir = TempDir::new("terratile-settings").unwrap();
        let path = dir.path().join("layer_settings.json");
        fs::write(&path, r#"[{ "layer": "water", "minzoom": 2, "maxzoom": 3 }]"#).unwrap();

        let settings = load_layer_settings(Some(&path)).unwrap();

        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].minzoom, Some(2));
    }

    #[test]
    fn malformed_settings_file_is_an_error() {
        let dir = TempDir::new("terratile-settings").unwrap();
        let path = dir.path().join("layer_settings.json");
        fs::write(&path, "{").unwrap();

        assert!(load_layer_settings(Some(&path)).is_err());
    }

    #[test]
    fn contours_layer_is_never_emitted() {
        let collections = collections_with_layers(&["contours"]);
        let settings = load_layer_settings(None).unwrap();

        assert!(find_lod_layers(&collections, &settings, 1, 8).is_empty());
    }

    #[test]
    fn layers_without_settings_are_always_included() {
        let collections = collections_with_layers(&["custom/thing"]);
        let settings = load_layer_settings(None).unwrap();

        for lod in 0..=8 {
            assert_eq!(
                find_lod_layers(&collections, &settings, lod, 8),
                vec!["custom/thing".to_string()]
            );
        }
    }

    #[test]
    fn contour_interval_ladder_follows_the_policy() {
        let collections =
            collections_with_layers(&["contours/50", "contours/100", "contours/10"]);
        let settings = load_layer_settings(None).unwrap();

        assert_eq!(
            find_lod_layers(&collections, &settings, 2, 8),
            vec!["contours/100".to_string()]
        );
        assert_eq!(
            find_lod_layers(&collections, &settings, 3, 8),
            vec!["contours/50".to_string()]
        );
        assert_eq!(
            find_lod_layers(&collections, &settings, 5, 8),
            vec!["contours/10".to_string()]
        );
    }

    #[test]
    fn min_zoom_is_clamped_to_max_lod() {
        // contours/01 wants minzoom 8, but a tiny map only reaches LOD 2
        let collections = collections_with_layers(&["contours/01"]);
        let settings = load_layer_settings(None).unwrap();

        assert_eq!(
            find_lod_layers(&collections, &settings, 2, 2),
            vec!["contours/01".to_string()]
        );
        assert!(find_lod_layers(&collections, &settings, 1, 2).is_empty());
    }

    #[test]
    fn max_zoom_caps_the_layer() {
        let collections = collections_with_layers(&["contours/100"]);
        let settings = load_layer_settings(None).unwrap();

        assert!(find_lod_layers(&collections, &settings, 3, 8).is_empty());
    }
}
