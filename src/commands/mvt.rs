use std::path::Path;
use std::time::Instant;

use anyhow::bail;
use clap::{arg, App, ArgMatches};

use crate::commands::{in_out_paths, with_in_out_args, Command};
use crate::coords::calc_max_lod;
use crate::dem::load_dem;
use crate::metajson::MetaJsonParser;
use crate::mvt::{
    build_contours, build_mounts, build_vector_tiles, load_geo_jsons, load_layer_settings,
    Collections,
};
use crate::validate;

pub struct MapboxVectorTiles {
    meta_json: Box<dyn MetaJsonParser>,
}

impl MapboxVectorTiles {
    pub fn new(meta_json: Box<dyn MetaJsonParser>) -> Self {
        MapboxVectorTiles { meta_json }
    }

    pub fn exec(
        &self,
        input_path: &Path,
        output_path: &Path,
        layer_settings_path: Option<&Path>,
    ) -> anyhow::Result<()> {
        let start = Instant::now();

        if !output_path.is_dir() {
            bail!("Output path is not a directory");
        }

        validate::map_directory(input_path)?;
        println!("✔️  Validated input directory structure");

        println!("▶️  Loading meta.json");
        let meta = self.meta_json.parse(&input_path.join("meta.json"))?;
        if meta.world_size <= 0.0 {
            bail!("worldSize must be larger than 0");
        }
        println!("✔️  Loaded meta.json");

        let now = Instant::now();
        println!("▶️  Loading layer settings");
        let layer_settings = load_layer_settings(layer_settings_path)?;
        println!("✔️  Loaded layer settings in {}ms", now.elapsed().as_millis());

        let now = Instant::now();
        println!("▶️  Loading DEM");
        let dem_path = input_path.join("dem.asc.gz");
        if !dem_path.is_file() {
            bail!("Couldn't find dem.asc.gz");
        }
        let dem = load_dem(&dem_path)?;
        println!("✔️  Loaded DEM in {}ms", now.elapsed().as_millis());

        let mut collections = Collections::new();

        let now = Instant::now();
        println!("▶️  Building contour lines");
        build_contours(&dem, meta.elevation_offset, meta.world_size, &mut collections)?;
        println!("✔️  Built contour lines in {}ms", now.elapsed().as_millis());

        let now = Instant::now();
        println!("▶️  Building mounts");
        build_mounts(&dem, meta.elevation_offset, &mut collections)?;
        println!("✔️  Built mounts in {}ms", now.elapsed().as_millis());

        let now = Instant::now();
        println!("▶️  Loading GeoJSONs");
        load_geo_jsons(&input_path.join("geojson"), &mut collections)?;
        println!(
            "✔️  Loaded layers from geojsons in {}ms",
            now.elapsed().as_millis()
        );

        let layer_names = collections.public_layer_names();
        println!(
            "ℹ️  Loaded the following layers ({}): {}",
            layer_names.len(),
            layer_names.join(", ")
        );

        let max_lod = calc_max_lod(meta.world_size)?;
        println!("ℹ️  Calculated max lod: {}", max_lod);

        let now = Instant::now();
        println!("▶️  Building vector tiles");
        build_vector_tiles(
            output_path,
            collections,
            max_lod,
            meta.world_size,
            &layer_settings,
        )?;
        println!("✔️  Built vector tiles in {}ms", now.elapsed().as_millis());

        let now = Instant::now();
        println!("▶️  Creating tile.json");
        crate::tilejson::write(output_path, max_lod, &meta, "Vector", &layer_names)?;
        println!("✔️  Created tile.json in {}ms", now.elapsed().as_millis());

        println!("\n    🎉  Finished in {}ms", start.elapsed().as_millis());

        Ok(())
    }
}

impl Command for MapboxVectorTiles {
    fn register(&self) -> App<'static> {
        with_in_out_args(App::new("mvt").about("Build vector tiles from a map export."))
            .arg(arg!(-l --layer_settings <FILE> "Path to a layer settings file").required(false))
    }

    fn run(&self, args: &ArgMatches) -> anyhow::Result<()> {
        let (input_path, output_path) = in_out_paths(args);
        let layer_settings_path = args.value_of("layer_settings").map(Path::new);

        self.exec(&input_path, &output_path, layer_settings_path)
    }
}
