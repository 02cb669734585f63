use std::path::Path;
use std::time::Instant;

use anyhow::bail;
use clap::{App, ArgMatches};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::commands::{in_out_paths, with_in_out_args, Command};
use crate::coords::calc_max_lod;
use crate::dem::{load_dem, DemRaster};
use crate::metajson::{MetaJsonParser, SerdeMetaJsonParser};
use crate::utils::build_tile_set;

pub struct TerrainRgb;

impl TerrainRgb {
    pub fn exec(&self, input_path: &Path, output_path: &Path) -> anyhow::Result<()> {
        let start = Instant::now();

        if !output_path.is_dir() {
            bail!("Output path is not a directory");
        }

        println!("▶️  Loading meta.json");
        let meta = SerdeMetaJsonParser.parse(&input_path.join("meta.json"))?;
        println!("✔️  Loaded meta.json");

        let now = Instant::now();
        println!("▶️  Loading DEM");
        let dem_path = input_path.join("dem.asc.gz");
        if !dem_path.is_file() {
            bail!("Couldn't find dem.asc.gz");
        }
        let dem = load_dem(&dem_path)?;
        println!("✔️  Loaded DEM in {}ms", now.elapsed().as_millis());

        let now = Instant::now();
        println!("▶️  Calculating image from DEM");
        let img = calculate_image(&dem, meta.elevation_offset);
        println!("✔️  Calculated image in {}ms", now.elapsed().as_millis());

        let max_lod = calc_max_lod(meta.world_size)?;
        println!("ℹ️  Calculated max lod: {}", max_lod);

        let now = Instant::now();
        println!("▶️  Building tiles");
        for lod in 0..=max_lod {
            let lod_timer = Instant::now();
            build_tile_set(output_path, &img, lod)?;
            println!(
                "    ✔️  Finished tiles for LOD {} in {}ms",
                lod,
                lod_timer.elapsed().as_millis()
            );
        }
        println!(
            "✔️  Built Terrain-RGB tiles in {}ms",
            now.elapsed().as_millis()
        );

        let now = Instant::now();
        println!("▶️  Creating tile.json");
        crate::tilejson::write(output_path, max_lod, &meta, "Terrain-RGB", &[])?;
        println!("✔️  Created tile.json in {}ms", now.elapsed().as_millis());

        println!("\n    🎉  Finished in {}ms", start.elapsed().as_millis());

        Ok(())
    }
}

impl Command for TerrainRgb {
    fn register(&self) -> App<'static> {
        with_in_out_args(App::new("terrainrgb").about("Build Terrain-RGB tiles from a map export."))
    }

    fn run(&self, args: &ArgMatches) -> anyhow::Result<()> {
        let (input_path, output_path) = in_out_paths(args);

        self.exec(&input_path, &output_path)
    }
}

fn calculate_image(dem: &DemRaster, elevation_offset: f64) -> DynamicImage {
    let (width, height) = dem.dimensions();
    let mut buffer = RgbaImage::new(width as u32, height as u32);

    for x in 0..width {
        for y in 0..height {
            let elevation = dem.z(x, y) + elevation_offset;
            buffer.put_pixel(x as u32, y as u32, elevation_to_rgb(elevation));
        }
    }

    DynamicImage::ImageRgba8(buffer)
}

/*
    Terrain-RGB tiles decode elevation from the color channels:

    height = -10000 + ((R * 256 * 256 + G * 256 + B) * 0.1)

    Substituting x for (R * 256 * 256 + G * 256 + B) and solving for x gives

    x = 10 * height + 100000

    which just needs to be written down in base 256: position 2 is r,
    position 1 is g and position 0 is b.
*/
const MAX_X: i64 = 256_i64 * 256 * 256 - 1;

fn elevation_to_rgb(elevation: f64) -> Rgba<u8> {
    // truncation applies to the full sum, never to the product alone
    let mut x = ((10.0 * elevation + 100000.0) as i64) % MAX_X;

    let b = (x % 256) as u8;
    x /= 256;

    let g = (x % 256) as u8;
    x /= 256;

    let r = (x % 256) as u8;

    Rgba([r, g, b, 255])
}
