use std::path::Path;
use std::time::Instant;

use anyhow::bail;
use clap::{App, ArgMatches};
use image::{imageops::replace, io::Reader as ImageReader, DynamicImage, GenericImageView};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::commands::{in_out_paths, with_in_out_args, Command};
use crate::coords::calc_max_lod;
use crate::metajson::{MetaJsonParser, SerdeMetaJsonParser};
use crate::utils::{build_tile_set, TileError};
use crate::validate;

pub struct Sat;

impl Sat {
    pub fn exec(&self, input_path: &Path, output_path: &Path) -> anyhow::Result<()> {
        let start = Instant::now();

        if !output_path.is_dir() {
            bail!("Output path is not a directory");
        }

        validate::map_directory(input_path)?;
        println!("✔️  Validated input directory structure");

        println!("▶️  Loading meta.json");
        let meta = SerdeMetaJsonParser.parse(&input_path.join("meta.json"))?;
        println!("✔️  Loaded meta.json");

        let now = Instant::now();
        println!("▶️  Combining satellite image");
        let combined = load_combined_sat_image(input_path)?;
        println!(
            "✔️  Combined satellite image in {}ms",
            now.elapsed().as_millis()
        );

        let max_lod = calc_max_lod(meta.world_size)?;
        println!("ℹ️  Calculated max lod: {}", max_lod);

        let now = Instant::now();
        println!("▶️  Building tiles");
        for lod in 0..=max_lod {
            let lod_timer = Instant::now();
            build_tile_set(output_path, &combined, lod)?;
            println!(
                "    ✔️  Finished tiles for LOD {} in {}ms",
                lod,
                lod_timer.elapsed().as_millis()
            );
        }
        println!(
            "✔️  Built satellite tiles in {}ms",
            now.elapsed().as_millis()
        );

        let now = Instant::now();
        println!("▶️  Creating tile.json");
        crate::tilejson::write(output_path, max_lod, &meta, "Satellite", &[])?;
        println!("✔️  Created tile.json in {}ms", now.elapsed().as_millis());

        println!("\n    🎉  Finished in {}ms", start.elapsed().as_millis());

        Ok(())
    }
}

impl Command for Sat {
    fn register(&self) -> App<'static> {
        with_in_out_args(App::new("sat").about("Build satellite tiles from a map export."))
    }

    fn run(&self, args: &ArgMatches) -> anyhow::Result<()> {
        let (input_path, output_path) = in_out_paths(args);

        self.exec(&input_path, &output_path)
    }
}

/// Stitches the 4x4 mosaic below `<in>/sat` into one image. Column widths
/// and row heights adapt to the largest tile of each column / row.
fn load_combined_sat_image(input_path: &Path) -> anyhow::Result<DynamicImage> {
    let sat_path = input_path.join("sat");

    let now = Instant::now();

    let results: Vec<Result<DynamicImage, TileError>> = (0..16_u32)
        .into_par_iter()
        .map(|index| {
            let col = index / 4;
            let row = index % 4;

            let img_path = sat_path.join(col.to_string()).join(format!("{}.png", row));

            ImageReader::open(img_path)
                .map_err(|e| TileError::new(col, row, e))?
                .decode()
                .map_err(|e| TileError::new(col, row, e))
        })
        .collect();

    let (ok_results, err_results): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);

    if !err_results.is_empty() {
        let errors: Vec<String> = err_results
            .into_iter()
            .filter_map(|r| r.err().map(|e| format!("\t{}", e)))
            .collect();

        bail!("Failed to load (multiple) tile(s):\n{}", errors.join("\n"));
    }

    let images: Vec<DynamicImage> = ok_results.into_iter().flatten().collect();
    println!("    ✔️  Loaded tiles in {}ms", now.elapsed().as_millis());

    let mut widths = [0_u32; 4];
    let mut heights = [0_u32; 4];
    for col in 0..4 {
        for row in 0..4 {
            let (w, h) = images[col * 4 + row].dimensions();

            if widths[col] < w {
                widths[col] = w;
            }
            if heights[row] < h {
                heights[row] = h;
            }
        }
    }

    let combined_width: u32 = widths.iter().sum();
    let combined_height: u32 = heights.iter().sum();

    let mut combined = DynamicImage::new_rgba8(combined_width, combined_height);

    let now = Instant::now();
    for col in 0..4 {
        for row in 0..4 {
            let img = &images[col * 4 + row];
            let x = widths.iter().take(col).sum();
            let y = heights.iter().take(row).sum();

            replace(&mut combined, img, x, y);
        }
    }
    println!("    ✔️  Combined tiles in {}ms", now.elapsed().as_millis());

    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::Sat;
    use crate::test::with_input_and_output_paths;

    #[test]
    fn bails_on_empty_input_dir() {
        with_input_and_output_paths(|input_path, output_path| {
            assert!(Sat.exec(&input_path, &output_path).is_err());
        });
    }
}
