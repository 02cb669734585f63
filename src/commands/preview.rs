use std::path::Path;
use std::time::Instant;

use anyhow::bail;
use clap::{App, ArgMatches};
use image::io::Reader as ImageReader;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::commands::{in_out_paths, with_in_out_args, Command};
use crate::utils::encode_png;

const PREVIEW_SIZES: [u32; 4] = [128, 256, 512, 1024];

pub struct Preview;

impl Preview {
    pub fn exec(&self, input_path: &Path, output_path: &Path) -> anyhow::Result<()> {
        let start = Instant::now();

        if !output_path.is_dir() {
            bail!("Output path is not a directory");
        }

        let preview_path = input_path.join("preview.png");
        if !preview_path.is_file() {
            bail!("Couldn't find preview.png");
        }

        let now = Instant::now();
        println!("▶️  Loading preview image");
        let img = ImageReader::open(preview_path)?.decode()?;
        println!("✔️  Loaded preview image in {}ms", now.elapsed().as_millis());

        let now = Instant::now();
        println!("▶️  Writing original preview image to output");
        if let Err(err) = encode_png(&output_path.join("preview.png"), &img) {
            println!("❌  Failed to write original preview image");
            println!("{}", err);
        } else {
            println!(
                "✔️  Wrote original preview image in {}ms",
                now.elapsed().as_millis()
            );
        }

        PREVIEW_SIZES.par_iter().for_each(|size| {
            let now = Instant::now();
            println!("▶️  Building x{} image", size);

            let thumb = img.thumbnail(*size, *size);
            let thumb_path = output_path.join(format!("preview_{}.png", size));

            if let Err(err) = encode_png(&thumb_path, &thumb) {
                println!("❌  Build of x{} failed", size);
                println!("{}", err);
            } else {
                println!("✔️  Built x{} in {}ms", size, now.elapsed().as_millis());
            }
        });

        println!("\n    🎉  Finished in {}ms", start.elapsed().as_millis());

        Ok(())
    }
}

impl Command for Preview {
    fn register(&self) -> App<'static> {
        with_in_out_args(App::new("preview").about("Build resolutions for the preview image."))
    }

    fn run(&self, args: &ArgMatches) -> anyhow::Result<()> {
        let (input_path, output_path) = in_out_paths(args);

        self.exec(&input_path, &output_path)
    }
}
