mod build_tile_set;
mod tile_error;

use anyhow::Context;
use image::{codecs::png::PngEncoder, DynamicImage, GenericImageView};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub use build_tile_set::build_tile_set;
pub use tile_error::TileError;

pub const TILE_SIZE_IN_PX: u32 = 256;

pub fn encode_png(file_path: &Path, img: &DynamicImage) -> anyhow::Result<()> {
    let file = File::create(file_path)
        .with_context(|| format!("could not create {}", file_path.display()))?;
    let buf = BufWriter::new(file);
    let encoder = PngEncoder::new(buf);

    let (width, height) = img.dimensions();
    encoder
        .encode(&img.to_bytes(), width, height, img.color())
        .with_context(|| format!("could not encode {}", file_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::encode_png;
    use image::{DynamicImage, GenericImageView};
    use tempdir::TempDir;

    #[test]
    fn encode_png_writes_a_decodable_file() {
        let dir = TempDir::new("terratile-utils").unwrap();
        let path = dir.path().join("img.png");
        let img = DynamicImage::new_rgba8(4, 4);

        encode_png(&path, &img).unwrap();

        let read_back = image::open(&path).unwrap();
        assert_eq!(read_back.width(), 4);
        assert_eq!(read_back.height(), 4);
    }
}
