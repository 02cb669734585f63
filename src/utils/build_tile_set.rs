use std::{fs::create_dir_all, path::Path};

use image::{imageops, DynamicImage, GenericImageView, Rgba};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use super::{encode_png, TILE_SIZE_IN_PX};

/// Cuts `img` into the `2^lod` by `2^lod` tile grid of one LOD and writes
/// each tile as a 256px PNG below `set_base_path/<lod>/<col>/<row>.png`.
///
/// A failed tile is logged and skipped, its siblings still get written.
pub fn build_tile_set(set_base_path: &Path, img: &DynamicImage, lod: usize) -> anyhow::Result<()> {
    let tiles_per_row_col = 2_u32.pow(lod as u32);

    for col in 0..tiles_per_row_col {
        let dir_path = set_base_path.join(lod.to_string()).join(col.to_string());
        create_dir_all(dir_path)?;
    }

    let (width, height) = img.dimensions();

    let tile_width = width / tiles_per_row_col;
    let tile_height = height / tiles_per_row_col;

    let width_remainder = width % tiles_per_row_col;
    let height_remainder = height % tiles_per_row_col;

    (0..tiles_per_row_col * tiles_per_row_col)
        .into_par_iter()
        .for_each(|index| {
            let col = index / tiles_per_row_col;
            let row = index % tiles_per_row_col;
            let x = tile_width * col;
            let y = tile_height * row;
            let mut w = tile_width;
            let mut h = tile_height;

            // distribute remaining pixels over the first rows / cols
            if width_remainder > col + 1 {
                w += 1;
            }
            if height_remainder > row + 1 {
                h += 1;
            }

            let sub = img.view(x, y, w, h);
            let resized = resize(&sub);

            let file_path = set_base_path
                .join(lod.to_string())
                .join(col.to_string())
                .join(format!("{}.png", row));

            if let Err(err) = encode_png(&file_path, &resized) {
                println!("❌  Tile {}/{}/{}: {}", lod, col, row, err);
            }
        });

    Ok(())
}

fn resize<I: GenericImageView<Pixel = Rgba<u8>>>(image: &I) -> DynamicImage {
    let buffer = imageops::resize(
        image,
        TILE_SIZE_IN_PX,
        TILE_SIZE_IN_PX,
        image::imageops::FilterType::Triangle,
    );

    DynamicImage::ImageRgba8(buffer)
}

#[cfg(test)]
mod tests {
    use super::build_tile_set;
    use image::{DynamicImage, GenericImageView};
    use tempdir::TempDir;

    #[test]
    fn lod_zero_is_a_single_tile() {
        let dir = TempDir::new("terratile-tileset").unwrap();
        let img = DynamicImage::new_rgba8(512, 512);

        build_tile_set(dir.path(), &img, 0).unwrap();

        let tile = dir.path().join("0").join("0").join("0.png");
        let tile_img = image::open(tile).unwrap();
        assert_eq!(tile_img.width(), 256);
        assert_eq!(tile_img.height(), 256);
    }

    #[test]
    fn lod_two_writes_a_four_by_four_grid() {
        let dir = TempDir::new("terratile-tileset").unwrap();
        let img = DynamicImage::new_rgba8(64, 64);

        build_tile_set(dir.path(), &img, 2).unwrap();

        for col in 0..4 {
            for row in 0..4 {
                let tile = dir
                    .path()
                    .join("2")
                    .join(col.to_string())
                    .join(format!("{}.png", row));
                assert!(tile.is_file(), "missing {}", tile.display());
            }
        }
    }
}
