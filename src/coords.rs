use anyhow::bail;

/// Edge length of a tile in tile-local units.
pub const TILE_EXTENT: u64 = 256;

/// Smallest LOD whose tile grid covers the whole world at full resolution:
/// `ceil(log2(ceil(world_size / extent)))`.
pub fn calc_max_lod(world_size: f64) -> anyhow::Result<usize> {
    if world_size <= 0.0 {
        bail!("worldSize must be larger than 0");
    }

    let tiles_per_row = (world_size / TILE_EXTENT as f64).ceil().max(1.0);

    Ok(tiles_per_row.log2().ceil() as usize)
}

/// Scale factor from world units to pixel units at `max_lod`.
pub fn projection_factor(world_size: f64, max_lod: usize) -> anyhow::Result<f64> {
    if world_size <= 0.0 {
        bail!("worldSize must be larger than 0");
    }

    let pixels = (TILE_EXTENT << max_lod) as f64;

    Ok(pixels / world_size)
}

/// World plane to pixel space at `max_lod`. The world's Y axis points up,
/// pixel Y points down, so Y is flipped against the world size.
pub fn world_to_pixel(
    world_size: f64,
    max_lod: usize,
    (x, y): (f64, f64),
) -> anyhow::Result<(f64, f64)> {
    let factor = projection_factor(world_size, max_lod)?;

    Ok((x * factor, (world_size - y) * factor))
}

pub fn pixel_to_world(
    world_size: f64,
    max_lod: usize,
    (x, y): (f64, f64),
) -> anyhow::Result<(f64, f64)> {
    let factor = projection_factor(world_size, max_lod)?;

    Ok((x / factor, world_size - y / factor))
}
