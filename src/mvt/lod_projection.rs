use geo::map_coords::MapCoordsInplace;

use crate::coords;
use crate::mvt::Collections;

/// Owns the registry while it walks down the LOD ladder.
///
/// Construction projects every layer from world coordinates into pixel space
/// at the maximum LOD; each `decrease_lod` halves all coordinates in place,
/// so the geometry entering a LOD is always the (already simplified) geometry
/// of the LOD above it.
pub struct LodProjection {
    collections: Collections,
    max_lod: usize,
    current_lod: usize,
}

impl LodProjection {
    pub fn new(
        mut collections: Collections,
        world_size: f64,
        max_lod: usize,
    ) -> anyhow::Result<Self> {
        let factor = coords::projection_factor(world_size, max_lod)?;

        collections.map_coords_inplace(|&(x, y)| (x * factor, (world_size - y) * factor));

        Ok(LodProjection {
            collections,
            max_lod,
            current_lod: max_lod,
        })
    }

    pub fn lod(&self) -> usize {
        self.current_lod
    }

    pub fn is_max_lod(&self) -> bool {
        self.current_lod == self.max_lod
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn collections_mut(&mut self) -> &mut Collections {
        &mut self.collections
    }

    /// Halves every coordinate and steps one LOD down. Errors once LOD 0 has
    /// been passed, which ends the assembler's loop.
    pub fn decrease_lod(&mut self) -> anyhow::Result<usize> {
        self.collections
            .map_coords_inplace(|&(x, y)| (x / 2.0, y / 2.0));

        self.current_lod = self
            .current_lod
            .checked_sub(1)
            .ok_or_else(|| anyhow::Error::msg("lod zero reached"))?;

        Ok(self.current_lod)
    }
}
