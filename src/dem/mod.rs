mod marching_squares;
mod parser;
mod raster;

use anyhow::Context;
use flate2::bufread::GzDecoder;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

pub use marching_squares::marching_squares;
pub use parser::{parse, DemParserError};
pub use raster::{DemRaster, Origin};

/// Read and parse a gzipped ESRI ASCII grid.
pub fn load_dem(path: &Path) -> anyhow::Result<DemRaster> {
    let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;

    let buf = BufReader::new(file);
    let mut dec = GzDecoder::new(buf);
    let mut contents = String::new();

    dec.read_to_string(&mut contents)
        .with_context(|| format!("could not decompress {}", path.display()))?;

    let raster = parse(&contents).with_context(|| format!("malformed DEM {}", path.display()))?;

    Ok(raster)
}
