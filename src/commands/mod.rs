mod mvt;
mod preview;
mod sat;
mod terrain_rgb;

use std::path::PathBuf;

use clap::{arg, App, ArgMatches};

pub use self::mvt::MapboxVectorTiles;
pub use preview::Preview;
pub use sat::Sat;
pub use terrain_rgb::TerrainRgb;

/// One sub-command of the binary.
pub trait Command {
    fn register(&self) -> App<'static>;
    fn run(&self, args: &ArgMatches) -> anyhow::Result<()>;
}

pub(crate) fn with_in_out_args(app: App<'static>) -> App<'static> {
    app.arg(arg!(-i --input <INPUT_DIR> "Path to the map export directory"))
        .arg(arg!(-o --output <OUTPUT_DIR> "Path to the output directory"))
}

pub(crate) fn in_out_paths(args: &ArgMatches) -> (PathBuf, PathBuf) {
    // both args are registered as required, clap enforces their presence
    let input = PathBuf::from(args.value_of("input").unwrap());
    let output = PathBuf::from(args.value_of("output").unwrap());

    (input, output)
}
