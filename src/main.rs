use std::collections::HashMap;

use clap::{app_from_crate, AppSettings};

use commands::Command;
use metajson::SerdeMetaJsonParser;

mod commands;
mod coords;
mod dem;
mod feature;
mod metajson;
mod mvt;
#[cfg(test)]
mod test;
mod tilejson;
mod utils;
mod validate;

fn main() {
    let args: Vec<_> = std::env::args().collect();

    if let Err(e) = execute(&args) {
        println!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn execute(input: &[String]) -> anyhow::Result<()> {
    let mut app = app_from_crate!()
        .global_setting(AppSettings::PropagateVersion)
        .global_setting(AppSettings::UseLongFormatForHelpSubcommand)
        .setting(AppSettings::SubcommandRequiredElseHelp);

    let sat = commands::Sat;
    let terrain_rgb = commands::TerrainRgb;
    let mvt_command = commands::MapboxVectorTiles::new(Box::new(SerdeMetaJsonParser));
    let preview = commands::Preview;

    let commands: Vec<&dyn Command> = vec![&sat, &terrain_rgb, &mvt_command, &preview];

    let mut commands_by_name: HashMap<String, &dyn Command> = HashMap::new();
    for command in &commands {
        let sub = command.register();
        commands_by_name.insert(sub.get_name().to_owned(), *command);
        app = app.subcommand(sub);
    }

    let matches = app.get_matches_from(input);

    match matches.subcommand() {
        Some((name, sub_matches)) => match commands_by_name.get(name) {
            Some(command) => command.run(sub_matches),
            _ => unreachable!(),
        },
        _ => unreachable!(),
    }
}
