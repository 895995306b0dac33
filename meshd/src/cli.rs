use std::path::PathBuf;

use clap::Parser;

/// Command-line entrypoint for a single `meshd` node process
/// (grounded on `zebra-rs/src/main.rs::Arg`).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Arg {
    #[arg(short, long, help = "Node config file", default_value = "meshd.yaml")]
    pub config: PathBuf,

    #[arg(long, help = "Print the current route table and exit")]
    pub show_routes: bool,

    #[arg(long, help = "Log to this file instead of stdout")]
    pub log_file: Option<PathBuf>,
}
