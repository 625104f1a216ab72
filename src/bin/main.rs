#![crate_type = "bin"]
#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;

mod config;
mod dispatch;
mod errors;
mod output;
mod timedisplay;

use crate::errors::*;
use crate::output::OutputPath;
use clap::load_yaml;
use clap::App;
use colored::*;
use log::error;
use relapic::dim::{D1, D2, D3};
use std::path::Path;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> String {
    format!("{}-{}", VERSION, env!("VERGEN_SHA_SHORT"))
}

fn main() {
    env_logger::init();

    if let Err(ref e) = run() {
        error!("{}: {}", "error".red(), e);

        for e in e.iter().skip(1) {
            error!("caused by: {}", e);
        }

        if let Some(backtrace) = e.backtrace() {
            error!("backtrace: {:?}", backtrace);
        }

        ::std::process::exit(1);
    }

    ::std::process::exit(0);
}

/// Parses the command line, reads and validates the parameter file,
/// resolves the spatial dimension to a concrete `Dim` marker, and hands
/// off to [`dispatch::run`].
fn run() -> Result<()> {
    let yaml = load_yaml!("cli.yml");
    let cli_matches = App::from_yaml(yaml).version(version().as_str()).get_matches();

    let settings_file_name = cli_matches.value_of("parameter_file").unwrap();
    let settings = config::read_parameter_file(settings_file_name).chain_err(|| "Error reading parameter file.")?;

    let output_dir = Path::new(cli_matches.value_of("output_directory").unwrap());
    let prefix = Path::new(settings_file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("picsim");
    let output_path = OutputPath::new(output_dir, prefix);
    output_path.create().chain_err(|| "Cannot create output directory")?;

    let param_name = output_path.with_extension("toml");
    let resolved = toml::to_string(&settings).chain_err(|| "Unable to serialize resolved parameter file.")?;
    std::fs::write(&param_name, resolved).chain_err(|| "Unable to save resolved parameter file.")?;

    let resume = cli_matches.is_present("resume");
    let show_progress = cli_matches.is_present("progress_bar");

    let start_time = time::now();

    let dim = settings.grid.n.len();
    match dim {
        1 => dispatch::run::<D1>(&settings, &output_path, show_progress, resume)?,
        2 => dispatch::run::<D2>(&settings, &output_path, show_progress, resume)?,
        3 => dispatch::run::<D3>(&settings, &output_path, show_progress, resume)?,
        _ => bail!("Grid dimension must be 1, 2, or 3; got {}.", dim),
    }

    let stop_time = time::now();
    println!(
        "Elapsed time: {}",
        timedisplay::pretty_print_duration(stop_time - start_time)
    );

    Ok(())
}
