//! geodeck CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use log::{debug, error};

use geodeck_cli::{Args, error_adapter::render_reports};

fn main() -> ExitCode {
    miette::set_panic_hook();

    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(args.log_level)
        .init();
    debug!(args:?; "Parsed arguments");

    match geodeck_cli::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            for report in render_reports(&err) {
                error!("{report}");
            }
            ExitCode::FAILURE
        }
    }
}
