//! Command-line argument definitions for the geodeck CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the deck and output paths, configuration
//! file selection, which slide to render and when, and logging verbosity.

use std::str::FromStr;

use clap::Parser;
use log::LevelFilter;

/// Command-line arguments for the geodeck slide renderer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input deck file (JSON)
    #[arg(help = "Path to the deck file")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Id of the slide to render; defaults to the first geo slide
    #[arg(short, long)]
    pub slide: Option<String>,

    /// Milliseconds of animation to run after the slide comes into view
    #[arg(long, default_value_t = 4000.0)]
    pub at_ms: f64,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", value_parser = parse_log_level)]
    pub log_level: LevelFilter,
}

fn parse_log_level(value: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(value)
        .map_err(|_| format!("`{value}` is not one of off, error, warn, info, debug, trace"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_defaults_to_info() {
        let args = Args::try_parse_from(["geodeck", "deck.json"]).unwrap();
        assert_eq!(args.log_level, LevelFilter::Info);
        assert_eq!(args.output, "out.svg");
        assert_eq!(args.at_ms, 4000.0);
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let args = Args::try_parse_from(["geodeck", "deck.json", "--log-level", "DEBUG"]).unwrap();
        assert_eq!(args.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let err = Args::try_parse_from(["geodeck", "deck.json", "--log-level", "loud"]).unwrap_err();
        assert!(err.to_string().contains("`loud` is not one of"));
    }
}
