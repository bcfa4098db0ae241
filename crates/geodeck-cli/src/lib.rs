//! CLI logic for the geodeck slide renderer.
//!
//! This module reads a deck, renders one of its slides at a point in time
//! and writes the SVG snapshot.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, path::Path};

use log::info;

use geodeck::{DeckRenderer, GeoError, deck::DeckConfig};

/// Run the geodeck CLI application
///
/// Boundary files referenced by relative paths resolve against the deck's
/// directory.
///
/// # Errors
///
/// Returns `GeoError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid deck JSON
/// - Boundary data errors of the rendered slide
/// - Export errors
pub fn run(args: &Args) -> Result<(), GeoError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing deck"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let deck = DeckConfig::from_json(&source)?;

    let mut renderer = DeckRenderer::new(app_config);
    if let Some(dir) = Path::new(&args.input).parent() {
        renderer = renderer.with_base_dir(dir);
    }
    let svg = renderer.render_svg(&deck, args.slide.as_deref(), args.at_ms)?;

    fs::write(&args.output, svg)?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}
