//! Error adapter for converting GeoError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, GraphicalReportHandler, GraphicalTheme, LabeledSpan};

use geodeck::GeoError;

/// Adapter for [`GeoError`] values.
///
/// Each variant maps to a stable diagnostic code; variants with an obvious
/// remedy also carry a help line.
pub struct ErrorAdapter<'a>(pub &'a GeoError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            GeoError::Io(_) => "geodeck::io",
            GeoError::Json(_) => "geodeck::json",
            GeoError::Config(_) => "geodeck::config",
            GeoError::Fetch(_) => "geodeck::fetch",
            GeoError::Topology(_) => "geodeck::topology",
            GeoError::UnknownChart(_) => "geodeck::unknown_chart",
            GeoError::ContainerNotFound(_) => "geodeck::container",
            GeoError::Layer { .. } => "geodeck::layer",
            GeoError::Export(_) => "geodeck::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            GeoError::Fetch(_) => {
                "map the boundary URL to a local file in the [sources] table of the configuration"
            }
            GeoError::Topology(_) => "check `basemap.object` against the objects of the topology",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Convert a [`GeoError`] into a list of reportable errors.
pub fn to_reportables(err: &GeoError) -> Vec<ErrorAdapter<'_>> {
    vec![ErrorAdapter(err)]
}

/// Renders every diagnostic of `err` as plain text, one report per entry.
///
/// A report that fails to render falls back to the error message alone.
pub fn render_reports(err: &GeoError) -> Vec<String> {
    let reporter = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    to_reportables(err)
        .iter()
        .map(|reportable| {
            let mut report = String::new();
            match reporter.render_report(&mut report, reportable) {
                Ok(()) => report,
                Err(_) => reportable.to_string(),
            }
        })
        .collect()
}
