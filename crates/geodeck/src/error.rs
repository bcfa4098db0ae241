//! Error types for geodeck operations.
//!
//! [`GeoError`] is the error returned by chart builds and the deck presenter.
//! [`FetchError`] describes boundary-data loading failures; it is `Clone`
//! because one in-flight fetch is shared by every chart awaiting the same URL.

use std::io;

use thiserror::Error;

use geodeck_core::scale::ScaleError;

/// Failure to load or decode boundary topology.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("no boundary source available for `{0}`")]
    Unavailable(String),

    #[error("failed to read `{url}`: {message}")]
    Io { url: String, message: String },

    #[error("failed to decode topology from `{url}`: {message}")]
    Decode { url: String, message: String },
}

/// The main error type for geodeck operations.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Boundary data error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Unknown chart type `{0}`")]
    UnknownChart(String),

    #[error("Container `{0}` not found")]
    ContainerNotFound(String),

    #[error("Layer `{layer}` failed: {message}")]
    Layer {
        layer: &'static str,
        message: String,
    },

    #[error("Export error: {0}")]
    Export(String),
}

impl From<ScaleError> for GeoError {
    fn from(err: ScaleError) -> Self {
        Self::Config(err.to_string())
    }
}

impl GeoError {
    /// Create a new `Layer` error for the named layer.
    pub fn layer(layer: &'static str, message: impl Into<String>) -> Self {
        Self::Layer {
            layer,
            message: message.into(),
        }
    }
}
