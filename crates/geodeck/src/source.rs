//! Boundary data sources.
//!
//! A [`BoundarySource`] resolves a boundary URL to raw TopoJSON bytes. The
//! engine never performs network I/O itself; deployments plug in whatever
//! transport they have. [`FileSource`] maps URLs to local files and
//! [`MemorySource`] serves bytes held in memory.

use std::{
    cell::Cell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use futures::future::{self, FutureExt, LocalBoxFuture};
use indexmap::IndexMap;
use log::debug;

use crate::error::FetchError;

/// Loads raw boundary data for a URL.
pub trait BoundarySource {
    /// Starts loading `url`. The returned future owns everything it needs.
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>>;
}

/// Serves boundary data from local files.
///
/// A URL listed in the source map is read from its mapped path. Any other
/// URL that is not `http(s)` is treated as a file path itself. Relative paths
/// resolve against the base directory when one is set.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    sources: IndexMap<String, PathBuf>,
    base_dir: Option<PathBuf>,
}

impl FileSource {
    /// Creates a file source from a URL-to-path map.
    pub fn new(sources: IndexMap<String, PathBuf>) -> Self {
        Self {
            sources,
            base_dir: None,
        }
    }

    /// Resolves relative paths against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Returns the file a URL resolves to, if any.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let path = match self.sources.get(url) {
            Some(path) => path.clone(),
            None if url.starts_with("http://") || url.starts_with("https://") => return None,
            None => PathBuf::from(url.strip_prefix("file://").unwrap_or(url)),
        };
        Some(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        })
    }
}

impl BoundarySource for FileSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>> {
        let result = match self.resolve(url) {
            Some(path) => read_file(url, &path),
            None => Err(FetchError::Unavailable(url.to_string())),
        };
        future::ready(result).boxed_local()
    }
}

fn read_file(url: &str, path: &Path) -> Result<Vec<u8>, FetchError> {
    debug!(url, path:? = path; "Reading boundary file");
    fs::read(path).map_err(|err| FetchError::Io {
        url: url.to_string(),
        message: format!("{}: {err}", path.display()),
    })
}

/// Serves boundary data held in memory and counts fetches.
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: HashMap<String, Vec<u8>>,
    fetches: Cell<usize>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the bytes served for `url`.
    pub fn with(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(url.into(), bytes.into());
        self
    }

    /// Returns how many fetches were started.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl BoundarySource for MemorySource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>> {
        self.fetches.set(self.fetches.get() + 1);
        let result = self
            .entries
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Unavailable(url.to_string()));
        future::ready(result).boxed_local()
    }
}
