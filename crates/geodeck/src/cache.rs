//! Shared boundary topology cache.
//!
//! [`TopologyCache`] collapses every request for one URL into a single
//! in-flight fetch whose decoded result is shared by all charts. A failed
//! fetch is evicted once it settles so a later request can try again.

use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use log::{debug, info, warn};

use crate::{error::FetchError, source::BoundarySource, topology::Topology};

type SharedFetch = Shared<LocalBoxFuture<'static, Result<Rc<Topology>, FetchError>>>;

/// Cache of decoded topologies keyed by URL.
///
/// Cloning the cache yields another handle to the same entries.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use futures::executor::block_on;
/// use geodeck::{cache::TopologyCache, source::MemorySource};
///
/// let json = r#"{"type": "Topology", "objects": {}, "arcs": []}"#;
/// let source = Rc::new(MemorySource::new().with("states.json", json));
/// let cache = TopologyCache::new(source.clone());
///
/// let a = cache.load("states.json");
/// let b = cache.load("states.json");
/// let (a, b) = block_on(async { futures::join!(a, b) });
/// assert!(Rc::ptr_eq(&a.unwrap(), &b.unwrap()));
/// assert_eq!(source.fetch_count(), 1);
/// ```
#[derive(Clone)]
pub struct TopologyCache {
    source: Rc<dyn BoundarySource>,
    entries: Rc<RefCell<HashMap<String, SharedFetch>>>,
}

impl TopologyCache {
    /// Creates an empty cache fetching from `source`.
    pub fn new(source: Rc<dyn BoundarySource>) -> Self {
        Self {
            source,
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Returns the topology for `url`, starting a fetch only if none is cached
    /// or in flight.
    pub fn load(&self, url: &str) -> impl Future<Output = Result<Rc<Topology>, FetchError>> + 'static {
        let fetch = {
            let mut entries = self.entries.borrow_mut();
            match entries.get(url) {
                Some(fetch) => {
                    debug!(url; "Topology cache hit");
                    fetch.clone()
                }
                None => {
                    info!(url; "Fetching boundary topology");
                    let fetch = self.start_fetch(url);
                    entries.insert(url.to_string(), fetch.clone());
                    fetch
                }
            }
        };

        let entries = Rc::clone(&self.entries);
        let url = url.to_string();
        let handle = fetch.clone();
        async move {
            let result = fetch.await;
            if let Err(err) = &result {
                warn!(url = url.as_str(), err:%; "Boundary fetch failed");
                let mut entries = entries.borrow_mut();
                if entries
                    .get(&url)
                    .is_some_and(|current| current.ptr_eq(&handle))
                {
                    entries.remove(&url);
                }
            }
            result
        }
    }

    fn start_fetch(&self, url: &str) -> SharedFetch {
        let bytes = self.source.fetch(url);
        let url = url.to_string();
        async move {
            let bytes = bytes.await?;
            let topology = Topology::from_slice(&bytes).map_err(|err| FetchError::Decode {
                url: url.clone(),
                message: err.to_string(),
            })?;
            debug!(url = url.as_str(), arcs = topology.arc_count(); "Topology decoded");
            Ok(Rc::new(topology))
        }
        .boxed_local()
        .shared()
    }

    /// Returns `true` if `url` is cached or in flight.
    pub fn contains(&self, url: &str) -> bool {
        self.entries.borrow().contains_key(url)
    }

    /// Returns the number of cached or in-flight URLs.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl fmt::Debug for TopologyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use futures::executor::block_on;

    const EMPTY: &str = r#"{"type": "Topology", "objects": {}, "arcs": []}"#;

    #[test]
    fn test_concurrent_loads_share_one_fetch() {
        let source = Rc::new(MemorySource::new().with("u", EMPTY));
        let cache = TopologyCache::new(source.clone());

        let first = cache.load("u");
        let second = cache.load("u");
        assert_eq!(cache.len(), 1);

        let (a, b) = block_on(async { futures::join!(first, second) });
        assert!(Rc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(source.fetch_count(), 1);

        // Later loads are served from the cache.
        assert!(block_on(cache.load("u")).is_ok());
        assert_eq!(source.fetch_count(), 1);
    }

    #[test]
    fn test_failed_fetch_is_evicted() {
        let source = Rc::new(MemorySource::new());
        let cache = TopologyCache::new(source.clone());

        let result = block_on(cache.load("missing"));
        assert_eq!(
            result.err(),
            Some(FetchError::Unavailable("missing".to_string()))
        );
        assert!(!cache.contains("missing"));

        assert!(block_on(cache.load("missing")).is_err());
        assert_eq!(source.fetch_count(), 2);
    }

    #[test]
    fn test_decode_failure() {
        let source = Rc::new(MemorySource::new().with("bad", "nope"));
        let cache = TopologyCache::new(source);
        assert!(matches!(
            block_on(cache.load("bad")),
            Err(FetchError::Decode { .. })
        ));
    }

    #[test]
    fn test_clones_share_entries() {
        let source = Rc::new(MemorySource::new().with("u", EMPTY));
        let cache = TopologyCache::new(source.clone());
        let other = cache.clone();

        block_on(cache.load("u")).unwrap();
        block_on(other.load("u")).unwrap();
        assert_eq!(source.fetch_count(), 1);
        assert!(other.contains("u"));
    }
}
