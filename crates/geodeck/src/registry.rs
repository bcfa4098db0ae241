//! Chart type registry.
//!
//! A deck names each figure's chart type as a string. [`ChartRegistry`] maps
//! those names to [`ChartBuilder`]s; several names may share one builder.
//! Builders receive a [`ChartContext`] carrying the stage and the shared
//! services they draw with.

use std::{cell::RefCell, fmt, rc::Rc};

use futures::future::LocalBoxFuture;
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::{
    cache::TopologyCache, config::AppConfig, error::GeoError, geo::GeoChart, stage::Stage,
    tooltip::TooltipSink,
};

/// Chart type names served by the geo composer.
pub const GEO_CHART_TYPES: [&str; 7] = ["geo", "map", "bubbles", "hexgrid", "flow2d", "plumes", "water"];

/// One chart to build.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    /// Registered chart type name.
    pub kind: String,
    /// Selector of the container the chart mounts into.
    pub container: String,
    /// Chart props as written in the deck.
    pub props: Value,
}

impl ChartRequest {
    /// Creates a request.
    pub fn new(kind: impl Into<String>, container: impl Into<String>, props: Value) -> Self {
        Self {
            kind: kind.into(),
            container: container.into(),
            props,
        }
    }
}

/// Services shared by every chart build.
///
/// Cloning the context yields handles to the same stage and services.
#[derive(Clone)]
pub struct ChartContext {
    pub stage: Rc<RefCell<Stage>>,
    pub topologies: TopologyCache,
    pub tooltip: Rc<dyn TooltipSink>,
    pub settings: Rc<AppConfig>,
}

impl fmt::Debug for ChartContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartContext")
            .field("topologies", &self.topologies)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Builds one chart type.
pub trait ChartBuilder {
    /// Starts building `request` into its container.
    ///
    /// The returned future owns everything it needs. It resolves once the
    /// chart is drawn and its reveal is armed, not when the reveal happens.
    fn build(&self, ctx: &ChartContext, request: ChartRequest) -> LocalBoxFuture<'static, Result<(), GeoError>>;
}

/// Maps chart type names to builders.
#[derive(Default, Clone)]
pub struct ChartRegistry {
    builders: IndexMap<String, Rc<dyn ChartBuilder>>,
}

impl ChartRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the geo composer under `geo` and every
    /// legacy geo chart name.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let geo: Rc<dyn ChartBuilder> = Rc::new(GeoChart);
        for name in GEO_CHART_TYPES {
            registry.register(name, Rc::clone(&geo));
        }
        registry
    }

    /// Registers `builder` under `name`, replacing any previous builder.
    pub fn register(&mut self, name: impl Into<String>, builder: Rc<dyn ChartBuilder>) {
        let name = name.into();
        if self.builders.insert(name.clone(), builder).is_some() {
            debug!(name = name.as_str(); "Replaced chart builder");
        }
    }

    /// Returns the builder registered under `name`.
    pub fn resolve(&self, name: &str) -> Option<Rc<dyn ChartBuilder>> {
        self.builders.get(name).cloned()
    }

    /// Returns the registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }
}

impl fmt::Debug for ChartRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use futures::future::{self, FutureExt};

    struct Counting(Rc<Cell<usize>>);

    impl ChartBuilder for Counting {
        fn build(&self, _ctx: &ChartContext, _request: ChartRequest) -> LocalBoxFuture<'static, Result<(), GeoError>> {
            self.0.set(self.0.get() + 1);
            future::ready(Ok(())).boxed_local()
        }
    }

    #[test]
    fn test_defaults_alias_one_builder() {
        let registry = ChartRegistry::with_defaults();
        assert_eq!(registry.names().collect::<Vec<_>>(), GEO_CHART_TYPES);
        let geo = registry.resolve("geo").unwrap();
        for name in GEO_CHART_TYPES {
            assert!(Rc::ptr_eq(&registry.resolve(name).unwrap(), &geo));
        }
        assert!(registry.resolve("globe").is_none());
    }

    #[test]
    fn test_register_last_write_wins() {
        let mut registry = ChartRegistry::with_defaults();
        let calls = Rc::new(Cell::new(0));
        let counting: Rc<dyn ChartBuilder> = Rc::new(Counting(Rc::clone(&calls)));
        registry.register("map", Rc::clone(&counting));

        assert!(Rc::ptr_eq(&registry.resolve("map").unwrap(), &counting));
        assert!(!Rc::ptr_eq(
            &registry.resolve("geo").unwrap(),
            &registry.resolve("map").unwrap()
        ));
        assert_eq!(registry.names().count(), GEO_CHART_TYPES.len());
    }
}
