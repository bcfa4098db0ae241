//! Unified geo chart composer.
//!
//! [`build`] draws one geo chart from a [`GeoChartConfig`]: it projects the
//! basemap boundaries, draws every configured layer in its initial state and
//! arms the reveal. Once the chart has faded in, the layers' entrance
//! animations run in [`LayerKind`] order.
//!
//! [`LayerKind`]: crate::layers::LayerKind

use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, info, warn};

use geodeck_core::draw::{ElementKind, RenderLayer};

use crate::{
    chart_config::GeoChartConfig,
    error::GeoError,
    layers::{
        self, DrawContext, LayerBuild, Theme,
        choropleth::Region,
    },
    legacy,
    path::GeoPath,
    registry::{ChartBuilder, ChartContext, ChartRequest},
    reveal::{RevealOptions, reveal},
    stage::Stage,
};

/// The geo chart builder.
///
/// Props of the legacy chart types are adapted by the request's type name
/// before they are decoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoChart;

impl ChartBuilder for GeoChart {
    fn build(&self, ctx: &ChartContext, request: ChartRequest) -> LocalBoxFuture<'static, Result<(), GeoError>> {
        let ctx = ctx.clone();
        let props = legacy::adapt(&request.kind, request.props);
        let container = request.container;
        async move {
            let config = GeoChartConfig::from_value(props)?;
            build(ctx, container, config).await
        }
        .boxed_local()
    }
}

/// Derives a document-unique identifier from a container selector.
fn chart_id(container: &str) -> String {
    container
        .trim_start_matches(['#', '.'])
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Keeps a layer that built, logs and drops one that did not.
fn keep(builds: &mut Vec<LayerBuild>, layer: &'static str, result: Result<LayerBuild, GeoError>) {
    match result {
        Ok(build) => builds.push(build),
        Err(err) => warn!(layer, err:%; "Skipping layer"),
    }
}

/// Builds a geo chart into `container`.
///
/// The only suspension point is the boundary fetch; everything after it
/// runs synchronously against the stage.
///
/// # Errors
///
/// Returns [`GeoError::ContainerNotFound`] for an unknown container,
/// [`GeoError::Fetch`] if the boundary data cannot be loaded and
/// [`GeoError::Topology`] if it lacks the configured object. In each case
/// nothing is drawn. Failing layers are skipped and do not fail the build.
pub async fn build(ctx: ChartContext, container: String, config: GeoChartConfig) -> Result<(), GeoError> {
    debug!(container = container.as_str(), url = config.basemap.url.as_str(); "Building geo chart");
    if !ctx.stage.borrow().has_container(&container) {
        return Err(GeoError::ContainerNotFound(container));
    }

    let size = config.size();
    let projection = config.projection.build(size);
    let topology = ctx.topologies.load(&config.basemap.url).await?;
    let features = topology.features(&config.basemap.object)?;

    let theme = ctx.settings.theme();
    let theme = Theme {
        ink: theme.ink().map_err(GeoError::Config)?,
        brand: theme.brand().map_err(GeoError::Config)?,
    };

    let mut stage = ctx.stage.borrow_mut();
    let mount = stage.mount_chart(&container, size)?;
    let timing = *stage.timing();
    let geo_path = GeoPath::new(Rc::clone(&projection));
    let basemap = &config.basemap;

    let scene = stage.scene_mut();
    let sphere = scene.append_layered(mount.root, RenderLayer::Sphere, ElementKind::Path);
    scene.set_attr(sphere, "class", "sphere");
    scene.set_attr(sphere, "d", geo_path.sphere().to_string());
    scene.set_attr(sphere, "fill", basemap.sphere_fill);

    let regions_group = scene.append_layered(mount.root, RenderLayer::Regions, ElementKind::Group);
    scene.set_attr(regions_group, "class", "states");
    let regions: Vec<Region> = features
        .iter()
        .map(|feature| {
            let node = scene.append(regions_group, ElementKind::Path);
            scene.set_attr(node, "class", "state");
            scene.set_attr(node, "d", geo_path.geometry(feature.geometry()).to_string());
            scene.set_attr(node, "fill", basemap.state_fill);
            scene.set_attr(node, "stroke", basemap.state_stroke);
            scene.set_attr(node, "stroke-width", basemap.state_stroke_width);
            Region {
                node,
                name: feature.name().map(str::to_string),
            }
        })
        .collect();
    debug!(container = container.as_str(), regions = regions.len(); "Basemap drawn");

    let mut draw = DrawContext {
        stage: &mut *stage,
        mount,
        chart_id: chart_id(&container),
        projection,
        theme,
        timing,
        tooltip: Rc::clone(&ctx.tooltip),
    };
    let mut builds = Vec::new();
    if let Some(choropleth) = &basemap.choropleth {
        let result = layers::choropleth::build(&mut draw, &regions, choropleth);
        keep(&mut builds, "choropleth", result);
    }
    let layers_config = &config.layers;
    if let Some(bubbles) = &layers_config.bubbles {
        keep(&mut builds, "bubbles", layers::bubbles::build(&mut draw, bubbles));
    }
    if let Some(flow) = &layers_config.flow {
        keep(&mut builds, "flow", layers::flow::build(&mut draw, flow));
    }
    if let Some(hexgrid) = &layers_config.hexgrid {
        keep(&mut builds, "hexgrid", layers::hexgrid::build(&mut draw, hexgrid));
    }
    if let Some(plumes) = &layers_config.plumes {
        keep(&mut builds, "plumes", layers::plumes::build(&mut draw, plumes));
    }
    if let Some(rings) = &layers_config.rings {
        keep(&mut builds, "rings", layers::rings::build(&mut draw, rings));
    }
    builds.sort_by_key(|build| build.kind);

    let layer_count = builds.len();
    let options = RevealOptions {
        container: container.clone(),
        root: mount.root,
        fade_ms: timing.dur(config.anim.fade_ms),
        ease: config.anim.ease,
        threshold: config.anim.threshold,
    };
    reveal(
        &mut *stage,
        options,
        Box::new(move |stage: &mut Stage| {
            for build in builds {
                let kind = build.kind;
                if let Err(err) = (build.finalize)(stage) {
                    warn!(layer = kind.name(), err:%; "Layer entrance failed");
                }
            }
        }),
    );
    info!(container = container.as_str(), layers = layer_count; "Geo chart built");
    Ok(())
}
