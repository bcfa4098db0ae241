//! Region fills driven by per-region values.

use std::rc::Rc;

use log::debug;
use serde_json::json;

use geodeck_core::{
    anim::Transition,
    color::Color,
    draw::{ElementKind, NodeId, RenderLayer, StrokeCap, StrokeDefinition},
    scale::ColorScale,
};

use crate::{
    chart_config::{ChoroplethConfig, OutlineConfig},
    error::GeoError,
    stage::Stage,
};

use super::{DrawContext, LayerBuild, LayerKind};

/// A drawn basemap region.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub node: NodeId,
    /// Region name from the boundary properties.
    pub name: Option<String>,
}

/// Nominal duration of the fill transition.
const FILL_MS: f64 = 900.0;

/// Fills every region with the color of 0 and returns the transition to the
/// value colors.
///
/// Regions get a hover title when `config.title` is set. With an outline
/// configured, regions at or above its threshold are traced by a dashed path
/// that starts marching once the layer is finalized.
///
/// # Errors
///
/// Returns [`GeoError::Config`] if the color scale stops are invalid.
pub fn build(
    ctx: &mut DrawContext<'_>,
    regions: &[Region],
    config: &ChoroplethConfig,
) -> Result<LayerBuild, GeoError> {
    let color: Rc<dyn Fn(f32) -> Color> = match &config.color_fn {
        Some(color_fn) => {
            let color_fn = color_fn.clone();
            Rc::new(move |v| color_fn.apply(v))
        }
        None => {
            let scale = ColorScale::new(config.color.domain.clone(), config.color.range.clone())?;
            Rc::new(move |v| scale.apply(v))
        }
    };

    let initial = color(0.0);
    let values: Vec<f64> = regions
        .iter()
        .map(|region| {
            region
                .name
                .as_deref()
                .and_then(|name| config.value_by_name.get(name))
                .copied()
                .unwrap_or(config.missing)
        })
        .collect();
    let targets: Vec<(NodeId, Color)> = regions
        .iter()
        .zip(&values)
        .map(|(region, value)| {
            ctx.stage.scene_mut().set_attr(region.node, "fill", initial);
            (region.node, color(*value as f32))
        })
        .collect();

    if let Some(title) = &config.title {
        for (region, value) in regions.iter().zip(&values) {
            let record = json!({
                "name": region.name.as_deref().unwrap_or_default(),
                "value": value,
                "pctl": (value * 100.0).trunc() as i64,
            });
            let text = record.as_object().map(|r| title.render(r)).unwrap_or_default();
            let scene = ctx.stage.scene_mut();
            let node = scene.append(region.node, ElementKind::Title);
            scene.set_text(node, text);
        }
    }

    let outlines = match &config.outline {
        Some(outline) => draw_outlines(ctx, regions, &values, outline),
        None => Vec::new(),
    };

    let matched = regions
        .iter()
        .filter(|r| r.name.as_deref().is_some_and(|n| config.value_by_name.contains_key(n)))
        .count();
    debug!(regions = regions.len(), matched; "Choropleth drawn");

    let duration = ctx.timing.dur(FILL_MS);
    let stagger = ctx.timing.dur(config.stagger_ms);
    let speed = match &config.outline {
        Some(outline) if outline.speed > 0.0 => outline.speed,
        _ => OutlineConfig::default().speed,
    };
    let root = ctx.mount.root;
    Ok(LayerBuild::new(LayerKind::Choropleth, move |stage: &mut Stage| {
        for (i, (node, fill)) in targets.into_iter().enumerate() {
            stage.transition(
                Transition::new(node)
                    .attr("fill", fill)
                    .delay(stagger * i as f64)
                    .duration(duration),
            );
        }
        if !outlines.is_empty() {
            stage.start_chart_timer(
                root,
                Box::new(move |elapsed, scene| {
                    let offset = -(elapsed / speed) as f32;
                    for outline in &outlines {
                        scene.set_attr(*outline, "stroke-dashoffset", offset);
                    }
                }),
            );
        }
        Ok(())
    }))
}

/// Traces the regions whose value reaches the outline threshold.
fn draw_outlines(
    ctx: &mut DrawContext<'_>,
    regions: &[Region],
    values: &[f64],
    outline: &OutlineConfig,
) -> Vec<NodeId> {
    let mut stroke = StrokeDefinition::dashed_pattern(outline.stroke, outline.stroke_width, &outline.dasharray);
    stroke.set_opacity(outline.stroke_opacity);
    stroke.set_cap(StrokeCap::Round);

    let root = ctx.mount.root;
    let scene = ctx.stage.scene_mut();
    let group = scene.append_layered(root, RenderLayer::Regions, ElementKind::Group);
    scene.set_attr(group, "class", "region-outlines");

    let traced: Vec<NodeId> = regions
        .iter()
        .zip(values)
        .filter(|(_, value)| **value >= outline.threshold)
        .filter_map(|(region, _)| {
            let d = scene.attr(region.node, "d").cloned()?;
            let path = scene.append(group, ElementKind::Path);
            scene.set_attr(path, "class", "region-outline");
            scene.set_attr(path, "d", d);
            scene.set_attr(path, "fill", "none");
            stroke.apply(scene, path);
            scene.set_attr(path, "stroke-dashoffset", 0.0);
            Some(path)
        })
        .collect();
    debug!(traced = traced.len(), threshold = outline.threshold; "Region outlines drawn");
    traced
}
