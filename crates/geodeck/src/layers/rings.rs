//! Dashed rings marching around points.

use log::debug;

use geodeck_core::{
    draw::{ElementKind, NodeId, RenderLayer, StrokeDefinition},
    scale::SqrtScale,
};

use crate::{chart_config::RingsConfig, error::GeoError, stage::Stage};

use super::{DrawContext, LayerBuild, LayerKind};

/// Value assumed for points that carry neither a radius nor a value.
const DEFAULT_VALUE: f64 = 100.0;

/// Draws the rings. The marching timer starts on reveal.
pub fn build(ctx: &mut DrawContext<'_>, config: &RingsConfig) -> Result<LayerBuild, GeoError> {
    let scale = SqrtScale::new(config.r_domain, config.r_range);
    let stroke = StrokeDefinition::dashed_pattern(config.stroke.unwrap_or(ctx.theme.ink), 2.0, "6 8");

    let group = ctx
        .stage
        .scene_mut()
        .append_layered(ctx.mount.root, RenderLayer::Rings, ElementKind::Group);
    ctx.stage.scene_mut().set_attr(group, "class", "rings");

    let mut rings: Vec<NodeId> = Vec::with_capacity(config.points.len());
    for point in &config.points {
        let Some(center) = ctx.project(point.lon, point.lat) else {
            continue;
        };
        let radius = match point.r {
            Some(r) if r > 0.0 => r,
            _ => {
                let value = point.value.filter(|v| *v != 0.0).unwrap_or(DEFAULT_VALUE);
                scale.apply(value as f32)
            }
        };

        let scene = ctx.stage.scene_mut();
        let ring = scene.append(group, ElementKind::Circle);
        scene.set_attr(ring, "class", "ring");
        scene.set_attr(ring, "cx", center.x());
        scene.set_attr(ring, "cy", center.y());
        scene.set_attr(ring, "r", radius);
        scene.set_attr(ring, "fill", "none");
        stroke.apply(scene, ring);
        rings.push(ring);
    }
    debug!(drawn = rings.len(), points = config.points.len(); "Rings drawn");

    let speed = if config.speed > 0.0 { config.speed } else { 70.0 };
    let root = ctx.mount.root;
    Ok(LayerBuild::new(LayerKind::Rings, move |stage: &mut Stage| {
        stage.start_chart_timer(root, Box::new(move |elapsed, scene| {
            let offset = -(elapsed / speed) as f32;
            for ring in &rings {
                scene.set_attr(*ring, "stroke-dashoffset", offset);
            }
        }));
        Ok(())
    }))
}
