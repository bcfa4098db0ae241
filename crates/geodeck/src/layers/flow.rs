//! Flow arcs between named hubs and generators.
//!
//! Every edge is drawn as a bundled curve bowing to the left of its
//! direction. After the reveal, node markers grow and a repeating timer
//! marches the arcs' dashes, faster for stronger flows.

use std::collections::HashMap;

use log::debug;

use geodeck_core::{
    anim::Transition,
    color::Color,
    draw::{ElementKind, NodeId, PathData, RenderLayer, StrokeCap, StrokeDefinition},
    geometry::Point,
    scale::ColorRamp,
};

use crate::{
    chart_config::{FlowConfig, FlowNode},
    error::GeoError,
    stage::Stage,
};

use super::{DrawContext, LayerBuild, LayerKind};

/// Perpendicular displacement of the control point, relative to the chord.
const CURVATURE: f32 = 0.22;
/// Dash offset the marching animation starts from.
const DASH_START: f32 = 60.0;

/// Returns `[source, control, target]` for an arc between two projected
/// points. The control point is the chord midpoint pushed along the chord's
/// left normal by `curvature × length`.
pub fn arc_points(a: Point, b: Point, curvature: f32) -> [Point; 3] {
    let mid = a.midpoint(b);
    let delta = b.sub_point(a);
    let length = delta.hypot();
    if length == 0.0 {
        return [a, mid, b];
    }
    let normal = delta.perpendicular().scale(1.0 / length);
    [a, mid.add_point(normal.scale(curvature * length)), b]
}

/// Dash offset of an arc with magnitude `magnitude` after `elapsed` ms.
pub fn dash_offset(elapsed: f64, dash_speed: f64, magnitude: f32) -> f32 {
    DASH_START - (elapsed / dash_speed) as f32 * (1.0 + magnitude * 1.5)
}

/// Draws arcs and nodes.
///
/// Edges naming an unknown node, or with an unprojectable endpoint, are
/// dropped.
pub fn build(ctx: &mut DrawContext<'_>, config: &FlowConfig) -> Result<LayerBuild, GeoError> {
    let by_name: HashMap<&str, &FlowNode> = config
        .hubs
        .iter()
        .chain(&config.gens)
        .map(|node| (node.name.as_str(), node))
        .collect();

    let edge_group = ctx
        .stage
        .scene_mut()
        .append_layered(ctx.mount.root, RenderLayer::FlowEdges, ElementKind::Group);
    ctx.stage.scene_mut().set_attr(edge_group, "class", "flow-edges");
    ctx.stage.scene_mut().set_attr(edge_group, "fill", "none");

    let mut arcs: Vec<(NodeId, f32)> = Vec::new();
    for edge in &config.edges {
        let (source, target, magnitude) = (&edge.0, &edge.1, edge.2 as f32);
        let endpoints = by_name
            .get(source.as_str())
            .zip(by_name.get(target.as_str()))
            .and_then(|(s, t)| ctx.project(s.lon, s.lat).zip(ctx.project(t.lon, t.lat)));
        let Some((a, b)) = endpoints else {
            debug!(source = source.as_str(), target = target.as_str(); "Dropping flow edge");
            continue;
        };

        let d = PathData::new().bundle(&arc_points(a, b, CURVATURE), config.curve_beta);
        let mut stroke = StrokeDefinition::dashed_pattern(
            ColorRamp::Warm.sample(0.15 + magnitude * 0.35),
            1.0 + magnitude * 4.0,
            "4 6",
        );
        stroke.set_opacity(0.9);
        stroke.set_cap(StrokeCap::Round);

        let scene = ctx.stage.scene_mut();
        let path = scene.append(edge_group, ElementKind::Path);
        scene.set_attr(path, "d", d.to_string());
        stroke.apply(scene, path);
        scene.set_attr(path, "stroke-dashoffset", DASH_START);
        arcs.push((path, magnitude));
    }

    let node_group = ctx
        .stage
        .scene_mut()
        .append_layered(ctx.mount.root, RenderLayer::FlowNodes, ElementKind::Group);
    ctx.stage.scene_mut().set_attr(node_group, "class", "flow-nodes");

    let generator_fill = config.node_fill.generator;
    let hub_fill = config.node_fill.hub.unwrap_or(ctx.theme.brand);
    let generators = draw_nodes(ctx, node_group, &config.gens, "gen", 1.0, generator_fill);
    let hubs = draw_nodes(ctx, node_group, &config.hubs, "hub", 1.5, hub_fill);

    if config.label.show {
        let fill = config.label.color.unwrap_or(ctx.theme.ink);
        for node in config.hubs.iter().chain(&config.gens) {
            let Some(p) = ctx.project(node.lon, node.lat) else {
                continue;
            };
            let scene = ctx.stage.scene_mut();
            let text = scene.append(node_group, ElementKind::Text);
            scene.set_attr(text, "class", "lbl");
            scene.set_attr(text, "x", p.x() + 6.0);
            scene.set_attr(text, "y", p.y() - 6.0);
            scene.set_attr(text, "fill", fill);
            scene.set_attr(text, "font-size", config.label.font_size);
            scene.set_attr(text, "font-weight", f32::from(config.label.weight));
            scene.set_text(text, node.name.clone());
        }
    }
    debug!(arcs = arcs.len(), dropped = config.edges.len() - arcs.len(); "Flow drawn");

    let node_ms = ctx.timing.dur(config.anim.node_ms);
    let (hub_r, generator_r) = (config.node_r.hub, config.node_r.generator);
    let dash_speed = if config.dash_speed > 0.0 {
        config.dash_speed
    } else {
        60.0
    };
    let root = ctx.mount.root;
    Ok(LayerBuild::new(LayerKind::Flow, move |stage: &mut Stage| {
        for node in generators {
            stage.transition(Transition::new(node).attr("r", generator_r).duration(node_ms));
        }
        for node in hubs {
            stage.transition(Transition::new(node).attr("r", hub_r).duration(node_ms));
        }
        stage.start_chart_timer(root, Box::new(move |elapsed, scene| {
            for (path, magnitude) in &arcs {
                scene.set_attr(*path, "stroke-dashoffset", dash_offset(elapsed, dash_speed, *magnitude));
            }
        }));
        Ok(())
    }))
}

fn draw_nodes(
    ctx: &mut DrawContext<'_>,
    group: NodeId,
    nodes: &[FlowNode],
    class: &'static str,
    radius: f32,
    fill: Color,
) -> Vec<NodeId> {
    nodes
        .iter()
        .filter_map(|node| {
            let p = ctx.project(node.lon, node.lat)?;
            let scene = ctx.stage.scene_mut();
            let circle = scene.append(group, ElementKind::Circle);
            scene.set_attr(circle, "class", class);
            scene.set_attr(circle, "cx", p.x());
            scene.set_attr(circle, "cy", p.y());
            scene.set_attr(circle, "r", radius);
            scene.set_attr(circle, "fill", fill);
            Some(circle)
        })
        .collect()
}
