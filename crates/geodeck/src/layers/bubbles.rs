//! Magnitude-sized point bubbles.
//!
//! Bubbles start small and grow to an area-proportional radius once the
//! chart is revealed. Labels sit above each circle and rise with it. When a
//! tooltip is configured, the chart reports the nearest bubble under the
//! pointer to the tooltip sink.

use std::rc::Rc;

use log::debug;

use geodeck_core::{
    anim::{Ease, Transition},
    draw::{ElementKind, NodeId, RenderLayer, StrokeDefinition, format_number},
    geometry::Point,
    scale::AreaRadiusScale,
};

use crate::{
    chart_config::BubblesConfig,
    error::GeoError,
    record,
    stage::{PointerEvent, Stage},
    tooltip::TooltipSink,
};

use super::{DrawContext, LayerBuild, LayerKind};

/// Extra distance beyond a bubble's edge that still counts as a hover.
const HOVER_SLACK: f32 = 10.0;
/// Gap between a grown bubble's edge and its label.
const LABEL_GAP: f32 = 6.0;

#[derive(Debug)]
struct Bubble {
    circle: NodeId,
    label: Option<NodeId>,
    radius: f32,
}

/// A hover target for the tooltip.
#[derive(Debug, Clone)]
struct Target {
    center: Point,
    radius: f32,
    html: String,
}

/// Draws the bubbles at their initial radius.
///
/// Records without a projectable position are skipped. Missing magnitudes
/// count as zero.
pub fn build(ctx: &mut DrawContext<'_>, config: &BubblesConfig) -> Result<LayerBuild, GeoError> {
    let magnitude = |d: &record::Record| record::number(d, &config.r).unwrap_or(0.0) as f32;
    let max = config
        .data
        .iter()
        .map(magnitude)
        .filter(|v| v.is_finite())
        .fold(0.0_f32, f32::max);
    let scale = AreaRadiusScale::new(max, config.r_range);

    let label_template = config.label.show.then(|| config.label_template());
    let tooltip_template = config.tooltip_template();
    let label_fill = config.label.color.unwrap_or(ctx.theme.ink);
    let stroke = StrokeDefinition::new(config.style.stroke, config.style.stroke_width);

    let group = ctx
        .stage
        .scene_mut()
        .append_layered(ctx.mount.root, RenderLayer::Bubbles, ElementKind::Group);
    ctx.stage.scene_mut().set_attr(group, "class", "bubbles");

    let mut bubbles = Vec::with_capacity(config.data.len());
    let mut targets = Vec::new();
    for datum in &config.data {
        let lon = record::number(datum, &config.lon).unwrap_or(f64::NAN);
        let lat = record::number(datum, &config.lat).unwrap_or(f64::NAN);
        let Some(center) = ctx.project(lon, lat) else {
            continue;
        };
        let radius = scale.apply(magnitude(datum));
        let initial = (radius * 0.25).max(3.0);

        let scene = ctx.stage.scene_mut();
        let marker = scene.append(group, ElementKind::Group);
        scene.set_attr(marker, "class", "m");
        scene.set_attr(
            marker,
            "transform",
            format!("translate({},{})", format_number(center.x()), format_number(center.y())),
        );

        let circle = scene.append(marker, ElementKind::Circle);
        scene.set_attr(circle, "r", initial);
        scene.set_attr(circle, "fill", config.style.fill);
        stroke.apply(scene, circle);

        let label = label_template.as_ref().map(|template| {
            let text = scene.append(marker, ElementKind::Text);
            scene.set_attr(text, "y", config.label.dy - initial);
            scene.set_attr(text, "text-anchor", config.label.anchor.clone());
            scene.set_attr(text, "fill", label_fill);
            scene.set_attr(text, "font-weight", f32::from(config.label.weight));
            scene.set_attr(text, "font-size", config.label.font_size);
            scene.set_text(text, template.render(datum));
            text
        });

        if let Some(template) = &tooltip_template {
            targets.push(Target {
                center,
                radius,
                html: template.render(datum),
            });
        }
        bubbles.push(Bubble {
            circle,
            label,
            radius,
        });
    }
    debug!(drawn = bubbles.len(), skipped = config.data.len() - bubbles.len(), max; "Bubbles drawn");

    if tooltip_template.is_some() {
        let tooltip = Rc::clone(&ctx.tooltip);
        ctx.stage.on_pointer(
            ctx.mount.svg,
            Box::new(move |event| hover(tooltip.as_ref(), &targets, event)),
        );
    }

    let grow_ms = ctx.timing.dur(config.anim.grow_ms);
    let label_ms = ctx.timing.dur(config.anim.label_ms);
    let ease = config.anim.ease;
    Ok(LayerBuild::new(LayerKind::Bubbles, move |stage: &mut Stage| {
        for bubble in bubbles {
            stage.transition(
                Transition::new(bubble.circle)
                    .attr("r", bubble.radius)
                    .duration(grow_ms)
                    .ease(ease),
            );
            if let Some(label) = bubble.label {
                stage.transition(
                    Transition::new(label)
                        .attr("y", -bubble.radius - LABEL_GAP)
                        .duration(label_ms)
                        .ease(Ease::CubicOut),
                );
            }
        }
        Ok(())
    }))
}

fn hover(tooltip: &dyn TooltipSink, targets: &[Target], event: &PointerEvent) {
    let PointerEvent::Move { local, page } = *event else {
        tooltip.hide();
        return;
    };
    let nearest = targets.iter().min_by(|a, b| {
        let da = a.center.distance(local) - a.radius;
        let db = b.center.distance(local) - b.radius;
        da.total_cmp(&db)
    });
    match nearest {
        Some(target) if target.center.distance(local) < target.radius + HOVER_SLACK => {
            tooltip.show(page, &target.html);
        }
        _ => tooltip.hide(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use serde_json::json;

    use crate::{layers::test_support, tooltip::RecordingTooltip};

    fn config(value: serde_json::Value) -> BubblesConfig {
        serde_json::from_value(value).unwrap()
    }

    fn circles(stage: &Stage, root: NodeId) -> Vec<NodeId> {
        let scene = stage.scene();
        scene
            .select_class(root, "m")
            .into_iter()
            .map(|m| scene.children(m)[0])
            .collect()
    }

    #[test]
    fn test_bubbles_grow_to_area_radius() {
        let (mut stage, mount) = test_support::stage();
        let config = config(json!({
            "data": [
                {"name": "Ashburn", "lon": -77.5, "lat": 39.05, "mw": 5000},
                {"name": "Dallas", "lon": -97.0, "lat": 32.9, "mw": 2600}
            ],
            "r": "mw",
            "rRange": [6, 58]
        }));
        let tooltip = Rc::new(RecordingTooltip::new());
        let build = {
            let mut ctx = test_support::context(&mut stage, mount, tooltip);
            build(&mut ctx, &config).unwrap()
        };
        let nodes = circles(&stage, mount.root);
        assert_eq!(nodes.len(), 2);
        assert!(approx_eq!(f32, stage.scene().number(nodes[0], "r").unwrap(), 14.5));

        (build.finalize)(&mut stage).unwrap();
        stage.advance(1400.0);
        let r0 = stage.scene().number(nodes[0], "r").unwrap();
        let r1 = stage.scene().number(nodes[1], "r").unwrap();
        assert!(approx_eq!(f32, r0, 58.0));
        assert!((r1 - 58.0 * (2600.0_f32 / 5000.0).sqrt()).abs() < 0.5);
    }

    #[test]
    fn test_labels_rise_above_grown_circle() {
        let (mut stage, mount) = test_support::stage();
        let config = config(json!({
            "data": [{"name": "A", "lon": 0, "lat": 0, "value": 100}],
            "rRange": [6, 20]
        }));
        let build = {
            let mut ctx = test_support::context(&mut stage, mount, Rc::new(RecordingTooltip::new()));
            build(&mut ctx, &config).unwrap()
        };
        let marker = stage.scene().select_class(mount.root, "m")[0];
        let label = stage.scene().children(marker)[1];
        assert_eq!(stage.scene().text(label), Some("A · 100"));
        assert_eq!(stage.scene().number(label, "y"), Some(-6.0 - 5.0));

        (build.finalize)(&mut stage).unwrap();
        stage.advance(1400.0);
        assert_eq!(stage.scene().number(label, "y"), Some(-26.0));
    }

    #[test]
    fn test_unprojectable_records_are_skipped() {
        let (mut stage, mount) = test_support::stage();
        let config = config(json!({
            "data": [
                {"name": "ok", "lon": 10, "lat": 10, "value": 1},
                {"name": "pole", "lon": 10, "lat": 95, "value": 1},
                {"name": "missing", "value": 1}
            ],
            "label": {"show": false}
        }));
        let mut ctx = test_support::context(&mut stage, mount, Rc::new(RecordingTooltip::new()));
        build(&mut ctx, &config).unwrap();
        assert_eq!(circles(&stage, mount.root).len(), 1);
    }

    #[test]
    fn test_tooltip_follows_nearest_bubble() {
        let (mut stage, mount) = test_support::stage();
        let config = config(json!({
            "data": [{"name": "Phoenix", "lon": 0, "lat": 0, "value": 1200}],
            "rRange": [6, 20]
        }));
        let tooltip = Rc::new(RecordingTooltip::new());
        {
            let mut ctx = test_support::context(&mut stage, mount, Rc::clone(&tooltip));
            build(&mut ctx, &config).unwrap();
        }

        // The bubble sits at (180, 90) with radius 20.
        stage.pointer_move("#c", Point::new(200.0, 90.0));
        let shown = tooltip.current().unwrap();
        assert_eq!(shown.html, "<strong>Phoenix</strong><br/>1,200");
        assert_eq!(shown.position, Point::new(200.0, 90.0));

        stage.pointer_move("#c", Point::new(215.0, 90.0));
        assert!(!tooltip.is_visible());

        stage.pointer_move("#c", Point::new(181.0, 90.0));
        assert!(tooltip.is_visible());
        stage.pointer_leave("#c");
        assert!(!tooltip.is_visible());
    }

    #[test]
    fn test_disabled_tooltip_installs_no_handler() {
        let (mut stage, mount) = test_support::stage();
        let config = config(json!({
            "data": [{"name": "A", "lon": 0, "lat": 0, "value": 1}],
            "tooltip": false
        }));
        {
            let mut ctx = test_support::context(&mut stage, mount, Rc::new(RecordingTooltip::new()));
            build(&mut ctx, &config).unwrap();
        }
        assert!(!stage.pointer_move("#c", Point::new(180.0, 90.0)));
    }
}
