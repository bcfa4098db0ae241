//! Radial plumes around sites.
//!
//! Each site gets its own radial gradient and a dashed outline colored by
//! intensity. On reveal a plume first grows to its dispersion radius, and
//! only then do its dashes settle.

use log::debug;

use geodeck_core::{
    anim::{Ease, Transition},
    draw::{ElementKind, RenderLayer, StrokeDefinition},
    scale::ColorRamp,
};

use crate::{chart_config::PlumesConfig, error::GeoError, stage::Stage};

use super::{DrawContext, LayerBuild, LayerKind};

/// Dash offset the outline starts from.
const DASH_START: f32 = 20.0;

/// Final radius of a plume with dispersion `disp`.
pub fn final_radius(disp: f32) -> f32 {
    40.0 + disp * 60.0
}

/// Radius a plume starts from.
pub fn initial_radius(disp: f32) -> f32 {
    (final_radius(disp) * 0.55).max(10.0)
}

/// Label text of a named site.
pub fn label_text(name: &str, ej: f32) -> String {
    format!("{name} · EJ {}pctl", (ej * 100.0).round() as i64)
}

/// Draws the gradients, outlines and labels at their initial radius.
///
/// Sites without a projectable position are skipped.
pub fn build(ctx: &mut DrawContext<'_>, config: &PlumesConfig) -> Result<LayerBuild, GeoError> {
    let root = ctx.mount.root;
    let defs = ctx
        .stage
        .scene_mut()
        .append_layered(root, RenderLayer::Defs, ElementKind::Definitions);

    let mut plumes = Vec::with_capacity(config.sites.len());
    for (i, site) in config.sites.iter().enumerate() {
        let Some(center) = ctx.project(site.lon, site.lat) else {
            continue;
        };
        let id = format!("plume-{}-{i}", ctx.chart_id);
        let r_final = final_radius(site.disp);
        let r_init = initial_radius(site.disp);
        let ink = ctx.theme.ink;

        let scene = ctx.stage.scene_mut();
        let gradient = scene.append(defs, ElementKind::RadialGradient);
        scene.set_attr(gradient, "id", id.clone());
        for stop in &config.stops {
            let node = scene.append(gradient, ElementKind::Stop);
            scene.set_attr(node, "offset", stop.offset.clone());
            scene.set_attr(node, "stop-color", stop.color);
        }

        let outline = config
            .stroke
            .unwrap_or_else(|| ColorRamp::Plasma.sample(site.ej * 0.8));
        let mut stroke = StrokeDefinition::dashed_pattern(outline, 1.5, "6 8");
        stroke.set_opacity(0.5);

        let circle = scene.append_layered(root, RenderLayer::Plumes, ElementKind::Circle);
        scene.set_attr(circle, "class", "plume");
        scene.set_attr(circle, "cx", center.x());
        scene.set_attr(circle, "cy", center.y());
        scene.set_attr(circle, "r", r_init);
        scene.set_attr(circle, "fill", format!("url(#{id})"));
        stroke.apply(scene, circle);
        scene.set_attr(circle, "stroke-dashoffset", DASH_START);

        let label = site.name.as_deref().map(|name| {
            let text = scene.append_layered(root, RenderLayer::Plumes, ElementKind::Text);
            scene.set_attr(text, "class", "plume-label");
            scene.set_attr(text, "x", center.x() + r_init / 2.0 + 6.0);
            scene.set_attr(text, "y", center.y() - r_init / 2.0 - 6.0);
            scene.set_attr(text, "fill", ink);
            scene.set_attr(text, "font-size", 13.0);
            scene.set_attr(text, "font-weight", 600.0);
            scene.set_text(text, label_text(name, site.ej));
            text
        });

        plumes.push((circle, label, center, r_final));
    }
    debug!(drawn = plumes.len(), sites = config.sites.len(); "Plumes drawn");

    let grow_ms = ctx.timing.dur(config.anim.grow_ms);
    let dash_ms = ctx.timing.dur(config.anim.dash_ms);
    Ok(LayerBuild::new(LayerKind::Plumes, move |stage: &mut Stage| {
        for (circle, label, center, r_final) in plumes {
            stage.transition(
                Transition::new(circle)
                    .attr("r", r_final)
                    .duration(grow_ms)
                    .ease(Ease::CubicOut)
                    .on_end(move |stage: &mut Stage| {
                        stage.transition(
                            Transition::new(circle)
                                .attr("stroke-dashoffset", 0.0)
                                .duration(dash_ms)
                                .ease(Ease::CubicInOut),
                        );
                    }),
            );
            if let Some(label) = label {
                stage.transition(
                    Transition::new(label)
                        .attr("x", center.x() + r_final / 2.0 + 6.0)
                        .attr("y", center.y() - r_final / 2.0 - 6.0)
                        .duration(grow_ms)
                        .ease(Ease::CubicOut),
                );
            }
        }
        Ok(())
    }))
}
