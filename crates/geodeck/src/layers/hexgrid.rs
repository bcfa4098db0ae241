//! Hex-binned density field over the whole chart.
//!
//! A staggered grid of hexagons covers the output area. Each hexagon takes
//! the mean value of the samples within the influence radius of its center
//! and is colored on a three-stop scale once the chart is revealed, sweeping
//! in column by column.

use std::f32::consts::PI;

use log::debug;

use geodeck_core::{
    anim::Transition,
    color::Color,
    draw::{ElementKind, PathData, RenderLayer},
    geometry::{Point, Size},
    scale::ColorScale,
};

use crate::{chart_config::HexgridConfig, error::GeoError, record, stage::Stage};

use super::{DrawContext, LayerBuild, LayerKind};

/// Vertical row pitch relative to the horizontal spacing.
const ROW_PITCH: f32 = 0.86;
/// Largest grid a chart will draw.
const MAX_CELLS: usize = 20_000;

/// One cell of the hex grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexCell {
    pub center: Point,
    pub column: usize,
}

/// Lays out a grid covering `size` with a margin of two cells.
///
/// Odd rows shift right by half a spacing.
pub fn grid(size: Size, spacing: f32) -> Vec<HexCell> {
    let (cols, rows) = dimensions(size, spacing);
    let (cols, rows) = (cols as usize, rows as usize);
    let mut cells = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        let y = row as f32 * spacing * ROW_PITCH;
        let offset = (row % 2) as f32 * spacing / 2.0;
        for column in 0..cols {
            cells.push(HexCell {
                center: Point::new(column as f32 * spacing + offset, y),
                column,
            });
        }
    }
    cells
}

/// Column and row counts of the grid covering `size`.
fn dimensions(size: Size, spacing: f32) -> (f64, f64) {
    let spacing = f64::from(spacing);
    let cols = (f64::from(size.width()) / spacing).ceil() + 2.0;
    let rows = (f64::from(size.height()) / (spacing * f64::from(ROW_PITCH))).ceil() + 2.0;
    (cols, rows)
}

/// Mean value of the samples strictly within `influence` of `center`, or 0
/// when none are.
pub fn cell_value(center: Point, samples: &[(Point, f32)], influence: f32) -> f32 {
    let (sum, count) = samples
        .iter()
        .filter(|(position, _)| position.distance(center) < influence)
        .fold((0.0_f32, 0_usize), |(sum, count), (_, value)| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f32 }
}

fn hexagon(center: Point, radius: f32) -> PathData {
    let corners: Vec<Point> = (0..6)
        .map(|i| {
            let angle = PI / 3.0 * i as f32;
            Point::new(center.x() + radius * angle.cos(), center.y() + radius * angle.sin())
        })
        .collect();
    PathData::new().ring(&corners)
}

/// Draws the grid in the color of 0 and optional sample labels.
///
/// # Errors
///
/// Returns [`GeoError::Layer`] for a non-positive spacing or one so small the
/// grid would exceed 20 000 cells, and [`GeoError::Config`] if the colors do
/// not form a three-stop scale.
pub fn build(ctx: &mut DrawContext<'_>, config: &HexgridConfig) -> Result<LayerBuild, GeoError> {
    if !(config.spacing > 0.0) {
        return Err(GeoError::layer(
            LayerKind::Hexgrid.name(),
            format!("spacing must be positive, got {}", config.spacing),
        ));
    }
    let (cols, rows) = dimensions(ctx.mount.size, config.spacing);
    if !(cols * rows <= MAX_CELLS as f64) {
        return Err(GeoError::layer(
            LayerKind::Hexgrid.name(),
            format!("spacing {} needs a {cols} by {rows} grid, more than {MAX_CELLS} cells", config.spacing),
        ));
    }

    let projected: Vec<(Point, &record::Record)> = config
        .points
        .iter()
        .filter_map(|p| {
            let lon = record::number(p, "lon")?;
            let lat = record::number(p, "lat")?;
            Some((ctx.project(lon, lat)?, p))
        })
        .collect();
    let samples: Vec<(Point, f32)> = projected
        .iter()
        .filter_map(|(position, p)| {
            let value = record::number(p, &config.value_key)? as f32;
            value.is_finite().then_some((*position, value))
        })
        .collect();

    let cells = grid(ctx.mount.size, config.spacing);
    let values: Vec<f32> = cells
        .iter()
        .map(|cell| cell_value(cell.center, &samples, config.influence))
        .collect();
    let max = values.iter().copied().fold(0.0_f32, f32::max);
    let max = if max > 0.0 { max } else { 1.0 };
    let color = ColorScale::new(vec![0.0, max * 0.5, max], config.colors.clone())?;
    let initial = color.apply(0.0);
    let edge = Color::new("rgba(255,255,255,.06)").unwrap_or_default();

    let group = ctx
        .stage
        .scene_mut()
        .append_layered(ctx.mount.root, RenderLayer::Hexgrid, ElementKind::Group);
    ctx.stage.scene_mut().set_attr(group, "class", "hexgrid");

    let mut hexes = Vec::with_capacity(cells.len());
    for (cell, value) in cells.iter().zip(&values) {
        let scene = ctx.stage.scene_mut();
        let hex = scene.append(group, ElementKind::Path);
        scene.set_attr(hex, "class", "hex");
        scene.set_attr(hex, "d", hexagon(cell.center, config.hex_r).to_string());
        scene.set_attr(hex, "fill", initial);
        scene.set_attr(hex, "stroke", edge);
        scene.set_attr(hex, "opacity", 0.95);
        hexes.push((hex, cell.column, color.apply(*value)));
    }

    if let Some(template) = &config.label_fmt {
        let ink = ctx.theme.ink;
        let scene = ctx.stage.scene_mut();
        let labels = scene.append_layered(ctx.mount.root, RenderLayer::HexLabels, ElementKind::Group);
        for (position, point) in &projected {
            let text = scene.append(labels, ElementKind::Text);
            scene.set_attr(text, "class", "mlbl");
            scene.set_attr(text, "x", position.x() + 8.0);
            scene.set_attr(text, "y", position.y() - 8.0);
            scene.set_attr(text, "fill", ink);
            scene.set_attr(text, "font-size", 12.0);
            scene.set_attr(text, "font-weight", 600.0);
            scene.set_text(text, template.render(point));
        }
    }
    debug!(cells = cells.len(), samples = samples.len(), max; "Hexgrid drawn");

    let draw_ms = ctx.timing.dur(config.anim.draw_ms);
    let wave_ms = config.anim.wave_ms;
    Ok(LayerBuild::new(LayerKind::Hexgrid, move |stage: &mut Stage| {
        for (hex, column, fill) in hexes {
            stage.transition(
                Transition::new(hex)
                    .attr("fill", fill)
                    .delay(column as f64 * wave_ms)
                    .duration(draw_ms),
            );
        }
        Ok(())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use float_cmp::approx_eq;
    use proptest::prelude::*;
    use serde_json::json;

    use crate::{layers::test_support, tooltip::RecordingTooltip};

    #[test]
    fn test_grid_dimensions() {
        let cells = grid(Size::new(1200.0, 720.0), 40.0);
        // 32 columns, 23 rows
        assert_eq!(cells.len(), 32 * 23);
        assert_eq!(cells[0].center, Point::new(0.0, 0.0));
        assert_eq!(cells[32].center.x(), 20.0);
        assert!(approx_eq!(f32, cells[32].center.y(), 34.4));
        assert_eq!(cells[33].column, 1);
    }

    #[test]
    fn test_cell_value_single_sample_is_exact() {
        let samples = [(Point::new(10.0, 0.0), 3.25)];
        assert_eq!(cell_value(Point::new(0.0, 0.0), &samples, 80.0), 3.25);
    }

    #[test]
    fn test_cell_value_without_samples_is_zero() {
        let samples = [(Point::new(100.0, 0.0), 3.25)];
        assert_eq!(cell_value(Point::new(0.0, 0.0), &samples, 80.0), 0.0);
        // Exactly on the influence radius does not count.
        assert_eq!(cell_value(Point::new(20.0, 0.0), &samples, 80.0), 0.0);
    }

    #[test]
    fn test_cell_value_mean() {
        let samples = [(Point::new(1.0, 0.0), 2.0), (Point::new(0.0, 1.0), 4.0)];
        assert_eq!(cell_value(Point::new(0.0, 0.0), &samples, 5.0), 3.0);
    }

    #[test]
    fn test_labels_and_empty_field() {
        let (mut stage, mount) = test_support::stage();
        // (-160, 90) projects to (20, 0), more than 10px from every center.
        let config: HexgridConfig = serde_json::from_value(json!({
            "points": [{"name": "Mid", "lon": -160, "lat": 90, "burden": 4.2}],
            "influence": 10,
            "colors": ["#000000", "#808080", "#ffffff"],
            "labelFmt": "{name} · {burden:.2}%"
        }))
        .unwrap();
        let build = {
            let mut ctx = test_support::context(&mut stage, mount, Rc::new(RecordingTooltip::new()));
            build(&mut ctx, &config).unwrap()
        };

        let label = stage.scene().select_class(mount.root, "mlbl")[0];
        assert_eq!(stage.scene().text(label), Some("Mid · 4.20%"));
        assert!(approx_eq!(f32, stage.scene().number(label, "x").unwrap(), 28.0, epsilon = 1e-3));
        assert!(approx_eq!(f32, stage.scene().number(label, "y").unwrap(), -8.0, epsilon = 1e-3));

        let hexes = stage.scene().select_class(mount.root, "hex");
        assert_eq!(hexes.len(), grid(Size::new(360.0, 180.0), 40.0).len());
        let black = Color::new("#000000").unwrap();
        (build.finalize)(&mut stage).unwrap();
        stage.advance(1000.0);
        assert!(hexes.iter().all(|h| stage.scene().color(*h, "fill") == Some(black)));
    }

    #[test]
    fn test_sample_on_cell_center_colors_it_fully() {
        let (mut stage, mount) = test_support::stage();
        // (-140, 90) projects to (40, 0), the center of column 1 in row 0.
        let config: HexgridConfig = serde_json::from_value(json!({
            "points": [{"lon": -140, "lat": 90, "burden": 2}],
            "influence": 10,
            "colors": ["#000000", "#808080", "#ffffff"]
        }))
        .unwrap();
        let build = {
            let mut ctx = test_support::context(&mut stage, mount, Rc::new(RecordingTooltip::new()));
            build(&mut ctx, &config).unwrap()
        };
        let hexes = stage.scene().select_class(mount.root, "hex");
        (build.finalize)(&mut stage).unwrap();
        stage.advance(800.0 + 8.0);

        let white = Color::new("#ffffff").unwrap();
        let hot: Vec<_> = hexes
            .iter()
            .filter(|h| stage.scene().color(**h, "fill") == Some(white))
            .collect();
        assert_eq!(hot.len(), 1);
        assert_eq!(*hot[0], hexes[1]);
    }

    #[test]
    fn test_non_positive_spacing_is_rejected() {
        let (mut stage, mount) = test_support::stage();
        let config = HexgridConfig {
            spacing: 0.0,
            ..HexgridConfig::default()
        };
        let mut ctx = test_support::context(&mut stage, mount, Rc::new(RecordingTooltip::new()));
        assert!(matches!(build(&mut ctx, &config), Err(GeoError::Layer { .. })));
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let (mut stage, mount) = test_support::stage();
        let config = HexgridConfig {
            spacing: 0.01,
            ..HexgridConfig::default()
        };
        {
            let mut ctx = test_support::context(&mut stage, mount, Rc::new(RecordingTooltip::new()));
            assert!(matches!(build(&mut ctx, &config), Err(GeoError::Layer { .. })));
        }
        assert!(stage.scene().select_class(mount.root, "hex").is_empty());
    }

    proptest! {
        #[test]
        fn test_cell_value_within_sample_range(values in prop::collection::vec(0.0f32..100.0, 1..8)) {
            let samples: Vec<(Point, f32)> = values
                .iter()
                .enumerate()
                .map(|(i, v)| (Point::new(i as f32, 0.0), *v))
                .collect();
            let value = cell_value(Point::new(0.0, 0.0), &samples, 50.0);
            let min = values.iter().copied().fold(f32::INFINITY, f32::min);
            let max = values.iter().copied().fold(0.0, f32::max);
            prop_assert!(value >= min - 1e-3 && value <= max + 1e-3);
        }
    }
}
