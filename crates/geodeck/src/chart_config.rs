//! Declarative geo chart configuration.
//!
//! A [`GeoChartConfig`] is deserialized once from a chart's JSON props.
//! Every field is optional; missing fields take the defaults documented on
//! each type, and unknown keys are ignored. Layer sections are decoded
//! independently: a malformed layer (or basemap choropleth) is logged and
//! left out without affecting the others.

use std::{fmt, rc::Rc};

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use geodeck_core::{anim::Ease, color::Color, geometry::Size};

use crate::{error::GeoError, projection::ProjectionSpec, record::Record, template::Template};

/// Default boundary topology URL.
pub const DEFAULT_BASEMAP_URL: &str = "https://cdn.jsdelivr.net/npm/us-atlas@3/states-10m.json";

fn color(css: &str) -> Color {
    Color::new(css).unwrap_or_default()
}

/// Full configuration of one geo chart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeoChartConfig {
    pub width: f32,
    pub height: f32,
    pub projection: ProjectionSpec,
    pub basemap: BasemapConfig,
    pub layers: LayersConfig,
    pub anim: AnimConfig,
}

impl Default for GeoChartConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 720.0,
            projection: ProjectionSpec::default(),
            basemap: BasemapConfig::default(),
            layers: LayersConfig::default(),
            anim: AnimConfig::default(),
        }
    }
}

impl GeoChartConfig {
    /// Decodes a configuration from JSON props.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Json`] if a top-level field has the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, GeoError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the output size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Global reveal animation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimConfig {
    /// Nominal fade-in duration, scaled by the global speed.
    pub fade_ms: f64,
    pub ease: Ease,
    /// Visible fraction of the scene that triggers the reveal.
    pub threshold: f32,
}

impl Default for AnimConfig {
    fn default() -> Self {
        Self {
            fade_ms: 700.0,
            ease: Ease::CubicOut,
            threshold: 0.45,
        }
    }
}

/// Basemap boundaries and styling.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasemapConfig {
    pub url: String,
    /// Name of the topology object holding the regions.
    pub object: String,
    pub sphere_fill: Color,
    pub state_fill: Color,
    pub state_stroke: Color,
    pub state_stroke_width: f32,
    /// A malformed choropleth is dropped, leaving the plain basemap.
    #[serde(deserialize_with = "lenient_choropleth")]
    pub choropleth: Option<ChoroplethConfig>,
}

impl Default for BasemapConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASEMAP_URL.to_string(),
            object: "states".to_string(),
            sphere_fill: color("rgba(255,255,255,0)"),
            state_fill: color("rgba(255,255,255,.35)"),
            state_stroke: color("rgba(255,255,255,.12)"),
            state_stroke_width: 0.6,
            choropleth: None,
        }
    }
}

/// A caller-supplied mapping from region value to fill color.
#[derive(Clone)]
pub struct ColorFn(Rc<dyn Fn(f32) -> Color>);

impl ColorFn {
    /// Wraps a color function.
    pub fn new(f: impl Fn(f32) -> Color + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Maps a value to a color.
    pub fn apply(&self, value: f32) -> Color {
        (self.0)(value)
    }
}

impl fmt::Debug for ColorFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ColorFn(..)")
    }
}

/// Linear color scale stops.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColorScaleConfig {
    pub domain: Vec<f32>,
    pub range: Vec<Color>,
}

impl Default for ColorScaleConfig {
    fn default() -> Self {
        Self {
            domain: vec![0.0, 1.0],
            range: vec![color("#1f2a44"), color("#ef5d60")],
        }
    }
}

/// Region fills driven by per-region values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChoroplethConfig {
    /// Value per region name.
    pub value_by_name: IndexMap<String, f64>,
    pub color: ColorScaleConfig,
    /// Overrides `color` when set.
    #[serde(skip)]
    pub color_fn: Option<ColorFn>,
    /// Value used for regions absent from `value_by_name`.
    pub missing: f64,
    /// Delay between consecutive regions' fill transitions.
    pub stagger_ms: f64,
    /// Hover title of each region, rendered against `name`, `value` and
    /// `pctl` (the value as a whole percentile).
    pub title: Option<Template>,
    /// Marching outline around high-valued regions.
    pub outline: Option<OutlineConfig>,
}

/// Dashed outline drawn over regions whose value reaches `threshold`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutlineConfig {
    pub threshold: f64,
    pub stroke: Color,
    pub stroke_opacity: f32,
    pub stroke_width: f32,
    pub dasharray: String,
    /// Milliseconds per pixel of dash offset.
    pub speed: f64,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            stroke: color("#e34a33"),
            stroke_opacity: 0.85,
            stroke_width: 1.8,
            dasharray: "6 8".to_string(),
            speed: 70.0,
        }
    }
}

/// Per-layer configuration. Absent layers are not drawn.
#[derive(Debug, Clone, Default)]
pub struct LayersConfig {
    pub bubbles: Option<BubblesConfig>,
    pub flow: Option<FlowConfig>,
    pub hexgrid: Option<HexgridConfig>,
    pub plumes: Option<PlumesConfig>,
    pub rings: Option<RingsConfig>,
}

impl LayersConfig {
    /// Returns `true` if no layer is configured.
    pub fn is_empty(&self) -> bool {
        self.bubbles.is_none()
            && self.flow.is_none()
            && self.hexgrid.is_none()
            && self.plumes.is_none()
            && self.rings.is_none()
    }
}

fn layer<T: for<'de> Deserialize<'de>>(raw: &mut IndexMap<String, Value>, name: &str) -> Option<T> {
    lenient(raw.shift_remove(name)?, name)
}

/// Decodes an optional layer, logging and dropping it when malformed.
fn lenient<T: for<'de> Deserialize<'de>>(value: Value, name: &str) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(config) => Some(config),
        Err(err) => {
            warn!(layer = name, err:%; "Ignoring malformed layer configuration");
            None
        }
    }
}

fn lenient_choropleth<'de, D>(deserializer: D) -> Result<Option<ChoroplethConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient(Value::deserialize(deserializer)?, "choropleth"))
}

impl<'de> Deserialize<'de> for LayersConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            bubbles: layer(&mut raw, "bubbles"),
            flow: layer(&mut raw, "flow"),
            hexgrid: layer(&mut raw, "hexgrid"),
            plumes: layer(&mut raw, "plumes"),
            rings: layer(&mut raw, "rings"),
        })
    }
}

/// Tooltip behavior: enabled with the default text, disabled, or a template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TooltipSetting {
    Enabled(bool),
    Template(Template),
}

impl Default for TooltipSetting {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

/// Circle style of the bubble layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BubbleStyle {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f32,
}

impl Default for BubbleStyle {
    fn default() -> Self {
        Self {
            fill: color("rgba(247,178,103,.25)"),
            stroke: color("rgba(247,157,101,1)"),
            stroke_width: 1.6,
        }
    }
}

/// Bubble label options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BubbleLabel {
    pub show: bool,
    /// Defaults to `"{name} · {<value field>}"`.
    pub text: Option<Template>,
    /// Offset above the initial circle edge.
    pub dy: f32,
    pub anchor: String,
    pub font_size: f32,
    /// Defaults to the theme ink.
    pub color: Option<Color>,
    pub weight: u16,
}

impl Default for BubbleLabel {
    fn default() -> Self {
        Self {
            show: true,
            text: None,
            dy: -6.0,
            anchor: "middle".to_string(),
            font_size: 14.0,
            color: None,
            weight: 600,
        }
    }
}

/// Bubble entrance animation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BubbleAnim {
    pub grow_ms: f64,
    pub label_ms: f64,
    pub ease: Ease,
}

impl Default for BubbleAnim {
    fn default() -> Self {
        Self {
            grow_ms: 1400.0,
            label_ms: 1200.0,
            ease: Ease::CubicOut,
        }
    }
}

/// Point bubbles sized by a magnitude field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BubblesConfig {
    pub data: Vec<Record>,
    /// Longitude field name.
    pub lon: String,
    /// Latitude field name.
    pub lat: String,
    /// Magnitude field name.
    pub r: String,
    pub r_range: [f32; 2],
    pub style: BubbleStyle,
    pub label: BubbleLabel,
    pub tooltip: TooltipSetting,
    pub anim: BubbleAnim,
}

impl Default for BubblesConfig {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            lon: "lon".to_string(),
            lat: "lat".to_string(),
            r: "value".to_string(),
            r_range: [6.0, 36.0],
            style: BubbleStyle::default(),
            label: BubbleLabel::default(),
            tooltip: TooltipSetting::default(),
            anim: BubbleAnim::default(),
        }
    }
}

impl BubblesConfig {
    /// Returns the label template, falling back to `"{name} · {<r>}"`.
    pub fn label_template(&self) -> Template {
        self.label
            .text
            .clone()
            .unwrap_or_else(|| Template::new(format!("{{name}} · {{{}}}", self.r)))
    }

    /// Returns the tooltip template, or `None` when tooltips are disabled.
    pub fn tooltip_template(&self) -> Option<Template> {
        match &self.tooltip {
            TooltipSetting::Enabled(false) => None,
            TooltipSetting::Enabled(true) => Some(Template::new(format!(
                "<strong>{{name}}</strong><br/>{{{}:,}}",
                self.r
            ))),
            TooltipSetting::Template(template) => Some(template.clone()),
        }
    }
}

/// A named flow endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlowNode {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

/// A directed flow edge: `(source name, target name, magnitude in [0, 1])`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlowEdge(pub String, pub String, pub f64);

/// Hub and generator circle radii.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeRadii {
    pub hub: f32,
    #[serde(rename = "gen")]
    pub generator: f32,
}

impl Default for NodeRadii {
    fn default() -> Self {
        Self {
            hub: 4.5,
            generator: 3.5,
        }
    }
}

/// Hub and generator fills. The hub fill defaults to the theme brand color.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeFills {
    pub hub: Option<Color>,
    #[serde(rename = "gen")]
    pub generator: Color,
}

impl Default for NodeFills {
    fn default() -> Self {
        Self {
            hub: None,
            generator: color("#fff"),
        }
    }
}

/// Node label options shared by the flow layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeLabel {
    pub show: bool,
    pub font_size: f32,
    pub color: Option<Color>,
    pub weight: u16,
}

impl Default for NodeLabel {
    fn default() -> Self {
        Self {
            show: true,
            font_size: 12.0,
            color: None,
            weight: 600,
        }
    }
}

/// Flow entrance animation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowAnim {
    pub node_ms: f64,
}

impl Default for FlowAnim {
    fn default() -> Self {
        Self { node_ms: 600.0 }
    }
}

/// Animated flow arcs between named hubs and generators.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowConfig {
    pub hubs: Vec<FlowNode>,
    pub gens: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    pub curve_beta: f32,
    /// Milliseconds per dash-offset unit of the marching animation.
    pub dash_speed: f64,
    pub node_r: NodeRadii,
    pub node_fill: NodeFills,
    pub label: NodeLabel,
    pub anim: FlowAnim,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            hubs: Vec::new(),
            gens: Vec::new(),
            edges: Vec::new(),
            curve_beta: 0.8,
            dash_speed: 60.0,
            node_r: NodeRadii::default(),
            node_fill: NodeFills::default(),
            label: NodeLabel::default(),
            anim: FlowAnim::default(),
        }
    }
}

/// Hexgrid entrance animation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HexAnim {
    pub draw_ms: f64,
    /// Delay per grid column.
    pub wave_ms: f64,
}

impl Default for HexAnim {
    fn default() -> Self {
        Self {
            draw_ms: 800.0,
            wave_ms: 8.0,
        }
    }
}

/// Hex-binned density field over the whole output area.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HexgridConfig {
    pub points: Vec<Record>,
    pub value_key: String,
    pub spacing: f32,
    pub hex_r: f32,
    /// Screen-space radius within which samples contribute to a hex.
    pub influence: f32,
    /// Low, middle and high colors.
    pub colors: Vec<Color>,
    /// Labels drawn at sample points when set.
    pub label_fmt: Option<Template>,
    pub anim: HexAnim,
}

impl Default for HexgridConfig {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            value_key: "burden".to_string(),
            spacing: 40.0,
            hex_r: 14.0,
            influence: 80.0,
            colors: vec![color("#20334f"), color("#f7dda6"), color("#ef5d60")],
            label_fmt: None,
            anim: HexAnim::default(),
        }
    }
}

/// A plume site.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlumeSite {
    pub name: Option<String>,
    pub lon: f64,
    pub lat: f64,
    /// Intensity in `[0, 1]`.
    pub ej: f32,
    /// Dispersion in `[0, 1]`.
    pub disp: f32,
}

impl Default for PlumeSite {
    fn default() -> Self {
        Self {
            name: None,
            lon: f64::NAN,
            lat: f64::NAN,
            ej: 0.0,
            disp: 0.0,
        }
    }
}

/// One radial gradient stop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GradientStop {
    pub offset: String,
    pub color: Color,
}

/// Plume entrance animation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlumeAnim {
    pub grow_ms: f64,
    pub dash_ms: f64,
}

impl Default for PlumeAnim {
    fn default() -> Self {
        Self {
            grow_ms: 900.0,
            dash_ms: 1300.0,
        }
    }
}

/// Radial plumes around sites.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlumesConfig {
    pub sites: Vec<PlumeSite>,
    /// Outline color; defaults to the plasma ramp at `ej × 0.8`.
    pub stroke: Option<Color>,
    pub stops: Vec<GradientStop>,
    pub anim: PlumeAnim,
}

impl Default for PlumesConfig {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            stroke: None,
            stops: vec![
                GradientStop {
                    offset: "0%".to_string(),
                    color: color("rgba(255,255,255,.9)"),
                },
                GradientStop {
                    offset: "100%".to_string(),
                    color: color("rgba(255,255,255,0)"),
                },
            ],
            anim: PlumeAnim::default(),
        }
    }
}

/// A ring location with an optional explicit radius.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RingPoint {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub r: Option<f32>,
}

/// Dashed rings marching around points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RingsConfig {
    pub points: Vec<RingPoint>,
    /// Defaults to the theme ink.
    pub stroke: Option<Color>,
    /// Milliseconds per dash-offset unit.
    pub speed: f64,
    pub r_domain: [f32; 2],
    pub r_range: [f32; 2],
}

impl Default for RingsConfig {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            stroke: None,
            speed: 70.0,
            r_domain: [0.0, 10000.0],
            r_range: [6.0, 72.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = GeoChartConfig::from_value(json!({})).unwrap();
        assert_eq!(config.width, 1200.0);
        assert_eq!(config.height, 720.0);
        assert_eq!(config.basemap.url, DEFAULT_BASEMAP_URL);
        assert_eq!(config.basemap.object, "states");
        assert_eq!(config.anim, AnimConfig::default());
        assert!(config.layers.is_empty());
        assert!(config.basemap.choropleth.is_none());
    }

    #[test]
    fn test_camel_case_fields() {
        let config = GeoChartConfig::from_value(json!({
            "width": 800,
            "projection": "equirectangular",
            "basemap": {"stateStrokeWidth": 1.5, "choropleth": {"valueByName": {"X": 1}, "staggerMs": 24}},
            "anim": {"fadeMs": 50, "ease": "linear", "threshold": 0.5}
        }))
        .unwrap();
        assert_eq!(config.width, 800.0);
        assert!(matches!(config.projection, ProjectionSpec::Equirectangular));
        assert_eq!(config.basemap.state_stroke_width, 1.5);
        let choropleth = config.basemap.choropleth.unwrap();
        assert_eq!(choropleth.value_by_name.get("X"), Some(&1.0));
        assert_eq!(choropleth.stagger_ms, 24.0);
        assert_eq!(choropleth.color, ColorScaleConfig::default());
        assert_eq!(config.anim.ease, Ease::Linear);
        assert_eq!(config.anim.fade_ms, 50.0);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = GeoChartConfig::from_value(json!({
            "title": "x",
            "layers": {"heatmap": {"cells": []}, "rings": {"points": [{"lon": 1, "lat": 2}]}}
        }))
        .unwrap();
        assert_eq!(config.layers.rings.unwrap().points.len(), 1);
    }

    #[test]
    fn test_malformed_layer_is_dropped_alone() {
        let config = GeoChartConfig::from_value(json!({
            "layers": {
                "flow": {"edges": "not a list"},
                "bubbles": {"data": [{"lon": -77.5, "lat": 39.05, "value": 5}]}
            }
        }))
        .unwrap();
        assert!(config.layers.flow.is_none());
        assert_eq!(config.layers.bubbles.unwrap().data.len(), 1);
    }

    #[test]
    fn test_malformed_choropleth_keeps_basemap_and_layers() {
        let config = GeoChartConfig::from_value(json!({
            "basemap": {"url": "states.json", "choropleth": {"valueByName": {"X": "high"}}},
            "layers": {"bubbles": {"data": []}}
        }))
        .unwrap();
        assert!(config.basemap.choropleth.is_none());
        assert_eq!(config.basemap.url, "states.json");
        assert!(config.layers.bubbles.is_some());

        let explicit_null = GeoChartConfig::from_value(json!({"basemap": {"choropleth": null}})).unwrap();
        assert!(explicit_null.basemap.choropleth.is_none());
    }

    #[test]
    fn test_choropleth_outline_and_title() {
        let choropleth: ChoroplethConfig = serde_json::from_value(json!({
            "title": "{name} {pctl}",
            "outline": {"threshold": 0.5}
        }))
        .unwrap();
        assert_eq!(choropleth.title.map(|t| t.source().to_string()), Some("{name} {pctl}".to_string()));
        let outline = choropleth.outline.unwrap();
        assert_eq!(outline.threshold, 0.5);
        assert_eq!(outline.dasharray, "6 8");
        assert_eq!(outline.speed, 70.0);
        assert!(ChoroplethConfig::default().outline.is_none());
    }

    #[test]
    fn test_flow_edges_from_tuples() {
        let flow: FlowConfig = serde_json::from_value(json!({
            "hubs": [{"name": "A", "lon": -100, "lat": 40}],
            "edges": [["A", "B", 0.9]],
            "nodeR": {"hub": 6}
        }))
        .unwrap();
        assert_eq!(flow.edges[0], FlowEdge("A".into(), "B".into(), 0.9));
        assert_eq!(flow.node_r.hub, 6.0);
        assert_eq!(flow.node_r.generator, 3.5);
        assert_eq!(flow.curve_beta, 0.8);
    }

    #[test]
    fn test_bubble_templates() {
        let bubbles = BubblesConfig {
            r: "mw".to_string(),
            ..BubblesConfig::default()
        };
        assert_eq!(bubbles.label_template().source(), "{name} · {mw}");
        assert_eq!(
            bubbles.tooltip_template().unwrap().source(),
            "<strong>{name}</strong><br/>{mw:,}"
        );

        let disabled: BubblesConfig = serde_json::from_value(json!({"tooltip": false})).unwrap();
        assert!(disabled.tooltip_template().is_none());

        let custom: BubblesConfig = serde_json::from_value(json!({"tooltip": "{name}!"})).unwrap();
        assert_eq!(custom.tooltip_template().unwrap().source(), "{name}!");
    }

    #[test]
    fn test_invalid_color_is_an_error() {
        let result = GeoChartConfig::from_value(json!({"basemap": {"stateFill": "nope"}}));
        assert!(matches!(result, Err(GeoError::Json(_))));
    }

    #[test]
    fn test_color_fn() {
        let f = ColorFn::new(|v| if v > 0.5 { Color::default() } else { color("#fff") });
        assert_eq!(f.apply(1.0), Color::default());
        assert_eq!(format!("{f:?}"), "ColorFn(..)");
    }
}
