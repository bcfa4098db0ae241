//! Stroke definitions for outlines, arcs and rings.
//!
//! A [`StrokeDefinition`] is written onto a scene node with
//! [`StrokeDefinition::apply`]:
//!
//! | Field | SVG attribute | Written when |
//! |-------|---------------|--------------|
//! | `color` | `stroke` | always |
//! | `width` | `stroke-width` | always |
//! | `opacity` | `stroke-opacity` | set |
//! | `style` | `stroke-dasharray` | dashed |
//! | `cap` | `stroke-linecap` | not `butt` |

use crate::{
    color::Color,
    draw::{NodeId, SceneGraph},
};

/// Line pattern of a stroke.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    /// An SVG dasharray such as `"6 8"`.
    Dashed(String),
}

impl StrokeStyle {
    /// Returns the dasharray, or `None` for solid lines.
    pub fn dasharray(&self) -> Option<&str> {
        match self {
            Self::Solid => None,
            Self::Dashed(pattern) => Some(pattern),
        }
    }
}

/// Line endpoint rendering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrokeCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl StrokeCap {
    /// Returns the `stroke-linecap` value.
    pub fn to_svg_value(self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

/// Stroke of a drawn element.
///
/// # Examples
///
/// ```
/// use geodeck_core::{
///     color::Color,
///     draw::{ElementKind, SceneGraph, StrokeCap, StrokeDefinition},
/// };
///
/// let mut stroke = StrokeDefinition::dashed_pattern(Color::new("#ffffff").unwrap(), 1.5, "6 8");
/// stroke.set_cap(StrokeCap::Round);
///
/// let mut scene = SceneGraph::new();
/// let node = scene.append(scene.root(), ElementKind::Circle);
/// stroke.apply(&mut scene, node);
/// assert_eq!(scene.number(node, "stroke-width"), Some(1.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    opacity: Option<f32>,
    style: StrokeStyle,
    cap: StrokeCap,
}

impl StrokeDefinition {
    /// Creates a solid stroke.
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            opacity: None,
            style: StrokeStyle::Solid,
            cap: StrokeCap::Butt,
        }
    }

    /// Creates a stroke dashed with an SVG dasharray.
    pub fn dashed_pattern(color: Color, width: f32, pattern: &str) -> Self {
        Self {
            style: StrokeStyle::Dashed(pattern.to_string()),
            ..Self::new(color, width)
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = Some(opacity);
    }

    pub fn set_cap(&mut self, cap: StrokeCap) {
        self.cap = cap;
    }

    /// Writes the stroke attributes onto `node`, leaving SVG defaults implicit.
    pub fn apply(&self, scene: &mut SceneGraph, node: NodeId) {
        scene.set_attr(node, "stroke", self.color);
        scene.set_attr(node, "stroke-width", self.width);
        if let Some(opacity) = self.opacity {
            scene.set_attr(node, "stroke-opacity", opacity);
        }
        if self.cap != StrokeCap::Butt {
            scene.set_attr(node, "stroke-linecap", self.cap.to_svg_value());
        }
        if let Some(dasharray) = self.style.dasharray() {
            scene.set_attr(node, "stroke-dasharray", dasharray.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{AttrValue, ElementKind};

    #[test]
    fn test_solid_stroke_omits_defaults() {
        let stroke = StrokeDefinition::new(Color::new("#ffffff").unwrap(), 2.0);
        let mut scene = SceneGraph::new();
        let node = scene.append(scene.root(), ElementKind::Path);
        stroke.apply(&mut scene, node);

        assert_eq!(scene.number(node, "stroke-width"), Some(2.0));
        assert!(scene.attr(node, "stroke-dasharray").is_none());
        assert!(scene.attr(node, "stroke-linecap").is_none());
        assert!(scene.attr(node, "stroke-opacity").is_none());
    }

    #[test]
    fn test_dashed_round_stroke() {
        let mut stroke = StrokeDefinition::dashed_pattern(Color::new("#ffffff").unwrap(), 1.0, "4 6");
        stroke.set_cap(StrokeCap::Round);
        stroke.set_opacity(0.9);

        let mut scene = SceneGraph::new();
        let node = scene.append(scene.root(), ElementKind::Path);
        stroke.apply(&mut scene, node);

        assert_eq!(scene.attr(node, "stroke-dasharray"), Some(&AttrValue::from("4 6")));
        assert_eq!(scene.attr(node, "stroke-linecap"), Some(&AttrValue::from("round")));
        assert_eq!(scene.number(node, "stroke-opacity"), Some(0.9));
    }
}
