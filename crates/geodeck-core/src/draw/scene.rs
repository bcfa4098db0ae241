//! Retained scene graph.
//!
//! A [`SceneGraph`] is an arena of SVG-like elements addressed by [`NodeId`].
//! Layers draw their initial state into it; transitions and timers later
//! rewrite attributes in place. Nodes are never removed: charts persist once
//! built.

use std::fmt;

use indexmap::IndexMap;

use crate::{color::Color, draw::RenderLayer};

use super::path::format_number;

/// Identifier of a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element kinds supported by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Group,
    Path,
    Circle,
    Text,
    /// Hover title of its parent element.
    Title,
    Definitions,
    RadialGradient,
    Stop,
}

impl ElementKind {
    /// Returns the SVG tag name for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Group => "g",
            Self::Path => "path",
            Self::Circle => "circle",
            Self::Text => "text",
            Self::Title => "title",
            Self::Definitions => "defs",
            Self::RadialGradient => "radialGradient",
            Self::Stop => "stop",
        }
    }
}

/// An attribute value.
///
/// Numbers and colors can be interpolated by transitions; text values switch
/// at the end of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f32),
    Color(Color),
    Text(String),
}

impl AttrValue {
    /// Returns the numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the color value, if this is a color.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns the text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpolates between `self` and `to` at eased progress `t`.
    ///
    /// Mismatched kinds (or text) jump to `to` once `t` reaches 1.
    pub fn interpolate(&self, to: &AttrValue, t: f32) -> AttrValue {
        match (self, to) {
            (Self::Number(a), Self::Number(b)) => Self::Number(a + (b - a) * t),
            (Self::Color(a), Self::Color(b)) => Self::Color(a.lerp(*b, t)),
            _ if t >= 1.0 => to.clone(),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Color(c) => write!(f, "{c}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<Color> for AttrValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug)]
struct Node {
    kind: ElementKind,
    layer: Option<RenderLayer>,
    attrs: IndexMap<&'static str, AttrValue>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An arena of scene nodes rooted at a single group.
///
/// # Examples
///
/// ```
/// use geodeck_core::draw::{ElementKind, RenderLayer, SceneGraph};
///
/// let mut scene = SceneGraph::new();
/// let circle = scene.append_layered(scene.root(), RenderLayer::Bubbles, ElementKind::Circle);
/// scene.set_attr(circle, "r", 6.0);
///
/// assert_eq!(scene.number(circle, "r"), Some(6.0));
/// assert_eq!(scene.layer(circle), Some(RenderLayer::Bubbles));
/// ```
#[derive(Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a scene containing only the root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: ElementKind::Group,
                layer: None,
                attrs: IndexMap::new(),
                text: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Returns the root group.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a scene holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a new element as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: ElementKind) -> NodeId {
        self.push(parent, kind, None)
    }

    /// Appends a new element tagged with a render layer.
    ///
    /// Siblings tagged with layers are regrouped by layer on export.
    pub fn append_layered(
        &mut self,
        parent: NodeId,
        layer: RenderLayer,
        kind: ElementKind,
    ) -> NodeId {
        self.push(parent, kind, Some(layer))
    }

    fn push(&mut self, parent: NodeId, kind: ElementKind, layer: Option<RenderLayer>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            layer,
            attrs: IndexMap::new(),
            text: None,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Sets (or replaces) an attribute.
    pub fn set_attr(&mut self, node: NodeId, name: &'static str, value: impl Into<AttrValue>) {
        self.nodes[node.0].attrs.insert(name, value.into());
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Option<AttrValue> {
        self.nodes[node.0].attrs.shift_remove(name)
    }

    /// Returns an attribute value.
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&AttrValue> {
        self.nodes[node.0].attrs.get(name)
    }

    /// Returns a numeric attribute.
    pub fn number(&self, node: NodeId, name: &str) -> Option<f32> {
        self.attr(node, name).and_then(AttrValue::as_number)
    }

    /// Returns a color attribute.
    pub fn color(&self, node: NodeId, name: &str) -> Option<Color> {
        self.attr(node, name).and_then(AttrValue::as_color)
    }

    /// Iterates over a node's attributes in insertion order.
    pub fn attrs(&self, node: NodeId) -> impl Iterator<Item = (&'static str, &AttrValue)> {
        self.nodes[node.0].attrs.iter().map(|(k, v)| (*k, v))
    }

    /// Sets the text content of a node.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        self.nodes[node.0].text = Some(text.into());
    }

    /// Returns the text content of a node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.0].text.as_deref()
    }

    /// Returns the element kind.
    pub fn kind(&self, node: NodeId) -> ElementKind {
        self.nodes[node.0].kind
    }

    /// Returns the render layer the node was tagged with.
    pub fn layer(&self, node: NodeId) -> Option<RenderLayer> {
        self.nodes[node.0].layer
    }

    /// Returns the parent of a node; `None` for the root.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Returns the children of a node in document order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Returns every descendant of `node` (depth-first, document order)
    /// whose `class` attribute equals `class`.
    pub fn select_class(&self, node: NodeId, class: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self
                .attr(id, "class")
                .and_then(AttrValue::as_text)
                .is_some_and(|c| c == class)
            {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }
}
