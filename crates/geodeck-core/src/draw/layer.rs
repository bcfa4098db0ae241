//! Layer-based rendering system for SVG output.
//!
//! Chart content is tagged with a [`RenderLayer`] when it is appended to the
//! scene. On export, [`LayeredOutput`] sorts the tagged nodes so that every
//! chart renders its layers in the same z-order regardless of build order.
//!
//! # Example
//!
//! ```
//! # use geodeck_core::draw::{RenderLayer, LayeredOutput};
//! # use svg::node::element::Circle;
//!
//! let mut output = LayeredOutput::new();
//! output.add_to_layer(RenderLayer::Bubbles, Box::new(Circle::new()));
//! output.add_to_layer(RenderLayer::Regions, Box::new(Circle::new()));
//!
//! // Regions render first, then bubbles
//! let svg_nodes = output.render();
//! assert_eq!(svg_nodes.len(), 2);
//! ```

use svg::node::element as svg_element;

/// Type alias for boxed SVG nodes.
pub type SvgNode = Box<dyn svg::Node>;

/// Defines the rendering layers of a geo chart.
///
/// Layers are rendered from bottom to top in the order defined by variant declaration.
/// The `Ord` derive uses declaration order, so the first variant renders first (bottom),
/// and the last variant renders last (top).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Gradient and other paint-server definitions
    Defs,
    /// The projected outline of the globe
    Sphere,
    /// Basemap regions, optionally tinted by a choropleth
    Regions,
    /// Untagged content
    #[default]
    Content,
    /// Magnitude bubbles and their labels
    Bubbles,
    /// Animated flow arcs
    FlowEdges,
    /// Hub and generator markers with their labels
    FlowNodes,
    /// Hexagonal density field
    Hexgrid,
    /// Labels placed at hexgrid sample points
    HexLabels,
    /// Radial plumes and their labels
    Plumes,
    /// Animated dashed rings
    Rings,
}

impl RenderLayer {
    /// Returns the `data-layer` name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Defs => "defs",
            Self::Sphere => "sphere",
            Self::Regions => "regions",
            Self::Content => "content",
            Self::Bubbles => "bubbles",
            Self::FlowEdges => "flow-edges",
            Self::FlowNodes => "flow-nodes",
            Self::Hexgrid => "hexgrid",
            Self::HexLabels => "hex-labels",
            Self::Plumes => "plumes",
            Self::Rings => "rings",
        }
    }
}

/// Represents SVG nodes grouped by rendering layer.
///
/// When rendered, nodes are emitted in layer order (bottom to top); within a
/// layer they keep insertion order.
#[derive(Debug, Default)]
pub struct LayeredOutput {
    items: Vec<(RenderLayer, SvgNode)>,
}

impl LayeredOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single node to the specified layer.
    pub fn add_to_layer(&mut self, layer: RenderLayer, node: SvgNode) {
        self.items.push((layer, node));
    }

    /// Returns `true` if there are no nodes in any layer.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Renders all layers to SVG groups, consuming the output.
    ///
    /// Each non-empty layer becomes an SVG `<g>` element with a `data-layer`
    /// attribute identifying the layer. Empty layers are skipped.
    pub fn render(mut self) -> Vec<SvgNode> {
        if self.is_empty() {
            return Vec::new();
        }

        // Stable sort keeps insertion order within a layer
        self.items.sort_by_key(|(layer, _)| *layer);

        let mut result = Vec::new();
        let mut current_layer = self.items[0].0;
        let mut current_group = svg_element::Group::new().set("data-layer", current_layer.name());

        for (layer, node) in self.items {
            if layer != current_layer {
                result.push(Box::new(current_group) as SvgNode);

                current_layer = layer;
                current_group = svg_element::Group::new().set("data-layer", layer.name());
            }

            current_group = current_group.add(node);
        }

        result.push(Box::new(current_group) as SvgNode);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svg::node::element::Circle;

    #[test]
    fn test_layered_output_new() {
        let output = LayeredOutput::new();
        assert!(output.is_empty());
    }

    #[test]
    fn test_layered_output_render_orders_layers() {
        let mut output = LayeredOutput::new();
        output.add_to_layer(RenderLayer::Rings, Box::new(Circle::new()));
        output.add_to_layer(RenderLayer::Sphere, Box::new(Circle::new()));
        output.add_to_layer(RenderLayer::Rings, Box::new(Circle::new()));

        let rendered: Vec<String> = output.render().iter().map(|n| n.to_string()).collect();

        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].contains("data-layer=\"sphere\""));
        assert!(rendered[1].contains("data-layer=\"rings\""));
    }

    #[test]
    fn test_render_layer_default_is_content() {
        assert_eq!(RenderLayer::default(), RenderLayer::Content);
        assert!(RenderLayer::Regions < RenderLayer::Content);
        assert!(RenderLayer::Content < RenderLayer::Bubbles);
    }
}
