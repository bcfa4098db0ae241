//! SVG export of scene subtrees.

use svg::{Document, node::element as svg_element};

use crate::geometry::Size;

use super::{ElementKind, LayeredOutput, NodeId, SceneGraph, SvgNode};

/// Copies a node's attributes and rendered children onto a typed SVG element.
macro_rules! build_element {
    ($element:expr, $scene:expr, $id:expr) => {{
        let mut element = $element;
        for (name, value) in $scene.attrs($id) {
            element = element.set(name, value.to_string());
        }
        for child in render_children($scene, $id) {
            element = element.add(child);
        }
        Box::new(element) as SvgNode
    }};
}

/// Renders a scene node and its subtree to an SVG node.
///
/// Children tagged with a render layer are regrouped into one `<g data-layer>`
/// per layer, in layer order; untagged siblings count as content.
pub fn render_node(scene: &SceneGraph, id: NodeId) -> SvgNode {
    match scene.kind(id) {
        ElementKind::Group => build_element!(svg_element::Group::new(), scene, id),
        ElementKind::Path => build_element!(svg_element::Path::new(), scene, id),
        ElementKind::Circle => build_element!(svg_element::Circle::new(), scene, id),
        ElementKind::Text => build_element!(
            svg_element::Text::new(scene.text(id).unwrap_or_default()),
            scene,
            id
        ),
        ElementKind::Title => build_element!(
            svg_element::Title::new(scene.text(id).unwrap_or_default()),
            scene,
            id
        ),
        ElementKind::Definitions => build_element!(svg_element::Definitions::new(), scene, id),
        ElementKind::RadialGradient => {
            build_element!(svg_element::RadialGradient::new(), scene, id)
        }
        ElementKind::Stop => build_element!(svg_element::Stop::new(), scene, id),
    }
}

fn render_children(scene: &SceneGraph, id: NodeId) -> Vec<SvgNode> {
    let children = scene.children(id);
    if children.iter().all(|child| scene.layer(*child).is_none()) {
        return children
            .iter()
            .map(|child| render_node(scene, *child))
            .collect();
    }

    let mut output = LayeredOutput::new();
    for child in children {
        output.add_to_layer(
            scene.layer(*child).unwrap_or_default(),
            render_node(scene, *child),
        );
    }
    output.render()
}

/// Renders a subtree as a standalone SVG document of the given size.
///
/// # Examples
///
/// ```
/// use geodeck_core::{draw::{ElementKind, SceneGraph, render_document}, geometry::Size};
///
/// let mut scene = SceneGraph::new();
/// let circle = scene.append(scene.root(), ElementKind::Circle);
/// scene.set_attr(circle, "r", 4.0);
///
/// let svg = render_document(&scene, scene.root(), Size::new(100.0, 50.0)).to_string();
/// assert!(svg.contains("viewBox=\"0 0 100 50\""));
/// assert!(svg.contains("r=\"4\""));
/// ```
pub fn render_document(scene: &SceneGraph, id: NodeId, size: Size) -> Document {
    Document::new()
        .set(
            "viewBox",
            (0.0, 0.0, f64::from(size.width()), f64::from(size.height())),
        )
        .set("width", f64::from(size.width()))
        .set("height", f64::from(size.height()))
        .add(render_node(scene, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::RenderLayer;

    #[test]
    fn test_render_text_content() {
        let mut scene = SceneGraph::new();
        let text = scene.append(scene.root(), ElementKind::Text);
        scene.set_text(text, "Phoenix · 135");
        scene.set_attr(text, "text-anchor", "middle");

        let rendered = render_node(&scene, scene.root()).to_string();
        assert!(rendered.contains("Phoenix · 135"));
        assert!(rendered.contains("text-anchor=\"middle\""));
    }

    #[test]
    fn test_render_title_inside_parent() {
        let mut scene = SceneGraph::new();
        let region = scene.append(scene.root(), ElementKind::Path);
        let title = scene.append(region, ElementKind::Title);
        scene.set_text(title, "Utah • stress 91pctl");

        let rendered = render_node(&scene, region).to_string();
        assert!(rendered.starts_with("<path>"));
        assert!(rendered.contains("<title>"));
        assert!(rendered.contains("Utah • stress 91pctl"));
    }

    #[test]
    fn test_render_groups_layered_children() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let ring = scene.append_layered(root, RenderLayer::Rings, ElementKind::Circle);
        scene.set_attr(ring, "class", "ring");
        let region = scene.append_layered(root, RenderLayer::Regions, ElementKind::Path);
        scene.set_attr(region, "class", "state");

        let rendered = render_node(&scene, root).to_string();
        let regions_at = rendered.find("data-layer=\"regions\"").unwrap();
        let rings_at = rendered.find("data-layer=\"rings\"").unwrap();
        assert!(regions_at < rings_at);
    }

    #[test]
    fn test_render_untagged_children_in_order() {
        let mut scene = SceneGraph::new();
        let group = scene.append(scene.root(), ElementKind::Group);
        let a = scene.append(group, ElementKind::Circle);
        scene.set_attr(a, "id", "first");
        let b = scene.append(group, ElementKind::Circle);
        scene.set_attr(b, "id", "second");

        let rendered = render_node(&scene, group).to_string();
        assert!(!rendered.contains("data-layer"));
        assert!(rendered.find("first").unwrap() < rendered.find("second").unwrap());
    }
}
