//! Drawing primitives for geodeck charts.
//!
//! Charts draw into a retained [`SceneGraph`] rather than emitting SVG directly,
//! so that transitions and timers can update attributes after the initial draw.
//! The scene is exported to SVG on demand, grouping chart content by
//! [`RenderLayer`] for stable z-ordering.

mod export;
mod layer;
mod path;
mod scene;
mod stroke;

pub use export::{render_document, render_node};
pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use path::{PathData, format_number};
pub use scene::{AttrValue, ElementKind, NodeId, SceneGraph};
pub use stroke::{StrokeCap, StrokeDefinition, StrokeStyle};
