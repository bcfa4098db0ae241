//! Geodeck Core Types and Primitives
//!
//! This crate provides the building blocks that geodeck charts are drawn and
//! animated with. It includes:
//!
//! - **Colors**: CSS color parsing and interpolation ([`color::Color`])
//! - **Geometry**: Screen-space points and sizes ([`geometry`] module)
//! - **Scales**: Linear, square-root and color scales plus color ramps ([`scale`] module)
//! - **Draw**: A retained SVG scene graph with z-ordered render layers ([`draw`] module)
//! - **Animation**: Easing, transitions and pausable timers ([`anim`] module)

pub mod anim;
pub mod color;
pub mod draw;
pub mod geometry;
pub mod scale;
