//! One-shot attribute transitions.

use std::fmt;

use crate::draw::{AttrValue, NodeId};

use super::Ease;

/// A deferred action run against the animation context `C` when a transition ends.
pub type Callback<C> = Box<dyn FnOnce(&mut C)>;

/// A transition of one node's attributes from their current values to targets.
///
/// Built with a small builder API and handed to
/// [`Animator::start`](super::Animator::start).
///
/// # Examples
///
/// ```
/// use geodeck_core::{anim::{Ease, Transition}, draw::SceneGraph};
///
/// let scene = SceneGraph::new();
/// let fade: Transition<()> = Transition::new(scene.root())
///     .attr("opacity", 1.0)
///     .duration(700.0)
///     .ease(Ease::CubicOut);
/// assert_eq!(fade.duration_ms(), 700.0);
/// ```
pub struct Transition<C> {
    pub(crate) node: NodeId,
    pub(crate) attrs: Vec<(&'static str, AttrValue)>,
    pub(crate) delay_ms: f64,
    pub(crate) duration_ms: f64,
    pub(crate) ease: Ease,
    pub(crate) on_end: Option<Callback<C>>,
}

impl<C> Transition<C> {
    /// Creates a transition on `node` with a 250 ms cubic-out default timing.
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            attrs: Vec::new(),
            delay_ms: 0.0,
            duration_ms: 250.0,
            ease: Ease::CubicOut,
            on_end: None,
        }
    }

    /// Adds a target attribute value.
    pub fn attr(mut self, name: &'static str, to: impl Into<AttrValue>) -> Self {
        self.attrs.push((name, to.into()));
        self
    }

    /// Sets the delay before the transition starts.
    pub fn delay(mut self, ms: f64) -> Self {
        self.delay_ms = ms.max(0.0);
        self
    }

    /// Sets the transition duration.
    pub fn duration(mut self, ms: f64) -> Self {
        self.duration_ms = ms.max(0.0);
        self
    }

    /// Sets the easing curve.
    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Registers a callback run once, after the final frame is applied.
    ///
    /// The callback is dropped without running if the transition is interrupted.
    pub fn on_end(mut self, callback: impl FnOnce(&mut C) + 'static) -> Self {
        self.on_end = Some(Box::new(callback));
        self
    }

    /// Returns the target node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the delay in milliseconds.
    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Returns the duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }
}

impl<C> fmt::Debug for Transition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("node", &self.node)
            .field("attrs", &self.attrs)
            .field("delay_ms", &self.delay_ms)
            .field("duration_ms", &self.duration_ms)
            .field("ease", &self.ease)
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}
