//! Animation primitives.
//!
//! # Overview
//!
//! - [`Ease`]: named easing curves
//! - [`Transition`]: a one-shot interpolation of node attributes with an optional completion callback
//! - [`TimerId`] / [`FrameFn`]: repeating per-frame timers with pause/resume
//! - [`Animator`]: owns running transitions and timers and advances them on [`Animator::tick`]
//!
//! Time is measured in milliseconds on a caller-provided clock; the animator
//! never reads wall time itself.

mod animator;
mod ease;
mod timer;
mod transition;

pub use animator::Animator;
pub use ease::Ease;
pub use timer::{FrameFn, TimerId};
pub use transition::{Callback, Transition};
