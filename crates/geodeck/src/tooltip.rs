//! Tooltip sinks.
//!
//! Layers with pointer interaction report what to show through a
//! [`TooltipSink`]. The sink is an explicit service handed to charts through
//! their context, so hosts decide where tooltip content goes.

use std::cell::RefCell;

use geodeck_core::geometry::Point;

/// Receives tooltip show and hide requests.
pub trait TooltipSink {
    /// Shows `html` at a page position.
    fn show(&self, position: Point, html: &str);

    /// Hides the tooltip.
    fn hide(&self);
}

/// Discards every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTooltip;

impl TooltipSink for NoopTooltip {
    fn show(&self, _position: Point, _html: &str) {}

    fn hide(&self) {}
}

/// Current tooltip content.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipState {
    pub position: Point,
    pub html: String,
}

/// Keeps the current tooltip and counts requests.
#[derive(Debug, Default)]
pub struct RecordingTooltip {
    current: RefCell<Option<TooltipState>>,
    shows: RefCell<usize>,
    hides: RefCell<usize>,
}

impl RecordingTooltip {
    /// Creates a hidden tooltip.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the visible tooltip, if any.
    pub fn current(&self) -> Option<TooltipState> {
        self.current.borrow().clone()
    }

    /// Returns `true` while a tooltip is visible.
    pub fn is_visible(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Returns the number of show requests.
    pub fn show_count(&self) -> usize {
        *self.shows.borrow()
    }

    /// Returns the number of hide requests.
    pub fn hide_count(&self) -> usize {
        *self.hides.borrow()
    }
}

impl TooltipSink for RecordingTooltip {
    fn show(&self, position: Point, html: &str) {
        *self.shows.borrow_mut() += 1;
        *self.current.borrow_mut() = Some(TooltipState {
            position,
            html: html.to_string(),
        });
    }

    fn hide(&self) {
        *self.hides.borrow_mut() += 1;
        *self.current.borrow_mut() = None;
    }
}
