//! Repeating per-frame timers.

use std::fmt;

use crate::draw::SceneGraph;

/// Identifier of a running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

/// Frame callback of a timer, receiving the elapsed running time in milliseconds.
pub type FrameFn = Box<dyn FnMut(f64, &mut SceneGraph)>;

/// A repeating timer. Elapsed time excludes paused intervals.
pub(crate) struct Timer {
    started_at: f64,
    paused_at: Option<f64>,
    paused_total: f64,
    frame: FrameFn,
}

impl Timer {
    pub(crate) fn new(now: f64, frame: FrameFn) -> Self {
        Self {
            started_at: now,
            paused_at: None,
            paused_total: 0.0,
            frame,
        }
    }

    pub(crate) fn elapsed(&self, now: f64) -> f64 {
        let end = self.paused_at.unwrap_or(now);
        (end - self.started_at - self.paused_total).max(0.0)
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub(crate) fn pause(&mut self, now: f64) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub(crate) fn resume(&mut self, now: f64) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += (now - paused_at).max(0.0);
        }
    }

    pub(crate) fn fire(&mut self, now: f64, scene: &mut SceneGraph) {
        let elapsed = self.elapsed(now);
        (self.frame)(elapsed, scene);
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("started_at", &self.started_at)
            .field("paused_at", &self.paused_at)
            .field("paused_total", &self.paused_total)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn test_timer_elapsed_excludes_pauses() {
        let mut timer = Timer::new(100.0, Box::new(|_, _| {}));
        assert!(approx_eq!(f64, timer.elapsed(150.0), 50.0));

        timer.pause(150.0);
        assert!(timer.is_paused());
        assert!(approx_eq!(f64, timer.elapsed(400.0), 50.0));

        timer.resume(400.0);
        assert!(approx_eq!(f64, timer.elapsed(410.0), 60.0));
    }

    #[test]
    fn test_timer_double_pause_keeps_first_instant() {
        let mut timer = Timer::new(0.0, Box::new(|_, _| {}));
        timer.pause(10.0);
        timer.pause(20.0);
        timer.resume(30.0);
        assert!(approx_eq!(f64, timer.elapsed(30.0), 10.0));
    }
}
