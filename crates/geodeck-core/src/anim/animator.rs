//! The animation driver.

use std::fmt;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::draw::{AttrValue, NodeId, SceneGraph};

use super::{
    Ease,
    timer::{FrameFn, Timer, TimerId},
    transition::{Callback, Transition},
};

struct Channel {
    attr: &'static str,
    /// Read from the scene on the first frame after the delay.
    from: Option<AttrValue>,
    to: AttrValue,
}

struct Running<C> {
    node: NodeId,
    channels: Vec<Channel>,
    start: f64,
    duration: f64,
    ease: Ease,
    on_end: Option<Callback<C>>,
}

impl<C> Running<C> {
    /// Eased progress at `now`, or `None` while still delayed.
    fn progress(&self, now: f64) -> Option<f32> {
        let local = now - self.start;
        if local < 0.0 {
            return None;
        }
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (local / self.duration).min(1.0)
        };
        Some(t as f32)
    }
}

/// Drives transitions and repeating timers against a [`SceneGraph`].
///
/// The animator is generic over the context `C` that completion callbacks
/// receive. [`Animator::tick`] applies one frame and returns the callbacks of
/// transitions that finished on that frame; the owner runs them with mutable
/// access to itself, which lets a callback start further transitions.
///
/// Starting a transition on a `(node, attribute)` pair that another running
/// transition animates interrupts that attribute. A transition whose
/// attributes are all interrupted is discarded and its callback never runs.
///
/// Timers pause and resume as a group, following document visibility.
///
/// # Examples
///
/// ```
/// use geodeck_core::{anim::{Animator, Transition}, draw::{ElementKind, SceneGraph}};
///
/// let mut scene = SceneGraph::new();
/// let circle = scene.append(scene.root(), ElementKind::Circle);
/// scene.set_attr(circle, "r", 0.0);
///
/// let mut animator: Animator<Vec<&str>> = Animator::new();
/// animator.start(0.0, Transition::new(circle)
///     .attr("r", 10.0)
///     .duration(100.0)
///     .on_end(|log: &mut Vec<&str>| log.push("grown")));
///
/// assert!(animator.tick(50.0, &mut scene).is_empty());
/// let done = animator.tick(100.0, &mut scene);
/// assert_eq!(scene.number(circle, "r"), Some(10.0));
///
/// let mut log = Vec::new();
/// for callback in done {
///     callback(&mut log);
/// }
/// assert_eq!(log, vec!["grown"]);
/// ```
pub struct Animator<C> {
    running: Vec<Running<C>>,
    timers: IndexMap<TimerId, Timer>,
    next_timer: u64,
    timers_paused: bool,
}

impl<C> Default for Animator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Animator<C> {
    /// Creates an idle animator.
    pub fn new() -> Self {
        Self {
            running: Vec::new(),
            timers: IndexMap::new(),
            next_timer: 0,
            timers_paused: false,
        }
    }

    /// Schedules a transition at time `now`.
    ///
    /// Start values are read from the scene when the delay has elapsed, so a
    /// staggered transition starts from whatever the attribute holds by then.
    /// An attribute that is not set at that point starts at its target value.
    pub fn start(&mut self, now: f64, transition: Transition<C>) {
        let Transition {
            node,
            attrs,
            delay_ms,
            duration_ms,
            ease,
            on_end,
        } = transition;

        for (attr, _) in &attrs {
            self.interrupt(node, attr);
        }

        let channels = attrs
            .into_iter()
            .map(|(attr, to)| Channel { attr, from: None, to })
            .collect();

        self.running.push(Running {
            node,
            channels,
            start: now + delay_ms,
            duration: duration_ms,
            ease,
            on_end,
        });
    }

    fn interrupt(&mut self, node: NodeId, attr: &str) {
        let before = self.running.len();
        for running in self.running.iter_mut().filter(|r| r.node == node) {
            running.channels.retain(|c| c.attr != attr);
        }
        self.running.retain(|r| !r.channels.is_empty());
        if self.running.len() < before {
            debug!(node = node.index(), attr; "Transition interrupted");
        }
    }

    /// Starts a repeating timer. If timers are currently paused the new timer
    /// starts paused as well.
    pub fn start_timer(&mut self, now: f64, frame: FrameFn) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;

        let mut timer = Timer::new(now, frame);
        if self.timers_paused {
            timer.pause(now);
        }
        self.timers.insert(id, timer);
        id
    }

    /// Stops and discards a timer. Returns `false` if it was not running.
    pub fn stop_timer(&mut self, id: TimerId) -> bool {
        self.timers.shift_remove(&id).is_some()
    }

    /// Pauses every timer at `now`.
    pub fn pause_timers(&mut self, now: f64) {
        self.timers_paused = true;
        for timer in self.timers.values_mut() {
            timer.pause(now);
        }
        debug!(count = self.timers.len(); "Timers paused");
    }

    /// Resumes every timer at `now`; paused time is excluded from elapsed time.
    pub fn resume_timers(&mut self, now: f64) {
        self.timers_paused = false;
        for timer in self.timers.values_mut() {
            timer.resume(now);
        }
        debug!(count = self.timers.len(); "Timers resumed");
    }

    /// Returns `true` if timers are paused.
    pub fn timers_paused(&self) -> bool {
        self.timers_paused
    }

    /// Returns the number of running transitions (including delayed ones).
    pub fn transition_count(&self) -> usize {
        self.running.len()
    }

    /// Returns the number of live timers.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Returns `true` when nothing is scheduled.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty() && self.timers.is_empty()
    }

    /// Applies the frame at `now` and returns the callbacks of transitions
    /// that completed, in start order.
    pub fn tick(&mut self, now: f64, scene: &mut SceneGraph) -> Vec<Callback<C>> {
        let mut finished = Vec::new();
        let mut still_running = Vec::with_capacity(self.running.len());

        for mut running in self.running.drain(..) {
            let Some(t) = running.progress(now) else {
                still_running.push(running);
                continue;
            };

            let node = running.node;
            let eased = if t >= 1.0 { 1.0 } else { running.ease.apply(t) };
            for channel in &mut running.channels {
                if t >= 1.0 {
                    scene.set_attr(node, channel.attr, channel.to.clone());
                    continue;
                }
                let to = &channel.to;
                let from = channel
                    .from
                    .get_or_insert_with(|| scene.attr(node, channel.attr).cloned().unwrap_or_else(|| to.clone()));
                let value = from.interpolate(to, eased);
                scene.set_attr(node, channel.attr, value);
            }

            if t >= 1.0 {
                trace!(node = running.node.index(); "Transition finished");
                if let Some(callback) = running.on_end.take() {
                    finished.push(callback);
                }
            } else {
                still_running.push(running);
            }
        }
        self.running = still_running;

        for timer in self.timers.values_mut() {
            if !timer.is_paused() {
                timer.fire(now, scene);
            }
        }

        finished
    }
}

impl<C> fmt::Debug for Animator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animator")
            .field("transitions", &self.running.len())
            .field("timers", &self.timers)
            .field("timers_paused", &self.timers_paused)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::{color::Color, draw::ElementKind};
    use float_cmp::approx_eq;

    fn circle(scene: &mut SceneGraph) -> NodeId {
        let node = scene.append(scene.root(), ElementKind::Circle);
        scene.set_attr(node, "r", 0.0);
        node
    }

    #[test]
    fn test_transition_interpolates_linearly() {
        let mut scene = SceneGraph::new();
        let node = circle(&mut scene);
        let mut animator: Animator<()> = Animator::new();
        animator.start(
            0.0,
            Transition::new(node)
                .attr("r", 10.0)
                .duration(100.0)
                .ease(Ease::Linear),
        );

        animator.tick(25.0, &mut scene);
        assert!(approx_eq!(f32, scene.number(node, "r").unwrap(), 2.5));
        assert_eq!(animator.transition_count(), 1);

        animator.tick(200.0, &mut scene);
        assert_eq!(scene.number(node, "r"), Some(10.0));
        assert_eq!(animator.transition_count(), 0);
    }

    #[test]
    fn test_transition_delay_holds_start_value() {
        let mut scene = SceneGraph::new();
        let node = circle(&mut scene);
        let mut animator: Animator<()> = Animator::new();
        animator.start(
            0.0,
            Transition::new(node).attr("r", 8.0).delay(40.0).duration(10.0),
        );

        animator.tick(39.0, &mut scene);
        assert_eq!(scene.number(node, "r"), Some(0.0));
        animator.tick(50.0, &mut scene);
        assert_eq!(scene.number(node, "r"), Some(8.0));
    }

    #[test]
    fn test_delayed_transition_starts_from_value_at_delay_end() {
        let mut scene = SceneGraph::new();
        let node = circle(&mut scene);
        let mut animator: Animator<()> = Animator::new();
        animator.start(
            0.0,
            Transition::new(node)
                .attr("r", 10.0)
                .delay(40.0)
                .duration(20.0)
                .ease(Ease::Linear),
        );

        animator.tick(20.0, &mut scene);
        scene.set_attr(node, "r", 6.0);
        animator.tick(50.0, &mut scene);
        assert!(approx_eq!(f32, scene.number(node, "r").unwrap(), 8.0));
        animator.tick(60.0, &mut scene);
        assert_eq!(scene.number(node, "r"), Some(10.0));
    }

    #[test]
    fn test_zero_duration_finishes_on_first_tick() {
        let mut scene = SceneGraph::new();
        let node = circle(&mut scene);
        let mut animator: Animator<u32> = Animator::new();
        animator.start(
            0.0,
            Transition::new(node)
                .attr("r", 3.0)
                .duration(0.0)
                .on_end(|n: &mut u32| *n += 1),
        );

        let done = animator.tick(0.0, &mut scene);
        let mut count = 0;
        for callback in done {
            callback(&mut count);
        }
        assert_eq!(count, 1);
    }

    #[test]
    fn test_color_transition() {
        let mut scene = SceneGraph::new();
        let node = scene.append(scene.root(), ElementKind::Path);
        let from = Color::new("#000000").unwrap();
        let to = Color::new("#ffffff").unwrap();
        scene.set_attr(node, "fill", from);

        let mut animator: Animator<()> = Animator::new();
        animator.start(
            0.0,
            Transition::new(node).attr("fill", to).duration(10.0),
        );
        animator.tick(10.0, &mut scene);
        assert_eq!(scene.color(node, "fill"), Some(to));
    }

    #[test]
    fn test_interrupt_drops_callback() {
        let mut scene = SceneGraph::new();
        let node = circle(&mut scene);
        let mut animator: Animator<Vec<&'static str>> = Animator::new();
        animator.start(
            0.0,
            Transition::new(node)
                .attr("r", 10.0)
                .duration(100.0)
                .on_end(|log: &mut Vec<&'static str>| log.push("first")),
        );
        animator.start(
            10.0,
            Transition::new(node)
                .attr("r", 20.0)
                .duration(100.0)
                .on_end(|log: &mut Vec<&'static str>| log.push("second")),
        );
        assert_eq!(animator.transition_count(), 1);

        let mut log = Vec::new();
        for callback in animator.tick(500.0, &mut scene) {
            callback(&mut log);
        }
        assert_eq!(log, vec!["second"]);
        assert_eq!(scene.number(node, "r"), Some(20.0));
    }

    #[test]
    fn test_timer_receives_elapsed_and_pauses() {
        let mut scene = SceneGraph::new();
        let seen = Rc::new(Cell::new(-1.0));
        let sink = Rc::clone(&seen);

        let mut animator: Animator<()> = Animator::new();
        let id = animator.start_timer(100.0, Box::new(move |elapsed, _| sink.set(elapsed)));

        animator.tick(160.0, &mut scene);
        assert!(approx_eq!(f64, seen.get(), 60.0));

        animator.pause_timers(160.0);
        seen.set(-1.0);
        animator.tick(500.0, &mut scene);
        assert!(approx_eq!(f64, seen.get(), -1.0));

        animator.resume_timers(500.0);
        animator.tick(516.0, &mut scene);
        assert!(approx_eq!(f64, seen.get(), 76.0));

        assert!(animator.stop_timer(id));
        assert!(!animator.stop_timer(id));
        assert!(animator.is_idle());
    }

    #[test]
    fn test_timer_started_while_paused_waits_for_resume() {
        let mut scene = SceneGraph::new();
        let fired = Rc::new(Cell::new(false));
        let sink = Rc::clone(&fired);

        let mut animator: Animator<()> = Animator::new();
        animator.pause_timers(0.0);
        animator.start_timer(0.0, Box::new(move |_, _| sink.set(true)));

        animator.tick(16.0, &mut scene);
        assert!(!fired.get());

        animator.resume_timers(32.0);
        animator.tick(48.0, &mut scene);
        assert!(fired.get());
    }
}
