//! The headless presentation stage.
//!
//! A [`Stage`] owns everything a deck needs at run time: the retained scene
//! graph, the millisecond clock, the [`Animator`], the vertically stacked
//! scenes with a scrollable viewport, one-shot intersection watches, pointer
//! handlers per chart and the document-hidden flag.
//!
//! Time only moves through [`Stage::advance`], which steps the clock one
//! frame at a time. Every frame evaluates intersection watches, applies
//! running transitions and timers, then runs the completion callbacks of
//! transitions that finished on that frame.

use std::{collections::HashMap, fmt};

use indexmap::IndexMap;
use log::{debug, trace};

use geodeck_core::{
    anim::{Animator, FrameFn, TimerId, Transition},
    draw::{ElementKind, NodeId, SceneGraph, render_document},
    geometry::{Point, Size},
};

use crate::{
    config::{TimingConfig, ViewportConfig},
    error::GeoError,
};

/// A deferred action run with mutable access to the stage.
pub type StageCallback = Box<dyn FnOnce(&mut Stage)>;

/// Pointer input delivered to a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// The pointer moved. `local` is in chart coordinates, `page` in page
    /// coordinates.
    Move { local: Point, page: Point },
    /// The pointer left the chart.
    Leave,
}

/// Handler receiving a chart's pointer input.
pub type PointerHandler = Box<dyn FnMut(&PointerEvent)>;

/// Progress of a chart's reveal. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RevealState {
    NotYetVisible,
    FadingIn,
    Revealed,
}

/// Identifier of an intersection watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

/// The nodes of a mounted chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartMount {
    /// Outer chart group; pointer handlers attach here.
    pub svg: NodeId,
    /// Faded root group holding all chart content.
    pub root: NodeId,
    /// Chart output size.
    pub size: Size,
}

#[derive(Debug)]
struct SceneSlot {
    node: NodeId,
    top: f32,
}

#[derive(Debug)]
struct Container {
    scene: String,
    node: NodeId,
    chart: Option<ChartMount>,
}

struct Watch {
    id: WatchId,
    scene: String,
    threshold: f32,
    callback: StageCallback,
}

/// Headless runtime of a deck.
pub struct Stage {
    timing: TimingConfig,
    viewport: ViewportConfig,
    now: f64,
    hidden: bool,
    scroll_y: f32,
    scene: SceneGraph,
    animator: Animator<Stage>,
    scenes: IndexMap<String, SceneSlot>,
    containers: IndexMap<String, Container>,
    watches: Vec<Watch>,
    next_watch: u64,
    pointer_handlers: HashMap<NodeId, PointerHandler>,
    reveals: HashMap<NodeId, RevealState>,
    chart_timers: HashMap<NodeId, Vec<TimerId>>,
}

/// Shortest clock step taken by [`Stage::advance`].
const MIN_FRAME_MS: f64 = 1.0;

impl Stage {
    /// Creates an empty stage at time zero, scrolled to the top.
    pub fn new(timing: TimingConfig, viewport: ViewportConfig) -> Self {
        Self {
            timing,
            viewport,
            now: 0.0,
            hidden: false,
            scroll_y: 0.0,
            scene: SceneGraph::new(),
            animator: Animator::new(),
            scenes: IndexMap::new(),
            containers: IndexMap::new(),
            watches: Vec::new(),
            next_watch: 0,
            pointer_handlers: HashMap::new(),
            reveals: HashMap::new(),
            chart_timers: HashMap::new(),
        }
    }

    /// Returns the timing configuration.
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Returns the viewport configuration.
    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    /// Enables or disables intersection observation.
    pub fn set_supports_intersection(&mut self, supported: bool) {
        self.viewport = ViewportConfig::new(self.viewport.height(), supported);
    }

    /// Returns the current time in milliseconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Returns the scene graph.
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Returns the scene graph for drawing.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Returns the animator.
    pub fn animator(&self) -> &Animator<Stage> {
        &self.animator
    }

    // --- layout -----------------------------------------------------------

    /// Appends a full-viewport scene below the existing ones.
    ///
    /// Adding an existing id is a no-op.
    pub fn add_scene(&mut self, id: impl Into<String>) {
        let id = id.into();
        if self.scenes.contains_key(&id) {
            return;
        }
        let top = self.scenes.len() as f32 * self.viewport.height();
        let node = self.scene.append(self.scene.root(), ElementKind::Group);
        self.scene.set_attr(node, "id", id.clone());
        self.scene.set_attr(node, "class", "scene");
        debug!(scene = id.as_str(), top; "Scene added");
        self.scenes.insert(id, SceneSlot { node, top });
    }

    /// Adds a chart container to a scene, addressed by `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Config`] if the scene does not exist.
    pub fn add_container(&mut self, selector: impl Into<String>, scene: &str) -> Result<(), GeoError> {
        let selector = selector.into();
        let slot = self
            .scenes
            .get(scene)
            .ok_or_else(|| GeoError::Config(format!("scene `{scene}` not found")))?;
        let node = self.scene.append(slot.node, ElementKind::Group);
        self.scene
            .set_attr(node, "id", selector.trim_start_matches('#').to_string());
        self.containers.insert(
            selector,
            Container {
                scene: scene.to_string(),
                node,
                chart: None,
            },
        );
        Ok(())
    }

    /// Returns `true` if the container exists.
    pub fn has_container(&self, selector: &str) -> bool {
        self.containers.contains_key(selector)
    }

    /// Returns the scene holding a container.
    pub fn container_scene(&self, selector: &str) -> Option<&str> {
        self.containers.get(selector).map(|c| c.scene.as_str())
    }

    /// Returns the top offset of a scene.
    pub fn scene_top(&self, scene: &str) -> Option<f32> {
        self.scenes.get(scene).map(|slot| slot.top)
    }

    /// Returns scene ids in layout order.
    pub fn scene_ids(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    /// Creates the chart groups inside a container.
    ///
    /// The root group starts at opacity 0 and must be brought in by a reveal.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::ContainerNotFound`] if the container does not exist.
    pub fn mount_chart(&mut self, selector: &str, size: Size) -> Result<ChartMount, GeoError> {
        let container = self
            .containers
            .get(selector)
            .ok_or_else(|| GeoError::ContainerNotFound(selector.to_string()))?;
        let container_node = container.node;
        if let Some(previous) = container.chart {
            let stopped = self.stop_chart_timers(previous.root);
            debug!(container = selector, stopped; "Replacing mounted chart");
        }

        let svg = self.scene.append(container_node, ElementKind::Group);
        self.scene.set_attr(svg, "class", "chart");
        let root = self.scene.append(svg, ElementKind::Group);
        self.scene.set_attr(root, "opacity", 0.0);

        let mount = ChartMount { svg, root, size };
        if let Some(container) = self.containers.get_mut(selector) {
            container.chart = Some(mount);
        }
        self.reveals.insert(root, RevealState::NotYetVisible);
        Ok(mount)
    }

    /// Returns the chart mounted in a container.
    pub fn chart(&self, selector: &str) -> Option<ChartMount> {
        self.containers.get(selector).and_then(|c| c.chart)
    }

    // --- viewport ---------------------------------------------------------

    /// Returns the scroll offset.
    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// Scrolls the viewport and evaluates intersection watches.
    pub fn scroll_to(&mut self, y: f32) {
        self.scroll_y = y.max(0.0);
        trace!(scroll_y = self.scroll_y; "Scrolled");
        self.check_intersections();
    }

    /// Scrolls so that a scene fills the viewport.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Config`] if the scene does not exist.
    pub fn scroll_to_scene(&mut self, scene: &str) -> Result<(), GeoError> {
        let top = self
            .scene_top(scene)
            .ok_or_else(|| GeoError::Config(format!("scene `{scene}` not found")))?;
        self.scroll_to(top);
        Ok(())
    }

    /// Returns the visible fraction of a scene, in `[0, 1]`.
    pub fn visible_ratio(&self, scene: &str) -> f32 {
        let Some(slot) = self.scenes.get(scene) else {
            return 0.0;
        };
        let height = self.viewport.height();
        if height <= 0.0 {
            return 0.0;
        }
        let top = slot.top.max(self.scroll_y);
        let bottom = (slot.top + height).min(self.scroll_y + height);
        ((bottom - top) / height).clamp(0.0, 1.0)
    }

    /// Registers a one-shot watch that runs `callback` the first time at least
    /// `threshold` of the scene is visible.
    ///
    /// Watches are evaluated on scroll and on every frame, never synchronously
    /// at registration.
    pub fn watch_intersection(
        &mut self,
        scene: impl Into<String>,
        threshold: f32,
        callback: impl FnOnce(&mut Stage) + 'static,
    ) -> WatchId {
        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        self.watches.push(Watch {
            id,
            scene: scene.into(),
            threshold,
            callback: Box::new(callback),
        });
        id
    }

    /// Removes a watch without running it. Returns `false` if it already fired.
    pub fn unwatch(&mut self, id: WatchId) -> bool {
        let before = self.watches.len();
        self.watches.retain(|w| w.id != id);
        self.watches.len() < before
    }

    /// Returns the number of pending watches.
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    fn check_intersections(&mut self) {
        if self.watches.is_empty() {
            return;
        }
        let (due, pending): (Vec<Watch>, Vec<Watch>) =
            std::mem::take(&mut self.watches).into_iter().partition(|w| {
                let ratio = self.visible_ratio(&w.scene);
                ratio > 0.0 && ratio >= w.threshold
            });
        self.watches = pending;
        for watch in due {
            debug!(scene = watch.scene.as_str(), threshold = watch.threshold; "Intersection watch fired");
            (watch.callback)(self);
        }
    }

    // --- document visibility ----------------------------------------------

    /// Returns `true` while the document is hidden.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Sets the document-hidden flag, pausing or resuming repeating timers.
    pub fn set_hidden(&mut self, hidden: bool) {
        if hidden == self.hidden {
            return;
        }
        self.hidden = hidden;
        if hidden {
            self.animator.pause_timers(self.now);
        } else {
            self.animator.resume_timers(self.now);
        }
    }

    // --- animation --------------------------------------------------------

    /// Starts a transition now.
    pub fn transition(&mut self, transition: Transition<Stage>) {
        self.animator.start(self.now, transition);
    }

    /// Starts a repeating timer now.
    pub fn start_timer(&mut self, frame: FrameFn) -> TimerId {
        self.animator.start_timer(self.now, frame)
    }

    /// Stops a repeating timer.
    pub fn stop_timer(&mut self, id: TimerId) -> bool {
        self.animator.stop_timer(id)
    }

    /// Starts a repeating timer owned by the chart whose root is `root`.
    ///
    /// The timer is stopped when another chart is mounted in the same
    /// container, or by [`Stage::stop_chart_timers`].
    pub fn start_chart_timer(&mut self, root: NodeId, frame: FrameFn) -> TimerId {
        let id = self.animator.start_timer(self.now, frame);
        self.chart_timers.entry(root).or_default().push(id);
        id
    }

    /// Stops every timer owned by the chart rooted at `root` and returns how
    /// many were still running.
    pub fn stop_chart_timers(&mut self, root: NodeId) -> usize {
        self.chart_timers
            .remove(&root)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| self.animator.stop_timer(*id))
            .count()
    }

    /// Advances the clock by `ms`, one frame at a time.
    ///
    /// Frames are at least [`MIN_FRAME_MS`] long, whatever the configured
    /// frame length.
    pub fn advance(&mut self, ms: f64) {
        let target = self.now + ms.max(0.0);
        let frame = self.timing.frame_ms().max(MIN_FRAME_MS);
        while self.now < target {
            self.now = (self.now + frame).min(target);
            self.frame();
        }
    }

    /// Runs one frame at the current time without moving the clock.
    pub fn frame(&mut self) {
        self.check_intersections();
        let callbacks = self.animator.tick(self.now, &mut self.scene);
        for callback in callbacks {
            callback(self);
        }
    }

    // --- reveal bookkeeping -----------------------------------------------

    /// Returns the reveal state of a chart root.
    pub fn reveal_state(&self, root: NodeId) -> Option<RevealState> {
        self.reveals.get(&root).copied()
    }

    /// Advances the reveal state of a chart root. Moving backwards is ignored.
    pub fn set_reveal_state(&mut self, root: NodeId, state: RevealState) {
        let current = self.reveals.entry(root).or_insert(RevealState::NotYetVisible);
        if state > *current {
            *current = state;
        }
    }

    // --- pointer ----------------------------------------------------------

    /// Installs the pointer handler of a chart, replacing any previous one.
    pub fn on_pointer(&mut self, svg: NodeId, handler: PointerHandler) {
        self.pointer_handlers.insert(svg, handler);
    }

    /// Delivers a pointer move in chart coordinates to a container's chart.
    ///
    /// Returns `false` if the container has no chart or no handler.
    pub fn pointer_move(&mut self, selector: &str, local: Point) -> bool {
        let Some((svg, scene)) = self
            .containers
            .get(selector)
            .and_then(|c| c.chart.map(|chart| (chart.svg, c.scene.clone())))
        else {
            return false;
        };
        let top = self.scene_top(&scene).unwrap_or(0.0);
        let page = Point::new(local.x(), top + local.y());
        self.dispatch_pointer(svg, &PointerEvent::Move { local, page })
    }

    /// Delivers a pointer leave to a container's chart.
    pub fn pointer_leave(&mut self, selector: &str) -> bool {
        let Some(svg) = self.chart(selector).map(|chart| chart.svg) else {
            return false;
        };
        self.dispatch_pointer(svg, &PointerEvent::Leave)
    }

    fn dispatch_pointer(&mut self, svg: NodeId, event: &PointerEvent) -> bool {
        match self.pointer_handlers.get_mut(&svg) {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    // --- export -----------------------------------------------------------

    /// Exports a container's chart as a standalone SVG document.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::ContainerNotFound`] for an unknown container and
    /// [`GeoError::Export`] if no chart is mounted in it.
    pub fn export_chart(&self, selector: &str) -> Result<svg::Document, GeoError> {
        let container = self
            .containers
            .get(selector)
            .ok_or_else(|| GeoError::ContainerNotFound(selector.to_string()))?;
        let chart = container
            .chart
            .ok_or_else(|| GeoError::Export(format!("no chart mounted in `{selector}`")))?;
        Ok(render_document(&self.scene, chart.root, chart.size))
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("now", &self.now)
            .field("hidden", &self.hidden)
            .field("scroll_y", &self.scroll_y)
            .field("scenes", &self.scenes)
            .field("containers", &self.containers)
            .field("watches", &self.watches.len())
            .field("animator", &self.animator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    fn stage() -> Stage {
        let mut stage = Stage::new(TimingConfig::new(1.0, 10.0), ViewportConfig::new(100.0, true));
        stage.add_scene("a");
        stage.add_scene("b");
        stage.add_container("#fig-b", "b").unwrap();
        stage
    }

    #[test]
    fn test_scenes_stack_vertically() {
        let stage = stage();
        assert_eq!(stage.scene_top("a"), Some(0.0));
        assert_eq!(stage.scene_top("b"), Some(100.0));
        assert_eq!(stage.container_scene("#fig-b"), Some("b"));
    }

    #[test]
    fn test_visible_ratio() {
        let mut stage = stage();
        assert_eq!(stage.visible_ratio("a"), 1.0);
        assert_eq!(stage.visible_ratio("b"), 0.0);
        stage.scroll_to(40.0);
        assert!((stage.visible_ratio("b") - 0.4).abs() < 1e-6);
        assert_eq!(stage.visible_ratio("missing"), 0.0);
    }

    #[test]
    fn test_watch_fires_once_on_threshold() {
        let mut stage = stage();
        let fired = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&fired);
        stage.watch_intersection("b", 0.5, move |_| *counter.borrow_mut() += 1);

        stage.scroll_to(30.0);
        assert_eq!(*fired.borrow(), 0);
        stage.scroll_to(60.0);
        assert_eq!(*fired.borrow(), 1);
        stage.scroll_to(0.0);
        stage.scroll_to(100.0);
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(stage.watch_count(), 0);
    }

    #[test]
    fn test_unwatch() {
        let mut stage = stage();
        let id = stage.watch_intersection("b", 0.1, |_| panic!("must not fire"));
        assert!(stage.unwatch(id));
        stage.scroll_to(100.0);
        assert!(!stage.unwatch(id));
    }

    #[test]
    fn test_advance_steps_frames_and_runs_callbacks() {
        let mut stage = stage();
        let root = stage.scene().root();
        let node = stage.scene_mut().append(root, ElementKind::Circle);
        stage.scene_mut().set_attr(node, "r", 0.0);
        stage.transition(
            Transition::new(node)
                .attr("r", 10.0)
                .duration(25.0)
                .on_end(move |stage: &mut Stage| stage.scene_mut().set_attr(node, "done", 1.0)),
        );

        stage.advance(20.0);
        assert_eq!(stage.now(), 20.0);
        assert_eq!(stage.scene().number(node, "done"), None);

        stage.advance(10.0);
        assert_eq!(stage.scene().number(node, "r"), Some(10.0));
        assert_eq!(stage.scene().number(node, "done"), Some(1.0));
    }

    #[test]
    fn test_hidden_pauses_timers() {
        let mut stage = stage();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        stage.start_timer(Box::new(move |elapsed, _| log.borrow_mut().push(elapsed)));

        stage.advance(20.0);
        stage.set_hidden(true);
        stage.advance(100.0);
        stage.set_hidden(false);
        stage.advance(10.0);

        assert_eq!(seen.borrow().last().copied(), Some(30.0));
    }

    #[test]
    fn test_advance_terminates_with_zero_frame_length() {
        let timing: TimingConfig = serde_json::from_value(serde_json::json!({ "frame_ms": 0.0 })).unwrap();
        assert_eq!(timing.frame_ms(), 0.0);
        let mut stage = Stage::new(timing, ViewportConfig::new(100.0, true));
        let frames = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&frames);
        stage.start_timer(Box::new(move |_, _| *counter.borrow_mut() += 1));

        stage.advance(5.0);
        assert_eq!(stage.now(), 5.0);
        assert_eq!(*frames.borrow(), 5);
    }

    #[test]
    fn test_remount_stops_previous_chart_timers() {
        let mut stage = stage();
        let first = stage.mount_chart("#fig-b", Size::new(10.0, 10.0)).unwrap();
        let ticks = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&ticks);
        stage.start_chart_timer(first.root, Box::new(move |_, _| *counter.borrow_mut() += 1));
        let unowned = stage.start_timer(Box::new(|_, _| {}));
        stage.advance(20.0);
        assert_eq!(*ticks.borrow(), 2);

        stage.mount_chart("#fig-b", Size::new(10.0, 10.0)).unwrap();
        assert_eq!(stage.animator().timer_count(), 1);
        stage.advance(20.0);
        assert_eq!(*ticks.borrow(), 2);
        assert!(stage.stop_timer(unowned));
        assert_eq!(stage.stop_chart_timers(first.root), 0);
    }

    #[test]
    fn test_mount_chart_starts_hidden() {
        let mut stage = stage();
        let mount = stage.mount_chart("#fig-b", Size::new(10.0, 10.0)).unwrap();
        assert_eq!(stage.scene().number(mount.root, "opacity"), Some(0.0));
        assert_eq!(stage.reveal_state(mount.root), Some(RevealState::NotYetVisible));
        assert!(matches!(
            stage.mount_chart("#nope", Size::new(1.0, 1.0)),
            Err(GeoError::ContainerNotFound(_))
        ));
    }

    #[test]
    fn test_reveal_state_is_monotonic() {
        let mut stage = stage();
        let mount = stage.mount_chart("#fig-b", Size::new(10.0, 10.0)).unwrap();
        stage.set_reveal_state(mount.root, RevealState::Revealed);
        stage.set_reveal_state(mount.root, RevealState::FadingIn);
        assert_eq!(stage.reveal_state(mount.root), Some(RevealState::Revealed));
    }

    #[test]
    fn test_pointer_dispatch_uses_page_coordinates() {
        let mut stage = stage();
        let mount = stage.mount_chart("#fig-b", Size::new(10.0, 10.0)).unwrap();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        stage.on_pointer(
            mount.svg,
            Box::new(move |event| *sink.borrow_mut() = Some(*event)),
        );

        assert!(stage.pointer_move("#fig-b", Point::new(3.0, 4.0)));
        assert_eq!(
            *seen.borrow(),
            Some(PointerEvent::Move {
                local: Point::new(3.0, 4.0),
                page: Point::new(3.0, 104.0)
            })
        );
        assert!(stage.pointer_leave("#fig-b"));
        assert_eq!(*seen.borrow(), Some(PointerEvent::Leave));
        assert!(!stage.pointer_move("#nope", Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_export_chart() {
        let mut stage = stage();
        assert!(matches!(stage.export_chart("#fig-b"), Err(GeoError::Export(_))));
        stage.mount_chart("#fig-b", Size::new(300.0, 200.0)).unwrap();
        let svg = stage.export_chart("#fig-b").unwrap().to_string();
        assert!(svg.contains("viewBox=\"0 0 300 200\""));
        assert!(svg.contains("opacity=\"0\""));
    }
}
