//! Two-phase chart reveal.
//!
//! [`reveal`] keeps a chart root invisible until its scene scrolls into view,
//! fades it in, and only then hands control to the chart's entrance
//! animations. It knows nothing about the chart it reveals.

use log::debug;

use geodeck_core::{anim::{Ease, Transition}, draw::NodeId};

use crate::stage::{RevealState, Stage, StageCallback};

/// Parameters of one reveal.
#[derive(Debug, Clone)]
pub struct RevealOptions {
    /// Selector of the container whose scene is watched.
    pub container: String,
    /// Root group that fades in.
    pub root: NodeId,
    /// Effective fade duration in milliseconds.
    pub fade_ms: f64,
    pub ease: Ease,
    /// Visible fraction of the scene that triggers the fade.
    pub threshold: f32,
}

/// Fades `options.root` in on first viewport entry, then runs `on_revealed`.
///
/// The root is set to opacity 0 immediately. When the stage cannot observe
/// intersections, or the container is not placed in any scene, the fade
/// starts right away. `on_revealed` runs exactly once, after the fade
/// transition completes.
pub fn reveal(stage: &mut Stage, options: RevealOptions, on_revealed: StageCallback) {
    let root = options.root;
    stage.scene_mut().set_attr(root, "opacity", 0.0);
    stage.set_reveal_state(root, RevealState::NotYetVisible);

    let scene = stage.container_scene(&options.container).map(str::to_string);
    match scene {
        Some(scene) if stage.viewport().supports_intersection() => {
            debug!(
                container = options.container.as_str(),
                threshold = options.threshold;
                "Waiting for chart to enter the viewport"
            );
            let threshold = options.threshold;
            stage.watch_intersection(scene, threshold, move |stage| {
                fade_in(stage, options, on_revealed)
            });
        }
        _ => fade_in(stage, options, on_revealed),
    }
}

fn fade_in(stage: &mut Stage, options: RevealOptions, on_revealed: StageCallback) {
    let root = options.root;
    debug!(container = options.container.as_str(), fade_ms = options.fade_ms; "Revealing chart");
    stage.set_reveal_state(root, RevealState::FadingIn);
    stage.transition(
        Transition::new(root)
            .attr("opacity", 1.0)
            .duration(options.fade_ms)
            .ease(options.ease)
            .on_end(move |stage: &mut Stage| {
                stage.set_reveal_state(root, RevealState::Revealed);
                on_revealed(stage);
            }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    use geodeck_core::geometry::Size;

    use crate::config::{TimingConfig, ViewportConfig};

    fn stage(supports_intersection: bool) -> Stage {
        let mut stage = Stage::new(
            TimingConfig::new(1.0, 10.0),
            ViewportConfig::new(100.0, supports_intersection),
        );
        stage.add_scene("intro");
        stage.add_scene("map");
        stage.add_container("#map", "map").unwrap();
        stage
    }

    fn options(root: NodeId) -> RevealOptions {
        RevealOptions {
            container: "#map".to_string(),
            root,
            fade_ms: 50.0,
            ease: Ease::CubicOut,
            threshold: 0.45,
        }
    }

    #[test]
    fn test_reveal_waits_for_intersection() {
        let mut stage = stage(true);
        let mount = stage.mount_chart("#map", Size::new(10.0, 10.0)).unwrap();
        let revealed = Rc::new(RefCell::new(0));
        let count = Rc::clone(&revealed);
        reveal(
            &mut stage,
            options(mount.root),
            Box::new(move |_| *count.borrow_mut() += 1),
        );

        stage.advance(200.0);
        assert_eq!(stage.reveal_state(mount.root), Some(RevealState::NotYetVisible));
        assert_eq!(stage.scene().number(mount.root, "opacity"), Some(0.0));

        stage.scroll_to(50.0);
        assert_eq!(stage.reveal_state(mount.root), Some(RevealState::FadingIn));
        stage.advance(40.0);
        assert_eq!(*revealed.borrow(), 0);
        stage.advance(10.0);
        assert_eq!(stage.reveal_state(mount.root), Some(RevealState::Revealed));
        assert_eq!(stage.scene().number(mount.root, "opacity"), Some(1.0));
        assert_eq!(*revealed.borrow(), 1);

        stage.scroll_to(0.0);
        stage.scroll_to(100.0);
        stage.advance(100.0);
        assert_eq!(*revealed.borrow(), 1);
    }

    #[test]
    fn test_reveal_without_intersection_support_starts_immediately() {
        let mut stage = stage(false);
        let mount = stage.mount_chart("#map", Size::new(10.0, 10.0)).unwrap();
        let revealed = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&revealed);
        reveal(
            &mut stage,
            options(mount.root),
            Box::new(move |_| *flag.borrow_mut() = true),
        );

        assert_eq!(stage.reveal_state(mount.root), Some(RevealState::FadingIn));
        stage.advance(50.0);
        assert!(*revealed.borrow());
    }
}
