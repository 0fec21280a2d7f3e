//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use anchored::commands::{Cmd, OverlayEvent};
use anchored::config::{OverlayConfig, TransitionTimings};
use anchored::model::{DismissReason, MountId, NodeId, OverlayId, Phase, Rect, Size, Viewport};
use anchored::runtime::{Simulation, TimedEvent};

pub const CONTENT: Size = Size {
    width: 120.0,
    height: 30.0,
};

/// Simulation with two sibling anchors under the body
pub struct Fixture {
    pub sim: Simulation,
    pub anchor: NodeId,
    pub other: NodeId,
}

impl Fixture {
    pub fn add(&mut self, config: OverlayConfig) -> OverlayId {
        self.sim.add_overlay(config, CONTENT)
    }

    pub fn phase(&self, id: OverlayId) -> Phase {
        self.sim.stage.get(id).unwrap().phase()
    }

    pub fn is_idle(&self, id: OverlayId) -> bool {
        self.sim.stage.get(id).unwrap().is_idle()
    }
}

pub fn viewport() -> Viewport {
    Viewport::new(800.0, 600.0)
}

fn fixture_with(sim: Simulation) -> Fixture {
    let mut sim = sim;
    let body = sim.body();
    let anchor = sim.add_node(body, Rect::new(100.0, 200.0, 80.0, 24.0));
    let other = sim.add_node(body, Rect::new(400.0, 200.0, 80.0, 24.0));
    Fixture { sim, anchor, other }
}

/// Transitions complete in the tick they start
pub fn fixture() -> Fixture {
    fixture_with(Simulation::instant(viewport()))
}

/// 120ms show / 100ms hide transitions
pub fn timed_fixture() -> Fixture {
    fixture_with(Simulation::new(viewport(), TransitionTimings::default()))
}

/// `(at_ms, "show"/"hide"/"error", anchor)` triples for compact assertions
pub fn timeline(events: &[TimedEvent]) -> Vec<(u64, &'static str, Option<NodeId>)> {
    events
        .iter()
        .map(|e| match &e.event {
            OverlayEvent::Show { anchor } => (e.at_ms, "show", Some(*anchor)),
            OverlayEvent::Hide { anchor, .. } => (e.at_ms, "hide", Some(*anchor)),
            OverlayEvent::Error { .. } => (e.at_ms, "error", None),
        })
        .collect()
}

pub fn hide_reasons(events: &[TimedEvent]) -> Vec<DismissReason> {
    events
        .iter()
        .filter_map(|e| match &e.event {
            OverlayEvent::Hide { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect()
}

pub fn show_count(events: &[TimedEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e.event, OverlayEvent::Show { .. }))
        .count()
}

/// Id of the mount request among the commands an update returned
pub fn requested_mount(cmd: Option<Cmd>) -> MountId {
    cmd.into_iter()
        .flat_map(Cmd::flatten)
        .find_map(|c| match c {
            Cmd::Mount { mount, .. } => Some(mount),
            _ => None,
        })
        .expect("no mount requested")
}

/// Everything an overlay held has been given back to the host
pub fn assert_released(fx: &Fixture, id: OverlayId) {
    assert!(fx.is_idle(id), "overlay not idle: {:?}", fx.sim.stage.get(id));
    assert_eq!(fx.sim.live_subscriptions(id), 0, "host still holds subscriptions");
    assert_eq!(fx.sim.live_timers(id), 0, "host still holds timers");
    assert!(!fx.sim.transition_in_flight(id), "transition still running");
}
