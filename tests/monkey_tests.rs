//! Monkey tests - long deterministic request sequences
//!
//! These tests throw mixed activate/deactivate/toggle/destroy/timer/host
//! sequences at the timed simulation and check the lifecycle invariants
//! after every single step.

mod common;

use anchored::commands::OverlayEvent;
use anchored::config::OverlayConfig;
use anchored::messages::ControlMsg;
use anchored::model::{OverlayId, Rect};

use common::{assert_released, timed_fixture, Fixture};

/// Small LCG so every run replays the same sequence
struct Sequence(u64);

impl Sequence {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

fn check_invariants(fx: &Fixture, ids: &[OverlayId], step: usize) {
    assert!(
        fx.sim.overlapping_transitions().is_empty(),
        "step {}: transition started over a running one: {:?}",
        step,
        fx.sim.overlapping_transitions()
    );
    for &id in ids {
        let overlay = fx.sim.stage.get(id).unwrap();
        assert_eq!(
            overlay.has_layer(),
            overlay.phase().is_active(),
            "step {}: layer held in {:?}",
            step,
            overlay.phase()
        );
        if !overlay.phase().is_active() {
            assert!(
                !fx.sim.transition_in_flight(id),
                "step {}: host still animating a closed overlay",
                step
            );
            assert_eq!(fx.sim.live_subscriptions(id), 0, "step {}", step);
            assert_eq!(overlay.content(), None, "step {}", step);
        }
    }
}

/// Show and hide strictly alternate per overlay, starting with show
fn check_event_order(fx: &Fixture, ids: &[OverlayId]) {
    for &id in ids {
        let kinds: Vec<bool> = fx
            .sim
            .events()
            .iter()
            .filter(|e| e.overlay == id)
            .filter_map(|e| match e.event {
                OverlayEvent::Show { .. } => Some(true),
                OverlayEvent::Hide { .. } => Some(false),
                OverlayEvent::Error { .. } => None,
            })
            .collect();
        for (i, shown) in kinds.iter().enumerate() {
            assert_eq!(*shown, i % 2 == 0, "{}: events out of order: {:?}", id, kinds);
        }
    }
}

fn run_sequence(seed: u64, steps: usize) {
    let mut fx = timed_fixture();
    let plain = fx.add(OverlayConfig::default());
    let delayed = fx.add(
        OverlayConfig::default()
            .with_show_delay(40)
            .with_hide_delay(70)
            .with_life(400),
    );
    let ids = [plain, delayed];
    let mut seq = Sequence(seed);

    for step in 0..steps {
        let id = ids[seq.next(2) as usize];
        match seq.next(10) {
            0 => fx.sim.activate(id, fx.anchor),
            1 => fx.sim.activate(id, fx.other),
            2 => fx.sim.deactivate(id),
            3 => fx.sim.toggle(id, fx.anchor),
            4 => fx.sim.send(id, ControlMsg::Destroy),
            5 | 6 => fx.sim.advance(seq.next(150)),
            7 => {
                fx.sim.remove_node(fx.anchor);
                let body = fx.sim.body();
                fx.anchor = fx.sim.add_node(body, Rect::new(100.0, 200.0, 80.0, 24.0));
            }
            8 => fx.sim.press_escape(),
            _ => {
                let body = fx.sim.body();
                fx.sim.click(body);
            }
        }
        check_invariants(&fx, &ids, step);
    }

    for &id in &ids {
        fx.sim.send(id, ControlMsg::Destroy);
    }
    fx.sim.run_until_idle();
    check_invariants(&fx, &ids, steps);
    check_event_order(&fx, &ids);
    for &id in &ids {
        assert_released(&fx, id);
    }
    assert_eq!(fx.sim.stage.layers().live_count(), 0);
}

// ========================================================================
// Mixed Sequences
// ========================================================================

#[test]
fn test_mixed_sequences_keep_lifecycle_invariants() {
    for seed in 1..=40 {
        run_sequence(seed, 300);
    }
}

#[test]
fn test_long_sequence_keeps_lifecycle_invariants() {
    run_sequence(0x5eed, 5000);
}

// ========================================================================
// Rapid Alternation
// ========================================================================

#[test]
fn test_rapid_activate_deactivate_never_overlaps_transitions() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());

    for i in 0..200u64 {
        if i % 2 == 0 {
            fx.sim.activate(id, fx.anchor);
        } else {
            fx.sim.deactivate(id);
        }
        fx.sim.advance((i * 37) % 130);
        check_invariants(&fx, &[id], i as usize);
    }
    fx.sim.deactivate(id);
    fx.sim.run_until_idle();

    check_event_order(&fx, &[id]);
    assert_released(&fx, id);
}

#[test]
fn test_switching_anchors_every_tick() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());

    for i in 0..200u64 {
        let anchor = if i % 2 == 0 { fx.anchor } else { fx.other };
        fx.sim.activate(id, anchor);
        fx.sim.advance(i % 7 * 20);
        check_invariants(&fx, &[id], i as usize);
    }
    fx.sim.run_until_idle();

    check_event_order(&fx, &[id]);
    assert!(fx.sim.overlapping_transitions().is_empty());
}

#[test]
fn test_destroy_at_every_point_of_a_show() {
    for at in 0..=130 {
        let mut fx = timed_fixture();
        let id = fx.add(OverlayConfig::default());

        fx.sim.activate(id, fx.anchor);
        fx.sim.advance(at);
        fx.sim.send(id, ControlMsg::Destroy);
        fx.sim.activate(id, fx.other);
        fx.sim.deactivate(id);
        fx.sim.run_until_idle();

        check_invariants(&fx, &[id], at as usize);
        check_event_order(&fx, &[id]);
        assert_released(&fx, id);
    }
}
