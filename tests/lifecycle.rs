//! Lifecycle controller tests
//!
//! Round trips, idempotence, anchor switching, reopen-in-place, mount
//! failure and teardown, driven through the simulated runtime.

mod common;

use anchored::commands::{Cmd, OverlayEvent};
use anchored::config::{AppendTarget, OverlayConfig};
use anchored::messages::{ControlMsg, HostMsg};
use anchored::model::{
    DismissReason, MountId, NodeId, Phase, Rect, Stage, TransitionKind, Viewport,
};
use anchored::runtime::Scene;
use anchored::update::update;

use common::{
    assert_released, fixture, hide_reasons, requested_mount, show_count, timed_fixture, timeline,
};

// ========================================================================
// Round Trips
// ========================================================================

#[test]
fn test_activate_then_deactivate_returns_to_idle() {
    let mut fx = fixture();
    let id = fx.add(OverlayConfig::default());

    fx.sim.activate(id, fx.anchor);
    assert_eq!(fx.phase(id), Phase::Open);
    assert_eq!(fx.sim.mounted_count(), 1);
    assert_eq!(fx.sim.stage.layers().live_count(), 1);

    fx.sim.deactivate(id);
    assert_released(&fx, id);
    assert_eq!(fx.sim.mounted_count(), 0);
    assert_eq!(fx.sim.stage.layers().live_count(), 0);
    assert_eq!(hide_reasons(fx.sim.events()), vec![DismissReason::Api]);
}

#[test]
fn test_phases_follow_transitions() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());

    fx.sim.activate(id, fx.anchor);
    assert_eq!(fx.phase(id), Phase::Opening);
    fx.sim.advance(119);
    assert_eq!(fx.phase(id), Phase::Opening);
    fx.sim.advance(1);
    assert_eq!(fx.phase(id), Phase::Open);

    fx.sim.deactivate(id);
    assert_eq!(fx.phase(id), Phase::Closing);
    fx.sim.advance(100);
    assert_eq!(fx.phase(id), Phase::Closed);

    assert_eq!(
        timeline(fx.sim.events()),
        vec![(120, "show", Some(fx.anchor)), (220, "hide", Some(fx.anchor))]
    );
}

#[test]
fn test_content_is_placed_and_layered() {
    let mut fx = fixture();
    let id = fx.add(OverlayConfig::default());
    fx.sim.activate(id, fx.anchor);

    let content = fx.sim.content_of(id).unwrap();
    // right of the anchor, vertically centered
    let pos = fx.sim.position_of(content).unwrap();
    assert_eq!((pos.left, pos.top), (180.0, 197.0));
    assert_eq!(fx.sim.z_index_of(content), Some(1001));
}

#[test]
fn test_activate_twice_is_idempotent() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());

    fx.sim.activate(id, fx.anchor);
    fx.sim.activate(id, fx.anchor);
    fx.sim.advance(50);
    fx.sim.activate(id, fx.anchor);
    fx.sim.run_until_idle();

    assert_eq!(fx.sim.mounted_count(), 1);
    assert_eq!(fx.sim.stage.layers().live_count(), 1);
    assert_eq!(show_count(fx.sim.events()), 1);
}

#[test]
fn test_deactivate_when_closed_is_noop() {
    let mut fx = fixture();
    let id = fx.add(OverlayConfig::default());
    fx.sim.deactivate(id);
    fx.sim.deactivate(id);
    assert!(fx.sim.events().is_empty());
    assert_released(&fx, id);
}

// ========================================================================
// Anchor Switching
// ========================================================================

#[test]
fn test_switch_anchor_closes_then_opens() {
    let mut fx = fixture();
    let id = fx.add(OverlayConfig::default());

    fx.sim.activate(id, fx.anchor);
    fx.sim.activate(id, fx.other);

    assert_eq!(fx.sim.stage.get(id).unwrap().anchor(), Some(fx.other));
    assert_eq!(
        timeline(fx.sim.events()),
        vec![
            (0, "show", Some(fx.anchor)),
            (0, "hide", Some(fx.anchor)),
            (0, "show", Some(fx.other)),
        ]
    );
    assert_eq!(fx.sim.mounted_count(), 1);
}

#[test]
fn test_switch_during_opening_waits_for_transition() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());

    fx.sim.activate(id, fx.anchor);
    fx.sim.advance(50);
    fx.sim.activate(id, fx.other);
    assert_eq!(fx.sim.stage.get(id).unwrap().pending_reopen(), Some(fx.other));
    fx.sim.run_until_idle();

    assert_eq!(
        timeline(fx.sim.events()),
        vec![
            (120, "show", Some(fx.anchor)),
            (220, "hide", Some(fx.anchor)),
            (340, "show", Some(fx.other)),
        ]
    );
    // never two transitions in flight for one overlay
    let starts: Vec<u64> = fx.sim.transition_log().iter().map(|(at, _, _)| *at).collect();
    assert_eq!(starts, vec![0, 120, 220]);
}

#[test]
fn test_same_anchor_while_closing_reopens_in_place() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());

    fx.sim.activate(id, fx.anchor);
    fx.sim.advance(120);
    let content = fx.sim.content_of(id).unwrap();
    let z_index = fx.sim.z_index_of(content);

    fx.sim.advance(30);
    fx.sim.deactivate(id);
    fx.sim.advance(50);
    fx.sim.activate(id, fx.anchor);
    fx.sim.run_until_idle();

    assert_eq!(fx.phase(id), Phase::Open);
    assert_eq!(fx.sim.content_of(id), Some(content));
    assert_eq!(fx.sim.z_index_of(content), z_index);
    assert_eq!(
        timeline(fx.sim.events()),
        vec![
            (120, "show", Some(fx.anchor)),
            (250, "hide", Some(fx.anchor)),
            (350, "show", Some(fx.anchor)),
        ]
    );
}

#[test]
fn test_deactivate_while_closing_drops_queued_reopen() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());

    fx.sim.activate(id, fx.anchor);
    fx.sim.advance(120);
    fx.sim.deactivate(id);
    fx.sim.activate(id, fx.other);
    fx.sim.deactivate(id);
    fx.sim.run_until_idle();

    assert_released(&fx, id);
    assert_eq!(show_count(fx.sim.events()), 1);
}

#[test]
fn test_deactivate_during_opening_runs_out_after_in() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());

    fx.sim.activate(id, fx.anchor);
    fx.sim.advance(40);
    fx.sim.deactivate(id);
    assert_eq!(fx.phase(id), Phase::Closing);
    fx.sim.run_until_idle();

    let kinds: Vec<TransitionKind> = fx.sim.transition_log().iter().map(|(_, _, k)| *k).collect();
    assert_eq!(kinds, vec![TransitionKind::In, TransitionKind::Out]);
    // Show never emitted, so no Hide either
    assert!(fx.sim.events().is_empty());
    assert_released(&fx, id);
}

// ========================================================================
// Failures and Teardown
// ========================================================================

#[test]
fn test_mount_failure_emits_error_and_releases() {
    let mut fx = fixture();
    let config = OverlayConfig {
        append_target: AppendTarget::Node(NodeId(999)),
        ..OverlayConfig::default()
    };
    let id = fx.add(config);

    fx.sim.activate(id, fx.anchor);

    let events = fx.sim.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0].event,
        OverlayEvent::Error { message } if message.contains("node#999")
    ));
    assert_released(&fx, id);
    assert_eq!(fx.sim.stage.layers().live_count(), 0);
}

#[test]
fn test_mount_into_anchor() {
    let mut fx = fixture();
    let config = OverlayConfig {
        append_target: AppendTarget::Anchor,
        ..OverlayConfig::default()
    };
    let id = fx.add(config);
    fx.sim.activate(id, fx.anchor);

    let content = fx.sim.content_of(id).unwrap();
    assert_eq!(fx.sim.scene.parent(content), Some(fx.anchor));
}

#[test]
fn test_destroy_is_idempotent() {
    let mut fx = fixture();
    let id = fx.add(OverlayConfig::default());
    fx.sim.activate(id, fx.anchor);

    fx.sim.send(id, ControlMsg::Destroy);
    fx.sim.send(id, ControlMsg::Destroy);

    assert_eq!(hide_reasons(fx.sim.events()), vec![DismissReason::Destroyed]);
    assert_released(&fx, id);
    assert_eq!(fx.sim.mounted_count(), 0);
}

#[test]
fn test_removing_anchor_destroys_overlay() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());
    fx.sim.activate(id, fx.anchor);
    fx.sim.advance(200);

    fx.sim.remove_node(fx.anchor);

    assert_released(&fx, id);
    assert_eq!(hide_reasons(fx.sim.events()), vec![DismissReason::Destroyed]);
}

#[test]
fn test_removed_anchor_mid_opening_does_not_get_stuck() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());
    fx.sim.activate(id, fx.anchor);
    fx.sim.advance(60);

    fx.sim.remove_node(fx.anchor);
    fx.sim.run_until_idle();

    assert_released(&fx, id);
    assert!(fx.sim.events().is_empty());
}

#[test]
fn test_deactivate_before_mount_reply_unmounts_on_arrival() {
    let mut scene = Scene::new(Viewport::new(800.0, 600.0));
    let anchor = scene.add(scene.body(), Rect::new(10.0, 10.0, 40.0, 20.0));
    let mut stage = Stage::new();
    let id = stage.add(OverlayConfig::default());

    let mount = requested_mount(update(
        &mut stage,
        id,
        ControlMsg::Activate(anchor).into(),
        &scene,
    ));

    update(&mut stage, id, ControlMsg::Deactivate.into(), &scene);
    assert_eq!(stage.get(id).unwrap().phase(), Phase::Closing);

    let content = scene.add(scene.body(), Rect::sized(120.0, 30.0));
    let cmds = update(&mut stage, id, HostMsg::Mounted { mount, content }.into(), &scene)
        .unwrap()
        .flatten();

    assert!(cmds.contains(&Cmd::Unmount { content }));
    assert!(!cmds.iter().any(|c| matches!(c, Cmd::Emit(_))));
    assert!(stage.get(id).unwrap().is_idle());
    assert_eq!(stage.layers().live_count(), 0);
}

#[test]
fn test_stale_mount_reply_is_unmounted() {
    let mut scene = Scene::new(Viewport::new(800.0, 600.0));
    let mut stage = Stage::new();
    let id = stage.add(OverlayConfig::default());

    let stray = scene.add(scene.body(), Rect::sized(10.0, 10.0));
    let reply = HostMsg::Mounted {
        mount: MountId(99),
        content: stray,
    };
    let cmd = update(&mut stage, id, reply.into(), &scene);
    assert_eq!(cmd, Some(Cmd::Unmount { content: stray }));
    assert!(stage.get(id).unwrap().is_idle());
}

#[test]
fn test_mount_reply_for_abandoned_open_is_not_adopted() {
    let mut scene = Scene::new(Viewport::new(800.0, 600.0));
    let anchor = scene.add(scene.body(), Rect::new(10.0, 10.0, 40.0, 20.0));
    let other = scene.add(scene.body(), Rect::new(300.0, 10.0, 40.0, 20.0));
    let mut stage = Stage::new();
    let id = stage.add(OverlayConfig::default());

    let first = requested_mount(update(
        &mut stage,
        id,
        ControlMsg::Activate(anchor).into(),
        &scene,
    ));
    update(&mut stage, id, ControlMsg::Destroy.into(), &scene);
    let second = requested_mount(update(
        &mut stage,
        id,
        ControlMsg::Activate(other).into(),
        &scene,
    ));
    assert_ne!(first, second);

    // the first mount lands late
    let late = scene.add(scene.body(), Rect::sized(120.0, 30.0));
    let cmd = update(
        &mut stage,
        id,
        HostMsg::Mounted {
            mount: first,
            content: late,
        }
        .into(),
        &scene,
    );
    assert_eq!(cmd, Some(Cmd::Unmount { content: late }));
    assert_eq!(stage.get(id).unwrap().content(), None);
    assert!(stage.get(id).unwrap().awaiting_mount());

    let content = scene.add(scene.body(), Rect::sized(120.0, 30.0));
    update(
        &mut stage,
        id,
        HostMsg::Mounted {
            mount: second,
            content,
        }
        .into(),
        &scene,
    );
    assert_eq!(stage.get(id).unwrap().content(), Some(content));
}

#[test]
fn test_destroy_mid_show_then_reopen_ignores_old_animation() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());

    fx.sim.activate(id, fx.anchor);
    fx.sim.advance(50);
    fx.sim.send(id, ControlMsg::Destroy);
    assert!(!fx.sim.transition_in_flight(id));
    fx.sim.advance(10);
    fx.sim.activate(id, fx.other);

    // the first show would have ended at 120
    fx.sim.advance(60);
    assert_eq!(fx.phase(id), Phase::Opening);
    assert!(fx.sim.events().is_empty());

    fx.sim.advance(60);
    assert_eq!(timeline(fx.sim.events()), vec![(180, "show", Some(fx.other))]);
}

#[test]
fn test_close_after_destroy_and_reopen_waits_for_new_show() {
    let mut fx = timed_fixture();
    let id = fx.add(OverlayConfig::default());

    fx.sim.activate(id, fx.anchor);
    fx.sim.advance(50);
    fx.sim.send(id, ControlMsg::Destroy);
    fx.sim.advance(10);
    fx.sim.activate(id, fx.other);
    fx.sim.advance(10);
    fx.sim.deactivate(id);
    fx.sim.run_until_idle();

    let log: Vec<(u64, TransitionKind)> = fx
        .sim
        .transition_log()
        .iter()
        .map(|(at, _, kind)| (*at, *kind))
        .collect();
    assert_eq!(
        log,
        vec![
            (0, TransitionKind::In),
            (60, TransitionKind::In),
            (180, TransitionKind::Out)
        ]
    );
    assert!(fx.sim.overlapping_transitions().is_empty());
    // show never completed, so no events
    assert!(fx.sim.events().is_empty());
    assert_released(&fx, id);
}

#[test]
fn test_content_change_repositions_without_reopening() {
    let mut fx = fixture();
    let id = fx.add(OverlayConfig::default());
    fx.sim.activate(id, fx.anchor);

    let content = fx.sim.content_of(id).unwrap();
    let pos = fx.sim.position_of(content).unwrap();
    // content grew taller
    fx.sim
        .scene
        .set_rect(content, Rect::new(pos.left, pos.top, 120.0, 60.0));
    fx.sim.send(id, ControlMsg::ContentChanged { has_content: true });

    let pos = fx.sim.position_of(content).unwrap();
    assert_eq!((pos.left, pos.top), (180.0, 182.0));
    assert_eq!(show_count(fx.sim.events()), 1);
    assert_eq!(fx.sim.content_of(id), Some(content));
}
