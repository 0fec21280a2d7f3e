//! Lifecycle controller: activation, display, dismissal and teardown
//!
//! Phases run `closed → opening → open → closing → closed`. The host runs at
//! most one transition per instance at a time; requests that arrive while
//! one is in flight are either absorbed (same anchor) or queued as a
//! pending reopen and replayed once the transition completes.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::commands::{Cmd, OverlayEvent};
use crate::config::TriggerMode;
use crate::error::OverlayError;
use crate::host::Surface;
use crate::messages::{ControlMsg, HostMsg};
use crate::model::geometry::NodeId;
use crate::model::overlay::{
    DismissReason, Layer, MountId, OverlayInstance, Phase, TimerId, TimerPurpose, TransitionId,
    TransitionKind, Watch,
};
use crate::placement::PlacementRequest;

use super::Env;

/// Delay between becoming visible and moving focus into the content
const FOCUS_DELAY: Duration = Duration::from_millis(5);

pub(super) fn update_control(
    overlay: &mut OverlayInstance,
    msg: ControlMsg,
    env: &mut Env<'_>,
    out: &mut Vec<Cmd>,
) {
    match msg {
        ControlMsg::Activate(anchor) => activate(overlay, anchor, env, out),
        ControlMsg::Deactivate => deactivate(overlay, DismissReason::Api, out),
        ControlMsg::Toggle(anchor) => toggle(overlay, anchor, env, out),
        ControlMsg::Destroy => destroy(overlay, env, out),
        ControlMsg::SetDisabled(disabled) => {
            overlay.config.disabled = disabled;
            if disabled {
                deactivate(overlay, DismissReason::Disabled, out);
            }
        }
        ControlMsg::ContentChanged { has_content } => {
            overlay.has_content = has_content;
            if !overlay.phase.is_showing() {
                return;
            }
            if has_content {
                reposition(overlay, env.surface, out);
            } else {
                deactivate(overlay, DismissReason::Api, out);
            }
        }
    }
}

pub(super) fn update_host(
    overlay: &mut OverlayInstance,
    msg: HostMsg,
    env: &mut Env<'_>,
    out: &mut Vec<Cmd>,
) {
    match msg {
        HostMsg::Mounted { mount, content } => on_mounted(overlay, mount, content, env, out),
        HostMsg::MountFailed { mount, reason } => {
            on_mount_failed(overlay, mount, reason, env, out)
        }
        HostMsg::TransitionEnded(transition) => on_transition_end(overlay, transition, env, out),
        HostMsg::TimerFired(timer) => on_timer(overlay, timer, env, out),
    }
}

// ============================================================================
// Requests
// ============================================================================

pub(super) fn activate(
    overlay: &mut OverlayInstance,
    anchor: NodeId,
    env: &mut Env<'_>,
    out: &mut Vec<Cmd>,
) {
    if overlay.config.disabled || !overlay.has_content {
        trace!(%anchor, "activation ignored: disabled or nothing to show");
        return;
    }

    match overlay.phase {
        Phase::Closed => {
            if overlay.armed == Some(anchor) {
                return;
            }
            if overlay.armed.take().is_some() {
                cancel_timer(overlay, TimerPurpose::ShowDelay, out);
            }

            schedule_life(overlay, out);
            match overlay.config.show_delay() {
                Some(delay) => {
                    overlay.armed = Some(anchor);
                    schedule_timer(overlay, TimerPurpose::ShowDelay, delay, out);
                }
                None => open(overlay, anchor, env, out),
            }
        }
        Phase::Opening | Phase::Open if overlay.anchor == Some(anchor) => {
            // Already visible for this target; drop any queued hide or switch
            if cancel_timer(overlay, TimerPurpose::HideDelay, out) {
                overlay.hide_reason = None;
                // the hide delay took the life timer with it
                if !overlay.has_timer(TimerPurpose::Life) {
                    if let Some(life) = overlay.config.life() {
                        schedule_timer(overlay, TimerPurpose::Life, life, out);
                    }
                }
            }
            overlay.pending_reopen = None;
        }
        Phase::Opening => {
            trace!(%anchor, "switch deferred until opening completes");
            overlay.pending_reopen = Some(anchor);
        }
        Phase::Open => {
            overlay.pending_reopen = Some(anchor);
            begin_close(overlay, DismissReason::Api, out);
        }
        Phase::Closing => {
            trace!(%anchor, "reopen queued behind close");
            overlay.pending_reopen = Some(anchor);
        }
    }
}

/// Close, honouring the configured hide delay
pub(super) fn deactivate(overlay: &mut OverlayInstance, reason: DismissReason, out: &mut Vec<Cmd>) {
    match overlay.phase {
        Phase::Closed => {
            if overlay.armed.take().is_some() {
                cancel_timer(overlay, TimerPurpose::ShowDelay, out);
                cancel_timer(overlay, TimerPurpose::Life, out);
                trace!("pending show cancelled");
            }
        }
        Phase::Closing => {
            if overlay.pending_reopen.take().is_some() {
                trace!("queued reopen dropped");
            }
        }
        Phase::Opening | Phase::Open => {
            overlay.pending_reopen = None;
            if let Some(delay) = overlay.config.hide_delay() {
                if overlay.has_timer(TimerPurpose::HideDelay) {
                    return;
                }
                cancel_timer(overlay, TimerPurpose::Life, out);
                overlay.hide_reason = Some(reason);
                schedule_timer(overlay, TimerPurpose::HideDelay, delay, out);
                return;
            }
            begin_close(overlay, reason, out);
        }
    }
}

/// Close immediately, skipping any hide delay
pub(super) fn dismiss_now(
    overlay: &mut OverlayInstance,
    reason: DismissReason,
    out: &mut Vec<Cmd>,
) {
    cancel_timer(overlay, TimerPurpose::HideDelay, out);
    overlay.hide_reason = None;
    begin_close(overlay, reason, out);
}

pub(super) fn toggle(
    overlay: &mut OverlayInstance,
    anchor: NodeId,
    env: &mut Env<'_>,
    out: &mut Vec<Cmd>,
) {
    if overlay.is_showing_for(anchor) {
        deactivate(overlay, DismissReason::Api, out);
    } else {
        activate(overlay, anchor, env, out);
    }
}

/// Release everything now, whatever the phase; safe to repeat
pub(super) fn destroy(overlay: &mut OverlayInstance, env: &mut Env<'_>, out: &mut Vec<Cmd>) {
    if overlay.is_idle() {
        return;
    }
    let was_shown = overlay.shown;
    overlay.pending_reopen = None;
    teardown(overlay, env, out);

    if was_shown {
        if let Some(anchor) = overlay.anchor {
            out.push(Cmd::Emit(OverlayEvent::Hide {
                anchor,
                reason: DismissReason::Destroyed,
            }));
        }
    }
    debug!("overlay destroyed");
}

// ============================================================================
// Host replies
// ============================================================================

fn on_mounted(
    overlay: &mut OverlayInstance,
    mount: MountId,
    content: NodeId,
    env: &mut Env<'_>,
    out: &mut Vec<Cmd>,
) {
    if overlay.mount != Some(mount) || overlay.content.is_some() || !overlay.phase.is_active() {
        warn!(%content, ?mount, "stale mount reply, unmounting");
        out.push(Cmd::Unmount { content });
        return;
    }
    overlay.mount = None;
    overlay.content = Some(content);

    match overlay.phase {
        Phase::Opening => {
            watch_content(overlay, content, out);
            if let Some(z_index) = overlay.z_index() {
                out.push(Cmd::SetZIndex { content, z_index });
            }
            reposition(overlay, env.surface, out);
            if overlay.config.focus_on_show {
                schedule_timer(overlay, TimerPurpose::Focus, FOCUS_DELAY, out);
            }
            begin_transition(overlay, TransitionKind::In, out);
        }
        // Deactivated before the host finished mounting
        Phase::Closing => finish_close(overlay, env, out),
        Phase::Open | Phase::Closed => {}
    }
}

fn on_mount_failed(
    overlay: &mut OverlayInstance,
    mount: MountId,
    reason: String,
    env: &mut Env<'_>,
    out: &mut Vec<Cmd>,
) {
    if overlay.mount != Some(mount) || !overlay.phase.is_active() {
        trace!(?mount, "stale mount failure ignored");
        return;
    }
    overlay.mount = None;
    // No retry, and a queued switch would hit the same target
    overlay.pending_reopen = None;

    let Some(anchor) = overlay.anchor else {
        teardown(overlay, env, out);
        return;
    };
    warn!(%anchor, %reason, "content mount failed");
    if overlay.phase == Phase::Opening {
        out.push(Cmd::Emit(OverlayError::MountFailure { anchor, reason }.into()));
    }
    teardown(overlay, env, out);
}

fn on_transition_end(
    overlay: &mut OverlayInstance,
    transition: TransitionId,
    env: &mut Env<'_>,
    out: &mut Vec<Cmd>,
) {
    let Some((_, kind)) = overlay.transition.filter(|(id, _)| *id == transition) else {
        trace!(?transition, "stale transition end dropped");
        return;
    };
    overlay.transition = None;

    match (kind, overlay.phase) {
        (TransitionKind::In, Phase::Opening) => {
            overlay.phase = Phase::Open;
            overlay.shown = true;
            if let Some(anchor) = overlay.anchor {
                out.push(Cmd::Emit(OverlayEvent::Show { anchor }));
            }
            match overlay.pending_reopen {
                Some(next) if Some(next) != overlay.anchor => {
                    begin_close(overlay, DismissReason::Api, out);
                }
                _ => overlay.pending_reopen = None,
            }
        }
        // Close requested mid-animation: now it may run
        (TransitionKind::In, Phase::Closing) => {
            begin_transition(overlay, TransitionKind::Out, out);
        }
        (TransitionKind::Out, Phase::Closing) => finish_close(overlay, env, out),
        (kind, phase) => trace!(?kind, ?phase, "transition end in unexpected phase"),
    }
}

fn on_timer(overlay: &mut OverlayInstance, timer: TimerId, env: &mut Env<'_>, out: &mut Vec<Cmd>) {
    let Some(purpose) = overlay.timer_purpose(timer) else {
        trace!(?timer, "stale timer ignored");
        return;
    };
    overlay.timers.remove(&purpose);

    match purpose {
        TimerPurpose::ShowDelay => {
            if let Some(anchor) = overlay.armed.take() {
                if overlay.phase == Phase::Closed {
                    open(overlay, anchor, env, out);
                }
            }
        }
        TimerPurpose::HideDelay => {
            let reason = overlay.hide_reason.take().unwrap_or(DismissReason::Api);
            begin_close(overlay, reason, out);
        }
        TimerPurpose::Life => {
            if overlay.armed.take().is_some() {
                cancel_timer(overlay, TimerPurpose::ShowDelay, out);
            }
            dismiss_now(overlay, DismissReason::Life, out);
        }
        TimerPurpose::Focus => {
            if let (Some(content), true) = (overlay.content, overlay.phase.is_showing()) {
                out.push(Cmd::Focus { content });
            }
        }
    }
}

// ============================================================================
// Transitions
// ============================================================================

fn open(overlay: &mut OverlayInstance, anchor: NodeId, env: &mut Env<'_>, out: &mut Vec<Cmd>) {
    overlay.phase = Phase::Opening;
    overlay.anchor = Some(anchor);
    overlay.shown = false;
    overlay.close_reason = None;
    overlay.self_click = false;

    let category = overlay.config.layer;
    overlay.layer = Some(match overlay.config.z_index {
        Some(z_index) => Layer::Fixed(z_index),
        None => {
            let base = env.bases.base(category) + overlay.config.base_z_index;
            Layer::Allocated(env.layers.acquire(base, category))
        }
    });

    watch_dismissals(overlay, anchor, out);
    let mount = overlay.next_mount_id();
    overlay.mount = Some(mount);
    out.push(Cmd::Mount {
        mount,
        anchor,
        target: overlay.config.append_target,
    });
    debug!(%anchor, "opening");
}

/// Start the close; no-op unless opening or open
pub(super) fn begin_close(
    overlay: &mut OverlayInstance,
    reason: DismissReason,
    out: &mut Vec<Cmd>,
) {
    if !overlay.phase.is_showing() {
        trace!(?reason, "close already in progress");
        return;
    }
    overlay.phase = Phase::Closing;
    overlay.close_reason = Some(reason);
    overlay.hide_reason = None;
    overlay.self_click = false;

    unwatch_all(overlay, out);
    for purpose in [TimerPurpose::HideDelay, TimerPurpose::Life, TimerPurpose::Focus] {
        cancel_timer(overlay, purpose, out);
    }

    // An in-flight show or a pending mount continues the close when it reports back
    if overlay.transition.is_none() && overlay.content.is_some() {
        begin_transition(overlay, TransitionKind::Out, out);
    }
    debug!(?reason, "closing");
}

fn finish_close(overlay: &mut OverlayInstance, env: &mut Env<'_>, out: &mut Vec<Cmd>) {
    let anchor = overlay.anchor;
    let reason = overlay.close_reason.take().unwrap_or(DismissReason::Api);
    if overlay.shown {
        if let Some(anchor) = anchor {
            out.push(Cmd::Emit(OverlayEvent::Hide { anchor, reason }));
        }
        overlay.shown = false;
    }

    match overlay.pending_reopen.take() {
        Some(next) if Some(next) == anchor && overlay.content.is_some() => {
            reopen_in_place(overlay, next, env, out);
        }
        next => {
            teardown(overlay, env, out);
            if let Some(next) = next {
                activate(overlay, next, env, out);
            }
        }
    }
}

/// Same anchor asked for again while closing: keep content and layer
fn reopen_in_place(
    overlay: &mut OverlayInstance,
    anchor: NodeId,
    env: &mut Env<'_>,
    out: &mut Vec<Cmd>,
) {
    overlay.phase = Phase::Opening;
    watch_dismissals(overlay, anchor, out);
    if let Some(content) = overlay.content {
        watch_content(overlay, content, out);
    }
    schedule_life(overlay, out);
    reposition(overlay, env.surface, out);
    begin_transition(overlay, TransitionKind::In, out);
    debug!(%anchor, "reopening in place");
}

/// Single release step shared by every exit path; idempotent
fn teardown(overlay: &mut OverlayInstance, env: &mut Env<'_>, out: &mut Vec<Cmd>) {
    unwatch_all(overlay, out);
    let timers: Vec<TimerPurpose> = overlay.timers.keys().copied().collect();
    for purpose in timers {
        cancel_timer(overlay, purpose, out);
    }

    if let Some(Layer::Allocated(token)) = overlay.layer.take() {
        env.layers.release(token);
    }
    if let Some(content) = overlay.content.take() {
        out.push(Cmd::Unmount { content });
    }
    // A reply to an abandoned mount is unmounted when it arrives
    overlay.mount = None;
    if let Some((transition, _)) = overlay.transition.take() {
        out.push(Cmd::CancelTransition { transition });
    }

    overlay.phase = Phase::Closed;
    overlay.armed = None;
    overlay.close_reason = None;
    overlay.hide_reason = None;
    overlay.shown = false;
    overlay.self_click = false;
    overlay.last_placement = None;
}

fn begin_transition(overlay: &mut OverlayInstance, kind: TransitionKind, out: &mut Vec<Cmd>) {
    let transition = overlay.next_transition_id();
    overlay.transition = Some((transition, kind));
    out.push(Cmd::BeginTransition { transition, kind });
}

// ============================================================================
// Placement
// ============================================================================

/// Resolve and apply placement; skipped when geometry is unusable
pub(super) fn reposition(overlay: &mut OverlayInstance, surface: &dyn Surface, out: &mut Vec<Cmd>) {
    let (Some(anchor), Some(content)) = (overlay.anchor, overlay.content) else {
        return;
    };
    let Some(anchor_box) = surface.usable_box(anchor) else {
        warn!("{}; placement skipped", OverlayError::GeometryUnavailable { node: anchor });
        return;
    };
    let Some(content_box) = surface.usable_box(content) else {
        warn!("{}; placement skipped", OverlayError::GeometryUnavailable { node: content });
        return;
    };

    let viewport = surface.viewport();
    let fallback = overlay.config.fallback();
    let side = overlay.config.position;
    let placement = PlacementRequest::new(anchor_box, content_box.size(), viewport, side)
        .with_fallback(&fallback)
        .with_offset(overlay.config.fixed_offset)
        .with_arrow_inset(overlay.config.arrow_inset)
        .resolve();

    if !placement.fits() {
        debug!(side = %placement.side, "no side fits the viewport");
    }
    let document_position = placement.document_position(&viewport);
    overlay.last_placement = Some(placement.clone());
    out.push(Cmd::Place {
        content,
        placement,
        document_position,
    });
}

// ============================================================================
// Watchers and timers
// ============================================================================

fn watch_dismissals(overlay: &mut OverlayInstance, anchor: NodeId, out: &mut Vec<Cmd>) {
    if overlay.config.dismissable {
        watch(overlay, Watch::OutsidePointer, out);
    }
    if overlay.config.escape_to_close {
        watch(overlay, Watch::EscapeKey, out);
    }
    watch(overlay, Watch::ViewportResize, out);
    watch(overlay, Watch::AnchorScroll { anchor }, out);
}

/// Hover tooltips that survive moving onto the content close when leaving it
fn watch_content(overlay: &mut OverlayInstance, content: NodeId, out: &mut Vec<Cmd>) {
    let hover = matches!(overlay.config.trigger, TriggerMode::Hover | TriggerMode::Both);
    if hover && !overlay.config.auto_hide {
        watch(overlay, Watch::ContentPointerLeave { content }, out);
    }
}

fn watch(overlay: &mut OverlayInstance, watch: Watch, out: &mut Vec<Cmd>) {
    if overlay.is_watching(&watch) {
        return;
    }
    let subscription = overlay.next_subscription_id();
    overlay.subscriptions.push((subscription, watch));
    out.push(Cmd::Subscribe {
        subscription,
        watch,
    });
}

fn unwatch_all(overlay: &mut OverlayInstance, out: &mut Vec<Cmd>) {
    for (subscription, _) in overlay.subscriptions.drain(..) {
        out.push(Cmd::Unsubscribe { subscription });
    }
}

fn schedule_life(overlay: &mut OverlayInstance, out: &mut Vec<Cmd>) {
    if let Some(life) = overlay.config.life_from_request() {
        schedule_timer(overlay, TimerPurpose::Life, life, out);
    }
}

/// Replaces any live timer with the same purpose
fn schedule_timer(
    overlay: &mut OverlayInstance,
    purpose: TimerPurpose,
    delay: Duration,
    out: &mut Vec<Cmd>,
) {
    cancel_timer(overlay, purpose, out);
    let timer = overlay.next_timer_id();
    overlay.timers.insert(purpose, timer);
    out.push(Cmd::ScheduleTimer { timer, delay });
}

fn cancel_timer(overlay: &mut OverlayInstance, purpose: TimerPurpose, out: &mut Vec<Cmd>) -> bool {
    match overlay.timers.remove(&purpose) {
        Some(timer) => {
            out.push(Cmd::CancelTimer { timer });
            true
        }
        None => false,
    }
}
