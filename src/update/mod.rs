//! Update functions for the Elm-style architecture
//!
//! All overlay state transformations flow through these functions. Each
//! call consumes one message and returns the host commands it produced.

mod lifecycle;
mod trigger;
mod watchers;

use crate::commands::Cmd;
use crate::config::LayerBases;
use crate::host::Surface;
use crate::messages::Msg;
use crate::model::layering::LayerAllocator;
use crate::model::overlay::{OverlayInstance, Phase};
use crate::model::stage::{OverlayId, Stage};

#[cfg(debug_assertions)]
use crate::tracing::OverlaySnapshot;
#[cfg(debug_assertions)]
use tracing::{debug, span, Level};

/// Collaborators an update needs besides the instance itself
pub struct Env<'a> {
    pub surface: &'a dyn Surface,
    pub layers: &'a mut LayerAllocator,
    pub bases: &'a LayerBases,
}

/// Route a message to one overlay of a stage
pub fn update(stage: &mut Stage, id: OverlayId, msg: Msg, surface: &dyn Surface) -> Option<Cmd> {
    let Some(overlay) = stage.overlays.get_mut(&id) else {
        tracing::warn!(%id, "message for unknown overlay dropped");
        return None;
    };
    let mut env = Env {
        surface,
        layers: &mut stage.layers,
        bases: &stage.bases,
    };
    update_overlay(overlay, msg, &mut env)
}

/// Update a single instance
///
/// In debug builds, this wraps with tracing instrumentation and checks
/// the lifecycle invariants after every message.
#[inline]
pub fn update_overlay(overlay: &mut OverlayInstance, msg: Msg, env: &mut Env<'_>) -> Option<Cmd> {
    #[cfg(debug_assertions)]
    {
        update_traced(overlay, msg, env)
    }
    #[cfg(not(debug_assertions))]
    {
        update_inner(overlay, msg, env)
    }
}

/// Inner update logic (no tracing)
fn update_inner(overlay: &mut OverlayInstance, msg: Msg, env: &mut Env<'_>) -> Option<Cmd> {
    let mut out = Vec::new();
    match msg {
        Msg::Control(m) => lifecycle::update_control(overlay, m, env, &mut out),
        Msg::Host(m) => lifecycle::update_host(overlay, m, env, &mut out),
        Msg::Watch(m) => watchers::update_watch(overlay, m, env, &mut out),
        Msg::Trigger(m) => trigger::update_trigger(overlay, m, env, &mut out),
    }
    Cmd::batch(out)
}

/// Traced update wrapper (debug builds only)
#[cfg(debug_assertions)]
fn update_traced(overlay: &mut OverlayInstance, msg: Msg, env: &mut Env<'_>) -> Option<Cmd> {
    let msg_name = msg_type_name(&msg);
    let _span = span!(Level::DEBUG, "update", msg = %msg_name).entered();

    let before = OverlaySnapshot::from_overlay(overlay);
    let result = update_inner(overlay, msg, env);
    let after = OverlaySnapshot::from_overlay(overlay);

    if let Some(diff) = before.diff(&after) {
        debug!(target: "lifecycle", "{}", diff);
    }
    assert_invariants(overlay, &msg_name);

    result
}

/// Lifecycle invariants that must hold between messages
#[cfg(debug_assertions)]
fn assert_invariants(overlay: &OverlayInstance, context: &str) {
    let phase = overlay.phase();
    debug_assert_eq!(
        overlay.has_layer(),
        phase.is_active(),
        "layer held outside opening/open/closing after {}",
        context
    );
    if !phase.is_showing() {
        debug_assert!(
            overlay.subscriptions.is_empty(),
            "watchers registered while {:?} after {}",
            phase,
            context
        );
    }
    if phase == Phase::Closed {
        debug_assert!(
            overlay.content.is_none() && overlay.mount.is_none() && overlay.transition.is_none(),
            "closed instance still mounted or animating after {}",
            context
        );
    }
}

#[cfg(debug_assertions)]
fn msg_type_name(msg: &Msg) -> String {
    match msg {
        Msg::Control(m) => format!("Control::{:?}", m),
        Msg::Host(m) => format!("Host::{:?}", m),
        Msg::Watch(m) => format!("Watch::{:?}", m),
        Msg::Trigger(m) => format!("Trigger::{:?}", m),
    }
}
