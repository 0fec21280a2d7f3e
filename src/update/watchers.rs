//! Dismissal watchers
//!
//! Events only count while the matching subscription is registered, so
//! nothing fires after teardown even if the host delivers late. Several
//! watchers firing in one tick collapse into a single close because
//! `begin_close` only acts on an opening/open instance.

use tracing::{debug, trace};

use crate::commands::Cmd;
use crate::host::Surface;
use crate::messages::WatchMsg;
use crate::model::geometry::NodeId;
use crate::model::overlay::{DismissReason, OverlayInstance, Watch};

use super::lifecycle::{deactivate, dismiss_now, reposition};
use super::Env;

pub(super) fn update_watch(
    overlay: &mut OverlayInstance,
    msg: WatchMsg,
    env: &mut Env<'_>,
    out: &mut Vec<Cmd>,
) {
    match msg {
        WatchMsg::ContentPointer => {
            if overlay.phase().is_showing() {
                overlay.self_click = true;
            }
        }

        WatchMsg::DocumentPointer { target } => {
            if !watching(overlay, |w| matches!(w, Watch::OutsidePointer)) {
                return;
            }
            // One-shot: only the event that produced it is suppressed
            let self_click = std::mem::take(&mut overlay.self_click);
            if !overlay.config.dismissable || self_click {
                trace!(%target, self_click, "pointer kept overlay open");
                return;
            }
            if is_inside(overlay, target, env.surface) {
                return;
            }
            debug!(%target, "outside pointer");
            deactivate(overlay, DismissReason::OutsideClick, out);
        }

        WatchMsg::EscapeKey => {
            if watching(overlay, |w| matches!(w, Watch::EscapeKey)) {
                deactivate(overlay, DismissReason::Escape, out);
            }
        }

        WatchMsg::ViewportResized => {
            if watching(overlay, |w| matches!(w, Watch::ViewportResize)) {
                close_or_follow(overlay, DismissReason::Resize, env.surface, out);
            }
        }

        WatchMsg::AnchorScrolled => {
            if watching(overlay, |w| matches!(w, Watch::AnchorScroll { .. })) {
                close_or_follow(overlay, DismissReason::Scroll, env.surface, out);
            }
        }

        WatchMsg::ContentPointerLeave => {
            if watching(overlay, |w| matches!(w, Watch::ContentPointerLeave { .. })) {
                deactivate(overlay, DismissReason::PointerLeave, out);
            }
        }
    }
}

fn watching(overlay: &OverlayInstance, kind: impl Fn(&Watch) -> bool) -> bool {
    let registered = overlay.watches().any(kind);
    if !registered {
        trace!("event for unregistered watcher ignored");
    }
    registered
}

/// Target lies in the anchor or the mounted content subtree
fn is_inside(overlay: &OverlayInstance, target: NodeId, surface: &dyn Surface) -> bool {
    let in_content = overlay
        .content()
        .is_some_and(|content| surface.contains(content, target));
    let in_anchor = overlay
        .anchor()
        .is_some_and(|anchor| surface.contains(anchor, target));
    in_content || in_anchor
}

/// Resize/scroll policy: close, or re-run placement when tolerant
fn close_or_follow(
    overlay: &mut OverlayInstance,
    reason: DismissReason,
    surface: &dyn Surface,
    out: &mut Vec<Cmd>,
) {
    if overlay.config.auto_hide_on_scroll_or_resize {
        dismiss_now(overlay, reason, out);
    } else {
        reposition(overlay, surface, out);
    }
}
