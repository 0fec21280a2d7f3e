//! Anchor interactions mapped onto lifecycle requests per trigger mode

use tracing::trace;

use crate::commands::Cmd;
use crate::config::TriggerMode;
use crate::messages::TriggerMsg;
use crate::model::overlay::{DismissReason, OverlayInstance};

use super::lifecycle::{activate, deactivate, toggle};
use super::Env;

pub(super) fn update_trigger(
    overlay: &mut OverlayInstance,
    msg: TriggerMsg,
    env: &mut Env<'_>,
    out: &mut Vec<Cmd>,
) {
    let mode = overlay.config.trigger;

    match msg {
        TriggerMsg::PointerEnter(anchor) if mode.uses_hover() => {
            activate(overlay, anchor, env, out)
        }

        TriggerMsg::PointerLeave { anchor, related } if mode.uses_hover() => {
            if !overlay.is_showing_for(anchor) {
                return;
            }
            if !overlay.config.auto_hide {
                let onto_content = match (overlay.content(), related) {
                    (Some(content), Some(related)) => env.surface.contains(content, related),
                    _ => false,
                };
                if onto_content {
                    trace!(%anchor, "pointer moved onto content, staying open");
                    return;
                }
            }
            deactivate(overlay, DismissReason::PointerLeave, out);
        }

        TriggerMsg::Focus(anchor) if mode.uses_focus() => activate(overlay, anchor, env, out),

        TriggerMsg::Blur(anchor) if mode.uses_focus() => {
            if overlay.is_showing_for(anchor) {
                deactivate(overlay, DismissReason::Blur, out);
            }
        }

        TriggerMsg::Click(anchor) => match mode {
            TriggerMode::Click => toggle(overlay, anchor, env, out),
            TriggerMode::Hover | TriggerMode::Both => {
                if overlay.is_showing_for(anchor) {
                    deactivate(overlay, DismissReason::AnchorClick, out);
                }
            }
            TriggerMode::Focus => {}
        },

        other => trace!(?other, ?mode, "interaction not used by trigger mode"),
    }
}
