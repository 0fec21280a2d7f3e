//! Command types for the Elm-style architecture
//!
//! Commands represent side effects the host must perform after an update.
//! Completion of asynchronous ones (mount, transitions, timers) comes back
//! as a [`crate::messages::HostMsg`].

use std::time::Duration;

use serde::Serialize;

use crate::config::AppendTarget;
use crate::error::OverlayError;
use crate::model::geometry::{NodeId, Point};
use crate::model::overlay::{
    DismissReason, MountId, SubscriptionId, TimerId, TransitionId, TransitionKind, Watch,
};
use crate::placement::PlacementResult;

/// Lifecycle notifications, fired at transition completion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum OverlayEvent {
    Show { anchor: NodeId },
    Hide { anchor: NodeId, reason: DismissReason },
    Error { message: String },
}

impl From<OverlayError> for OverlayEvent {
    fn from(err: OverlayError) -> Self {
        OverlayEvent::Error {
            message: err.to_string(),
        }
    }
}

/// Side effects requested of the host
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cmd {
    /// No command - do nothing
    #[default]
    None,
    /// Attach a content node; reply with `Mounted` or `MountFailed`
    Mount {
        mount: MountId,
        anchor: NodeId,
        target: AppendTarget,
    },
    Unmount { content: NodeId },
    /// Move content to the resolved placement
    Place {
        content: NodeId,
        placement: PlacementResult,
        /// Position with viewport scroll added
        document_position: Point,
    },
    SetZIndex { content: NodeId, z_index: i32 },
    Subscribe {
        subscription: SubscriptionId,
        watch: Watch,
    },
    Unsubscribe { subscription: SubscriptionId },
    ScheduleTimer { timer: TimerId, delay: Duration },
    CancelTimer { timer: TimerId },
    /// Run the show/hide animation; reply with `TransitionEnded`
    BeginTransition {
        transition: TransitionId,
        kind: TransitionKind,
    },
    /// Abandon a running animation; no `TransitionEnded` is expected
    CancelTransition { transition: TransitionId },
    Focus { content: NodeId },
    Emit(OverlayEvent),
    /// Execute multiple commands in order
    Batch(Vec<Cmd>),
}

impl Cmd {
    /// Collapse a list into the smallest equivalent command
    pub fn batch(cmds: Vec<Cmd>) -> Option<Cmd> {
        let mut cmds: Vec<Cmd> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => None,
            1 => cmds.pop(),
            _ => Some(Cmd::Batch(cmds)),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Cmd::None)
    }

    /// Depth-first list of leaf commands
    pub fn flatten(self) -> Vec<Cmd> {
        match self {
            Cmd::None => Vec::new(),
            Cmd::Batch(cmds) => cmds.into_iter().flat_map(Cmd::flatten).collect(),
            other => vec![other],
        }
    }
}
