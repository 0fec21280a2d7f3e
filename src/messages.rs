//! Message types for the Elm-style architecture
//!
//! Every input to an overlay flows through these types: caller requests,
//! host replies, dismissal watcher events, and anchor interactions.

use crate::model::geometry::NodeId;
use crate::model::overlay::{MountId, TimerId, TransitionId};

/// Top-level message
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Control(ControlMsg),
    Host(HostMsg),
    Watch(WatchMsg),
    Trigger(TriggerMsg),
}

/// Explicit caller requests
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMsg {
    /// Show for the given anchor
    Activate(NodeId),
    /// Hide (honours the hide delay)
    Deactivate,
    /// Hide if showing for the anchor, show otherwise
    Toggle(NodeId),
    /// Tear everything down now (anchor removed, component dropped)
    Destroy,
    SetDisabled(bool),
    /// Content was replaced; `false` means there is nothing to show
    ContentChanged { has_content: bool },
}

/// Replies from the host runtime, echoing the id of the command they answer
#[derive(Debug, Clone, PartialEq)]
pub enum HostMsg {
    Mounted { mount: MountId, content: NodeId },
    MountFailed { mount: MountId, reason: String },
    TransitionEnded(TransitionId),
    TimerFired(TimerId),
}

/// Events delivered for registered dismissal watchers
#[derive(Debug, Clone, PartialEq)]
pub enum WatchMsg {
    /// Pointer/tap anywhere in the document
    DocumentPointer { target: NodeId },
    /// Pointer/tap observed inside the content (arrives before the document event)
    ContentPointer,
    EscapeKey,
    ViewportResized,
    AnchorScrolled,
    ContentPointerLeave,
}

/// Interactions on an anchor element
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerMsg {
    PointerEnter(NodeId),
    /// `related` is the node the pointer moved onto
    PointerLeave {
        anchor: NodeId,
        related: Option<NodeId>,
    },
    Focus(NodeId),
    Blur(NodeId),
    Click(NodeId),
}

impl From<ControlMsg> for Msg {
    fn from(msg: ControlMsg) -> Self {
        Msg::Control(msg)
    }
}

impl From<HostMsg> for Msg {
    fn from(msg: HostMsg) -> Self {
        Msg::Host(msg)
    }
}

impl From<WatchMsg> for Msg {
    fn from(msg: WatchMsg) -> Self {
        Msg::Watch(msg)
    }
}

impl From<TriggerMsg> for Msg {
    fn from(msg: TriggerMsg) -> Self {
        Msg::Trigger(msg)
    }
}
