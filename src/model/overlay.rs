//! State of one overlay instance
//!
//! An instance pairs one floating panel with the anchor it is currently
//! shown for. Everything it owns while showing (layer token, timers,
//! watcher subscriptions, mounted content) is released by a single
//! teardown step in the update layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::OverlayConfig;
use crate::model::geometry::NodeId;
use crate::model::layering::LayerToken;
use crate::placement::PlacementResult;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Closed,
    /// Mounting and animating in
    Opening,
    Open,
    /// Animating out
    Closing,
}

impl Phase {
    /// Opening or open: the overlay is (becoming) visible
    pub fn is_showing(self) -> bool {
        matches!(self, Phase::Opening | Phase::Open)
    }

    pub fn is_active(self) -> bool {
        self != Phase::Closed
    }
}

/// Direction of an animated transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    In,
    Out,
}

/// Why an overlay closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissReason {
    /// Explicit deactivate/toggle call
    Api,
    OutsideClick,
    Escape,
    Resize,
    Scroll,
    /// Auto-close timer
    Life,
    PointerLeave,
    Blur,
    AnchorClick,
    Disabled,
    /// Host tore the instance down
    Destroyed,
}

/// What a scheduled timer is for; each purpose has at most one live timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerPurpose {
    ShowDelay,
    HideDelay,
    Life,
    Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub u64);

/// Tags one mount request; replies carrying another id are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountId(pub u64);

/// Tags one host animation; ends carrying another id are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(pub u64);

/// Dismissal trigger kinds the host can be asked to watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Watch {
    /// Document-level pointer/tap
    OutsidePointer,
    EscapeKey,
    ViewportResize,
    /// Any scroll container holding the anchor. Closes only when
    /// `autoHideOnScrollOrResize` is set; otherwise placement is re-run.
    AnchorScroll { anchor: NodeId },
    /// Pointer leaving the mounted content
    ContentPointerLeave { content: NodeId },
}

impl Watch {
    /// Same kind, ignoring node payloads
    pub fn same_kind(&self, other: &Watch) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Z-order held while the overlay is active
#[derive(Debug, PartialEq, Eq)]
pub enum Layer {
    Allocated(LayerToken),
    Fixed(i32),
}

impl Layer {
    pub fn z_index(&self) -> i32 {
        match self {
            Layer::Allocated(token) => token.z_index(),
            Layer::Fixed(z) => *z,
        }
    }
}

/// One overlay and everything it holds
#[derive(Debug)]
pub struct OverlayInstance {
    pub config: OverlayConfig,
    pub(crate) phase: Phase,
    /// Anchor of the most recent open
    pub(crate) anchor: Option<NodeId>,
    pub(crate) content: Option<NodeId>,
    pub(crate) layer: Option<Layer>,
    pub(crate) timers: BTreeMap<TimerPurpose, TimerId>,
    pub(crate) subscriptions: Vec<(SubscriptionId, Watch)>,
    /// Mount request still awaiting the host's reply
    pub(crate) mount: Option<MountId>,
    /// Transition the host is currently running
    pub(crate) transition: Option<(TransitionId, TransitionKind)>,
    /// Anchor to open for once the in-flight transitions finish
    pub(crate) pending_reopen: Option<NodeId>,
    /// Anchor waiting on the show delay
    pub(crate) armed: Option<NodeId>,
    pub(crate) close_reason: Option<DismissReason>,
    /// Reason to use when the hide-delay timer fires
    pub(crate) hide_reason: Option<DismissReason>,
    /// `Show` was emitted for the current open
    pub(crate) shown: bool,
    /// A click was just observed inside the content
    pub(crate) self_click: bool,
    pub(crate) has_content: bool,
    pub(crate) last_placement: Option<PlacementResult>,
    next_handle: u64,
}

impl OverlayInstance {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            phase: Phase::Closed,
            anchor: None,
            content: None,
            layer: None,
            timers: BTreeMap::new(),
            subscriptions: Vec::new(),
            mount: None,
            transition: None,
            pending_reopen: None,
            armed: None,
            close_reason: None,
            hide_reason: None,
            shown: false,
            self_click: false,
            has_content: true,
            last_placement: None,
            next_handle: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn anchor(&self) -> Option<NodeId> {
        self.anchor
    }

    pub fn content(&self) -> Option<NodeId> {
        self.content
    }

    pub fn z_index(&self) -> Option<i32> {
        self.layer.as_ref().map(Layer::z_index)
    }

    pub fn has_layer(&self) -> bool {
        self.layer.is_some()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn has_timer(&self, purpose: TimerPurpose) -> bool {
        self.timers.contains_key(&purpose)
    }

    pub fn watches(&self) -> impl Iterator<Item = &Watch> {
        self.subscriptions.iter().map(|(_, watch)| watch)
    }

    pub fn is_watching(&self, watch: &Watch) -> bool {
        self.watches().any(|w| w.same_kind(watch))
    }

    pub fn pending_reopen(&self) -> Option<NodeId> {
        self.pending_reopen
    }

    pub fn transition(&self) -> Option<TransitionKind> {
        self.transition.map(|(_, kind)| kind)
    }

    pub fn awaiting_mount(&self) -> bool {
        self.mount.is_some()
    }

    pub fn last_placement(&self) -> Option<&PlacementResult> {
        self.last_placement.as_ref()
    }

    /// Visible (or becoming visible) for `anchor`
    pub fn is_showing_for(&self, anchor: NodeId) -> bool {
        (self.phase.is_showing() && self.anchor == Some(anchor)) || self.armed == Some(anchor)
    }

    /// No watchers, no timers, no layer, nothing mounted, nothing queued
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Closed
            && self.layer.is_none()
            && self.timers.is_empty()
            && self.subscriptions.is_empty()
            && self.content.is_none()
            && self.mount.is_none()
            && self.transition.is_none()
            && self.pending_reopen.is_none()
            && self.armed.is_none()
    }

    pub(crate) fn next_timer_id(&mut self) -> TimerId {
        self.next_handle += 1;
        TimerId(self.next_handle)
    }

    pub(crate) fn next_subscription_id(&mut self) -> SubscriptionId {
        self.next_handle += 1;
        SubscriptionId(self.next_handle)
    }

    pub(crate) fn next_mount_id(&mut self) -> MountId {
        self.next_handle += 1;
        MountId(self.next_handle)
    }

    pub(crate) fn next_transition_id(&mut self) -> TransitionId {
        self.next_handle += 1;
        TransitionId(self.next_handle)
    }

    pub(crate) fn timer_purpose(&self, timer: TimerId) -> Option<TimerPurpose> {
        self.timers
            .iter()
            .find(|(_, id)| **id == timer)
            .map(|(purpose, _)| *purpose)
    }
}
