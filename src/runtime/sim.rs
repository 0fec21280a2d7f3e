//! Deterministic host that executes engine commands against a [`Scene`]
//!
//! Mounts succeed or fail synchronously, transitions finish after the
//! configured show/hide time, and timers run on a virtual clock. Host input
//! (clicks, keys, resizes, scrolls) fans out only to overlays that hold the
//! matching subscription.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use serde::Serialize;

use crate::commands::{Cmd, OverlayEvent};
use crate::config::{AppendTarget, OverlayConfig, TransitionTimings};
use crate::host::Surface;
use crate::messages::{ControlMsg, HostMsg, Msg, TriggerMsg, WatchMsg};
use crate::model::geometry::{NodeId, Point, Rect, Size, Viewport};
use crate::model::overlay::{
    MountId, SubscriptionId, TimerId, TransitionId, TransitionKind, Watch,
};
use crate::model::stage::{OverlayId, Stage};
use crate::update::update;

use super::clock::{Clock, ClockKey, Due};
use super::scene::Scene;

/// Content size used when an overlay has none configured
pub const DEFAULT_CONTENT_SIZE: Size = Size {
    width: 120.0,
    height: 30.0,
};

/// An emitted lifecycle event with its virtual time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    pub overlay: OverlayId,
    #[serde(flatten)]
    pub event: OverlayEvent,
}

pub struct Simulation {
    pub stage: Stage,
    pub scene: Scene,
    clock: Clock,
    timings: TransitionTimings,
    queue: VecDeque<(OverlayId, Msg)>,
    subscriptions: BTreeMap<(OverlayId, SubscriptionId), Watch>,
    timers: HashMap<(OverlayId, TimerId), ClockKey>,
    transitions: HashMap<OverlayId, (TransitionId, ClockKey)>,
    content_sizes: HashMap<OverlayId, Size>,
    content_owner: HashMap<NodeId, OverlayId>,
    z_indices: HashMap<NodeId, i32>,
    focused: Option<NodeId>,
    events: Vec<TimedEvent>,
    /// Every host transition request, for ordering checks
    transition_log: Vec<(u64, OverlayId, TransitionKind)>,
    /// Transitions started while another was still running for the same overlay
    overlaps: Vec<(u64, OverlayId)>,
}

impl Simulation {
    pub fn new(viewport: Viewport, timings: TransitionTimings) -> Self {
        Self {
            stage: Stage::new(),
            scene: Scene::new(viewport),
            clock: Clock::new(),
            timings,
            queue: VecDeque::new(),
            subscriptions: BTreeMap::new(),
            timers: HashMap::new(),
            transitions: HashMap::new(),
            content_sizes: HashMap::new(),
            content_owner: HashMap::new(),
            z_indices: HashMap::new(),
            focused: None,
            events: Vec::new(),
            transition_log: Vec::new(),
            overlaps: Vec::new(),
        }
    }

    /// Transitions complete in the same tick they start
    pub fn instant(viewport: Viewport) -> Self {
        Self::new(
            viewport,
            TransitionTimings {
                show_ms: 0,
                hide_ms: 0,
            },
        )
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn add_overlay(&mut self, config: OverlayConfig, content: Size) -> OverlayId {
        let id = self.stage.add(config);
        self.content_sizes.insert(id, content);
        id
    }

    pub fn add_node(&mut self, parent: NodeId, rect: Rect) -> NodeId {
        self.scene.add(parent, rect)
    }

    pub fn body(&self) -> NodeId {
        self.scene.body()
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Deliver a message and run everything it triggers at the current time
    pub fn send(&mut self, id: OverlayId, msg: impl Into<Msg>) {
        self.queue.push_back((id, msg.into()));
        self.settle();
    }

    pub fn activate(&mut self, id: OverlayId, anchor: NodeId) {
        self.send(id, ControlMsg::Activate(anchor));
    }

    pub fn deactivate(&mut self, id: OverlayId) {
        self.send(id, ControlMsg::Deactivate);
    }

    pub fn toggle(&mut self, id: OverlayId, anchor: NodeId) {
        self.send(id, ControlMsg::Toggle(anchor));
    }

    pub fn trigger(&mut self, id: OverlayId, msg: TriggerMsg) {
        self.send(id, msg);
    }

    /// Advance the virtual clock, delivering everything that falls due
    pub fn advance(&mut self, ms: u64) {
        let target = self.clock.now() + ms;
        self.run_until(target);
        self.clock.set_now(target);
    }

    pub fn advance_to(&mut self, at_ms: u64) {
        if at_ms > self.clock.now() {
            self.advance(at_ms - self.clock.now());
        }
    }

    /// Deliver everything still scheduled
    pub fn run_until_idle(&mut self) {
        while let Some(horizon) = self.clock.horizon() {
            self.run_until(horizon);
        }
        self.drain_queue();
    }

    fn settle(&mut self) {
        self.run_until(self.clock.now());
    }

    fn run_until(&mut self, limit: u64) {
        loop {
            self.drain_queue();
            let Some(due) = self.clock.pop_due(limit) else {
                break;
            };
            match due {
                Due::Timer(id, timer) => {
                    self.timers.remove(&(id, timer));
                    self.queue.push_back((id, HostMsg::TimerFired(timer).into()));
                }
                Due::TransitionEnd(id, transition) => {
                    if self.transitions.get(&id).is_some_and(|(t, _)| *t == transition) {
                        self.transitions.remove(&id);
                    }
                    self.queue
                        .push_back((id, HostMsg::TransitionEnded(transition).into()));
                }
            }
        }
    }

    fn drain_queue(&mut self) {
        while let Some((id, msg)) = self.queue.pop_front() {
            if let Some(cmd) = update(&mut self.stage, id, msg, &self.scene) {
                self.execute(id, cmd);
            }
        }
    }

    // ========================================================================
    // Command execution
    // ========================================================================

    fn execute(&mut self, id: OverlayId, cmd: Cmd) {
        for cmd in cmd.flatten() {
            match cmd {
                Cmd::None | Cmd::Batch(_) => {}
                Cmd::Mount {
                    mount,
                    anchor,
                    target,
                } => self.mount(id, mount, anchor, target),
                Cmd::Unmount { content } => {
                    self.scene.remove(content);
                    self.content_owner.remove(&content);
                    self.z_indices.remove(&content);
                    if self.focused == Some(content) {
                        self.focused = None;
                    }
                }
                Cmd::Place {
                    content, placement, ..
                } => self.scene.move_to(content, placement.position),
                Cmd::SetZIndex { content, z_index } => {
                    self.z_indices.insert(content, z_index);
                }
                Cmd::Subscribe {
                    subscription,
                    watch,
                } => {
                    self.subscriptions.insert((id, subscription), watch);
                }
                Cmd::Unsubscribe { subscription } => {
                    self.subscriptions.remove(&(id, subscription));
                }
                Cmd::ScheduleTimer { timer, delay } => {
                    let key = self.clock.schedule(millis(delay), Due::Timer(id, timer));
                    self.timers.insert((id, timer), key);
                }
                Cmd::CancelTimer { timer } => {
                    if let Some(key) = self.timers.remove(&(id, timer)) {
                        self.clock.cancel(key);
                    }
                }
                Cmd::BeginTransition { transition, kind } => {
                    let ms = match kind {
                        TransitionKind::In => self.timings.show_ms,
                        TransitionKind::Out => self.timings.hide_ms,
                    };
                    let key = self.clock.schedule(ms, Due::TransitionEnd(id, transition));
                    if self.transitions.insert(id, (transition, key)).is_some() {
                        tracing::warn!(%id, ?transition, "transition started over a running one");
                        self.overlaps.push((self.clock.now(), id));
                    }
                    self.transition_log.push((self.clock.now(), id, kind));
                }
                Cmd::CancelTransition { transition } => {
                    if let Some((running, key)) = self.transitions.get(&id).copied() {
                        if running == transition {
                            self.clock.cancel(key);
                            self.transitions.remove(&id);
                        }
                    }
                }
                Cmd::Focus { content } => self.focused = Some(content),
                Cmd::Emit(event) => {
                    tracing::debug!(%id, ?event, at_ms = self.clock.now(), "overlay event");
                    self.events.push(TimedEvent {
                        at_ms: self.clock.now(),
                        overlay: id,
                        event,
                    });
                }
            }
        }
    }

    fn mount(&mut self, id: OverlayId, mount: MountId, anchor: NodeId, target: AppendTarget) {
        let parent = match target {
            AppendTarget::Body => self.scene.body(),
            AppendTarget::Anchor => anchor,
            AppendTarget::Node(node) => node,
        };
        if !self.scene.is_attached(parent) {
            let reason = format!("append target {} is not attached", parent);
            self.queue
                .push_back((id, HostMsg::MountFailed { mount, reason }.into()));
            return;
        }

        let size = self
            .content_sizes
            .get(&id)
            .copied()
            .unwrap_or(DEFAULT_CONTENT_SIZE);
        // Parked off-screen until placed
        let content = self
            .scene
            .add(parent, Rect::new(-999.0, -999.0, size.width, size.height));
        self.content_owner.insert(content, id);
        self.queue
            .push_back((id, HostMsg::Mounted { mount, content }.into()));
    }

    // ========================================================================
    // Host input
    // ========================================================================

    /// Pointer press on `target`: content handlers first, then the document
    pub fn click(&mut self, target: NodeId) {
        let owners: Vec<OverlayId> = self
            .content_owner
            .iter()
            .filter(|(content, _)| self.scene.contains(**content, target))
            .map(|(_, id)| *id)
            .collect();
        for id in owners {
            self.queue.push_back((id, WatchMsg::ContentPointer.into()));
        }
        for id in self.watchers(|w| matches!(w, Watch::OutsidePointer)) {
            self.queue
                .push_back((id, WatchMsg::DocumentPointer { target }.into()));
        }
        self.settle();
    }

    pub fn press_escape(&mut self) {
        self.broadcast(|w| matches!(w, Watch::EscapeKey), WatchMsg::EscapeKey);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        let viewport = self.scene.viewport();
        self.scene.set_viewport(Viewport {
            width,
            height,
            ..viewport
        });
        self.broadcast(
            |w| matches!(w, Watch::ViewportResize),
            WatchMsg::ViewportResized,
        );
    }

    /// Scroll `container`; overlays anchored inside it are notified
    pub fn scroll(&mut self, container: NodeId) {
        let scene = &self.scene;
        let ids = self.watchers(|w| match w {
            Watch::AnchorScroll { anchor } => {
                *anchor != container && scene.contains(container, *anchor)
            }
            _ => false,
        });
        for id in ids {
            self.queue.push_back((id, WatchMsg::AnchorScrolled.into()));
        }
        self.settle();
    }

    pub fn pointer_leave_content(&mut self, content: NodeId) {
        self.broadcast(
            |w| matches!(w, Watch::ContentPointerLeave { content: c } if *c == content),
            WatchMsg::ContentPointerLeave,
        );
    }

    /// Detach a node; overlays anchored inside it are destroyed
    pub fn remove_node(&mut self, node: NodeId) {
        let removed = self.scene.remove(node);
        let affected: Vec<OverlayId> = self
            .stage
            .ids()
            .filter(|id| {
                self.stage
                    .get(*id)
                    .and_then(|o| o.anchor())
                    .is_some_and(|anchor| removed.contains(&anchor))
            })
            .collect();
        for id in affected {
            self.queue.push_back((id, ControlMsg::Destroy.into()));
        }
        self.settle();
    }

    fn watchers(&self, matches: impl Fn(&Watch) -> bool) -> Vec<OverlayId> {
        let mut ids: Vec<OverlayId> = self
            .subscriptions
            .iter()
            .filter(|(_, watch)| matches(*watch))
            .map(|((id, _), _)| *id)
            .collect();
        ids.dedup();
        ids
    }

    fn broadcast(&mut self, matches: impl Fn(&Watch) -> bool, msg: WatchMsg) {
        for id in self.watchers(matches) {
            self.queue.push_back((id, msg.clone().into()));
        }
        self.settle();
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<TimedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn transition_log(&self) -> &[(u64, OverlayId, TransitionKind)] {
        &self.transition_log
    }

    /// Subscriptions the host currently holds for an overlay
    pub fn live_subscriptions(&self, id: OverlayId) -> usize {
        self.subscriptions.keys().filter(|(o, _)| *o == id).count()
    }

    /// Timers the host currently holds for an overlay
    pub fn live_timers(&self, id: OverlayId) -> usize {
        self.timers.keys().filter(|(o, _)| *o == id).count()
    }

    /// Times at which a transition began while the overlay already had one running
    pub fn overlapping_transitions(&self) -> &[(u64, OverlayId)] {
        &self.overlaps
    }

    pub fn transition_in_flight(&self, id: OverlayId) -> bool {
        self.transitions.contains_key(&id)
    }

    pub fn content_of(&self, id: OverlayId) -> Option<NodeId> {
        self.stage.get(id).and_then(|o| o.content())
    }

    pub fn position_of(&self, content: NodeId) -> Option<Point> {
        self.scene.rect(content).map(|r| r.origin())
    }

    pub fn z_index_of(&self, content: NodeId) -> Option<i32> {
        self.z_indices.get(&content).copied()
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn mounted_count(&self) -> usize {
        self.content_owner.len()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
