//! Virtual millisecond clock with cancellable scheduled items

use std::collections::BTreeMap;

use crate::model::overlay::{TimerId, TransitionId};
use crate::model::stage::OverlayId;

/// Something the clock will deliver later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Due {
    Timer(OverlayId, TimerId),
    TransitionEnd(OverlayId, TransitionId),
}

/// Handle for cancelling a scheduled item: (due time, insertion sequence)
pub type ClockKey = (u64, u64);

#[derive(Debug, Default)]
pub struct Clock {
    now: u64,
    seq: u64,
    queue: BTreeMap<ClockKey, Due>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn schedule(&mut self, delay_ms: u64, due: Due) -> ClockKey {
        self.seq += 1;
        let key = (self.now + delay_ms, self.seq);
        self.queue.insert(key, due);
        key
    }

    pub fn cancel(&mut self, key: ClockKey) -> bool {
        self.queue.remove(&key).is_some()
    }

    /// Next item due at or before `limit`, advancing `now` to its time
    pub fn pop_due(&mut self, limit: u64) -> Option<Due> {
        let (&key, _) = self.queue.iter().next()?;
        if key.0 > limit {
            return None;
        }
        let due = self.queue.remove(&key)?;
        self.now = self.now.max(key.0);
        Some(due)
    }

    /// Move forward without delivering anything
    pub fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the last scheduled item
    pub fn horizon(&self) -> Option<u64> {
        self.queue.keys().next_back().map(|key| key.0)
    }
}
