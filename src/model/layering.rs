//! Z-order allocation for concurrently open overlays
//!
//! Each category keeps its own counter so the most recently opened overlay
//! of a category stacks above earlier ones. The counter only falls back to
//! the base once every token of that category has been released.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stacking category, each with its own base z-index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerCategory {
    Modal,
    Overlay,
    Menu,
    Tooltip,
}

impl LayerCategory {
    pub fn default_base(self) -> i32 {
        match self {
            LayerCategory::Modal => 1100,
            LayerCategory::Overlay => 1000,
            LayerCategory::Menu => 1000,
            LayerCategory::Tooltip => 1100,
        }
    }
}

/// Proof of a live z-index allocation
///
/// Deliberately not `Clone`: the holder returns it through
/// [`LayerAllocator::release`] exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct LayerToken {
    id: u64,
    category: LayerCategory,
    z_index: i32,
}

impl LayerToken {
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn category(&self) -> LayerCategory {
        self.category
    }
}

/// Hands out increasing z-indices per category
#[derive(Debug, Default)]
pub struct LayerAllocator {
    next_id: u64,
    /// High-water mark per category while any token is live
    counters: HashMap<LayerCategory, i32>,
    /// (token id, category) of every outstanding token
    live: Vec<(u64, LayerCategory)>,
}

impl LayerAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, base_z_index: i32, category: LayerCategory) -> LayerToken {
        let counter = self.counters.entry(category).or_insert(base_z_index);
        let z_index = (*counter).max(base_z_index) + 1;
        *counter = z_index;

        self.next_id += 1;
        let id = self.next_id;
        self.live.push((id, category));

        tracing::trace!(?category, z_index, id, "layer acquired");
        LayerToken {
            id,
            category,
            z_index,
        }
    }

    /// Returns false if the token was not issued by this allocator
    pub fn release(&mut self, token: LayerToken) -> bool {
        let Some(idx) = self.live.iter().position(|(id, _)| *id == token.id) else {
            tracing::warn!(id = token.id, "released unknown layer token");
            return false;
        };
        self.live.swap_remove(idx);

        if !self.live.iter().any(|(_, c)| *c == token.category) {
            self.counters.remove(&token.category);
        }
        tracing::trace!(category = ?token.category, z_index = token.z_index, "layer released");
        true
    }

    /// Highest z-index handed out for a category with live tokens
    pub fn current(&self, category: LayerCategory) -> Option<i32> {
        self.counters.get(&category).copied()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_count_independently() {
        let mut layers = LayerAllocator::new();
        let a = layers.acquire(1000, LayerCategory::Overlay);
        let b = layers.acquire(1100, LayerCategory::Tooltip);
        let c = layers.acquire(1000, LayerCategory::Overlay);
        assert_eq!(a.z_index(), 1001);
        assert_eq!(b.z_index(), 1101);
        assert_eq!(c.z_index(), 1002);
    }

    #[test]
    fn test_counter_resets_when_category_empties() {
        let mut layers = LayerAllocator::new();
        let a = layers.acquire(1000, LayerCategory::Overlay);
        let b = layers.acquire(1000, LayerCategory::Overlay);
        assert!(layers.release(a));
        // b still live: no reuse of 1001 or 1002
        let c = layers.acquire(1000, LayerCategory::Overlay);
        assert_eq!(c.z_index(), 1003);
        assert!(layers.release(b));
        assert!(layers.release(c));
        assert_eq!(layers.current(LayerCategory::Overlay), None);
        assert_eq!(layers.acquire(1000, LayerCategory::Overlay).z_index(), 1001);
    }

    #[test]
    fn test_foreign_token_is_rejected() {
        let mut other = LayerAllocator::new();
        let _first = other.acquire(0, LayerCategory::Menu);
        let stray = other.acquire(0, LayerCategory::Menu);

        let mut layers = LayerAllocator::new();
        let _own = layers.acquire(0, LayerCategory::Menu);
        assert!(!layers.release(stray));
        assert_eq!(layers.live_count(), 1);
    }

    #[test]
    fn test_higher_base_raises_counter() {
        let mut layers = LayerAllocator::new();
        let _a = layers.acquire(1000, LayerCategory::Overlay);
        let b = layers.acquire(2000, LayerCategory::Overlay);
        assert_eq!(b.z_index(), 2001);
    }
}
