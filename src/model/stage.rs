//! The set of overlays sharing one layer allocator

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{LayerBases, OverlayConfig};
use crate::model::layering::LayerAllocator;
use crate::model::overlay::OverlayInstance;

/// Identifies an overlay within a [`Stage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayId(pub u32);

impl std::fmt::Display for OverlayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// Owns every overlay instance and the shared layering counter
#[derive(Debug, Default)]
pub struct Stage {
    pub(crate) overlays: BTreeMap<OverlayId, OverlayInstance>,
    pub(crate) layers: LayerAllocator,
    pub bases: LayerBases,
    next_id: u32,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bases(bases: LayerBases) -> Self {
        Self {
            bases,
            ..Self::default()
        }
    }

    pub fn add(&mut self, config: OverlayConfig) -> OverlayId {
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        self.overlays.insert(id, OverlayInstance::new(config));
        id
    }

    pub fn get(&self, id: OverlayId) -> Option<&OverlayInstance> {
        self.overlays.get(&id)
    }

    pub fn get_mut(&mut self, id: OverlayId) -> Option<&mut OverlayInstance> {
        self.overlays.get_mut(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = OverlayId> + '_ {
        self.overlays.keys().copied()
    }

    pub fn layers(&self) -> &LayerAllocator {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}
