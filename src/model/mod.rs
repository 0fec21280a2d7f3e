//! Engine state: geometry primitives, overlay instances, layering

pub mod geometry;
pub mod layering;
pub mod overlay;
pub mod stage;

pub use geometry::{NodeId, Offset, Point, Rect, Size, Viewport};
pub use layering::{LayerAllocator, LayerCategory, LayerToken};
pub use overlay::{
    DismissReason, Layer, MountId, OverlayInstance, Phase, SubscriptionId, TimerId, TimerPurpose,
    TransitionId, TransitionKind, Watch,
};
pub use stage::{OverlayId, Stage};
