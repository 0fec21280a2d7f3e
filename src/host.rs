//! Read-only view of the host rendering tree
//!
//! Side effects (mounting, subscriptions, timers, transitions) are requested
//! through [`crate::commands::Cmd`]. Queries that must be answered
//! synchronously during an update go through this trait.

use crate::model::geometry::{NodeId, Rect, Viewport};

/// Geometry provider and tree queries supplied by the host
pub trait Surface {
    /// Bounding box in viewport coordinates, `None` if the node is unknown
    fn bounding_box(&self, node: NodeId) -> Option<Rect>;

    fn viewport(&self) -> Viewport;

    /// True if `node` is `ancestor` or lies inside its subtree
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// True if the node is still part of the rendered document
    fn is_attached(&self, node: NodeId) -> bool;

    /// Box of an attached, non-empty node
    fn usable_box(&self, node: NodeId) -> Option<Rect> {
        if !self.is_attached(node) {
            return None;
        }
        self.bounding_box(node).filter(|rect| !rect.is_empty())
    }
}
