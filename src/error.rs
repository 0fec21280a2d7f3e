//! Error types for the overlay engine
//!
//! Nothing here is fatal: every failure degrades to "overlay not shown" or
//! "overlay closed early" and is surfaced through the event channel.

use thiserror::Error;

use crate::model::geometry::NodeId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    /// Host refused to attach the content node
    #[error("content for anchor {anchor} could not be mounted: {reason}")]
    MountFailure { anchor: NodeId, reason: String },

    /// Anchor or content had no usable box at positioning time
    #[error("no usable geometry for {node}")]
    GeometryUnavailable { node: NodeId },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type OverlayResult<T> = Result<T, OverlayError>;
