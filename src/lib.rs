//! Anchored - headless overlay lifecycle and positioning engine
//!
//! This crate provides the core types and logic for tooltips, popovers and
//! other anchored overlays, implementing the Elm Architecture pattern: the
//! host feeds messages in, `update` returns commands for the host to run.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod error;
pub mod host;
pub mod messages;
pub mod model;
pub mod placement;
pub mod runtime;
pub mod tracing;
pub mod update;

// Re-export commonly used types
pub use commands::{Cmd, OverlayEvent};
pub use config::{EngineConfig, OverlayConfig};
pub use error::{OverlayError, OverlayResult};
pub use host::Surface;
pub use messages::Msg;
pub use model::{OverlayId, Stage};
pub use placement::{resolve, PlacementResult, Side};
