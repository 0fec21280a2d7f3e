//! Runtime module - deterministic host for driving the engine
//!
//! This module contains a headless stand-in for a rendering host:
//! - `scene` - Node tree with boxes, implements [`crate::host::Surface`]
//! - `clock` - Virtual millisecond clock for timers and transitions
//! - `sim` - Executes engine commands and feeds replies back
//! - `script` - YAML scenario scripts replayed through `sim`

pub mod clock;
pub mod scene;
pub mod script;
pub mod sim;

pub use scene::Scene;
pub use script::{run as run_script, Script};
pub use sim::{Simulation, TimedEvent};
