//! Debug tracing infrastructure for development diagnostics
//!
//! Provides structured logging with scoped filtering for debugging
//! lifecycle transitions, watcher fan-out and placement decisions.
//!
//! # Usage
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=lifecycle=debug` - phase changes only
//! - `RUST_LOG=anchored::update=trace` - module-level filtering
//!
//! # Log Files
//!
//! Logs are written to `~/.config/anchored/logs/anchored.log` with daily rotation.
//! File logging uses debug level by default for more verbose troubleshooting.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::model::overlay::{OverlayInstance, Phase};

/// Initialize tracing subscriber with console and file logging
///
/// Console output respects RUST_LOG env var and defaults to `warn`. Output
/// goes to stderr so command output on stdout stays machine-readable.
pub fn init() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Console layer - respects RUST_LOG
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    // File layer - always debug level for troubleshooting
    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, "anchored.log");
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    // A host may already have installed a subscriber
    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

/// Lightweight snapshot of what an instance holds, for diffing across updates
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySnapshot {
    pub phase: Phase,
    pub z_index: Option<i32>,
    pub timers: usize,
    pub watchers: usize,
    pub mounted: bool,
    pub pending_reopen: bool,
}

impl OverlaySnapshot {
    pub fn from_overlay(overlay: &OverlayInstance) -> Self {
        Self {
            phase: overlay.phase(),
            z_index: overlay.z_index(),
            timers: overlay.pending_timers(),
            watchers: overlay.watches().count(),
            mounted: overlay.content().is_some(),
            pending_reopen: overlay.pending_reopen().is_some(),
        }
    }

    /// Generate a diff description between two snapshots
    pub fn diff(&self, other: &OverlaySnapshot) -> Option<String> {
        let mut changes = Vec::new();

        if self.phase != other.phase {
            changes.push(format!("phase: {:?} → {:?}", self.phase, other.phase));
        }
        if self.z_index != other.z_index {
            changes.push(format!("z-index: {:?} → {:?}", self.z_index, other.z_index));
        }
        if self.timers != other.timers {
            changes.push(format!("timers: {} → {}", self.timers, other.timers));
        }
        if self.watchers != other.watchers {
            changes.push(format!("watchers: {} → {}", self.watchers, other.watchers));
        }
        if self.mounted != other.mounted {
            let status = if other.mounted { "mounted" } else { "unmounted" };
            changes.push(format!("content {}", status));
        }
        if self.pending_reopen != other.pending_reopen {
            let status = if other.pending_reopen { "queued" } else { "cleared" };
            changes.push(format!("reopen {}", status));
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes.join("; "))
        }
    }
}
