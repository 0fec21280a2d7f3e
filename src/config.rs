//! Overlay and engine configuration
//!
//! `OverlayConfig` is the per-instance option set recognised by the
//! lifecycle controller. `EngineConfig` is the process-level file at
//! `~/.config/anchored/config.yaml`: layer bases, transition timings for the
//! simulated runtime, and named presets.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, OverlayResult};
use crate::model::geometry::{NodeId, Offset};
use crate::model::layering::LayerCategory;
use crate::placement::Side;

/// Which anchor interactions show and hide the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Pointer enter shows, pointer leave hides
    #[default]
    Hover,
    /// Focus shows, blur hides
    Focus,
    /// Hover and focus
    Both,
    /// Anchor click toggles
    Click,
}

impl TriggerMode {
    pub fn uses_hover(self) -> bool {
        matches!(self, TriggerMode::Hover | TriggerMode::Both)
    }

    pub fn uses_focus(self) -> bool {
        matches!(self, TriggerMode::Focus | TriggerMode::Both)
    }
}

/// Where the content node is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendTarget {
    /// Document body
    #[default]
    Body,
    /// Inside the anchor itself
    Anchor,
    /// A specific container node
    Node(NodeId),
}

/// Per-instance options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Desired side relative to the anchor
    pub position: Side,
    /// Explicit fallback order; defaults to the side's own priority list
    pub fallback_order: Option<Vec<Side>>,
    pub trigger: TriggerMode,
    /// Close on outside pointer interaction
    pub dismissable: bool,
    /// Close on viewport resize and anchor scroll (reposition otherwise)
    pub auto_hide_on_scroll_or_resize: bool,
    /// Hover mode: leaving the anchor hides even when moving onto the content
    pub auto_hide: bool,
    pub escape_to_close: bool,
    /// Milliseconds before the overlay starts opening
    pub show_delay: Option<u64>,
    /// Milliseconds between a deactivate request and the close
    pub hide_delay: Option<u64>,
    /// Milliseconds the overlay stays up before closing on its own
    pub life: Option<u64>,
    pub append_target: AppendTarget,
    pub fixed_offset: Offset,
    /// Fixed z-index; `None` allocates from the layer allocator
    pub z_index: Option<i32>,
    /// Added to the category base when allocating
    pub base_z_index: i32,
    pub layer: LayerCategory,
    /// Focus the content shortly after it becomes open
    pub focus_on_show: bool,
    /// Corner radius the arrow keeps clear of
    pub arrow_inset: f32,
    pub disabled: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            position: Side::Right,
            fallback_order: None,
            trigger: TriggerMode::Hover,
            dismissable: true,
            auto_hide_on_scroll_or_resize: true,
            auto_hide: true,
            escape_to_close: true,
            show_delay: None,
            hide_delay: None,
            life: None,
            append_target: AppendTarget::Body,
            fixed_offset: Offset::default(),
            z_index: None,
            base_z_index: 0,
            layer: LayerCategory::Overlay,
            focus_on_show: false,
            arrow_inset: 0.0,
            disabled: false,
        }
    }
}

impl OverlayConfig {
    /// Hover tooltip defaults
    pub fn tooltip() -> Self {
        Self {
            layer: LayerCategory::Tooltip,
            dismissable: false,
            ..Self::default()
        }
    }

    /// Click-toggled panel defaults
    pub fn popover() -> Self {
        Self {
            position: Side::Bottom,
            trigger: TriggerMode::Click,
            focus_on_show: true,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, side: Side) -> Self {
        self.position = side;
        self
    }

    pub fn with_show_delay(mut self, ms: u64) -> Self {
        self.show_delay = Some(ms);
        self
    }

    pub fn with_hide_delay(mut self, ms: u64) -> Self {
        self.hide_delay = Some(ms);
        self
    }

    pub fn with_life(mut self, ms: u64) -> Self {
        self.life = Some(ms);
        self
    }

    pub fn fallback(&self) -> Vec<Side> {
        self.fallback_order
            .clone()
            .unwrap_or_else(|| self.position.default_fallback().to_vec())
    }

    pub fn show_delay(&self) -> Option<Duration> {
        nonzero_ms(self.show_delay)
    }

    pub fn hide_delay(&self) -> Option<Duration> {
        nonzero_ms(self.hide_delay)
    }

    pub fn life(&self) -> Option<Duration> {
        nonzero_ms(self.life)
    }

    /// Auto-close delay measured from the activation request
    ///
    /// The show delay is added so the overlay is visible for the full life.
    pub fn life_from_request(&self) -> Option<Duration> {
        Some(self.life()? + self.show_delay().unwrap_or_default())
    }

    pub fn from_yaml_str(yaml: &str) -> OverlayResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| OverlayError::Config(e.to_string()))
    }
}

fn nonzero_ms(ms: Option<u64>) -> Option<Duration> {
    ms.filter(|ms| *ms > 0).map(Duration::from_millis)
}

/// Base z-index per layer category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerBases {
    pub modal: i32,
    pub overlay: i32,
    pub menu: i32,
    pub tooltip: i32,
}

impl Default for LayerBases {
    fn default() -> Self {
        Self {
            modal: LayerCategory::Modal.default_base(),
            overlay: LayerCategory::Overlay.default_base(),
            menu: LayerCategory::Menu.default_base(),
            tooltip: LayerCategory::Tooltip.default_base(),
        }
    }
}

impl LayerBases {
    pub fn base(&self, category: LayerCategory) -> i32 {
        match category {
            LayerCategory::Modal => self.modal,
            LayerCategory::Overlay => self.overlay,
            LayerCategory::Menu => self.menu,
            LayerCategory::Tooltip => self.tooltip,
        }
    }
}

/// Show/hide transition lengths used by the simulated runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionTimings {
    pub show_ms: u64,
    pub hide_ms: u64,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            show_ms: 120,
            hide_ms: 100,
        }
    }
}

/// Process-level configuration that persists across sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layers: LayerBases,
    pub transitions: TransitionTimings,
    /// Named overlay option sets
    pub presets: BTreeMap<String, OverlayConfig>,
}

impl EngineConfig {
    /// Load from the default location, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load from `path`; missing or malformed files fall back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> OverlayResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OverlayError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| OverlayError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            OverlayError::Config(format!(
                "Failed to write config to {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Named preset, or the built-in tooltip/popover defaults
    pub fn preset(&self, name: &str) -> Option<OverlayConfig> {
        if let Some(config) = self.presets.get(name) {
            return Some(config.clone());
        }
        match name {
            "tooltip" => Some(OverlayConfig::tooltip()),
            "popover" => Some(OverlayConfig::popover()),
            _ => None,
        }
    }
}
