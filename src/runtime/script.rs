//! YAML scenario scripts for the simulated runtime
//!
//! A script declares a node tree, a set of overlays and a timeline of host
//! interactions. Running it yields the lifecycle events in emission order.
//!
//! ```yaml
//! viewport: { width: 800, height: 600 }
//! nodes:
//!   - { id: 1, rect: { left: 100, top: 100, width: 80, height: 24 } }
//! overlays:
//!   - { name: tip, preset: tooltip, config: { showDelay: 200 } }
//! steps:
//!   - { at: 0, action: pointer_enter, overlay: tip, node: 1 }
//!   - { at: 900, action: pointer_leave, overlay: tip, node: 1 }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, OverlayConfig, TransitionTimings};
use crate::error::{OverlayError, OverlayResult};
use crate::host::Surface;
use crate::messages::{ControlMsg, TriggerMsg};
use crate::model::geometry::{NodeId, Rect, Size, Viewport};
use crate::model::stage::{OverlayId, Stage};

use super::scene::Scene;
use super::sim::{Simulation, TimedEvent, DEFAULT_CONTENT_SIZE};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Script {
    pub viewport: Viewport,
    /// Overrides the engine's transition timings
    #[serde(default)]
    pub transitions: Option<TransitionTimings>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub overlays: Vec<OverlaySpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeSpec {
    pub id: NodeId,
    /// Defaults to the body
    #[serde(default)]
    pub parent: Option<NodeId>,
    pub rect: Rect,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverlaySpec {
    pub name: String,
    /// Named preset the config is layered over
    #[serde(default)]
    pub preset: Option<String>,
    /// Option keys overriding the preset
    #[serde(default)]
    pub config: Option<serde_yaml::Value>,
    #[serde(default)]
    pub content: Option<Size>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Step {
    /// Virtual time in milliseconds
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Activate { overlay: String, node: NodeId },
    Deactivate { overlay: String },
    Toggle { overlay: String, node: NodeId },
    Destroy { overlay: String },
    SetDisabled { overlay: String, disabled: bool },
    ContentChanged { overlay: String, has_content: bool },
    PointerEnter { overlay: String, node: NodeId },
    PointerLeave {
        overlay: String,
        node: NodeId,
        #[serde(default)]
        related: Option<NodeId>,
    },
    Focus { overlay: String, node: NodeId },
    Blur { overlay: String, node: NodeId },
    AnchorClick { overlay: String, node: NodeId },
    /// Pointer leaves the overlay's mounted content
    LeaveContent { overlay: String },
    /// Document pointer press on a node
    Click { node: NodeId },
    Escape,
    Resize { width: f32, height: f32 },
    Scroll { node: NodeId },
    Remove { node: NodeId },
}

impl Script {
    pub fn from_yaml_str(yaml: &str) -> OverlayResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| OverlayError::Config(format!("invalid script: {}", e)))
    }

    pub fn load(path: &Path) -> OverlayResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OverlayError::Config(format!("Failed to read script {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }
}

/// Build the scene, replay every step in time order, then drain the clock
pub fn run(script: &Script, engine: &EngineConfig) -> OverlayResult<Vec<TimedEvent>> {
    let timings = script
        .transitions
        .clone()
        .unwrap_or_else(|| engine.transitions.clone());
    let mut sim = Simulation::new(script.viewport, timings)
        .with_stage(Stage::with_bases(engine.layers.clone()));

    for node in &script.nodes {
        let parent = node.parent.unwrap_or(Scene::BODY);
        if !sim.scene.is_attached(parent) {
            return Err(OverlayError::Config(format!(
                "node {} declared before its parent {}",
                node.id, parent
            )));
        }
        if !sim.scene.insert(node.id, parent, node.rect) {
            return Err(OverlayError::Config(format!("duplicate node id {}", node.id)));
        }
    }

    let mut names = HashMap::new();
    for decl in &script.overlays {
        let config = overlay_config(decl, engine)?;
        let id = sim.add_overlay(config, decl.content.unwrap_or(DEFAULT_CONTENT_SIZE));
        if names.insert(decl.name.clone(), id).is_some() {
            return Err(OverlayError::Config(format!("duplicate overlay '{}'", decl.name)));
        }
    }

    let mut steps: Vec<&Step> = script.steps.iter().collect();
    steps.sort_by_key(|step| step.at);

    for step in steps {
        sim.advance_to(step.at);
        tracing::trace!(at = step.at, action = ?step.action, "script step");
        apply(&mut sim, &names, &step.action)?;
    }
    sim.run_until_idle();

    Ok(sim.take_events())
}

fn overlay_config(decl: &OverlaySpec, engine: &EngineConfig) -> OverlayResult<OverlayConfig> {
    let base = match &decl.preset {
        Some(name) => engine
            .preset(name)
            .ok_or_else(|| OverlayError::Config(format!("unknown preset '{}'", name)))?,
        None => OverlayConfig::default(),
    };
    let Some(overrides) = &decl.config else {
        return Ok(base);
    };

    let mut merged = serde_yaml::to_value(&base).map_err(|e| OverlayError::Config(e.to_string()))?;
    if let (serde_yaml::Value::Mapping(target), serde_yaml::Value::Mapping(extra)) =
        (&mut merged, overrides)
    {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    } else {
        return Err(OverlayError::Config(format!(
            "config for overlay '{}' must be a mapping",
            decl.name
        )));
    }
    serde_yaml::from_value(merged).map_err(|e| OverlayError::Config(e.to_string()))
}

fn apply(
    sim: &mut Simulation,
    names: &HashMap<String, OverlayId>,
    action: &Action,
) -> OverlayResult<()> {
    let lookup = |name: &str| {
        names
            .get(name)
            .copied()
            .ok_or_else(|| OverlayError::Config(format!("unknown overlay '{}'", name)))
    };

    match action {
        Action::Activate { overlay, node } => sim.activate(lookup(overlay)?, *node),
        Action::Deactivate { overlay } => sim.deactivate(lookup(overlay)?),
        Action::Toggle { overlay, node } => sim.toggle(lookup(overlay)?, *node),
        Action::Destroy { overlay } => sim.send(lookup(overlay)?, ControlMsg::Destroy),
        Action::SetDisabled { overlay, disabled } => {
            sim.send(lookup(overlay)?, ControlMsg::SetDisabled(*disabled))
        }
        Action::ContentChanged {
            overlay,
            has_content,
        } => sim.send(
            lookup(overlay)?,
            ControlMsg::ContentChanged {
                has_content: *has_content,
            },
        ),
        Action::PointerEnter { overlay, node } => {
            sim.trigger(lookup(overlay)?, TriggerMsg::PointerEnter(*node))
        }
        Action::PointerLeave {
            overlay,
            node,
            related,
        } => sim.trigger(
            lookup(overlay)?,
            TriggerMsg::PointerLeave {
                anchor: *node,
                related: *related,
            },
        ),
        Action::Focus { overlay, node } => sim.trigger(lookup(overlay)?, TriggerMsg::Focus(*node)),
        Action::Blur { overlay, node } => sim.trigger(lookup(overlay)?, TriggerMsg::Blur(*node)),
        Action::AnchorClick { overlay, node } => {
            sim.trigger(lookup(overlay)?, TriggerMsg::Click(*node))
        }
        Action::LeaveContent { overlay } => {
            if let Some(content) = sim.content_of(lookup(overlay)?) {
                sim.pointer_leave_content(content);
            }
        }
        Action::Click { node } => sim.click(*node),
        Action::Escape => sim.press_escape(),
        Action::Resize { width, height } => sim.resize(*width, *height),
        Action::Scroll { node } => sim.scroll(*node),
        Action::Remove { node } => sim.remove_node(*node),
    }
    Ok(())
}
