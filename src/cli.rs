//! Command-line argument parsing for the engine driver
//!
//! Supports:
//! - Resolving a single placement and printing it as JSON
//! - Replaying a YAML scenario script through the simulated runtime
//! - Printing the effective engine configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::model::geometry::{Offset, Rect, Size, Viewport};
use crate::placement::Side;

/// Overlay lifecycle and positioning engine
#[derive(Parser, Debug)]
#[command(name = "anchored", version, about = "Overlay lifecycle and positioning engine")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve where an overlay goes relative to an anchor
    Resolve(ResolveArgs),

    /// Replay a scenario script and print the emitted events
    Simulate {
        /// Script file (YAML)
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Engine config file instead of the default location
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// One JSON object per line instead of a pretty array
        #[arg(long)]
        lines: bool,
    },

    /// Print the effective engine configuration as YAML
    Config {
        /// Engine config file instead of the default location
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Anchor box as LEFT,TOP,WIDTH,HEIGHT
    #[arg(long, value_name = "L,T,W,H")]
    pub anchor: String,

    /// Overlay size as WIDTHxHEIGHT
    #[arg(long, value_name = "WxH")]
    pub overlay: String,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, value_name = "WxH", default_value = "1280x800")]
    pub viewport: String,

    /// Desired side
    #[arg(long, default_value = "right")]
    pub side: Side,

    /// Comma-separated fallback order (defaults to the side's own list)
    #[arg(long, value_name = "SIDES")]
    pub fallback: Option<String>,

    /// Extra offset as TOP,LEFT
    #[arg(long, value_name = "T,L")]
    pub offset: Option<String>,

    /// Viewport scroll as LEFT,TOP
    #[arg(long, value_name = "L,T")]
    pub scroll: Option<String>,

    /// Corner inset kept clear by the arrow
    #[arg(long, default_value_t = 0.0)]
    pub arrow_inset: f32,
}

/// Parsed geometry for a `resolve` run
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveInput {
    pub anchor: Rect,
    pub overlay: Size,
    pub viewport: Viewport,
    pub side: Side,
    pub fallback: Vec<Side>,
    pub offset: Offset,
    pub arrow_inset: f32,
}

impl ResolveArgs {
    /// Convert the raw strings into geometry
    pub fn into_input(self) -> Result<ResolveInput, String> {
        let anchor = match numbers(&self.anchor, ',')?.as_slice() {
            [l, t, w, h] => Rect::new(*l, *t, *w, *h),
            _ => return Err(format!("anchor needs 4 numbers, got '{}'", self.anchor)),
        };
        let overlay = size(&self.overlay)?;
        let viewport_size = size(&self.viewport)?;
        let mut viewport = Viewport::new(viewport_size.width, viewport_size.height);
        if let Some(scroll) = &self.scroll {
            let [left, top] = pair(scroll, "scroll")?;
            viewport = viewport.with_scroll(left, top);
        }

        let fallback = match &self.fallback {
            Some(list) => list
                .split(',')
                .map(|s| s.parse::<Side>())
                .collect::<Result<Vec<_>, _>>()?,
            None => self.side.default_fallback().to_vec(),
        };

        let offset = match &self.offset {
            Some(raw) => {
                let [top, left] = pair(raw, "offset")?;
                Offset::new(top, left)
            }
            None => Offset::default(),
        };

        Ok(ResolveInput {
            anchor,
            overlay,
            viewport,
            side: self.side,
            fallback,
            offset,
            arrow_inset: self.arrow_inset,
        })
    }
}

fn numbers(raw: &str, sep: char) -> Result<Vec<f32>, String> {
    raw.split(sep)
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|_| format!("'{}' is not a number", part.trim()))
        })
        .collect()
}

fn pair(raw: &str, what: &str) -> Result<[f32; 2], String> {
    match numbers(raw, ',')?.as_slice() {
        [a, b] => Ok([*a, *b]),
        _ => Err(format!("{} needs 2 numbers, got '{}'", what, raw)),
    }
}

fn size(raw: &str) -> Result<Size, String> {
    match numbers(&raw.to_ascii_lowercase(), 'x')?.as_slice() {
        [w, h] => Ok(Size::new(*w, *h)),
        _ => Err(format!("expected WIDTHxHEIGHT, got '{}'", raw)),
    }
}
