use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use anchored::cli::{CliArgs, Command, ResolveArgs};
use anchored::config::EngineConfig;
use anchored::model::geometry::Point;
use anchored::placement::{PlacementRequest, PlacementResult};
use anchored::runtime::{run_script, Script};

#[derive(Serialize)]
struct ResolveOutput {
    #[serde(flatten)]
    placement: PlacementResult,
    fits: bool,
    document_position: Point,
}

fn main() -> Result<()> {
    anchored::tracing::init();

    let args = CliArgs::parse();
    match args.command {
        Command::Resolve(resolve) => run_resolve(resolve),
        Command::Simulate {
            script,
            config,
            lines,
        } => {
            let engine = load_engine(config.as_deref());
            let script = Script::load(&script)?;
            let events = run_script(&script, &engine)?;
            if lines {
                for event in &events {
                    println!("{}", serde_json::to_string(event)?);
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&events)?);
            }
            Ok(())
        }
        Command::Config { config } => {
            let engine = load_engine(config.as_deref());
            print!("{}", serde_yaml::to_string(&engine)?);
            Ok(())
        }
    }
}

fn run_resolve(args: ResolveArgs) -> Result<()> {
    let input = args
        .into_input()
        .map_err(anyhow::Error::msg)
        .context("invalid resolve arguments")?;

    let placement = PlacementRequest::new(input.anchor, input.overlay, input.viewport, input.side)
        .with_fallback(&input.fallback)
        .with_offset(input.offset)
        .with_arrow_inset(input.arrow_inset)
        .resolve();
    tracing::debug!(side = %placement.side, attempts = placement.attempts.len(), "resolved");

    let output = ResolveOutput {
        fits: placement.fits(),
        document_position: placement.document_position(&input.viewport),
        placement,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_engine(path: Option<&std::path::Path>) -> EngineConfig {
    match path {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    }
}
