use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use burrow::{
    camera::FixedCamera,
    collision::CollisionEventKind,
    ecs::ComponentFactory,
    engine::EngineBuilder,
    level::LevelLoader,
    script::{ScriptArgs, ScriptTable},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless level runner")]
struct Cli {
    /// Path to the level YAML file
    #[arg(long, default_value = "levels/meadow.yaml")]
    level: PathBuf,

    /// Override frame count (uses the level default when omitted)
    #[arg(long)]
    frames: Option<u64>,

    /// Log filter, e.g. `debug` or `burrow=trace`; falls back to the level's
    /// logging.level
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = LevelLoader::new(".");
    let level = loader.load(&cli.level)?;

    let filter = cli
        .log_level
        .clone()
        .unwrap_or_else(|| level.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let factory = ComponentFactory::with_core_components();
    let mut world = level
        .build_world(&factory)
        .with_context(|| format!("Failed to build level '{}'", level.name))?;

    let mut scripts = ScriptTable::new();
    for kind in [
        CollisionEventKind::GoalReached,
        CollisionEventKind::ItemCollected,
        CollisionEventKind::PlayerHit,
    ] {
        scripts.register(kind.script_name(), move |args: &ScriptArgs| {
            info!(
                event = kind.script_name(),
                subject = %args.subject,
                other = %args.other,
                frame = args.frame,
                "script"
            );
        });
    }

    let mut engine = EngineBuilder::new(level.engine_settings())
        .with_default_pipeline(level.rules())
        .with_camera(FixedCamera(level.camera()))
        .with_scripts(scripts)
        .build();

    let frames = level.frames(cli.frames);
    let mut events = 0;
    let mut pairs = 0;
    engine.run_with_hook(&mut world, frames, |summary| {
        events += summary.events;
        pairs += summary.collision.pairs_tested;
    })?;

    println!(
        "Level '{}' ran for {} frames. Entities: {}, pairs tested: {}, collision events: {}",
        level.name,
        frames,
        world.entity_count(),
        pairs,
        events
    );
    Ok(())
}
