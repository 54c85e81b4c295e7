use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use voxport_host::{Palette, Scene, SoftwareHost};
use voxport_quad::BlockPos;
use voxport_runtime::{CacheStats, ExportConfig, ExportSession};

/// Captures a block scene through the software host and exports it as reconciled
/// per-chunk meshes.
#[derive(Parser, Debug)]
#[command(name = "voxport", author, version, about, long_about = None)]
struct Args {
    /// Export settings (TOML). Command line overrides win.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene document (TOML) with an optional palette, blocks and entities.
    #[arg(short, long, conflicts_with = "terrain")]
    scene: Option<PathBuf>,

    /// Generate rolling terrain from this seed instead of loading a scene.
    #[arg(long)]
    terrain: Option<i32>,

    /// Export centre as `x,y,z`.
    #[arg(long, value_parser = parse_center, default_value = "0,64,0")]
    center: BlockPos,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    radius: Option<i32>,

    /// Skip the mesh optimizer.
    #[arg(long)]
    no_optimize: bool,

    /// Keep world coordinates instead of centring the output on the origin.
    #[arg(long)]
    absolute: bool,
}

fn parse_center(s: &str) -> Result<BlockPos, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got `{s}`"));
    };
    let num = |v: &str| v.parse::<i32>().map_err(|e| format!("`{v}`: {e}"));
    Ok(BlockPos::new(num(*x)?, num(*y)?, num(*z)?))
}

#[derive(Serialize)]
struct CacheLine {
    hits: u64,
    misses: u64,
    evictions: u64,
    entries: usize,
}

impl From<CacheStats> for CacheLine {
    fn from(c: CacheStats) -> Self {
        Self {
            hits: c.hits,
            misses: c.misses,
            evictions: c.evictions,
            entries: c.entries,
        }
    }
}

#[derive(Serialize)]
struct Summary {
    chunks: usize,
    failures: usize,
    quads: usize,
    deliveries: usize,
    elapsed_ms: u64,
    sprite_cache: CacheLine,
    opacity_cache: CacheLine,
    image_cache: CacheLine,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExportConfig::from_path(path)?,
        None => ExportConfig::default(),
    };
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(radius) = args.radius {
        config.radius = radius;
    }
    config.optimize_mesh &= !args.no_optimize;
    config.relative_coordinates &= !args.absolute;

    let scene = match (&args.scene, args.terrain) {
        (Some(path), _) => Scene::from_path(path)?,
        (None, seed) => {
            let size = (config.radius.max(0) + 8) * 2;
            Scene::terrain(seed.unwrap_or(0), size, Palette::builtin())?
        }
    };
    log::info!(
        "scene has {} block(s) and {} entity box(es)",
        scene.len(),
        scene.entities().len()
    );

    // The host must be created on this thread: it is also the privileged one.
    let host = Arc::new(SoftwareHost::new(scene));
    let session = ExportSession::new(host, config, args.center)?;
    let mut deliveries = 0usize;
    let summary = session.run(|batch| {
        deliveries += 1;
        for chunk in &batch {
            log::debug!(
                "chunk ({}, {}): {} quad(s), {} merged away",
                chunk.x,
                chunk.z,
                chunk.quads.len(),
                chunk.stats.merged_away
            );
        }
    })?;

    let stats = summary.stats;
    let report = Summary {
        chunks: stats.chunks,
        failures: stats.failures,
        quads: stats.quads,
        deliveries,
        elapsed_ms: u64::try_from(stats.elapsed.as_millis()).unwrap_or(u64::MAX),
        sprite_cache: stats.sprite_cache.into(),
        opacity_cache: stats.opacity_cache.into(),
        image_cache: stats.image_cache.into(),
    };
    print!("{}", toml::to_string(&report)?);
    Ok(())
}
