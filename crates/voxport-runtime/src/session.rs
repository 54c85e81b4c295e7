use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use rayon::ThreadPoolBuilder;
use voxport_quad::BlockPos;

use crate::cache::CacheStats;
use crate::config::{ConfigError, ExportConfig};
use crate::error::{ChunkStage, ExportError};
use crate::extension::MaterialExtension;
use crate::host::EngineHost;
use crate::pipeline::{Caches, ExportChunk, Shared, process_chunk};
use crate::pool::ScratchPool;
use crate::privileged::PrivilegedExecutor;
use crate::scan::{ExportRegion, partition};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub chunks: usize,
    pub failures: usize,
    pub quads: usize,
    pub sprite_cache: CacheStats,
    pub opacity_cache: CacheStats,
    pub image_cache: CacheStats,
    pub elapsed: Duration,
}

/// Outcome of [`ExportSession::run`]; the chunks themselves went to the sink.
#[derive(Debug)]
pub struct RunSummary {
    pub failures: Vec<ExportError>,
    pub stats: ExportStats,
}

#[derive(Debug)]
pub struct ExportReport {
    /// Successful chunks ordered by worker batch, then scan order within the batch.
    pub chunks: Vec<ExportChunk>,
    pub failures: Vec<ExportError>,
    pub stats: ExportStats,
}

struct ChunkResult {
    batch: usize,
    seq: usize,
    result: Result<ExportChunk, ExportError>,
}

/// One export around a centre block. Owns the shared caches, which live as long as the session.
///
/// The thread that calls [`ExportSession::run`] or [`ExportSession::export`] becomes the
/// privileged context for that run.
pub struct ExportSession {
    shared: Arc<Shared>,
}

impl ExportSession {
    pub fn new(
        host: Arc<dyn EngineHost>,
        config: ExportConfig,
        center: BlockPos,
    ) -> Result<Self, ConfigError> {
        Self::build(host, config, center, None)
    }

    /// Like [`ExportSession::new`] with a shader-pack material extension.
    pub fn with_extension(
        host: Arc<dyn EngineHost>,
        config: ExportConfig,
        center: BlockPos,
        extension: Arc<dyn MaterialExtension>,
    ) -> Result<Self, ConfigError> {
        Self::build(host, config, center, Some(extension))
    }

    fn build(
        host: Arc<dyn EngineHost>,
        config: ExportConfig,
        center: BlockPos,
        extension: Option<Arc<dyn MaterialExtension>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let caches = Caches::new(config.cache_capacity);
        let scratch = ScratchPool::for_workers(config.threads);
        Ok(Self {
            shared: Arc::new(Shared {
                host,
                config,
                center,
                caches,
                extension,
                scratch,
            }),
        })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.shared.config
    }

    pub fn region(&self) -> ExportRegion {
        let cfg = &self.shared.config;
        ExportRegion::around(self.shared.center, cfg.radius, cfg.lower_height, cfg.upper_height)
    }

    /// Exports the region, handing batches of at most `chunks_per_delivery` chunks to
    /// `sink` on the calling thread as they complete.
    ///
    /// Chunk failures are logged and collected; only a worker pool that cannot be built
    /// fails the run.
    pub fn run(&self, mut sink: impl FnMut(Vec<ExportChunk>)) -> Result<RunSummary, ExportError> {
        let started = Instant::now();
        let per = self.shared.config.chunks_per_delivery;
        let mut pending: Vec<ExportChunk> = Vec::with_capacity(per);
        let mut failures = Vec::new();
        let (mut delivered, mut quads) = (0usize, 0usize);
        self.drive(|r| match r.result {
            Ok(chunk) => {
                quads += chunk.quads.len();
                pending.push(chunk);
                if pending.len() >= per {
                    delivered += pending.len();
                    sink(std::mem::replace(&mut pending, Vec::with_capacity(per)));
                }
            }
            Err(e) => {
                log::error!("{}", e);
                failures.push(e);
            }
        })?;
        if !pending.is_empty() {
            delivered += pending.len();
            sink(pending);
        }
        let stats = self.finish_stats(delivered, failures.len(), quads, started);
        Ok(RunSummary { failures, stats })
    }

    /// Exports the region and collects every chunk.
    pub fn export(&self) -> Result<ExportReport, ExportError> {
        let started = Instant::now();
        let mut done: Vec<(usize, usize, ExportChunk)> = Vec::new();
        let mut failures = Vec::new();
        self.drive(|r| match r.result {
            Ok(chunk) => done.push((r.batch, r.seq, chunk)),
            Err(e) => {
                log::error!("{}", e);
                failures.push(e);
            }
        })?;
        done.sort_by_key(|(batch, seq, _)| (*batch, *seq));
        let chunks: Vec<ExportChunk> = done.into_iter().map(|(_, _, c)| c).collect();
        let quads = chunks.iter().map(|c| c.quads.len()).sum();
        let stats = self.finish_stats(chunks.len(), failures.len(), quads, started);
        Ok(ExportReport {
            chunks,
            failures,
            stats,
        })
    }

    fn drive(&self, mut on_result: impl FnMut(ChunkResult)) -> Result<(), ExportError> {
        let cfg = &self.shared.config;
        let region = self.region();
        let units = region.units();
        let executor = PrivilegedExecutor::new(
            cfg.task_queue_depth,
            Duration::from_millis(cfg.privileged_timeout_ms),
            Duration::from_millis(cfg.poll_interval_ms),
        );
        let handle = executor.handle();
        let c = self.shared.center;
        log::info!(
            "exporting {} chunk(s), {} block(s) around ({}, {}, {}) with {} worker(s)",
            units.len(),
            region.block_count(),
            c.x,
            c.y,
            c.z,
            cfg.threads
        );

        if cfg.threads == 1 || units.len() <= 1 {
            for (seq, unit) in units.into_iter().enumerate() {
                log::trace!("chunk ({}, {}) {}", unit.chunk_x, unit.chunk_z, ChunkStage::Pending);
                let result = process_chunk(&self.shared, &handle, unit);
                on_result(ChunkResult {
                    batch: 0,
                    seq,
                    result,
                });
            }
            return Ok(());
        }

        let batches = partition(units, cfg.threads);
        let pool = ThreadPoolBuilder::new()
            .num_threads(batches.len())
            .thread_name(|i| format!("voxport-export-{i}"))
            .build()
            .map_err(|e| ExportError::WorkerPool(e.to_string()))?;
        let (res_tx, res_rx) = unbounded::<ChunkResult>();
        for (batch, units) in batches.into_iter().enumerate() {
            let tx = res_tx.clone();
            let shared = Arc::clone(&self.shared);
            let handle = handle.clone();
            pool.spawn(move || {
                for (seq, unit) in units.into_iter().enumerate() {
                    let result = process_chunk(&shared, &handle, unit);
                    if tx.send(ChunkResult { batch, seq, result }).is_err() {
                        break;
                    }
                }
            });
        }
        drop(res_tx);
        executor.pump_until_closed(&res_rx, |r| {
            log::trace!("batch {} chunk #{} {}", r.batch, r.seq, ChunkStage::Delivered);
            on_result(r)
        });
        Ok(())
    }

    fn finish_stats(
        &self,
        chunks: usize,
        failures: usize,
        quads: usize,
        started: Instant,
    ) -> ExportStats {
        let caches = &self.shared.caches;
        let stats = ExportStats {
            chunks,
            failures,
            quads,
            sprite_cache: caches.sprites.stats(),
            opacity_cache: caches.opacity.stats(),
            image_cache: caches.images.stats(),
            elapsed: started.elapsed(),
        };
        log::info!(
            "export finished: {} chunk(s), {} failure(s), {} quad(s) in {:?}",
            stats.chunks,
            stats.failures,
            stats.quads,
            stats.elapsed
        );
        for (name, c) in [
            ("sprite", stats.sprite_cache),
            ("opacity", stats.opacity_cache),
            ("image", stats.image_cache),
        ] {
            log::info!(
                "{} cache: hits={} misses={} evictions={} entries={}",
                name,
                c.hits,
                c.misses,
                c.evictions,
                c.entries
            );
        }
        stats
    }
}
