use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use uuid::Uuid;
use voxport_capture::{CapturedBuffer, PixelImage, SpriteLookup};
use voxport_host::{EntityBox, Palette, Scene, SoftwareHost};
use voxport_quad::{BlockPos, Quad, SpriteRef, TextureId, UvBounds, Vec3};
use voxport_runtime::{
    ChunkStage, ChunkUnit, ConfigError, EngineHost, ExecContext, ExportChunk, ExportConfig,
    ExportError, ExportReport, ExportSession, HostError, HostOp, SuffixMaps,
};

const ORIGIN: BlockPos = BlockPos::new(0, 64, 0);

fn config(threads: usize) -> ExportConfig {
    ExportConfig {
        threads,
        radius: 8,
        lower_height: 56,
        upper_height: 72,
        ..ExportConfig::default()
    }
}

fn scene_with(blocks: &[(i32, i32, i32, &str)]) -> Scene {
    let mut scene = Scene::new(Palette::builtin());
    for &(x, y, z, name) in blocks {
        scene.place(BlockPos::new(x, y, z), name).unwrap();
    }
    scene
}

fn run_export(host: impl EngineHost + 'static, cfg: ExportConfig) -> ExportReport {
    ExportSession::new(Arc::new(host), cfg, ORIGIN).unwrap().export().unwrap()
}

fn all_quads(chunks: &[ExportChunk]) -> Vec<&Quad> {
    chunks.iter().flat_map(|c| c.quads.iter()).collect()
}

fn min_corner(q: &Quad) -> Vec3 {
    (0..4).map(|i| q.position(i)).fold(Vec3::new(f32::MAX, f32::MAX, f32::MAX), |m, p| {
        Vec3::new(m.x.min(p.x), m.y.min(p.y), m.z.min(p.z))
    })
}

#[test]
fn adjacent_cubes_export_as_one_box() {
    let host = SoftwareHost::new(scene_with(&[(1, 64, 1, "stone"), (2, 64, 1, "stone")]));
    let report = run_export(host, config(1));
    assert!(report.failures.is_empty());
    assert_eq!(report.chunks.len(), 4);
    assert_eq!(report.stats.chunks, 4);

    let quads = all_quads(&report.chunks);
    assert_eq!(quads.len(), 6);
    let total: f32 = quads.iter().map(|q| q.area()).sum();
    assert!((total - 10.0).abs() < 1e-4);
    let top: Vec<&&Quad> = quads.iter().filter(|q| q.normal().y > 0.99).collect();
    assert_eq!(top.len(), 1);
    assert!((top[0].area() - 2.0).abs() < 1e-5);
    assert!(quads.iter().all(|q| q.texture().as_str() == "stone"));

    let owner_chunk = report.chunks.iter().find(|c| !c.quads.is_empty()).unwrap();
    assert_eq!((owner_chunk.x, owner_chunk.z), (0, 0));
    assert_eq!(owner_chunk.stats.merged_away, 4);
    assert_eq!(owner_chunk.stats.nudges, 0);
}

#[test]
fn unoptimized_export_keeps_every_face() {
    let host = SoftwareHost::new(scene_with(&[(1, 64, 1, "stone"), (2, 64, 1, "stone")]));
    let cfg = ExportConfig {
        optimize_mesh: false,
        ..config(1)
    };
    let report = run_export(host, cfg);
    assert_eq!(all_quads(&report.chunks).len(), 10);
}

#[test]
fn worker_count_does_not_change_the_result() {
    let shape = |threads: usize| {
        let scene = Scene::terrain(11, 32, Palette::builtin()).unwrap();
        let cfg = ExportConfig {
            radius: 12,
            ..config(threads)
        };
        let report = run_export(SoftwareHost::new(scene), cfg);
        assert!(report.failures.is_empty());
        report
            .chunks
            .iter()
            .map(|c| (c.x, c.z, c.quads.len()))
            .collect::<Vec<_>>()
    };
    let single = shape(1);
    assert_eq!(single.len(), 4);
    assert!(single.iter().all(|&(_, _, n)| n > 0));
    assert_eq!(shape(3), single);
    assert_eq!(shape(8), single);
}

#[test]
fn entities_are_captured_through_the_privileged_context() {
    let mut scene = scene_with(&[(5, 63, 5, "stone")]);
    scene.add_entity(EntityBox {
        id: Uuid::new_v4(),
        min: Vec3::new(1.25, 64.0, 1.25),
        max: Vec3::new(1.75, 65.0, 1.75),
        texture: "entity/sheep".to_string(),
    });
    let report = run_export(SoftwareHost::new(scene), config(2));
    assert!(report.failures.is_empty());
    let quads = all_quads(&report.chunks);
    assert_eq!(quads.iter().filter(|q| q.owner.is_entity()).count(), 6);
    assert_eq!(quads.iter().filter(|q| !q.owner.is_entity()).count(), 6);
    // Pixel reads went through the cache, once per texture.
    assert_eq!(report.stats.image_cache.entries, 2);
}

#[test]
fn entities_can_be_switched_off() {
    let mut scene = scene_with(&[]);
    scene.add_entity(EntityBox {
        id: Uuid::new_v4(),
        min: Vec3::new(1.25, 64.0, 1.25),
        max: Vec3::new(1.75, 65.0, 1.75),
        texture: "entity/sheep".to_string(),
    });
    let cfg = ExportConfig {
        enable_entities: false,
        ..config(2)
    };
    let report = run_export(SoftwareHost::new(scene), cfg);
    assert!(all_quads(&report.chunks).is_empty());
}

#[test]
fn relative_coordinates_shift_positions_and_chunks() {
    let center = BlockPos::new(40, 64, -24);
    let export = |relative: bool| {
        let host = SoftwareHost::new(scene_with(&[(41, 64, -23, "dirt")]));
        let cfg = ExportConfig {
            radius: 4,
            relative_coordinates: relative,
            ..config(1)
        };
        let report = ExportSession::new(Arc::new(host), cfg, center).unwrap().export().unwrap();
        assert_eq!(report.chunks.len(), 1);
        report.chunks.into_iter().next().unwrap()
    };

    let rel = export(true);
    assert_eq!((rel.x, rel.z), (0, 0));
    let lo = rel
        .quads
        .iter()
        .map(min_corner)
        .fold(Vec3::new(f32::MAX, f32::MAX, f32::MAX), |m, p| {
            Vec3::new(m.x.min(p.x), m.y.min(p.y), m.z.min(p.z))
        });
    assert_eq!(lo, Vec3::new(1.0, 64.0, 1.0));

    let abs = export(false);
    assert_eq!((abs.x, abs.z), (2, -2));
    assert!(abs.quads.iter().all(|q| min_corner(q).x >= 41.0));
}

/// Fails every capture in chunk column 0.
struct FlakyHost(SoftwareHost);

impl SpriteLookup for FlakyHost {
    fn sprite_for(&self, resource: &TextureId, bounds: &UvBounds) -> Option<SpriteRef> {
        self.0.sprite_for(resource, bounds)
    }

    fn texture_size(&self, resource: &TextureId) -> Option<(u32, u32)> {
        self.0.texture_size(resource)
    }

    fn is_atlas(&self, resource: &TextureId) -> bool {
        self.0.is_atlas(resource)
    }
}

impl EngineHost for FlakyHost {
    fn context_for(&self, op: HostOp) -> ExecContext {
        self.0.context_for(op)
    }

    fn record_blocks(&self, unit: &ChunkUnit) -> Result<Vec<CapturedBuffer>, HostError> {
        if unit.chunk_x == 0 {
            return Err(HostError::Failed("renderer lost".to_string()));
        }
        self.0.record_blocks(unit)
    }

    fn read_pixels(&self, resource: &TextureId) -> Result<Option<PixelImage>, HostError> {
        self.0.read_pixels(resource)
    }
}

#[test]
fn failing_chunks_do_not_stop_the_others() {
    let scene = scene_with(&[(1, 64, 1, "stone"), (-3, 64, -3, "sand")]);
    let report = run_export(FlakyHost(SoftwareHost::new(scene)), config(2));
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.chunks.len(), 2);
    assert_eq!(report.stats.failures, 2);
    for failure in &report.failures {
        match failure {
            ExportError::Chunk { x, stage, source, .. } => {
                assert_eq!(*x, 0);
                assert_eq!(*stage, ChunkStage::Capturing);
                assert!(matches!(**source, ExportError::Host(HostError::Failed(_))));
            }
            other => panic!("unexpected failure {other}"),
        }
    }
    let quads = all_quads(&report.chunks);
    assert_eq!(quads.len(), 6);
    assert!(quads.iter().all(|q| q.texture().as_str() == "sand"));
}

/// Records every draw twice, as engines do when a block is re-rendered mid-capture.
struct DoubledHost(SoftwareHost);

impl SpriteLookup for DoubledHost {
    fn sprite_for(&self, resource: &TextureId, bounds: &UvBounds) -> Option<SpriteRef> {
        self.0.sprite_for(resource, bounds)
    }

    fn texture_size(&self, resource: &TextureId) -> Option<(u32, u32)> {
        self.0.texture_size(resource)
    }

    fn is_atlas(&self, resource: &TextureId) -> bool {
        self.0.is_atlas(resource)
    }
}

impl EngineHost for DoubledHost {
    fn record_blocks(&self, unit: &ChunkUnit) -> Result<Vec<CapturedBuffer>, HostError> {
        let once = self.0.record_blocks(unit)?;
        Ok(once.iter().cloned().chain(once.iter().cloned()).collect())
    }

    fn read_pixels(&self, resource: &TextureId) -> Result<Option<PixelImage>, HostError> {
        self.0.read_pixels(resource)
    }
}

#[test]
fn repeated_draws_collapse_to_one_copy() {
    let host = DoubledHost(SoftwareHost::new(scene_with(&[(3, 64, 3, "glass")])));
    let cfg = ExportConfig {
        optimize_mesh: false,
        ..config(1)
    };
    let report = run_export(host, cfg);
    let quads = all_quads(&report.chunks);
    assert_eq!(quads.len(), 6);
    let chunk = report.chunks.iter().find(|c| !c.quads.is_empty()).unwrap();
    assert_eq!(chunk.stats.decode.quads, 12);
    assert_eq!(chunk.stats.nudges, 0);
}

/// Counts pixel reads, optionally handing back truncated pixel data.
struct ShortPixelsHost {
    inner: SoftwareHost,
    reads: AtomicUsize,
    truncate: bool,
}

impl ShortPixelsHost {
    fn new(scene: Scene, truncate: bool) -> Self {
        Self {
            inner: SoftwareHost::new(scene),
            reads: AtomicUsize::new(0),
            truncate,
        }
    }
}

impl SpriteLookup for ShortPixelsHost {
    fn sprite_for(&self, resource: &TextureId, bounds: &UvBounds) -> Option<SpriteRef> {
        self.inner.sprite_for(resource, bounds)
    }

    fn texture_size(&self, resource: &TextureId) -> Option<(u32, u32)> {
        self.inner.texture_size(resource)
    }

    fn is_atlas(&self, resource: &TextureId) -> bool {
        self.inner.is_atlas(resource)
    }
}

impl EngineHost for ShortPixelsHost {
    fn context_for(&self, op: HostOp) -> ExecContext {
        self.inner.context_for(op)
    }

    fn record_blocks(&self, unit: &ChunkUnit) -> Result<Vec<CapturedBuffer>, HostError> {
        self.inner.record_blocks(unit)
    }

    fn read_pixels(&self, resource: &TextureId) -> Result<Option<PixelImage>, HostError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if self.truncate {
            // 16 pixels cannot cover a 64x64 texture.
            return Ok(PixelImage::new(64, 64, vec![0xFF00_0000; 16]));
        }
        self.inner.read_pixels(resource)
    }
}

#[test]
fn truncated_pixel_data_does_not_fail_the_chunk() {
    let host = Arc::new(ShortPixelsHost::new(scene_with(&[(3, 64, 3, "glass")]), true));
    let session = ExportSession::new(Arc::clone(&host) as Arc<dyn EngineHost>, config(2), ORIGIN);
    let report = session.unwrap().export().unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(all_quads(&report.chunks).len(), 6);
    assert_eq!(host.reads.load(Ordering::Relaxed), 1);
    assert_eq!(report.stats.image_cache.misses, 1);
    assert_eq!(report.stats.opacity_cache.misses, 1);
}

#[test]
fn same_textured_blocks_share_cached_lookups() {
    let scene = scene_with(&[
        (1, 64, 1, "stone"),
        (4, 64, 1, "stone"),
        (1, 64, 4, "stone"),
        (-3, 64, -3, "glass"),
        (-6, 64, -6, "glass"),
    ]);
    let host = Arc::new(ShortPixelsHost::new(scene, false));
    let cfg = ExportConfig {
        optimize_mesh: false,
        ..config(1)
    };
    let session = ExportSession::new(Arc::clone(&host) as Arc<dyn EngineHost>, cfg, ORIGIN);
    let report = session.unwrap().export().unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(all_quads(&report.chunks).len(), 30);

    // Both kinds live in the one block atlas, so its pixels are read once.
    assert_eq!(host.reads.load(Ordering::Relaxed), 1);
    let stats = &report.stats;
    assert_eq!((stats.image_cache.misses, stats.image_cache.entries), (1, 1));
    // One (atlas, footprint) key per kind; every other face is a hit.
    assert_eq!(stats.sprite_cache.misses, 2);
    assert_eq!(stats.sprite_cache.hits, 28);
    assert_eq!(stats.sprite_cache.entries, 2);
    assert_eq!(stats.opacity_cache.misses, 2);
    assert_eq!(stats.opacity_cache.hits, 28);
}

#[test]
fn material_extension_pairs_companion_maps() {
    let host = SoftwareHost::new(scene_with(&[(1, 64, 1, "grass")]));
    let session = ExportSession::with_extension(
        Arc::new(host),
        config(1),
        ORIGIN,
        Arc::new(SuffixMaps::default()),
    )
    .unwrap();
    let report = session.export().unwrap();
    let chunk = report.chunks.iter().find(|c| !c.quads.is_empty()).unwrap();
    let names: Vec<&str> = chunk.materials.keys().map(TextureId::as_str).collect();
    assert_eq!(names, vec!["dirt", "grass_side", "grass_top"]);
    let top = &chunk.materials[&TextureId::from("grass_top")];
    assert_eq!(top.normal, Some(TextureId::from("grass_top_n")));
    assert_eq!(top.specular, Some(TextureId::from("grass_top_s")));
    assert!(report.chunks.iter().filter(|c| c.quads.is_empty()).all(|c| c.materials.is_empty()));
}

#[test]
fn run_delivers_in_batches() {
    let host = SoftwareHost::new(scene_with(&[(1, 64, 1, "stone")]));
    let cfg = ExportConfig {
        chunks_per_delivery: 3,
        ..config(1)
    };
    let session = ExportSession::new(Arc::new(host), cfg, ORIGIN).unwrap();
    let mut sizes = Vec::new();
    let summary = session.run(|batch| sizes.push(batch.len())).unwrap();
    assert_eq!(sizes, vec![3, 1]);
    assert_eq!(summary.stats.chunks, 4);
    assert_eq!(summary.stats.quads, 6);
    assert!(summary.failures.is_empty());
}

#[test]
fn invalid_configs_are_refused() {
    let host: Arc<dyn EngineHost> = Arc::new(SoftwareHost::new(scene_with(&[])));
    let cfg = ExportConfig {
        threads: 0,
        ..ExportConfig::default()
    };
    let err = ExportSession::new(host, cfg, BlockPos::new(0, 0, 0)).err().unwrap();
    assert!(matches!(err, ConfigError::Invalid(_)));
}
