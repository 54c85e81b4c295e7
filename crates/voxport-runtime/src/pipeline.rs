use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use voxport_capture::{
    DecodeReport, PixelImage, SpriteLookup, decode_buffer, flip_v, resolve_textures,
};
use voxport_geom::Vec3;
use voxport_mesh::{DrawOrder, OPAQUE, OverlapSettings, optimize, reconcile_owner};
use voxport_quad::{BlockPos, OwnerKey, Quad, SpriteRef, TextureId, UvBounds};

use crate::cache::SessionCache;
use crate::config::ExportConfig;
use crate::error::{ChunkStage, ExportError, HostError};
use crate::extension::{MaterialExtension, MaterialMaps};
use crate::host::{ChunkUnit, EngineHost, ExecContext, HostOp};
use crate::pool::ScratchPool;
use crate::privileged::PrivilegedHandle;

type SpriteKey = (TextureId, [u32; 4]);
/// Resource, sampled region, tint alpha.
type OpacityKey = (TextureId, [u32; 4], u8);

pub(crate) struct Caches {
    pub sprites: SessionCache<SpriteKey, Option<SpriteRef>>,
    pub opacity: SessionCache<OpacityKey, f32>,
    pub images: SessionCache<TextureId, Option<Arc<PixelImage>>>,
}

impl Caches {
    pub fn new(capacity: usize) -> Self {
        Self {
            sprites: SessionCache::new(capacity),
            opacity: SessionCache::new(capacity),
            images: SessionCache::new(capacity),
        }
    }
}

/// Everything a worker needs, shared for the lifetime of one export session.
pub(crate) struct Shared {
    pub host: Arc<dyn EngineHost>,
    pub config: ExportConfig,
    pub center: BlockPos,
    pub caches: Caches,
    pub extension: Option<Arc<dyn MaterialExtension>>,
    pub scratch: ScratchPool,
}

/// Per-chunk counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub buffers: usize,
    /// Buffers skipped by the format gate.
    pub rejected_buffers: usize,
    pub decode: DecodeReport,
    pub nudges: usize,
    /// Owners whose overlap separation hit the pass cap.
    pub unconverged_owners: usize,
    /// Quads removed by the optimizer.
    pub merged_away: usize,
}

/// One delivered chunk.
#[derive(Clone, Debug)]
pub struct ExportChunk {
    /// Chunk coordinates, relative to the centre chunk when relative coordinates are on.
    pub x: i32,
    pub z: i32,
    pub quads: Vec<Quad>,
    /// Companion maps per texture, filled only when a material extension is installed.
    pub materials: BTreeMap<TextureId, MaterialMaps>,
    pub stats: ChunkStats,
}

/// Memoizing [`SpriteLookup`] in front of the host's atlas tables.
struct CachedSprites<'a> {
    host: &'a dyn EngineHost,
    cache: &'a SessionCache<SpriteKey, Option<SpriteRef>>,
}

impl SpriteLookup for CachedSprites<'_> {
    fn sprite_for(&self, resource: &TextureId, bounds: &UvBounds) -> Option<SpriteRef> {
        self.cache
            .get_or_insert_with((resource.clone(), bounds.key()), || {
                self.host.sprite_for(resource, bounds)
            })
    }

    fn texture_size(&self, resource: &TextureId) -> Option<(u32, u32)> {
        self.host.texture_size(resource)
    }

    fn is_atlas(&self, resource: &TextureId) -> bool {
        self.host.is_atlas(resource)
    }
}

/// Runs a host operation, handing it to the privileged context when it is declared
/// privileged or fails with [`HostError::WrongContext`].
fn host_call<T, F>(
    shared: &Shared,
    handle: &PrivilegedHandle,
    op: HostOp,
    f: F,
) -> Result<T, ExportError>
where
    T: Send + 'static,
    F: Fn(&dyn EngineHost) -> Result<T, HostError> + Send + 'static,
{
    if shared.host.context_for(op) == ExecContext::Any {
        match f(shared.host.as_ref()) {
            Err(HostError::WrongContext) if !handle.is_privileged_thread() => {}
            other => return other.map_err(ExportError::from),
        }
    }
    log::debug!("handing {:?} to the privileged context", op);
    let host = Arc::clone(&shared.host);
    handle.call(move || f(host.as_ref()))?.map_err(ExportError::from)
}

fn image(
    shared: &Shared,
    handle: &PrivilegedHandle,
    resource: &TextureId,
) -> Option<Arc<PixelImage>> {
    shared.caches.images.get_or_insert_with(resource.clone(), || {
        let res = resource.clone();
        match host_call(shared, handle, HostOp::ReadPixels, move |host| host.read_pixels(&res)) {
            Ok(Some(img)) => Some(Arc::new(img)),
            Ok(None) => {
                log::warn!("host returned no pixel data for {}", resource);
                None
            }
            Err(e) => {
                log::warn!("no pixel data for {}: {}", resource, e);
                None
            }
        }
    })
}

/// Average alpha of what the quad samples; quads without texture use their tint alpha.
fn opacity(shared: &Shared, handle: &PrivilegedHandle, q: &Quad) -> f32 {
    let tint = q.color().alpha();
    if !q.has_uv() {
        return f32::from(tint);
    }
    let region = q.sprite.as_ref().map_or(UvBounds::UNIT, |s| s.footprint);
    let key = (q.resource.clone(), region.key(), tint);
    shared.caches.opacity.get_or_insert_with(key, || {
        image(shared, handle, &q.resource)
            .and_then(|img| img.average_alpha(&region, tint))
            .unwrap_or(OPAQUE)
    })
}

/// Owner buckets in order of first appearance.
fn group_by_owner(quads: Vec<Quad>) -> Vec<(OwnerKey, Vec<Quad>)> {
    let mut groups: Vec<(OwnerKey, Vec<Quad>)> = Vec::new();
    let mut slot: HashMap<OwnerKey, usize> = HashMap::new();
    for q in quads {
        let i = *slot.entry(q.owner).or_insert_with(|| {
            groups.push((q.owner, Vec::new()));
            groups.len() - 1
        });
        groups[i].1.push(q);
    }
    groups
}

fn material_maps(ext: &dyn MaterialExtension, quads: &[Quad]) -> BTreeMap<TextureId, MaterialMaps> {
    let mut out = BTreeMap::new();
    for q in quads {
        let tex = q.texture();
        if out.contains_key(tex) {
            continue;
        }
        if let Some(maps) = ext.material_maps(tex).filter(|m| !m.is_empty()) {
            out.insert(tex.clone(), maps);
        }
    }
    out
}

/// Takes one chunk unit through capture, decode, texture resolution, per-owner
/// reconciliation and optimization.
pub(crate) fn process_chunk(
    shared: &Shared,
    handle: &PrivilegedHandle,
    unit: ChunkUnit,
) -> Result<ExportChunk, ExportError> {
    let t0 = Instant::now();
    let cfg = &shared.config;
    let (x, z) = if cfg.relative_coordinates {
        let (cx, cz) = shared.center.chunk_xz();
        (unit.chunk_x - cx, unit.chunk_z - cz)
    } else {
        (unit.chunk_x, unit.chunk_z)
    };
    let stage = |s: ChunkStage| log::trace!("chunk ({}, {}) {}", x, z, s);
    stage(ChunkStage::Capturing);

    let mut buffers = host_call(shared, handle, HostOp::RecordBlocks, move |h| {
        h.record_blocks(&unit)
    })
    .map_err(|e| e.in_chunk(x, z, ChunkStage::Capturing))?;
    if cfg.enable_entities {
        let entities = host_call(shared, handle, HostOp::RecordEntities, move |h| {
            h.record_entities(&unit)
        })
        .map_err(|e| e.in_chunk(x, z, ChunkStage::Capturing))?;
        buffers.extend(entities);
    }

    let mut stats = ChunkStats {
        buffers: buffers.len(),
        ..ChunkStats::default()
    };
    let mut quads = {
        let mut scratch = shared.scratch.acquire();
        for buf in &buffers {
            let report = decode_buffer(buf, &mut scratch);
            if report.rejected {
                stats.rejected_buffers += 1;
            }
            stats.decode.merge(report);
        }
        scratch.drain(..).collect::<Vec<Quad>>()
    };
    drop(buffers);
    stage(ChunkStage::Decoded);

    if cfg.relative_coordinates {
        let shift = Vec3::new(-(shared.center.x as f32), 0.0, -(shared.center.z as f32));
        for q in &mut quads {
            q.translate(shift);
        }
    }
    let lookup = CachedSprites {
        host: shared.host.as_ref(),
        cache: &shared.caches.sprites,
    };
    let quads = flip_v(resolve_textures(quads, &lookup));
    stage(ChunkStage::Normalized);

    let settings = OverlapSettings {
        distance: cfg.overlap_distance,
        max_passes: cfg.max_overlap_passes,
    };
    let mut separated = Vec::with_capacity(quads.len());
    for (owner, bucket) in group_by_owner(quads) {
        let out = reconcile_owner(
            bucket,
            |q| DrawOrder {
                priority: q.layer.priority(),
                opacity: opacity(shared, handle, q),
            },
            &settings,
        );
        stats.nudges += out.nudges;
        if !out.converged {
            stats.unconverged_owners += 1;
            log::warn!("overlaps of {:?} in chunk ({}, {}) left unresolved", owner, x, z);
        }
        separated.extend(out.quads);
    }
    stage(ChunkStage::Separated);

    let quads = if cfg.optimize_mesh {
        let before = separated.len();
        let merged = optimize(separated);
        stats.merged_away = before - merged.len();
        stage(ChunkStage::Optimized);
        merged
    } else {
        separated
    };

    let materials = shared
        .extension
        .as_deref()
        .map(|ext| material_maps(ext, &quads))
        .unwrap_or_default();

    let ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    log::info!(
        target: "perf",
        "ms={} export_chunk chunk=({}, {}) blocks={} buffers={} quads={} nudges={} merged={}",
        ms,
        x,
        z,
        unit.block_count(),
        stats.buffers,
        quads.len(),
        stats.nudges,
        stats.merged_away
    );
    Ok(ExportChunk {
        x,
        z,
        quads,
        materials,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxport_quad::{RenderLayer, Vertex};

    fn quad_for(owner: OwnerKey) -> Quad {
        Quad::new(
            [Vertex::default(); 4],
            RenderLayer::Solid,
            TextureId::from("t"),
            owner,
        )
    }

    #[test]
    fn owner_groups_keep_first_appearance() {
        let a = OwnerKey::Block(BlockPos::new(0, 0, 0));
        let b = OwnerKey::Block(BlockPos::new(1, 0, 0));
        let groups = group_by_owner(vec![quad_for(b), quad_for(a), quad_for(b)]);
        let shape: Vec<(OwnerKey, usize)> = groups.iter().map(|(o, qs)| (*o, qs.len())).collect();
        assert_eq!(shape, vec![(b, 2), (a, 1)]);
    }
}
