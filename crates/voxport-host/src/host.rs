use std::thread::{self, ThreadId};

use hashbrown::HashMap;
use voxport_capture::{AtlasTable, CapturedBuffer, PixelImage, SpriteLookup};
use voxport_geom::Vec3;
use voxport_quad::{BlockPos, OwnerKey, PackedColor, RenderLayer, SpriteRef, TextureId, UvBounds};
use voxport_runtime::{ChunkUnit, EngineHost, ExecContext, ExportRegion, HostError, HostOp};

use crate::atlas::{GridAtlas, TILE, base_color};
use crate::emit::BufferWriter;
use crate::face::Face;
use crate::scene::Scene;

/// Software stand-in for the engine's renderer.
///
/// Records scene geometry into quad-list buffers. Pixel readback and entity capture are
/// confined to the thread that created the host.
pub struct SoftwareHost {
    scene: Scene,
    atlas: GridAtlas,
    table: AtlasTable,
    entity_images: HashMap<TextureId, PixelImage>,
    owner: ThreadId,
}

impl SoftwareHost {
    pub fn new(scene: Scene) -> Self {
        let atlas = GridAtlas::build(scene.palette());
        let mut table = atlas.table().clone();
        let mut entity_images = HashMap::new();
        for e in scene.entities() {
            let id = TextureId::from(e.texture.as_str());
            if entity_images.contains_key(&id) {
                continue;
            }
            table.insert_texture(id.clone(), TILE, TILE);
            let argb = 0xFF00_0000 | base_color(&e.texture);
            entity_images.insert(id, PixelImage::filled(TILE, TILE, argb));
        }
        Self {
            scene,
            atlas,
            table,
            entity_images,
            owner: thread::current().id(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn atlas(&self) -> &GridAtlas {
        &self.atlas
    }

    #[inline]
    fn on_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// A face is drawn unless an opaque block, or another block of the same kind, covers
    /// it. Neighbours outside the export region never cover.
    fn exposed(&self, pos: BlockPos, face: Face, region: &ExportRegion) -> bool {
        let n = face.neighbor(pos);
        if !region.contains(n) {
            return true;
        }
        match self.scene.kind_at(n) {
            None => true,
            Some(k) if Some(k) == self.scene.kind_at(pos) => false,
            Some(_) => !self.scene.get(n).is_some_and(|b| b.opaque),
        }
    }
}

impl SpriteLookup for SoftwareHost {
    fn sprite_for(&self, resource: &TextureId, bounds: &UvBounds) -> Option<SpriteRef> {
        self.table.sprite_for(resource, bounds)
    }

    fn texture_size(&self, resource: &TextureId) -> Option<(u32, u32)> {
        self.table.texture_size(resource)
    }

    fn is_atlas(&self, resource: &TextureId) -> bool {
        self.table.is_atlas(resource)
    }
}

impl EngineHost for SoftwareHost {
    fn context_for(&self, op: HostOp) -> ExecContext {
        match op {
            HostOp::ReadPixels => ExecContext::Privileged,
            HostOp::RecordBlocks | HostOp::RecordEntities => ExecContext::Any,
        }
    }

    fn record_blocks(&self, unit: &ChunkUnit) -> Result<Vec<CapturedBuffer>, HostError> {
        let mut writers: Vec<(RenderLayer, BufferWriter)> = Vec::new();
        let mut faces = Vec::with_capacity(6);
        for y in unit.min.y..=unit.max.y {
            for z in unit.min.z..=unit.max.z {
                for x in unit.min.x..=unit.max.x {
                    let pos = BlockPos::new(x, y, z);
                    let Some(kind) = self.scene.get(pos) else {
                        continue;
                    };
                    faces.clear();
                    faces.extend(
                        Face::ALL
                            .into_iter()
                            .filter(|&f| self.exposed(pos, f, &unit.region)),
                    );
                    if faces.is_empty() {
                        continue;
                    }
                    let slot = match writers.iter().position(|(l, _)| *l == kind.layer) {
                        Some(i) => i,
                        None => {
                            let writer = BufferWriter::blocks(kind.layer, self.atlas.id().clone());
                            writers.push((kind.layer, writer));
                            writers.len() - 1
                        }
                    };
                    let w = &mut writers[slot].1;
                    w.begin_owner(OwnerKey::Block(pos), kind.light);
                    let min = Vec3::new(x as f32, y as f32, z as f32);
                    let max = min + Vec3::new(1.0, 1.0, 1.0);
                    let [r, g, b, a] = kind.tint;
                    let color = PackedColor::from_rgba(r, g, b, a);
                    for &face in &faces {
                        let texture = kind.texture(face);
                        let Some(sprite) = self.atlas.sprite(texture) else {
                            log::warn!("texture {} missing from atlas", texture);
                            continue;
                        };
                        w.face(face, min, max, &sprite.footprint, color);
                    }
                }
            }
        }
        Ok(writers
            .into_iter()
            .filter(|(_, w)| !w.is_empty())
            .map(|(_, w)| w.finish())
            .collect())
    }

    fn record_entities(&self, unit: &ChunkUnit) -> Result<Vec<CapturedBuffer>, HostError> {
        if !self.on_owner_thread() {
            return Err(HostError::WrongContext);
        }
        let mut writers: Vec<(TextureId, BufferWriter)> = Vec::new();
        for e in self.scene.entities() {
            if !unit.contains(e.origin_block()) {
                continue;
            }
            let id = TextureId::from(e.texture.as_str());
            let slot = match writers.iter().position(|(t, _)| *t == id) {
                Some(i) => i,
                None => {
                    writers.push((id.clone(), BufferWriter::entities(id)));
                    writers.len() - 1
                }
            };
            let w = &mut writers[slot].1;
            w.begin_owner(OwnerKey::Entity(e.id), 0);
            for face in Face::ALL {
                w.face(face, e.min, e.max, &UvBounds::UNIT, PackedColor::NO_TINT);
            }
        }
        Ok(writers.into_iter().map(|(_, w)| w.finish()).collect())
    }

    fn read_pixels(&self, resource: &TextureId) -> Result<Option<PixelImage>, HostError> {
        if !self.on_owner_thread() {
            return Err(HostError::WrongContext);
        }
        if resource == self.atlas.id() {
            return Ok(Some(self.atlas.pixels().clone()));
        }
        Ok(self.entity_images.get(resource).cloned())
    }
}
