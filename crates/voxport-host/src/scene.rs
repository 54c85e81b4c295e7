use std::collections::BTreeMap;
use std::path::Path;

use fastnoise_lite::{FastNoiseLite, NoiseType};
use hashbrown::HashMap;
use serde::Deserialize;
use uuid::Uuid;
use voxport_geom::Vec3;
use voxport_quad::BlockPos;

use crate::error::SceneError;
use crate::palette::{BlockKind, KindEntry, KindId, Palette};

/// Axis-aligned entity model with one standalone texture.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityBox {
    pub id: Uuid,
    pub min: Vec3,
    pub max: Vec3,
    pub texture: String,
}

impl EntityBox {
    /// Block holding the entity's minimum corner; decides which chunk captures it.
    pub fn origin_block(&self) -> BlockPos {
        BlockPos::new(
            self.min.x.floor() as i32,
            self.min.y.floor() as i32,
            self.min.z.floor() as i32,
        )
    }
}

/// Sparse block world plus entities.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    palette: Palette,
    blocks: HashMap<BlockPos, KindId>,
    entities: Vec<EntityBox>,
}

#[derive(Deserialize)]
struct SceneFile {
    #[serde(default)]
    palette: Option<BTreeMap<String, KindEntry>>,
    #[serde(default)]
    blocks: Vec<BlockEntry>,
    #[serde(default)]
    entities: Vec<EntityEntry>,
}

#[derive(Deserialize)]
struct BlockEntry {
    kind: String,
    at: [i32; 3],
    /// Opposite corner of an inclusive fill box.
    #[serde(default)]
    to: Option<[i32; 3]>,
}

#[derive(Deserialize)]
struct EntityEntry {
    id: String,
    texture: String,
    min: [f32; 3],
    max: [f32; 3],
}

impl Scene {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    /// Parses a scene document. Without a `[palette]` table the built-in palette is used.
    pub fn from_toml_str(src: &str) -> Result<Self, SceneError> {
        let file: SceneFile = toml::from_str(src)?;
        let palette = match file.palette {
            Some(entries) => Palette::from_entries(entries)?,
            None => Palette::builtin(),
        };
        let mut scene = Scene::new(palette);
        for b in file.blocks {
            let kind = scene.palette.require(&b.kind)?;
            let at = BlockPos::new(b.at[0], b.at[1], b.at[2]);
            let to = b.to.map_or(at, |t| BlockPos::new(t[0], t[1], t[2]));
            scene.fill(at, to, kind);
        }
        for e in file.entities {
            let id = Uuid::parse_str(&e.id).map_err(|_| SceneError::BadEntityId(e.id.clone()))?;
            let min = Vec3::new(e.min[0], e.min[1], e.min[2]);
            let max = Vec3::new(e.max[0], e.max[1], e.max[2]);
            if !(min.x < max.x && min.y < max.y && min.z < max.z) {
                return Err(SceneError::Invalid(format!("entity {id} has an empty box")));
            }
            scene.add_entity(EntityBox {
                id,
                min,
                max,
                texture: e.texture,
            });
        }
        Ok(scene)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let src = std::fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }

    /// Rolling grass terrain of `size x size` columns centred on the origin.
    /// Requires `grass`, `dirt` and `stone` in the palette.
    pub fn terrain(seed: i32, size: i32, palette: Palette) -> Result<Self, SceneError> {
        let grass = palette.require("grass")?;
        let dirt = palette.require("dirt")?;
        let stone = palette.require("stone")?;
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(0.03));

        let mut scene = Scene::new(palette);
        let half = size / 2;
        for z in -half..size - half {
            for x in -half..size - half {
                let h = 62 + (noise.get_noise_2d(x as f32, z as f32) * 6.0).round() as i32;
                for y in h - 4..=h {
                    let kind = if y == h {
                        grass
                    } else if y >= h - 2 {
                        dirt
                    } else {
                        stone
                    };
                    scene.set(BlockPos::new(x, y, z), kind);
                }
            }
        }
        log::info!("generated terrain seed={} size={} blocks={}", seed, size, scene.len());
        Ok(scene)
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set(&mut self, pos: BlockPos, kind: KindId) {
        self.blocks.insert(pos, kind);
    }

    /// Places a kind by name.
    pub fn place(&mut self, pos: BlockPos, name: &str) -> Result<(), SceneError> {
        let kind = self.palette.require(name)?;
        self.set(pos, kind);
        Ok(())
    }

    /// Fills the inclusive box spanned by `a` and `b`.
    pub fn fill(&mut self, a: BlockPos, b: BlockPos, kind: KindId) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for z in a.z.min(b.z)..=a.z.max(b.z) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    self.set(BlockPos::new(x, y, z), kind);
                }
            }
        }
    }

    pub fn remove(&mut self, pos: BlockPos) -> Option<KindId> {
        self.blocks.remove(&pos)
    }

    #[inline]
    pub fn get(&self, pos: BlockPos) -> Option<&BlockKind> {
        self.blocks.get(&pos).and_then(|&id| self.palette.get(id))
    }

    #[inline]
    pub fn kind_at(&self, pos: BlockPos) -> Option<KindId> {
        self.blocks.get(&pos).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn add_entity(&mut self, entity: EntityBox) {
        self.entities.push(entity);
    }

    pub fn entities(&self) -> &[EntityBox] {
        &self.entities
    }
}
