use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::Deserialize;
use voxport_quad::RenderLayer;

use crate::error::SceneError;
use crate::face::Face;

/// Palette index of a block kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindId(pub u16);

#[derive(Clone, Debug, PartialEq)]
pub struct BlockKind {
    pub name: String,
    pub top: String,
    pub bottom: String,
    pub side: String,
    pub layer: RenderLayer,
    /// Full opaque cube: hides the faces of its neighbours.
    pub opaque: bool,
    /// Emitted light, 0..=15.
    pub light: u8,
    /// Vertex tint (RGBA).
    pub tint: [u8; 4],
}

impl BlockKind {
    pub fn texture(&self, face: Face) -> &str {
        match face {
            Face::PosY => &self.top,
            Face::NegY => &self.bottom,
            _ => &self.side,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Palette {
    kinds: Vec<BlockKind>,
    by_name: HashMap<String, KindId>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct KindEntry {
    #[serde(default)]
    texture: Option<String>,
    #[serde(default)]
    top: Option<String>,
    #[serde(default)]
    bottom: Option<String>,
    #[serde(default)]
    side: Option<String>,
    #[serde(default)]
    layer: Option<String>,
    #[serde(default)]
    opaque: Option<bool>,
    #[serde(default)]
    light: u8,
    #[serde(default)]
    tint: Option<[u8; 4]>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// The block set used for generated terrain.
    pub fn builtin() -> Self {
        let mut p = Palette::new();
        let mut cube = |name: &str,
                        top: &str,
                        bottom: &str,
                        side: &str,
                        layer: RenderLayer,
                        light: u8| {
            p.insert(BlockKind {
                name: name.to_string(),
                top: top.to_string(),
                bottom: bottom.to_string(),
                side: side.to_string(),
                layer,
                opaque: layer == RenderLayer::Solid,
                light,
                tint: [255; 4],
            });
        };
        cube("stone", "stone", "stone", "stone", RenderLayer::Solid, 0);
        cube("dirt", "dirt", "dirt", "dirt", RenderLayer::Solid, 0);
        cube("grass", "grass_top", "dirt", "grass_side", RenderLayer::Solid, 0);
        cube("sand", "sand", "sand", "sand", RenderLayer::Solid, 0);
        cube("leaves", "leaves", "leaves", "leaves", RenderLayer::Cutout, 0);
        cube("glass", "glass", "glass", "glass", RenderLayer::Translucent, 0);
        cube("glowstone", "glowstone", "glowstone", "glowstone", RenderLayer::Solid, 15);
        p
    }

    /// Parses a table of kinds: `[stone] texture = "stone"`, `[grass] top = ... side = ...`.
    pub fn from_toml_str(src: &str) -> Result<Self, SceneError> {
        let entries: BTreeMap<String, KindEntry> = toml::from_str(src)?;
        Self::from_entries(entries)
    }

    // BTreeMap iteration keeps kind ids stable across loads.
    pub(crate) fn from_entries(entries: BTreeMap<String, KindEntry>) -> Result<Self, SceneError> {
        let mut p = Palette::new();
        for (name, e) in entries {
            let base = e.texture.clone().unwrap_or_else(|| name.clone());
            let side = e.side.unwrap_or_else(|| base.clone());
            let layer = e.layer.as_deref().map_or(RenderLayer::Solid, RenderLayer::from_name);
            if e.light > 15 {
                return Err(SceneError::Invalid(format!("light of `{name}` exceeds 15")));
            }
            p.insert(BlockKind {
                top: e.top.unwrap_or_else(|| base.clone()),
                bottom: e.bottom.unwrap_or_else(|| base.clone()),
                side,
                layer,
                opaque: e.opaque.unwrap_or(layer == RenderLayer::Solid),
                light: e.light,
                tint: e.tint.unwrap_or([255; 4]),
                name,
            });
        }
        Ok(p)
    }

    /// Adds or replaces a kind by name.
    pub fn insert(&mut self, kind: BlockKind) -> KindId {
        if let Some(&id) = self.by_name.get(&kind.name) {
            self.kinds[id.0 as usize] = kind;
            return id;
        }
        let id = KindId(self.kinds.len() as u16);
        self.by_name.insert(kind.name.clone(), id);
        self.kinds.push(kind);
        id
    }

    #[inline]
    pub fn get(&self, id: KindId) -> Option<&BlockKind> {
        self.kinds.get(id.0 as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<KindId> {
        self.by_name.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<KindId, SceneError> {
        self.id_by_name(name)
            .ok_or_else(|| SceneError::UnknownBlock(name.to_string()))
    }

    pub fn kinds(&self) -> &[BlockKind] {
        &self.kinds
    }

    /// Every texture referenced by a kind, sorted and deduplicated.
    pub fn textures(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .kinds
            .iter()
            .flat_map(|k| [k.top.clone(), k.bottom.clone(), k.side.clone()])
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Render layer of the first kind using `texture`.
    pub fn layer_of_texture(&self, texture: &str) -> Option<RenderLayer> {
        self.kinds
            .iter()
            .find(|k| k.top == texture || k.bottom == texture || k.side == texture)
            .map(|k| k.layer)
    }
}
