use hashbrown::HashMap;
use voxport_quad::{SpriteRef, TextureId, UvBounds};

use crate::texture::{SpriteLookup, find_containing_sprite};

/// In-memory registry of atlases (sprite tables) and standalone texture sizes.
#[derive(Clone, Debug, Default)]
pub struct AtlasTable {
    atlases: HashMap<TextureId, Vec<SpriteRef>>,
    sizes: HashMap<TextureId, (u32, u32)>,
}

impl AtlasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_atlas(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        sprites: Vec<SpriteRef>,
    ) {
        self.sizes.insert(id.clone(), (width, height));
        self.atlases.insert(id, sprites);
    }

    pub fn insert_texture(&mut self, id: TextureId, width: u32, height: u32) {
        self.sizes.insert(id, (width, height));
    }

    /// Sprite table of `id`; `None` if it is not an atlas.
    pub fn sprites(&self, id: &TextureId) -> Option<&[SpriteRef]> {
        self.atlases.get(id).map(Vec::as_slice)
    }

    pub fn sprite_named(&self, atlas: &TextureId, name: &str) -> Option<&SpriteRef> {
        self.sprites(atlas)?.iter().find(|s| s.id.as_str() == name)
    }
}

impl SpriteLookup for AtlasTable {
    fn sprite_for(&self, resource: &TextureId, bounds: &UvBounds) -> Option<SpriteRef> {
        find_containing_sprite(self.sprites(resource)?, bounds).cloned()
    }

    fn texture_size(&self, resource: &TextureId) -> Option<(u32, u32)> {
        self.sizes.get(resource).copied()
    }

    fn is_atlas(&self, resource: &TextureId) -> bool {
        self.atlases.contains_key(resource)
    }
}
