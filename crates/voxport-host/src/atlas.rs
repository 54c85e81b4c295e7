use voxport_capture::{AtlasTable, PixelImage};
use voxport_quad::{RenderLayer, SpriteRef, TextureId, UvBounds};

use crate::palette::Palette;

/// Tile edge in pixels.
pub const TILE: u32 = 16;
pub const ATLAS_ID: &str = "blocks";

/// Every block texture packed into a square power-of-two grid of tiles.
#[derive(Clone, Debug)]
pub struct GridAtlas {
    id: TextureId,
    table: AtlasTable,
    pixels: PixelImage,
}

impl GridAtlas {
    pub fn build(palette: &Palette) -> Self {
        let names = palette.textures();
        let mut per_row = 1u32;
        while (per_row * per_row) < names.len() as u32 {
            per_row *= 2;
        }
        let size = per_row * TILE;
        let mut pixels = PixelImage::filled(size, size, 0);
        let mut sprites = Vec::with_capacity(names.len());
        let cell = 1.0 / per_row as f32;
        for (i, name) in names.iter().enumerate() {
            let (col, row) = (i as u32 % per_row, i as u32 / per_row);
            let layer = palette.layer_of_texture(name).unwrap_or(RenderLayer::Solid);
            paint_tile(&mut pixels, col * TILE, row * TILE, name, layer);
            sprites.push(SpriteRef {
                id: TextureId::from(name.as_str()),
                footprint: UvBounds::new(
                    col as f32 * cell,
                    (col + 1) as f32 * cell,
                    row as f32 * cell,
                    (row + 1) as f32 * cell,
                ),
                width: TILE,
                height: TILE,
            });
        }
        let id = TextureId::from(ATLAS_ID);
        let mut table = AtlasTable::new();
        table.insert_atlas(id.clone(), size, size, sprites);
        log::debug!("packed {} texture(s) into a {}x{} atlas", names.len(), size, size);
        Self { id, table, pixels }
    }

    #[inline]
    pub fn id(&self) -> &TextureId {
        &self.id
    }

    pub fn sprite(&self, name: &str) -> Option<&SpriteRef> {
        self.table.sprite_named(&self.id, name)
    }

    pub fn pixels(&self) -> &PixelImage {
        &self.pixels
    }

    pub fn table(&self) -> &AtlasTable {
        &self.table
    }
}

/// Stable RGB from a texture name (FNV-1a).
pub(crate) fn base_color(name: &str) -> u32 {
    let mut h: u32 = 0x811C_9DC5;
    for b in name.bytes() {
        h ^= u32::from(b);
        h = h.wrapping_mul(0x0100_0193);
    }
    h & 0x00FF_FFFF
}

fn paint_tile(img: &mut PixelImage, x0: u32, y0: u32, name: &str, layer: RenderLayer) {
    let rgb = base_color(name);
    for y in 0..TILE {
        for x in 0..TILE {
            let alpha: u32 = match layer {
                RenderLayer::Translucent => 0x80,
                // Checkerboard holes.
                RenderLayer::Cutout | RenderLayer::CutoutMipped if (x + y) % 2 == 1 => 0,
                _ => 0xFF,
            };
            img.set_pixel(x0 + x, y0 + y, (alpha << 24) | rgb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprites_tile_the_atlas() {
        let atlas = GridAtlas::build(&Palette::builtin());
        // 8 textures -> 4x4 grid.
        assert_eq!(atlas.pixels().width(), 4 * TILE);
        let stone = atlas.sprite("stone").unwrap();
        assert_eq!(stone.footprint.width(), 0.25);
        let glass = atlas.sprite("glass").unwrap().footprint;
        let alpha = atlas.pixels().average_alpha(&glass, 255).unwrap();
        assert_eq!(alpha, 128.0);
    }
}
