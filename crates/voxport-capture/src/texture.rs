use voxport_geom::Vec2;
use voxport_quad::{Quad, SpriteRef, TextureId, UvBounds};

/// Slack allowed when testing that a sprite footprint contains a quad's UV bounds.
pub const CONTAINMENT_EPSILON: f32 = 1e-6;
/// Snap distance used when neither a sprite nor a texture size is known.
pub const DEFAULT_SNAP_ERROR: f32 = 0.0001;

/// Atlas and texture metadata queries needed to resolve quads.
pub trait SpriteLookup {
    /// The sprite of atlas `resource` whose footprint contains `bounds`.
    /// `None` for non-atlas resources and for misses.
    fn sprite_for(&self, resource: &TextureId, bounds: &UvBounds) -> Option<SpriteRef>;

    /// Pixel dimensions of a standalone texture.
    fn texture_size(&self, resource: &TextureId) -> Option<(u32, u32)>;

    /// Whether `resource` is an atlas. Atlas misses snap with [`DEFAULT_SNAP_ERROR`]
    /// instead of the atlas texel size.
    fn is_atlas(&self, _resource: &TextureId) -> bool {
        false
    }
}

/// Linear scan for the first sprite whose footprint fully contains `bounds`.
pub fn find_containing_sprite<'a>(
    sprites: &'a [SpriteRef],
    bounds: &UvBounds,
) -> Option<&'a SpriteRef> {
    sprites
        .iter()
        .find(|s| !s.footprint.is_degenerate() && s.footprint.contains(bounds, CONTAINMENT_EPSILON))
}

/// Snaps `x` to exactly 0 or 1 when it lies within `err` of either.
#[inline]
pub fn snap_unit(x: f32, err: f32) -> f32 {
    if x.abs() < err {
        0.0
    } else if (x - 1.0).abs() < err {
        1.0
    } else {
        x
    }
}

#[inline]
fn half_texel(dim: u32) -> f32 {
    if dim > 0 { 0.5 / dim as f32 } else { DEFAULT_SNAP_ERROR }
}

/// Resolves the sprite of one quad and rewrites its UVs into sprite-local space.
///
/// Quads without UVs, and atlas misses, keep their resource and raw coordinates;
/// snapping to the unit edges still applies to the latter, with the default error.
pub fn resolve_quad<L: SpriteLookup + ?Sized>(mut quad: Quad, lookup: &L) -> Quad {
    let Some(bounds) = quad.uv_bounds() else {
        return quad;
    };
    let (w, h) = match lookup.sprite_for(&quad.resource, &bounds) {
        Some(sprite) => {
            let footprint = sprite.footprint;
            quad.map_uvs(|uv| footprint.localize(uv));
            let dims = (sprite.width, sprite.height);
            quad.sprite = Some(sprite);
            dims
        }
        None if lookup.is_atlas(&quad.resource) => (0, 0),
        None => lookup.texture_size(&quad.resource).unwrap_or((0, 0)),
    };
    let (err_u, err_v) = (half_texel(w), half_texel(h));
    quad.map_uvs(|uv| Vec2::new(snap_unit(uv.x, err_u), snap_unit(uv.y, err_v)));
    quad
}

pub fn resolve_textures<L: SpriteLookup + ?Sized>(quads: Vec<Quad>, lookup: &L) -> Vec<Quad> {
    quads.into_iter().map(|q| resolve_quad(q, lookup)).collect()
}

/// Converts to bottom-left texture origin (`v -> 1 - v`).
pub fn flip_v(mut quads: Vec<Quad>) -> Vec<Quad> {
    for q in &mut quads {
        if q.has_uv() {
            q.map_uvs(|uv| Vec2::new(uv.x, 1.0 - uv.y));
        }
    }
    quads
}
