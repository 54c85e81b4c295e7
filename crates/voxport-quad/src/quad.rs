use voxport_geom::{Vec2, Vec3};

use crate::owner::OwnerKey;
use crate::texture::{SpriteRef, TextureId};
use crate::uv::UvBounds;
use crate::vertex::Vertex;

/// Material/blend classification of the pass a quad was drawn in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderLayer {
    Solid,
    Cutout,
    CutoutMipped,
    Tripwire,
    Translucent,
    /// Any pass without a fixed slot; ordered after the cutout layers.
    Other(u16),
}

impl RenderLayer {
    /// Draw-order priority, lower first.
    #[inline]
    pub const fn priority(self) -> u32 {
        match self {
            RenderLayer::Solid => 0,
            RenderLayer::Cutout => 1,
            RenderLayer::CutoutMipped => 2,
            RenderLayer::Other(_) => 3,
            RenderLayer::Tripwire => u32::MAX - 1,
            RenderLayer::Translucent => u32::MAX,
        }
    }

    pub fn from_name(name: &str) -> RenderLayer {
        match name {
            "solid" => RenderLayer::Solid,
            "cutout" => RenderLayer::Cutout,
            "cutout_mipped" => RenderLayer::CutoutMipped,
            "tripwire" => RenderLayer::Tripwire,
            "translucent" => RenderLayer::Translucent,
            _ => RenderLayer::Other(0),
        }
    }
}

/// Four vertices in winding order plus the identity of what they were drawn with.
///
/// The UV bounds are cached and kept in sync by every mutator that touches a UV,
/// which is why the vertices are only reachable through accessors.
#[derive(Clone, Debug, PartialEq)]
pub struct Quad {
    vertices: [Vertex; 4],
    uv_bounds: Option<UvBounds>,
    pub layer: RenderLayer,
    pub resource: TextureId,
    pub sprite: Option<SpriteRef>,
    pub owner: OwnerKey,
    /// Emitted block light, 0..=15.
    pub light: u8,
}

impl Quad {
    pub fn new(
        vertices: [Vertex; 4],
        layer: RenderLayer,
        resource: TextureId,
        owner: OwnerKey,
    ) -> Self {
        let mut q = Self {
            vertices,
            uv_bounds: None,
            layer,
            resource,
            sprite: None,
            owner,
            light: 0,
        };
        q.refresh_uv_bounds();
        q
    }

    #[inline]
    pub fn with_light(mut self, light: u8) -> Self {
        self.light = light;
        self
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex; 4] {
        &self.vertices
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        self.vertices[i].position
    }

    /// UV of vertex `i`; `None` if the quad was captured without UVs.
    #[inline]
    pub fn uv(&self, i: usize) -> Option<Vec2> {
        self.vertices[i].uv
    }

    /// `None` unless all four vertices carry a UV.
    #[inline]
    pub fn uv_bounds(&self) -> Option<UvBounds> {
        self.uv_bounds
    }

    #[inline]
    pub fn has_uv(&self) -> bool {
        self.uv_bounds.is_some()
    }

    /// Logical texture: the resolved sprite if any, else the raw resource.
    #[inline]
    pub fn texture(&self) -> &TextureId {
        self.sprite.as_ref().map_or(&self.resource, |s| &s.id)
    }

    #[inline]
    pub fn set_position(&mut self, i: usize, p: Vec3) {
        self.vertices[i].position = p;
    }

    pub fn translate(&mut self, d: Vec3) {
        for v in &mut self.vertices {
            v.position += d;
        }
    }

    pub fn set_uv(&mut self, i: usize, uv: Vec2) {
        self.vertices[i].uv = Some(uv);
        self.refresh_uv_bounds();
    }

    /// Rewrites every present UV through `f`.
    pub fn map_uvs(&mut self, mut f: impl FnMut(Vec2) -> Vec2) {
        for v in &mut self.vertices {
            if let Some(uv) = v.uv {
                v.uv = Some(f(uv));
            }
        }
        self.refresh_uv_bounds();
    }

    fn refresh_uv_bounds(&mut self) {
        self.uv_bounds = if self.vertices.iter().all(|v| v.uv.is_some()) {
            UvBounds::from_uvs(self.vertices.iter().filter_map(|v| v.uv))
        } else {
            None
        };
    }

    /// Unit face normal from the diagonals; counter-clockwise winding faces the viewer.
    pub fn normal(&self) -> Vec3 {
        let [a, b, c, d] = self.vertices.map(|v| v.position);
        (c - a).cross(d - b).normalized()
    }

    /// Area of the (planar) quad.
    pub fn area(&self) -> f32 {
        let [a, b, c, d] = self.vertices.map(|v| v.position);
        (c - a).cross(d - b).length() * 0.5
    }

    pub fn centroid(&self) -> Vec3 {
        self.vertices
            .iter()
            .fold(Vec3::ZERO, |acc, v| acc + v.position)
            / 4.0
    }

    /// Color of the first vertex, which the engine repeats across a face.
    #[inline]
    pub fn color(&self) -> crate::PackedColor {
        self.vertices[0].color
    }
}
