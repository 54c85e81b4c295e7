use voxport_geom::{Vec2, Vec3};

use crate::color::PackedColor;

/// One decoded vertex. Absent attributes stay `None` (or [`PackedColor::NO_TINT`]).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Option<Vec2>,
    pub light_uv: Option<Vec2>,
    pub color: PackedColor,
}

impl Vertex {
    #[inline]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.uv = Some(Vec2::new(u, v));
        self
    }

    #[inline]
    pub fn with_color(mut self, color: PackedColor) -> Self {
        self.color = color;
        self
    }

    /// Position, UV and color match; the light-map coordinate is ignored.
    #[inline]
    pub fn same_surface(&self, other: &Vertex) -> bool {
        self.position == other.position && self.uv == other.uv && self.color == other.color
    }
}
