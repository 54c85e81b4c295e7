use voxport_geom::{Vec2, quantized_bits};

/// Slack for the 0..1 span test: half a quantization step at 1.0.
const UNIT_SLACK: f32 = 1.0 / 8192.0;

/// Axis-aligned min/max of a set of texture coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvBounds {
    pub u_min: f32,
    pub u_max: f32,
    pub v_min: f32,
    pub v_max: f32,
}

impl UvBounds {
    pub const UNIT: UvBounds = UvBounds {
        u_min: 0.0,
        u_max: 1.0,
        v_min: 0.0,
        v_max: 1.0,
    };

    #[inline]
    pub const fn new(u_min: f32, u_max: f32, v_min: f32, v_max: f32) -> Self {
        Self {
            u_min,
            u_max,
            v_min,
            v_max,
        }
    }

    /// Bounds of `uvs`; `None` when empty.
    pub fn from_uvs(uvs: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut it = uvs.into_iter();
        let first = it.next()?;
        let mut b = UvBounds::new(first.x, first.x, first.y, first.y);
        for uv in it {
            b.u_min = b.u_min.min(uv.x);
            b.u_max = b.u_max.max(uv.x);
            b.v_min = b.v_min.min(uv.y);
            b.v_max = b.v_max.max(uv.y);
        }
        Some(b)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.u_min, self.v_min)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.u_max, self.v_max)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.u_max - self.u_min
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.v_max - self.v_min
    }

    /// Zero-area bounds cannot be sampled or renormalized against.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    pub fn clamped(&self) -> Self {
        UvBounds::new(
            self.u_min.clamp(0.0, 1.0),
            self.u_max.clamp(0.0, 1.0),
            self.v_min.clamp(0.0, 1.0),
            self.v_max.clamp(0.0, 1.0),
        )
    }

    /// `other` lies inside `self`, allowing `eps` slack on every side.
    #[inline]
    pub fn contains(&self, other: &UvBounds, eps: f32) -> bool {
        self.u_min - eps <= other.u_min
            && other.u_max <= self.u_max + eps
            && self.v_min - eps <= other.v_min
            && other.v_max <= self.v_max + eps
    }

    /// Spans exactly 0..1 on both axes, up to quantization.
    pub fn is_unit(&self) -> bool {
        let near = |a: f32, b: f32| (a - b).abs() <= UNIT_SLACK;
        near(self.u_min, 0.0)
            && near(self.u_max, 1.0)
            && near(self.v_min, 0.0)
            && near(self.v_max, 1.0)
    }

    /// Maps `uv` from these bounds into local 0..1 space.
    #[inline]
    pub fn localize(&self, uv: Vec2) -> Vec2 {
        Vec2::new(
            (uv.x - self.u_min) / self.width(),
            (uv.y - self.v_min) / self.height(),
        )
    }

    /// Quantized bit pattern, used as a memoization key.
    #[inline]
    pub fn key(&self) -> [u32; 4] {
        [
            quantized_bits(self.u_min),
            quantized_bits(self.u_max),
            quantized_bits(self.v_min),
            quantized_bits(self.v_max),
        ]
    }
}
