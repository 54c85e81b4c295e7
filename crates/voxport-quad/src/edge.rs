use voxport_geom::{Vec3, quantized_bits};

type PointKey = [u32; 3];

#[inline]
fn point_key(p: Vec3) -> PointKey {
    [quantized_bits(p.x), quantized_bits(p.y), quantized_bits(p.z)]
}

/// Unordered pair of quantized points. Only ever used as a lookup key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    a: PointKey,
    b: PointKey,
}

impl Edge {
    pub fn new(p: Vec3, q: Vec3) -> Self {
        let (a, b) = (point_key(p), point_key(q));
        if a <= b { Edge { a, b } } else { Edge { a: b, b: a } }
    }

    /// `p` quantizes onto one of the endpoints.
    #[inline]
    pub fn touches(&self, p: Vec3) -> bool {
        let k = point_key(p);
        k == self.a || k == self.b
    }
}
