/// Vertex color as laid out in the engine's buffers: bytes R, G, B, A in memory,
/// read as a little-endian `u32` (`0xAABBGGRR`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PackedColor(pub u32);

impl PackedColor {
    /// Opaque white; the multiplicative identity.
    pub const NO_TINT: PackedColor = PackedColor(u32::MAX);

    #[inline]
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_le_bytes([r, g, b, a]))
    }

    #[inline]
    pub const fn to_rgba(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

impl Default for PackedColor {
    fn default() -> Self {
        Self::NO_TINT
    }
}
