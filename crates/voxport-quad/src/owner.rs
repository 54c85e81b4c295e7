use uuid::Uuid;

/// Integer block coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Chunk column holding this block (16x16 columns).
    #[inline]
    pub const fn chunk_xz(self) -> (i32, i32) {
        (self.x >> 4, self.z >> 4)
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    #[inline]
    fn from(v: (i32, i32, i32)) -> Self {
        Self::new(v.0, v.1, v.2)
    }
}

/// Who produced a quad during one capture pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OwnerKey {
    Block(BlockPos),
    Entity(Uuid),
}

impl OwnerKey {
    #[inline]
    pub fn is_entity(&self) -> bool {
        matches!(self, OwnerKey::Entity(_))
    }
}

impl From<BlockPos> for OwnerKey {
    fn from(p: BlockPos) -> Self {
        OwnerKey::Block(p)
    }
}

impl From<Uuid> for OwnerKey {
    fn from(id: Uuid) -> Self {
        OwnerKey::Entity(id)
    }
}
