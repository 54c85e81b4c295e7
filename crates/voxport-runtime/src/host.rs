use voxport_capture::{CapturedBuffer, PixelImage, SpriteLookup};
use voxport_quad::{BlockPos, TextureId};

use crate::error::HostError;
use crate::scan::ExportRegion;

/// Engine operations the session may need to run somewhere specific.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostOp {
    RecordBlocks,
    RecordEntities,
    ReadPixels,
}

/// Where an operation may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecContext {
    /// Try on the calling thread; a [`HostError::WrongContext`] still triggers a handoff.
    Any,
    /// Always hand off to the privileged context.
    Privileged,
}

/// One chunk column clipped to the export region. Bounds are inclusive world block coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkUnit {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub min: BlockPos,
    pub max: BlockPos,
    /// The whole export, for hosts that close the mesh at its border.
    pub region: ExportRegion,
}

impl ChunkUnit {
    #[inline]
    pub fn contains(&self, p: BlockPos) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }

    pub fn block_count(&self) -> usize {
        let span = |lo: i32, hi: i32| (hi - lo + 1).max(0) as usize;
        span(self.min.x, self.max.x) * span(self.min.y, self.max.y) * span(self.min.z, self.max.z)
    }
}

/// The engine the session captures from.
///
/// Atlas queries come through [`SpriteLookup`]; they must be callable from any thread.
pub trait EngineHost: SpriteLookup + Send + Sync {
    /// Declared execution context of `op`.
    fn context_for(&self, _op: HostOp) -> ExecContext {
        ExecContext::Any
    }

    /// Records every block inside `unit`, one buffer per draw.
    fn record_blocks(&self, unit: &ChunkUnit) -> Result<Vec<CapturedBuffer>, HostError>;

    /// Records the entities whose origin lies inside `unit`.
    fn record_entities(&self, _unit: &ChunkUnit) -> Result<Vec<CapturedBuffer>, HostError> {
        Ok(Vec::new())
    }

    /// Pixel data of a texture or atlas; `Ok(None)` when the host has none.
    fn read_pixels(&self, resource: &TextureId) -> Result<Option<PixelImage>, HostError>;
}
