use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Failures reported by the engine host.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HostError {
    /// The operation is only safe on the privileged context and was attempted elsewhere.
    #[error("operation is confined to the privileged context")]
    WrongContext,
    #[error("host resource unavailable: {0}")]
    Unavailable(String),
    #[error("host operation failed: {0}")]
    Failed(String),
}

/// Where a chunk work unit is in its pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkStage {
    Pending,
    Capturing,
    Decoded,
    Normalized,
    Separated,
    Optimized,
    Delivered,
}

impl fmt::Display for ChunkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChunkStage::Pending => "pending",
            ChunkStage::Capturing => "capturing",
            ChunkStage::Decoded => "decoded",
            ChunkStage::Normalized => "normalized",
            ChunkStage::Separated => "separated",
            ChunkStage::Optimized => "optimized",
            ChunkStage::Delivered => "delivered",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("privileged task did not complete within {0:?}")]
    PrivilegedTimeout(Duration),
    #[error("privileged executor is no longer accepting tasks")]
    PrivilegedGone,
    #[error("privileged task panicked")]
    PrivilegedTaskPanicked,
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
    #[error("chunk ({x}, {z}) failed while {stage}: {source}")]
    Chunk {
        x: i32,
        z: i32,
        stage: ChunkStage,
        #[source]
        source: Box<ExportError>,
    },
}

impl ExportError {
    pub(crate) fn in_chunk(self, x: i32, z: i32, stage: ChunkStage) -> Self {
        ExportError::Chunk {
            x,
            z,
            stage,
            source: Box::new(self),
        }
    }
}
