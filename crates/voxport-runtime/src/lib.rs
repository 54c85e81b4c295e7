//! Export orchestration: scans a region chunk by chunk, runs capture and reconciliation on
//! worker threads, and confines host operations that need it to the privileged thread.
#![forbid(unsafe_code)]

mod cache;
mod config;
mod error;
mod extension;
mod host;
mod pipeline;
mod pool;
mod privileged;
mod scan;
mod session;

pub use cache::{CacheStats, SessionCache};
pub use config::{ConfigError, ExportConfig};
pub use error::{ChunkStage, ExportError, HostError};
pub use extension::{MaterialExtension, MaterialMaps, SuffixMaps};
pub use host::{ChunkUnit, EngineHost, ExecContext, HostOp};
pub use pipeline::{ChunkStats, ExportChunk};
pub use pool::{PooledScratch, ScratchPool};
pub use privileged::{PrivilegedExecutor, PrivilegedHandle};
pub use scan::{CHUNK_SIZE, ExportRegion, partition};
pub use session::{ExportReport, ExportSession, ExportStats, RunSummary};
