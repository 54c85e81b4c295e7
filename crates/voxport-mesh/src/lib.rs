//! Per-owner reconciliation of captured quads: duplicate removal, overlap separation
//! and coplanar merging.
#![forbid(unsafe_code)]

mod constants;
mod dedup;
mod optimize;
mod overlap;

pub use constants::{DEFAULT_MAX_PASSES, DEFAULT_OVERLAP_DISTANCE, OPAQUE};
pub use dedup::{dedup_quads, quads_equivalent};
pub use optimize::{can_tile, is_rectangle, optimize};
pub use overlap::{
    DrawOrder, OverlapSettings, Separated, overlap_depth, reconcile_owner, separate_overlaps,
    sort_for_drawing,
};
