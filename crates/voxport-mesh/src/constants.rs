//! Tolerances shared by the overlap resolver and the optimizer.

// Normals
pub(crate) const PARALLEL_DOT: f32 = 1.0 - 0.000_05; // |n1 - n2|^2 <= 1e-4 for unit normals
pub(crate) const NORMAL_KEY_SCALE: f32 = 1024.0; // normal grid used for optimizer buckets

// Rectangles
pub(crate) const RIGHT_ANGLE_COS: f32 = 1e-4; // |cos| below this counts as perpendicular
pub(crate) const SAME_DIRECTION_COS: f32 = 0.999;

// Overlaps
pub const DEFAULT_OVERLAP_DISTANCE: f32 = 0.001; // world units
pub const DEFAULT_MAX_PASSES: usize = 64;
/// Opacity assumed when no pixel data is available; ties every quad of a layer.
pub const OPAQUE: f32 = 255.0;
