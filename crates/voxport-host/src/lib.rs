//! Reference software host: a block scene recorded into the same vertex buffers a real
//! renderer would hand to the exporter.
#![forbid(unsafe_code)]

mod atlas;
mod emit;
mod error;
mod face;
mod host;
mod palette;
mod scene;

pub use atlas::{ATLAS_ID, GridAtlas, TILE};
pub use emit::BufferWriter;
pub use error::SceneError;
pub use face::{FACE_UVS, Face};
pub use host::SoftwareHost;
pub use palette::{BlockKind, KindId, Palette};
pub use scene::{EntityBox, Scene};
