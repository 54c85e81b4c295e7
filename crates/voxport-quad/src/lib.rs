//! Captured geometry records: vertices, quads, UV bounds, edges and owner keys.
#![forbid(unsafe_code)]

mod color;
mod edge;
mod owner;
mod quad;
mod texture;
mod uv;
mod vertex;

pub use color::PackedColor;
pub use edge::Edge;
pub use owner::{BlockPos, OwnerKey};
pub use quad::{Quad, RenderLayer};
pub use texture::{SpriteRef, TextureId};
pub use uv::UvBounds;
pub use vertex::Vertex;

pub use voxport_geom::{Vec2, Vec3};
