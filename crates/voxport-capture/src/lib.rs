//! Turns captured vertex bytes into quads and maps their UVs back to logical textures.
#![forbid(unsafe_code)]

mod atlas;
mod decode;
mod image;
mod layout;
mod texture;

pub use atlas::AtlasTable;
pub use decode::{
    CapturedBuffer, DecodeError, DecodeReport, Decoded, OwnerSpan, QuadStamp, decode_buffer,
    decode_quads, decode_quads_into,
};
pub use image::PixelImage;
pub use layout::{AttributeRole, ElementType, Topology, VertexAttribute, VertexLayout};
pub use texture::{
    CONTAINMENT_EPSILON, DEFAULT_SNAP_ERROR, SpriteLookup, find_containing_sprite, flip_v,
    resolve_quad, resolve_textures, snap_unit,
};
