use voxport_capture::{CapturedBuffer, OwnerSpan, Topology, VertexLayout};
use voxport_geom::Vec3;
use voxport_quad::{OwnerKey, PackedColor, RenderLayer, TextureId, UvBounds};

use crate::face::{FACE_UVS, Face};

/// Full-bright sky channel of the light map.
const SKY_LIGHT: i16 = 240;

/// Appends quad-list vertices in the engine's interleaved little-endian layouts.
pub struct BufferWriter {
    layer: RenderLayer,
    resource: TextureId,
    layout: VertexLayout,
    entity: bool,
    bytes: Vec<u8>,
    spans: Vec<OwnerSpan>,
    vertices: usize,
}

impl BufferWriter {
    /// Writer for [`VertexLayout::block`].
    pub fn blocks(layer: RenderLayer, resource: TextureId) -> Self {
        Self::with_layout(layer, resource, VertexLayout::block(), false)
    }

    /// Writer for [`VertexLayout::entity`].
    pub fn entities(resource: TextureId) -> Self {
        Self::with_layout(RenderLayer::Cutout, resource, VertexLayout::entity(), true)
    }

    fn with_layout(
        layer: RenderLayer,
        resource: TextureId,
        layout: VertexLayout,
        entity: bool,
    ) -> Self {
        Self {
            layer,
            resource,
            layout,
            entity,
            bytes: Vec::new(),
            spans: Vec::new(),
            vertices: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices == 0
    }

    /// Opens a span for `owner`; following faces belong to it until the next call.
    pub fn begin_owner(&mut self, owner: OwnerKey, light: u8) {
        self.spans.push(OwnerSpan {
            owner,
            first_vertex: self.vertices,
            vertex_count: 0,
            light,
        });
    }

    /// Writes one face of the box `min..max`, texturing it with `sprite` (atlas space).
    pub fn face(
        &mut self,
        face: Face,
        min: Vec3,
        max: Vec3,
        sprite: &UvBounds,
        color: PackedColor,
    ) {
        let n = face.normal();
        let pack = |c: f32| (c * 127.0) as i8 as u8;
        let light = self.spans.last().map_or(0, |s| s.light);
        for (p, (u, v)) in face.corners(min, max).into_iter().zip(FACE_UVS) {
            self.put_f32(&[p.x, p.y, p.z]);
            self.bytes.extend_from_slice(&color.to_rgba());
            self.put_f32(&[
                sprite.u_min + u * sprite.width(),
                sprite.v_min + v * sprite.height(),
            ]);
            if self.entity {
                // Overlay coordinate: no hurt flash.
                self.put_i16(&[0, 10]);
            }
            self.put_i16(&[i16::from(light) * 16, SKY_LIGHT]);
            self.bytes.extend_from_slice(&[pack(n.x), pack(n.y), pack(n.z), 0]);
        }
        self.vertices += 4;
        if let Some(span) = self.spans.last_mut() {
            span.vertex_count += 4;
        }
    }

    fn put_f32(&mut self, vals: &[f32]) {
        for v in vals {
            self.bytes.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn put_i16(&mut self, vals: &[i16]) {
        for v in vals {
            self.bytes.extend_from_slice(&v.to_le_bytes());
        }
    }

    pub fn finish(mut self) -> CapturedBuffer {
        self.spans.retain(|s| s.vertex_count > 0);
        debug_assert_eq!(self.bytes.len(), self.vertices * self.layout.stride());
        CapturedBuffer {
            layer: self.layer,
            resource: self.resource,
            layout: self.layout,
            topology: Topology::Quads,
            bytes: self.bytes,
            spans: self.spans,
        }
    }
}
