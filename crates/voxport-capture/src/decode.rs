use thiserror::Error;
use voxport_geom::{Vec2, Vec3};
use voxport_quad::{OwnerKey, PackedColor, Quad, RenderLayer, TextureId, Vertex};

use crate::layout::{AttributeRole, ElementType, Topology, VertexAttribute, VertexLayout};

/// Light-map shorts run 0..=240 in the engine's packing.
const LIGHTMAP_MAX: f32 = 240.0;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer underrun at byte {offset}: needed {needed}, {available} available")]
    Underrun {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// Identity stamped onto every quad decoded from one span.
#[derive(Clone, Debug)]
pub struct QuadStamp {
    pub layer: RenderLayer,
    pub resource: TextureId,
    pub owner: OwnerKey,
    pub light: u8,
}

/// What happened while decoding; recoverable problems land here instead of in an `Err`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub quads: usize,
    /// Quads discarded because a vertex carried a NaN texture coordinate.
    pub malformed_quads: usize,
    /// Fields skipped for an unsupported encoding.
    pub skipped_fields: usize,
    /// Vertices of a trailing quad that never completed.
    pub dropped_vertices: usize,
    /// Buffer rejected by the format gate before decoding.
    pub rejected: bool,
    pub underrun: Option<DecodeError>,
}

impl DecodeReport {
    pub fn merge(&mut self, other: DecodeReport) {
        self.quads += other.quads;
        self.malformed_quads += other.malformed_quads;
        self.skipped_fields += other.skipped_fields;
        self.dropped_vertices += other.dropped_vertices;
        self.rejected |= other.rejected;
        if self.underrun.is_none() {
            self.underrun = other.underrun;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Decoded {
    pub quads: Vec<Quad>,
    pub report: DecodeReport,
}

/// A contiguous run of vertices drawn for one owner.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnerSpan {
    pub owner: OwnerKey,
    pub first_vertex: usize,
    pub vertex_count: usize,
    pub light: u8,
}

/// One recorded draw: bytes plus everything needed to interpret them.
#[derive(Clone, Debug)]
pub struct CapturedBuffer {
    pub layer: RenderLayer,
    pub resource: TextureId,
    pub layout: VertexLayout,
    pub topology: Topology,
    pub bytes: Vec<u8>,
    pub spans: Vec<OwnerSpan>,
}

impl CapturedBuffer {
    /// Passes the format gate: quad topology and a capturable layout.
    pub fn is_decodable(&self) -> bool {
        self.topology == Topology::Quads && self.layout.is_capturable()
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.bytes.len().saturating_sub(self.pos);
        if n > available {
            return Err(DecodeError::Underrun {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let field = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(field)
    }

    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }
}

#[inline]
fn le_f32(b: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

#[inline]
fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

enum VertexRead {
    Accepted(Vertex),
    /// NaN texture coordinate; the cursor still sits at the next vertex.
    Malformed,
}

fn read_vertex(
    cur: &mut Cursor<'_>,
    layout: &VertexLayout,
    report: &mut DecodeReport,
) -> Result<VertexRead, DecodeError> {
    let mut v = Vertex::default();
    let mut malformed = false;
    for attr in layout.attributes() {
        let field = cur.take(attr.byte_size)?;
        if !read_field(attr, field, &mut v, &mut malformed) {
            report.skipped_fields += 1;
            log::debug!(
                "skipping {:?} field encoded as {:?} ({} bytes)",
                attr.role,
                attr.element,
                attr.byte_size
            );
        }
    }
    Ok(if malformed {
        VertexRead::Malformed
    } else {
        VertexRead::Accepted(v)
    })
}

/// Interprets one field into `v`. Returns `false` when the encoding is unsupported.
fn read_field(attr: &VertexAttribute, field: &[u8], v: &mut Vertex, malformed: &mut bool) -> bool {
    match (attr.role, attr.element) {
        (AttributeRole::Position, ElementType::F32) if field.len() >= 12 => {
            v.position = Vec3::new(le_f32(field, 0), le_f32(field, 4), le_f32(field, 8));
            true
        }
        (AttributeRole::Color, ElementType::U8) if field.len() == 4 => {
            v.color = PackedColor(u32::from_le_bytes([field[0], field[1], field[2], field[3]]));
            true
        }
        (AttributeRole::UvPrimary, ElementType::F32) if field.len() >= 8 => {
            let uv = Vec2::new(le_f32(field, 0), le_f32(field, 4));
            if uv.is_nan() {
                *malformed = true;
            } else {
                v.uv = Some(uv);
            }
            true
        }
        (AttributeRole::UvSecondary, ElementType::I16 | ElementType::U16) if field.len() >= 4 => {
            let (s, t) = if attr.element == ElementType::I16 {
                (le_u16(field, 0) as i16 as f32, le_u16(field, 2) as i16 as f32)
            } else {
                (le_u16(field, 0) as f32, le_u16(field, 2) as f32)
            };
            v.light_uv = Some(Vec2::new(s / LIGHTMAP_MAX, t / LIGHTMAP_MAX));
            true
        }
        (AttributeRole::UvSecondary, ElementType::F32) if field.len() >= 8 => {
            v.light_uv = Some(Vec2::new(le_f32(field, 0), le_f32(field, 4)));
            true
        }
        (AttributeRole::Other, _) => true,
        _ => false,
    }
}

/// Decodes `vertex_count` vertices starting at byte `start`, appending complete quads to `out`.
///
/// Every fourth accepted vertex closes a quad. A NaN texture coordinate throws away the
/// quad being built and resumes at the next four-vertex boundary. A trailing partial quad
/// is dropped. Running out of bytes stops decoding; quads already appended are kept.
pub fn decode_quads_into(
    bytes: &[u8],
    layout: &VertexLayout,
    start: usize,
    vertex_count: usize,
    stamp: &QuadStamp,
    out: &mut Vec<Quad>,
) -> DecodeReport {
    let mut report = DecodeReport::default();
    let stride = layout.stride();
    let mut cur = Cursor::new(bytes, start);
    let mut pending: Vec<Vertex> = Vec::with_capacity(4);
    let mut index = 0usize;

    while index < vertex_count {
        match read_vertex(&mut cur, layout, &mut report) {
            Ok(VertexRead::Accepted(v)) => {
                pending.push(v);
                index += 1;
                if pending.len() == 4 {
                    let vertices = [pending[0], pending[1], pending[2], pending[3]];
                    pending.clear();
                    out.push(
                        Quad::new(vertices, stamp.layer, stamp.resource.clone(), stamp.owner)
                            .with_light(stamp.light),
                    );
                    report.quads += 1;
                }
            }
            Ok(VertexRead::Malformed) => {
                report.malformed_quads += 1;
                pending.clear();
                let rest_of_quad = 3 - index % 4;
                let skip = rest_of_quad.min(vertex_count - index - 1);
                index += 1 + skip;
                if let Err(e) = cur.skip(skip * stride) {
                    report.underrun = Some(e);
                    break;
                }
            }
            Err(e) => {
                report.underrun = Some(e);
                break;
            }
        }
    }

    if report.underrun.is_none() {
        report.dropped_vertices = pending.len();
    }
    if report.malformed_quads > 0 {
        log::warn!(
            "discarded {} quad(s) with NaN texture coordinates from {}",
            report.malformed_quads,
            stamp.resource
        );
    }
    if let Some(e) = &report.underrun {
        log::warn!("vertex buffer for {} truncated: {}", stamp.resource, e);
    }
    report
}

/// Allocating convenience wrapper around [`decode_quads_into`].
pub fn decode_quads(
    bytes: &[u8],
    layout: &VertexLayout,
    start: usize,
    vertex_count: usize,
    stamp: &QuadStamp,
) -> Decoded {
    let mut quads = Vec::with_capacity(vertex_count / 4);
    let report = decode_quads_into(bytes, layout, start, vertex_count, stamp, &mut quads);
    Decoded { quads, report }
}

/// Decodes every owner span of a captured buffer, gated on topology and layout.
///
/// A rejected buffer yields no quads and a report with `rejected` set; it is not an error.
/// An underrun in any span ends the whole buffer.
pub fn decode_buffer(buf: &CapturedBuffer, out: &mut Vec<Quad>) -> DecodeReport {
    let mut report = DecodeReport::default();
    if !buf.is_decodable() {
        log::debug!(
            "skipping {:?} buffer for {} with unsupported format",
            buf.topology,
            buf.resource
        );
        report.rejected = true;
        return report;
    }
    let stride = buf.layout.stride();
    for span in &buf.spans {
        let stamp = QuadStamp {
            layer: buf.layer,
            resource: buf.resource.clone(),
            owner: span.owner,
            light: span.light,
        };
        let r = decode_quads_into(
            &buf.bytes,
            &buf.layout,
            span.first_vertex * stride,
            span.vertex_count,
            &stamp,
            out,
        );
        let stop = r.underrun.is_some();
        report.merge(r);
        if stop {
            break;
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_reports_underrun() {
        let bytes = [0u8; 6];
        let mut cur = Cursor::new(&bytes, 4);
        assert_eq!(
            cur.take(4),
            Err(DecodeError::Underrun {
                offset: 4,
                needed: 4,
                available: 2
            })
        );
        assert!(cur.take(2).is_ok());
        assert!(cur.skip(1).is_err());
    }

    #[test]
    fn unsupported_position_keeps_default() {
        let attr = VertexAttribute::new(AttributeRole::Position, ElementType::I16, 3);
        let mut v = Vertex::default();
        let mut malformed = false;
        assert!(!read_field(&attr, &[1, 0, 2, 0, 3, 0], &mut v, &mut malformed));
        assert_eq!(v.position, Vec3::ZERO);
        assert!(!malformed);
    }
}
