use voxport_quad::{Quad, Vertex};

fn covers(a: &[Vertex; 4], b: &[Vertex; 4]) -> bool {
    a.iter().all(|va| b.iter().any(|vb| va.same_surface(vb)))
}

/// Same draw identity and the same set of vertices (position, UV, color), in any order.
pub fn quads_equivalent(a: &Quad, b: &Quad) -> bool {
    a.layer == b.layer
        && a.resource == b.resource
        && a.texture() == b.texture()
        && a.light == b.light
        && covers(a.vertices(), b.vertices())
        && covers(b.vertices(), a.vertices())
}

/// Drops every quad equivalent to an earlier one. Quadratic; buckets hold one owner's faces.
pub fn dedup_quads(quads: Vec<Quad>) -> Vec<Quad> {
    let mut kept: Vec<Quad> = Vec::with_capacity(quads.len());
    for q in quads {
        if !kept.iter().any(|k| quads_equivalent(k, &q)) {
            kept.push(q);
        }
    }
    kept
}
