use std::cmp::Ordering;

use hashbrown::HashMap;
use voxport_geom::{Vec2, Vec3, float_eq, quantized_bits};
use voxport_quad::{Edge, Quad, RenderLayer, TextureId};

use crate::constants::{NORMAL_KEY_SCALE, RIGHT_ANGLE_COS, SAME_DIRECTION_COS};

/// Vertex indices of a quad's texture corners.
#[derive(Clone, Copy, Debug)]
struct UvCorners {
    origin: usize, // (u_min, v_min)
    u_end: usize,  // (u_max, v_min)
    v_end: usize,  // (u_min, v_max)
    far: usize,    // (u_max, v_max)
}

fn uv_corners(q: &Quad) -> Option<UvCorners> {
    let b = q.uv_bounds()?;
    let find = |u: f32, v: f32| (0..4).find(|&i| q.uv(i) == Some(Vec2::new(u, v)));
    Some(UvCorners {
        origin: find(b.u_min, b.v_min)?,
        u_end: find(b.u_max, b.v_min)?,
        v_end: find(b.u_min, b.v_max)?,
        far: find(b.u_max, b.v_max)?,
    })
}

/// Opposite sides equally long and adjacent sides perpendicular.
pub fn is_rectangle(q: &Quad) -> bool {
    let [p0, p1, p2, p3] = [0, 1, 2, 3].map(|i| q.position(i));
    let a = p1 - p0;
    let b = p3 - p0;
    let (la, lb) = (a.length(), b.length());
    if la == 0.0 || lb == 0.0 {
        return false;
    }
    float_eq(p0.distance_sq(p3), p1.distance_sq(p2))
        && float_eq(p0.distance_sq(p1), p2.distance_sq(p3))
        && (a.dot(b) / (la * lb)).abs() <= RIGHT_ANGLE_COS
}

/// Eligible for merging: full 0..1 UVs on both axes, axis-aligned texture corners, rectangular.
pub fn can_tile(q: &Quad) -> bool {
    matches!(q.uv_bounds(), Some(b) if b.is_unit()) && uv_corners(q).is_some() && is_rectangle(q)
}

/// Quads only merge within one bucket.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SubsetKey {
    layer: RenderLayer,
    texture: TextureId,
    color: u32,
    light: u8,
    normal: [i32; 3],
    uvs: [[u32; 2]; 4],
}

impl SubsetKey {
    fn of(q: &Quad) -> Self {
        let n = q.normal();
        let grid = |c: f32| (c * NORMAL_KEY_SCALE).round() as i32;
        let uv_bits = |i: usize| {
            let uv = q.uv(i).unwrap_or_default();
            [quantized_bits(uv.x), quantized_bits(uv.y)]
        };
        Self {
            layer: q.layer,
            texture: q.texture().clone(),
            color: q.color().0,
            light: q.light,
            normal: [grid(n.x), grid(n.y), grid(n.z)],
            uvs: [uv_bits(0), uv_bits(1), uv_bits(2), uv_bits(3)],
        }
    }
}

fn geometric_order(a: &Quad, b: &Quad) -> Ordering {
    let (pa, pb) = (a.position(0), b.position(0));
    let height = |q: &Quad| q.position(0).distance_sq(q.position(1));
    let width = |q: &Quad| q.position(0).distance_sq(q.position(3));
    pa.x.total_cmp(&pb.x)
        .then(pa.y.total_cmp(&pb.y))
        .then(pa.z.total_cmp(&pb.z))
        .then(height(b).total_cmp(&height(a)))
        .then(width(b).total_cmp(&width(a)))
}

/// The four boundary edges, keyed by texture side.
fn side_edges(q: &Quad, c: &UvCorners) -> [Edge; 4] {
    let p = |i: usize| q.position(i);
    [
        Edge::new(p(c.origin), p(c.u_end)),
        Edge::new(p(c.v_end), p(c.far)),
        Edge::new(p(c.origin), p(c.v_end)),
        Edge::new(p(c.u_end), p(c.far)),
    ]
}

fn edges_of(q: &Quad) -> Vec<Edge> {
    uv_corners(q).map(|c| side_edges(q, &c).to_vec()).unwrap_or_default()
}

fn same_direction(a: Vec3, b: Vec3) -> bool {
    a.normalized().dot(b.normalized()) >= SAME_DIRECTION_COS
}

/// `q2` continues `q1` across `edge`: textures run the same way and the quads lie on
/// opposite sides of the edge.
fn mergeable(q1: &Quad, q2: &Quad, edge: &Edge) -> bool {
    let (Some(c1), Some(c2)) = (uv_corners(q1), uv_corners(q2)) else {
        return false;
    };
    let axis = |q: &Quad, c: &UvCorners| {
        (
            q.position(c.u_end) - q.position(c.origin),
            q.position(c.v_end) - q.position(c.origin),
        )
    };
    let (u1, v1) = axis(q1, &c1);
    let (u2, v2) = axis(q2, &c2);
    if !same_direction(u1, u2) || !same_direction(v1, v2) {
        return false;
    }
    let on_edge: Vec<Vec3> = (0..4)
        .map(|i| q1.position(i))
        .filter(|p| edge.touches(*p))
        .collect();
    let &[a, b] = on_edge.as_slice() else {
        return false;
    };
    let across = q1.normal().cross(b - a);
    let side = |q: &Quad| (q.centroid() - a).dot(across);
    side(q1) * side(q2) < 0.0
}

/// Extends `q1` over `q2`, which shares `edge` with it.
///
/// Vertices of `q1` on the edge take the position of the same-index vertex of `q2`.
/// Texture coordinates keep `q1`'s origin corner and grow by `q2`'s span along the axis
/// that crosses the edge, so the texture keeps tiling at its original scale.
fn merge_into(q1: &mut Quad, q2: &Quad, edge: &Edge) {
    let (Some(c), Some(b2)) = (uv_corners(q1), q2.uv_bounds()) else {
        return;
    };
    let origin_pos = q1.position(c.origin);
    let v_end_pos = q1.position(c.v_end);
    // The edge runs along V when it is one of the two u-constant sides.
    let along_v = (edge.touches(origin_pos) && edge.touches(v_end_pos))
        || (edge.touches(q1.position(c.u_end)) && edge.touches(q1.position(c.far)));

    for i in 0..4 {
        if edge.touches(q1.position(i)) {
            q1.set_position(i, q2.position(i));
        }
    }

    let (grow, grown) = if along_v {
        (Vec2::new(b2.width().abs(), 0.0), [c.u_end, c.far])
    } else {
        (Vec2::new(0.0, b2.height().abs()), [c.v_end, c.far])
    };
    for i in grown {
        if let Some(uv) = q1.uv(i) {
            q1.set_uv(i, uv + grow);
        }
    }
}

fn unindex(index: &mut HashMap<Edge, Vec<usize>>, slot: usize, edges: &[Edge]) {
    for e in edges {
        if let Some(list) = index.get_mut(e) {
            list.retain(|&s| s != slot);
            if list.is_empty() {
                index.remove(e);
            }
        }
    }
}

fn merge_subset(mut quads: Vec<Quad>) -> (Vec<Quad>, usize) {
    quads.sort_by(geometric_order);
    let mut slots: Vec<Option<Quad>> = quads.into_iter().map(Some).collect();
    let mut index: HashMap<Edge, Vec<usize>> = HashMap::new();
    for (i, q) in slots.iter().enumerate() {
        if let Some(q) = q {
            for e in edges_of(q) {
                index.entry(e).or_default().push(i);
            }
        }
    }

    let mut merges = 0usize;
    loop {
        let mut touched = vec![false; slots.len()];
        let mut merged_any = false;
        for i in 0..slots.len() {
            if touched[i] {
                continue;
            }
            let found = {
                let Some(q1) = slots[i].as_ref() else {
                    continue;
                };
                edges_of(q1).into_iter().find_map(|e| {
                    let j = index.get(&e)?.iter().copied().find(|&j| {
                        j != i && slots[j].as_ref().is_some_and(|q2| mergeable(q1, q2, &e))
                    })?;
                    Some((j, e))
                })
            };
            let Some((j, edge)) = found else {
                continue;
            };
            let Some(q2) = slots[j].take() else {
                continue;
            };
            unindex(&mut index, j, &edges_of(&q2));
            if let Some(q1) = slots[i].as_mut() {
                unindex(&mut index, i, &edges_of(q1));
                merge_into(q1, &q2, &edge);
            }
            touched[i] = true;
            merged_any = true;
            merges += 1;
        }
        for (i, t) in touched.iter().enumerate() {
            if *t {
                if let Some(q) = &slots[i] {
                    for e in edges_of(q) {
                        index.entry(e).or_default().push(i);
                    }
                }
            }
        }
        if !merged_any {
            break;
        }
    }
    (slots.into_iter().flatten().collect(), merges)
}

/// Fuses adjacent coplanar tileable quads; everything else passes through unchanged.
///
/// Output order: non-eligible quads in input order, then each bucket (in order of first
/// appearance) sorted geometrically.
pub fn optimize(quads: Vec<Quad>) -> Vec<Quad> {
    let input = quads.len();
    let mut out = Vec::with_capacity(input);
    let mut buckets: Vec<Vec<Quad>> = Vec::new();
    let mut bucket_of: HashMap<SubsetKey, usize> = HashMap::new();
    for q in quads {
        if !can_tile(&q) {
            out.push(q);
            continue;
        }
        let slot = *bucket_of.entry(SubsetKey::of(&q)).or_insert_with(|| {
            buckets.push(Vec::new());
            buckets.len() - 1
        });
        buckets[slot].push(q);
    }
    let mut merges = 0usize;
    for bucket in buckets {
        let (merged, n) = merge_subset(bucket);
        merges += n;
        out.extend(merged);
    }
    log::debug!("optimized {} quad(s) into {} ({} merge(s))", input, out.len(), merges);
    out
}
