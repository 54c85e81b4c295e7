use std::cmp::Ordering;
use std::collections::BTreeSet;

use voxport_geom::{Vec2, Vec3};
use voxport_quad::{Quad, RenderLayer};

use crate::constants::{DEFAULT_MAX_PASSES, DEFAULT_OVERLAP_DISTANCE, OPAQUE, PARALLEL_DOT};
use crate::dedup::dedup_quads;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlapSettings {
    /// Depth band treated as coplanar, minimum 2D interpenetration, and the nudge step.
    pub distance: f32,
    /// Fixpoint passes before giving up.
    pub max_passes: usize,
}

impl Default for OverlapSettings {
    fn default() -> Self {
        Self {
            distance: DEFAULT_OVERLAP_DISTANCE,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Sort key: render-layer priority ascending, then opacity descending so the more
/// transparent of two coplanar faces is drawn, and nudged, last.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawOrder {
    pub priority: u32,
    /// Average alpha, 0..=255.
    pub opacity: f32,
}

impl DrawOrder {
    /// Ordering without pixel data: every quad of a layer ties.
    pub fn layer_only(layer: RenderLayer) -> Self {
        Self {
            priority: layer.priority(),
            opacity: OPAQUE,
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.opacity.total_cmp(&self.opacity))
    }
}

/// Stable sort by [`DrawOrder`]; `key` is evaluated once per quad.
pub fn sort_for_drawing(quads: Vec<Quad>, mut key: impl FnMut(&Quad) -> DrawOrder) -> Vec<Quad> {
    let mut keyed: Vec<(DrawOrder, Quad)> = quads.into_iter().map(|q| (key(&q), q)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, q)| q).collect()
}

struct Projected {
    min: Vec2,
    max: Vec2,
    depth: f32,
}

fn project(q: &Quad, t: Vec3, b: Vec3, n: Vec3) -> Projected {
    let mut min = Vec2::new(f32::INFINITY, f32::INFINITY);
    let mut max = Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    let mut depth = 0.0;
    for v in q.vertices() {
        let p = v.position;
        let (x, y) = (p.dot(t), p.dot(b));
        min = Vec2::new(min.x.min(x), min.y.min(y));
        max = Vec2::new(max.x.max(x), max.y.max(y));
        depth += p.dot(n);
    }
    Projected {
        min,
        max,
        depth: depth / 4.0,
    }
}

/// Signed depth of `b` above `a` along `a`'s normal when the two z-fight.
///
/// Overlapping means parallel (or antiparallel) normals, a depth gap strictly inside
/// `tol`, and extents interpenetrating by more than `tol` on both in-plane axes.
pub fn overlap_depth(a: &Quad, b: &Quad, tol: f32) -> Option<f32> {
    let na = a.normal();
    let nb = b.normal();
    if na.length_sq() == 0.0 || nb.length_sq() == 0.0 {
        return None;
    }
    if na.dot(nb).abs() < PARALLEL_DOT {
        return None;
    }
    let (t, bt) = na.plane_basis();
    let pa = project(a, t, bt, na);
    let pb = project(b, t, bt, na);
    let gap = pb.depth - pa.depth;
    if gap.abs() >= tol {
        return None;
    }
    let across = |amin: f32, amax: f32, bmin: f32, bmax: f32| {
        amax - bmin > tol && bmax - amin > tol
    };
    let overlaps = across(pa.min.x, pa.max.x, pb.min.x, pb.max.x)
        && across(pa.min.y, pa.max.y, pb.min.y, pb.max.y);
    overlaps.then_some(gap)
}

#[derive(Clone, Debug)]
pub struct Separated {
    pub quads: Vec<Quad>,
    pub passes: usize,
    /// Individual nudges applied.
    pub nudges: usize,
    /// False when the pass cap stopped the fixpoint early.
    pub converged: bool,
}

/// Pushes later quads off earlier ones until nothing z-fights.
///
/// `quads` must already be in draw order. Each overlapping later quad moves by
/// `settings.distance` along the earlier quad's normal. The first pass compares every
/// pair; later passes only revisit quads that moved, against everything else.
pub fn separate_overlaps(mut quads: Vec<Quad>, settings: &OverlapSettings) -> Separated {
    let tol = settings.distance;
    let n = quads.len();
    let mut to_check: BTreeSet<usize> = (0..n).collect();
    let mut passes = 0usize;
    let mut nudges = 0usize;
    let mut converged = true;

    while !to_check.is_empty() {
        if passes == settings.max_passes {
            log::warn!(
                "overlap separation stopped after {} passes with {} quad(s) still moving",
                passes,
                to_check.len()
            );
            converged = false;
            break;
        }
        let first_pass = passes == 0;
        passes += 1;
        let mut moved = BTreeSet::new();
        for &i in &to_check {
            let others = if first_pass { i + 1..n } else { 0..n };
            for k in others {
                if k == i {
                    continue;
                }
                let (lo, hi) = if i < k { (i, k) } else { (k, i) };
                if overlap_depth(&quads[lo], &quads[hi], tol).is_some() {
                    let push = quads[lo].normal() * tol;
                    quads[hi].translate(push);
                    moved.insert(hi);
                    nudges += 1;
                }
            }
        }
        to_check = moved;
    }

    if nudges > 0 {
        log::debug!("separated overlaps: {} nudge(s) over {} pass(es)", nudges, passes);
    }
    Separated {
        quads,
        passes,
        nudges,
        converged,
    }
}

/// Full reconciliation of one owner bucket: dedup, draw-order sort, separation.
pub fn reconcile_owner(
    quads: Vec<Quad>,
    key: impl FnMut(&Quad) -> DrawOrder,
    settings: &OverlapSettings,
) -> Separated {
    let quads = dedup_quads(quads);
    let quads = sort_for_drawing(quads, key);
    separate_overlaps(quads, settings)
}
