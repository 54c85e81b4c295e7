#![allow(dead_code)]

use voxport_quad::{BlockPos, OwnerKey, Quad, RenderLayer, TextureId, Vec3, Vertex};

/// Unit square facing +z with its lower-left corner at `(x, y, z)`, texture origin top-left.
pub fn square(x: f32, y: f32, z: f32, texture: &str) -> Quad {
    let corners = [
        Vec3::new(x, y, z),
        Vec3::new(x + 1.0, y, z),
        Vec3::new(x + 1.0, y + 1.0, z),
        Vec3::new(x, y + 1.0, z),
    ];
    let uvs = [(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)];
    let mut vs = [Vertex::default(); 4];
    for i in 0..4 {
        vs[i] = Vertex::new(corners[i]).with_uv(uvs[i].0, uvs[i].1);
    }
    Quad::new(
        vs,
        RenderLayer::Solid,
        TextureId::from(texture),
        OwnerKey::Block(BlockPos::new(0, 0, 0)),
    )
}

/// Same square with its vertex order rotated by `r`.
pub fn rotated(q: &Quad, r: usize) -> Quad {
    let vs = q.vertices();
    let turned = [vs[r % 4], vs[(r + 1) % 4], vs[(r + 2) % 4], vs[(r + 3) % 4]];
    Quad::new(turned, q.layer, q.resource.clone(), q.owner).with_light(q.light)
}

/// Order-free fingerprint for multiset comparisons.
pub fn fingerprint(q: &Quad) -> (String, Vec<[u32; 5]>) {
    let mut vs: Vec<[u32; 5]> = q
        .vertices()
        .iter()
        .map(|v| {
            let uv = v.uv.unwrap_or_default();
            [
                v.position.x.to_bits(),
                v.position.y.to_bits(),
                v.position.z.to_bits(),
                uv.x.to_bits(),
                uv.y.to_bits(),
            ]
        })
        .collect();
    vs.sort_unstable();
    (q.texture().to_string(), vs)
}

pub fn fingerprints(quads: &[Quad]) -> Vec<(String, Vec<[u32; 5]>)> {
    let mut f: Vec<_> = quads.iter().map(fingerprint).collect();
    f.sort();
    f
}
