use voxport_geom::{Vec2, Vec3, float_eq, quantize};

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn vec3_approx_eq(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx_eq(a.x, b.x, eps) && approx_eq(a.y, b.y, eps) && approx_eq(a.z, b.z, eps)
}

#[test]
fn vec3_ops() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    let b = Vec3::new(-4.0, 5.0, -6.0);
    assert!(vec3_approx_eq(a + b, Vec3::new(-3.0, 7.0, -3.0), 1e-6));
    assert!(vec3_approx_eq(-a, Vec3::new(-1.0, -2.0, -3.0), 1e-6));
    assert!(approx_eq(a.distance_sq(b), 25.0 + 9.0 + 81.0, 1e-4));
    let mut v = a;
    v -= Vec3::new(1.0, 1.0, 1.0);
    assert!(vec3_approx_eq(v, Vec3::new(0.0, 1.0, 2.0), 1e-6));
}

#[test]
fn plane_basis_of_axes() {
    for n in [
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -1.0),
    ] {
        let (t, b) = n.plane_basis();
        assert!(approx_eq(t.dot(n), 0.0, 1e-6));
        assert!(approx_eq(b.dot(n), 0.0, 1e-6));
        assert!(approx_eq(t.dot(b), 0.0, 1e-6));
        assert!(vec3_approx_eq(t.cross(b), n, 1e-5));
    }
}

#[test]
fn vec2_sub_and_nan() {
    let d = Vec2::new(0.5, -1.0) - Vec2::new(1.0, 0.0);
    assert_eq!(d, Vec2::new(-0.5, -1.0));
    assert!(Vec2::new(f32::NAN, 0.0).is_nan());
    assert!(!Vec2::ZERO.is_nan());
}

#[test]
fn quantize_is_stable_near_integers() {
    let v = Vec3::new(0.1 + 1e-7, 16.0 - 1e-6, -3.0);
    assert_eq!(quantize(v.x), quantize(quantize(v.x)));
    assert!(float_eq(quantize(v.y), 16.0));
    assert_eq!(quantize(v.z), -3.0);
}
