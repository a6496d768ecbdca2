//! Camera, Transform and Frustum Tests
//!
//! Tests for:
//! - Transform TRS operations, Euler round-trip and look_at
//! - apply_local_matrix decomposition
//! - Projection depth mapping and aspect updates
//! - RenderCamera extraction
//! - Frustum-sphere intersection
//! - Viewport pixel rectangles

use glam::{Affine3A, Mat4, Quat, Vec3, Vec4};

use lantern::renderer::{PixelRect, Viewport};
use lantern::scene::{Attenuation, Camera, Frustum, Projection, Transform};
use lantern::ViewportType;

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let t = Transform::new();
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);
    assert_eq!(t.local_matrix(), Affine3A::IDENTITY);
}

#[test]
fn transform_local_matrix_reflects_trs() {
    let mut t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
    t.scale = Vec3::splat(2.0);
    t.translate(Vec3::X);

    let p = t.local_matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
    assert!(vec3_approx(p, Vec3::new(4.0, 2.0, 3.0)));
}

#[test]
fn transform_euler_roundtrip() {
    let mut t = Transform::new();
    t.set_rotation_euler(0.3, -0.2, 0.1);
    assert!(vec3_approx(t.rotation_euler(), Vec3::new(0.3, -0.2, 0.1)));
}

#[test]
fn transform_look_at_collinear_up_noop() {
    let mut t = Transform::from_position(Vec3::ZERO);
    t.set_rotation_euler(0.0, 0.5, 0.0);
    let before = t.rotation;

    t.look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::Y);
    assert_eq!(t.rotation, before);
}

#[test]
fn transform_apply_local_matrix_decomposition() {
    let matrix = Affine3A::from_scale_rotation_translation(
        Vec3::new(1.0, 2.0, 3.0),
        Quat::from_rotation_y(0.7),
        Vec3::new(-4.0, 5.0, 6.0),
    );
    let mut t = Transform::new();
    t.apply_local_matrix(matrix);

    assert!(vec3_approx(t.scale, Vec3::new(1.0, 2.0, 3.0)));
    assert!(vec3_approx(t.position, Vec3::new(-4.0, 5.0, 6.0)));
    assert!(t.rotation.angle_between(Quat::from_rotation_y(0.7)) < 1e-4);
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn perspective_maps_near_to_zero_and_far_to_one() {
    let camera = Camera::new_perspective(60.0, 1.0, 0.5, 100.0);
    let proj = camera.projection_matrix();

    let near = proj * Vec4::new(0.0, 0.0, -0.5, 1.0);
    let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
    assert!(approx_eq(near.z / near.w, 0.0));
    assert!((far.z / far.w - 1.0).abs() < 1e-4);
}

#[test]
fn set_aspect_only_touches_perspective() {
    let mut camera = Camera::default();
    camera.set_aspect(2.0);
    assert!(matches!(
        camera.projection,
        Projection::Perspective { aspect, .. } if approx_eq(aspect, 2.0)
    ));

    camera.set_orthographic(-1.0, 1.0, -1.0, 1.0, 0.1, 10.0);
    camera.set_aspect(3.0);
    assert!(matches!(camera.projection, Projection::Orthographic { .. }));
}

#[test]
fn view_matrix_is_inverse_of_world() {
    let world = Affine3A::from_rotation_translation(
        Quat::from_rotation_x(0.4),
        Vec3::new(2.0, -1.0, 7.0),
    );
    let resolved = Camera::default().extract(&world);

    assert!(vec3_approx(resolved.position, Vec3::new(2.0, -1.0, 7.0)));
    let product = Mat4::from(world) * resolved.view;
    assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    assert!(
        resolved
            .view_projection
            .abs_diff_eq(resolved.projection * resolved.view, 1e-5)
    );
}

// ============================================================================
// Frustum
// ============================================================================

fn make_test_frustum() -> Frustum {
    let proj = Mat4::perspective_rh(60.0_f32.to_radians(), 1.0, 0.1, 50.0);
    Frustum::from_matrix(proj)
}

#[test]
fn frustum_sphere_inside() {
    assert!(make_test_frustum().intersects_sphere(Vec3::new(0.0, 0.0, -5.0), 1.0));
}

#[test]
fn frustum_sphere_outside_left() {
    assert!(!make_test_frustum().intersects_sphere(Vec3::new(-1000.0, 0.0, -5.0), 1.0));
}

#[test]
fn frustum_sphere_beyond_far_plane() {
    let frustum = make_test_frustum();
    assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -60.0)));
    assert!(frustum.intersects_sphere(Vec3::new(0.0, 0.0, -52.0), 5.0));
}

#[test]
fn frustum_follows_camera_world_transform() {
    let mut transform = Transform::from_position(Vec3::new(0.0, 0.0, 10.0));
    transform.look_at(Vec3::new(10.0, 0.0, 10.0), Vec3::Y);
    let resolved = Camera::default().extract(&transform.local_matrix());

    assert!(resolved.frustum.contains_point(Vec3::new(15.0, 0.0, 10.0)));
    assert!(!resolved.frustum.contains_point(Vec3::new(0.0, 0.0, 0.0)));
}

// ============================================================================
// Lights & viewports
// ============================================================================

#[test]
fn attenuation_is_one_at_the_source() {
    let attenuation = Attenuation {
        constant: 1.0,
        linear: 0.5,
        quadratic: 0.25,
    };
    assert!(approx_eq(attenuation.factor(0.0), 1.0));
    assert!(attenuation.factor(4.0) < attenuation.factor(1.0));
}

#[test]
fn viewport_pixel_rects() {
    let full = Viewport::from_type(ViewportType::Full);
    assert_eq!(
        full.pixel_rect(800, 600),
        PixelRect {
            x: 0,
            y: 0,
            width: 800,
            height: 600
        }
    );

    let pillarbox = Viewport::from_type(ViewportType::BlankLeftRight);
    let rect = pillarbox.pixel_rect(800, 600);
    assert_eq!((rect.x, rect.width), (100, 600));
    assert!(approx_eq(pillarbox.aspect(800, 600), 1.0));
}
