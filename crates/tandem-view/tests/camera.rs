use cgmath::InnerSpace;
use tandem_geometry::{Point3, Vec3, assert_near};
use tandem_view::OrbitCamera;

#[test]
fn default_camera_sits_at_reference_distance() {
    let camera = OrbitCamera::default();
    assert_near!(camera.distance(), 15.0);
    assert!(camera.position().y > 0.0);
    let to_target = (camera.target() - camera.position()).normalize();
    assert_near!(camera.forward(), to_target);
}

#[test]
fn basis_is_orthonormal() {
    let camera = OrbitCamera::default();
    assert_near!(camera.right().dot(camera.up()), 0.0);
    assert_near!(camera.right().dot(camera.forward()), 0.0);
    assert_near!(camera.right().cross(camera.up()), -camera.forward());
    assert!(camera.up().y > 0.0);
}

#[test]
fn orbit_keeps_distance_and_target() {
    let mut camera = OrbitCamera::default();
    camera.orbit(0.4, -0.2);
    assert_near!(camera.distance(), 15.0);
    assert_near!(camera.target(), Point3::new(0.0, 0.0, 0.0));
    let to_target = (camera.target() - camera.position()).normalize();
    assert_near!(camera.forward(), to_target);
}

#[test]
fn orbit_refuses_to_pitch_over_the_pole() {
    let mut camera = OrbitCamera::new(Point3::new(0.0, 14.9, 1.0), Point3::new(0.0, 0.0, 0.0));
    let before = camera.position();
    camera.orbit(0.0, -1.0);
    camera.orbit(0.0, 1.0);
    let dir = (camera.position() - camera.target()).normalize();
    assert!(dir.y.abs() < 0.995 || camera.position() == before);
}

#[test]
fn zoom_moves_along_view_direction_and_clamps() {
    let mut camera = OrbitCamera::default();
    let forward = camera.forward();
    camera.zoom(50.0);
    assert!(camera.distance() < 15.0);
    assert_near!(camera.forward(), forward);
    camera.zoom(100_000.0);
    assert_near!(camera.distance(), 1.0);
}

#[test]
fn set_orientation_preserves_distance() {
    let mut camera = OrbitCamera::default();
    let turned = tandem_geometry::math::look_rotation(Vec3::new(-1.0, -0.2, 0.0), Vec3::unit_y());
    camera.set_orientation(turned);
    assert_near!(camera.distance(), 15.0);
    assert_near!(camera.forward(), Vec3::new(-1.0, -0.2, 0.0).normalize());
}
