use cgmath::{InnerSpace, MetricSpace, Rad, Rotation3};
use serde::Serialize;

use tandem_geometry::math::{look_rotation, world_up};
use tandem_geometry::{Point3, Quat, Vec3};

const MIN_DISTANCE: f64 = 1.0;
const MAX_DISTANCE: f64 = 1.0e4;
const ORBIT_POLE_LIMIT: f64 = 0.995;

/// Perspective camera orbiting a target point in a Y-up world.
///
/// `orientation` is camera-to-world: the camera looks down its local -Z.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OrbitCamera {
    position: Point3,
    target: Point3,
    orientation: Quat,
    fov_deg: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let yaw: f64 = 0.6;
        let pitch: f64 = 0.5;
        let distance: f64 = 15.0;
        let offset = Vec3::new(
            yaw.sin() * pitch.cos(),
            pitch.sin(),
            yaw.cos() * pitch.cos(),
        ) * distance;
        let target = Point3::new(0.0, 0.0, 0.0);
        Self::new(target + offset, target)
    }
}

impl OrbitCamera {
    pub fn new(position: Point3, target: Point3) -> Self {
        let mut camera = Self {
            position,
            target,
            orientation: Quat::new(1.0, 0.0, 0.0, 0.0),
            fov_deg: 50.0,
        };
        camera.look_at(target);
        camera
    }

    pub fn position(&self) -> Point3 {
        self.position
    }

    pub fn target(&self) -> Point3 {
        self.target
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn fov_deg(&self) -> f64 {
        self.fov_deg
    }

    pub fn distance(&self) -> f64 {
        self.position.distance(self.target)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::new(0.0, 0.0, -1.0)
    }

    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::unit_x()
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::unit_y()
    }

    pub fn look_at(&mut self, target: Point3) {
        self.target = target;
        let dir = target - self.position;
        if dir.magnitude() <= f64::EPSILON {
            return;
        }
        self.orientation = look_rotation(dir, world_up());
    }

    /// Replaces the orientation and swings the position around the target
    /// so the distance is unchanged.
    pub fn set_orientation(&mut self, orientation: Quat) {
        let distance = self.distance();
        self.orientation = orientation.normalize();
        self.position = self.target - self.forward() * distance;
    }

    pub fn set_pose(&mut self, position: Point3, target: Point3, orientation: Quat) {
        self.position = position;
        self.target = target;
        self.orientation = orientation.normalize();
    }

    /// Turntable orbit about the target: yaw around world up, pitch around
    /// the camera right axis, refusing to pitch over the poles.
    pub fn orbit(&mut self, yaw_delta: f64, pitch_delta: f64) {
        let yaw = Quat::from_axis_angle(world_up(), Rad(yaw_delta));
        let yawed = yaw * (self.position - self.target);

        let mut offset = yawed;
        if pitch_delta != 0.0 {
            let right = (yaw * self.right()).normalize();
            let pitched = Quat::from_axis_angle(right, Rad(pitch_delta)) * yawed;
            if pitched.normalize().y.abs() < ORBIT_POLE_LIMIT {
                offset = pitched;
            }
        }
        self.position = self.target + offset;
        self.orientation = look_rotation(-offset, world_up());
    }

    /// Exponential dolly toward the target; positive scroll moves closer.
    pub fn zoom(&mut self, scroll: f64) {
        let factor = (-scroll * 0.01).exp();
        let distance = (self.distance() * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.position = self.target - self.forward() * distance;
    }
}
