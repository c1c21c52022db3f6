use cgmath::{InnerSpace, Matrix3, Rad, Rotation3};
use serde::{Deserialize, Serialize};

use crate::{Quat, Vec3};

/// Below this length a flattened or crossed vector counts as degenerate.
pub const DEGENERATE_EPSILON: f64 = 1.0e-6;

pub fn world_up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

pub fn identity_quat() -> Quat {
    Quat::new(1.0, 0.0, 0.0, 0.0)
}

/// Rotation in radians applied as X, then Y, then Z about the object's axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerXyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EulerXyz {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn max_abs_diff(self, other: Self) -> f64 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }

    /// Only the yaw component.
    pub fn yaw_quat(self) -> Quat {
        Quat::from_angle_y(Rad(self.y))
    }

    /// Pitch and roll without yaw.
    pub fn tilt_quat(self) -> Quat {
        Quat::from_angle_x(Rad(self.x)) * Quat::from_angle_z(Rad(self.z))
    }
}

impl cgmath::AbsDiffEq for EulerXyz {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.max_abs_diff(*other) <= epsilon
    }
}

/// Up vector for a camera looking along `forward` in a Y-up world.
///
/// Looking straight up or down falls back to -Z as the screen-up direction.
pub fn default_up(forward: Vec3) -> Vec3 {
    let forward = forward.normalize();
    let mut right = forward.cross(world_up());
    if right.magnitude() <= DEGENERATE_EPSILON {
        right = forward.cross(Vec3::new(0.0, 0.0, -1.0));
    }
    right.normalize().cross(forward).normalize()
}

/// Camera-to-world rotation for a camera looking along `forward`.
///
/// The camera looks down its local -Z with +Y up.
pub fn look_rotation(forward: Vec3, up_hint: Vec3) -> Quat {
    let forward = forward.normalize();
    let mut right = forward.cross(up_hint);
    if right.magnitude() <= DEGENERATE_EPSILON {
        right = forward.cross(default_up(forward));
    }
    let right = right.normalize();
    let up = right.cross(forward).normalize();
    Quat::from(Matrix3::from_cols(right, up, -forward)).normalize()
}

/// Projects `v` onto the XZ ground plane and renormalises it.
pub fn flatten_to_ground(v: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(v.x, 0.0, v.z);
    if flat.magnitude() <= DEGENERATE_EPSILON {
        None
    } else {
        Some(flat.normalize())
    }
}

pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Face-label axis: index (0 = x, 1 = y, 2 = z) of the largest magnitude
/// component and whether it is positive. Ties resolve in x, y, z order.
pub fn dominant_axis(v: Vec3) -> (usize, bool) {
    let components = [v.x, v.y, v.z];
    let mut best = 0;
    for idx in 1..3 {
        if components[idx].abs() > components[best].abs() {
            best = idx;
        }
    }
    (best, components[best] >= 0.0)
}
