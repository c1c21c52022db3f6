use serde::{Deserialize, Serialize};

use tandem_base::RotationConfig;
use tandem_geometry::EulerXyz;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimatorState {
    Settled,
    Animating,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAxis {
    X,
    Y,
    Z,
}

/// Eases a model's displayed rotation toward a commanded target.
///
/// Each tick closes `min(k * dt, cap)` of the remaining gap per axis and
/// snaps exactly onto the target once every axis is within epsilon.
#[derive(Clone, Debug)]
pub struct RotationAnimator {
    config: RotationConfig,
    current: EulerXyz,
    target: EulerXyz,
}

impl RotationAnimator {
    pub fn new(config: RotationConfig, rotation: EulerXyz) -> Self {
        Self {
            config,
            current: rotation,
            target: rotation,
        }
    }

    pub fn current(&self) -> EulerXyz {
        self.current
    }

    pub fn target(&self) -> EulerXyz {
        self.target
    }

    pub fn state(&self) -> AnimatorState {
        if self.current == self.target {
            AnimatorState::Settled
        } else {
            AnimatorState::Animating
        }
    }

    pub fn is_settled(&self) -> bool {
        self.state() == AnimatorState::Settled
    }

    pub fn set_target(&mut self, target: EulerXyz) {
        self.target = target;
    }

    pub fn rotate_by(&mut self, axis: RotationAxis, angle: f64) {
        match axis {
            RotationAxis::X => self.target.x += angle,
            RotationAxis::Y => self.target.y += angle,
            RotationAxis::Z => self.target.z += angle,
        }
    }

    /// Moves both current and target, skipping the animation.
    pub fn jump_to(&mut self, rotation: EulerXyz) {
        self.current = rotation;
        self.target = rotation;
    }

    /// Advances by `dt` seconds. Returns the new rotation when it changed.
    pub fn tick(&mut self, dt: f64) -> Option<EulerXyz> {
        if self.is_settled() {
            return None;
        }
        let fraction = (self.config.responsiveness * dt.max(0.0)).min(self.config.cap_fraction);
        let step = |current: f64, target: f64| current + (target - current) * fraction;
        let next = EulerXyz::new(
            step(self.current.x, self.target.x),
            step(self.current.y, self.target.y),
            step(self.current.z, self.target.z),
        );
        let next = if next.max_abs_diff(self.target) < self.config.epsilon {
            self.target
        } else {
            next
        };
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }
}
