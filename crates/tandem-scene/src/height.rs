//! Press-and-hold height control. While held, every frame moves the model
//! by `speed * elapsed` where elapsed is measured from the previous tick's
//! wall-clock instant, so the rate does not depend on the frame rate.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tandem_base::{HeightConfig, ModelId};

use crate::transform::{ModelTransform, TransformPatch, TransformStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightDirection {
    Up,
    Down,
}

impl HeightDirection {
    fn sign(self) -> f64 {
        match self {
            HeightDirection::Up => 1.0,
            HeightDirection::Down => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct HeightHold {
    model: ModelId,
    direction: HeightDirection,
    last_tick: Instant,
    y: f64,
}

#[derive(Clone, Debug)]
pub struct HeightAdjuster {
    config: HeightConfig,
    hold: Option<HeightHold>,
}

impl HeightAdjuster {
    pub fn new(config: HeightConfig) -> Self {
        Self { config, hold: None }
    }

    pub fn is_active(&self) -> bool {
        self.hold.is_some()
    }

    pub fn active_model(&self) -> Option<ModelId> {
        self.hold.map(|hold| hold.model)
    }

    pub fn press(
        &mut self,
        model: ModelId,
        direction: HeightDirection,
        current: &ModelTransform,
        now: Instant,
    ) {
        self.clear("restarted");
        self.hold = Some(HeightHold {
            model,
            direction,
            last_tick: now,
            y: current.position.y,
        });
    }

    /// One frame of the hold loop. Returns the patch to persist, if the
    /// height moved. X and Z come from the store so a concurrent write to
    /// them is not undone.
    pub fn tick(
        &mut self,
        now: Instant,
        store: &TransformStore,
    ) -> Option<(ModelId, TransformPatch)> {
        let mut hold = self.hold?;
        let Some(current) = store.get(hold.model) else {
            self.clear("model removed");
            return None;
        };
        let elapsed = now.saturating_duration_since(hold.last_tick).as_secs_f64();
        hold.last_tick = now;

        let mut y = (hold.y + hold.direction.sign() * self.config.speed * elapsed).max(0.0);
        if let Some(max) = self.config.max_height {
            y = y.min(max);
        }
        let changed = y != hold.y;
        hold.y = y;
        self.hold = Some(hold);

        let mut position = current.position;
        position.y = y;
        changed.then(|| (hold.model, TransformPatch::position(position)))
    }

    pub fn release(&mut self) -> bool {
        self.clear("release")
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.clear("pointer left")
    }

    pub fn teardown(&mut self) -> bool {
        self.clear("teardown")
    }

    fn clear(&mut self, reason: &str) -> bool {
        match self.hold.take() {
            Some(hold) => {
                debug!(model = %hold.model, reason, "height hold stopped");
                true
            }
            None => false,
        }
    }
}
