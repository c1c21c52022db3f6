//! Pointer and touch gestures on a model, turned into ground-plane or
//! full 3D moves.
//!
//! One contact moves the model across the ground along the camera's
//! flattened right/up axes. Two contacts move it along world X and Y so it
//! can be lifted. Gestures with more contacts than the model accepts fall
//! through to the camera orbit.

use tracing::debug;

use tandem_base::{DragConfig, DragMapping, ModelId};
use tandem_geometry::math::flatten_to_ground;
use tandem_geometry::{GroundBounds, Vec3};
use tandem_view::{OrbitCamera, Point2};

use crate::transform::{ModelTransform, MutationSink, SelectionSink, TransformPatch};

pub type PointerId = u64;

/// What the caller should do with the event after the controller saw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureResponse {
    /// Consumed by the model drag; the camera must not react to it.
    Captured,
    /// More contacts than the model accepts; hand it to the camera orbit.
    PassThrough,
    /// No drag session owns this pointer.
    Ignored,
}

/// Screen-to-world basis for one-contact moves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundBasis {
    pub right: Vec3,
    pub up: Vec3,
}

impl GroundBasis {
    pub fn world() -> Self {
        Self {
            right: Vec3::unit_x(),
            up: Vec3::new(0.0, 0.0, -1.0),
        }
    }

    /// Camera right and up flattened onto the ground. A camera looking along
    /// the horizon has no ground-projected up, so its forward stands in; a
    /// fully degenerate view falls back to world X and -Z.
    pub fn from_camera(camera: &OrbitCamera) -> Self {
        let fallback = Self::world();
        let right = flatten_to_ground(camera.right()).unwrap_or(fallback.right);
        let up = flatten_to_ground(camera.up())
            .or_else(|| flatten_to_ground(camera.forward()))
            .unwrap_or(fallback.up);
        Self { right, up }
    }
}

/// State of one gesture. Dropped on end or cancel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub model: ModelId,
    pub pointer_id: PointerId,
    pub start_pointer: Point2,
    pub last_pointer: Point2,
    pub initial: ModelTransform,
    pub position: Vec3,
    pub pointer_count: usize,
    pub moved: bool,
    pub select_sent: bool,
}

#[derive(Clone, Debug)]
pub struct DragController {
    config: DragConfig,
    ground: GroundBounds,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new(config: DragConfig, ground: GroundBounds) -> Self {
        Self {
            config,
            ground,
            session: None,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn ground(&self) -> &GroundBounds {
        &self.ground
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_model(&self) -> Option<ModelId> {
        self.session.map(|session| session.model)
    }

    /// World units per pixel for the given camera.
    pub fn move_scale(&self, camera: Option<&OrbitCamera>) -> f64 {
        let factor = camera
            .map(|camera| {
                (camera.distance() / self.config.reference_distance).clamp(
                    self.config.min_distance_factor,
                    self.config.max_distance_factor,
                )
            })
            .unwrap_or(1.0);
        self.config.move_speed * factor
    }

    /// Starts a gesture on `model`. Any previous session is replaced.
    pub fn on_gesture_start(
        &mut self,
        model: ModelId,
        pointer_id: PointerId,
        pos: Point2,
        current: &ModelTransform,
    ) -> GestureResponse {
        self.session = Some(DragSession {
            model,
            pointer_id,
            start_pointer: pos,
            last_pointer: pos,
            initial: *current,
            position: current.position,
            pointer_count: 1,
            moved: false,
            select_sent: false,
        });
        GestureResponse::Captured
    }

    pub fn on_gesture_move(
        &mut self,
        pointer_id: PointerId,
        pos: Point2,
        active_pointer_count: usize,
        camera: Option<&OrbitCamera>,
        selection: &mut dyn SelectionSink,
        sink: &mut dyn MutationSink,
    ) -> GestureResponse {
        let Some(mut session) = self.session else {
            return GestureResponse::Ignored;
        };
        if active_pointer_count > self.config.max_object_pointers {
            // Handed to the camera, so lifting the fingers is not a tap.
            session.moved = true;
            session.pointer_count = active_pointer_count;
            if pointer_id == session.pointer_id {
                session.last_pointer = pos;
            }
            self.session = Some(session);
            return GestureResponse::PassThrough;
        }
        if pointer_id != session.pointer_id {
            return GestureResponse::Captured;
        }
        if active_pointer_count != session.pointer_count {
            // A finger landed or lifted: re-baseline so the mode switch does not jump.
            session.pointer_count = active_pointer_count;
            session.last_pointer = pos;
            self.session = Some(session);
            return GestureResponse::Captured;
        }
        if !session.moved {
            if pos.distance(session.start_pointer) < self.config.tap_threshold_px {
                return GestureResponse::Captured;
            }
            session.moved = true;
        }

        let delta = pos - session.last_pointer;
        if delta.length() < self.config.debounce_px {
            self.session = Some(session);
            return GestureResponse::Captured;
        }

        let scale = self.move_scale(camera);
        let world_delta = if active_pointer_count >= 2 {
            Vec3::new(delta.x, -delta.y, 0.0) * scale
        } else {
            let basis = match (self.config.mapping, camera) {
                (DragMapping::CameraRelative, Some(camera)) => GroundBasis::from_camera(camera),
                _ => GroundBasis::world(),
            };
            (basis.right * delta.x - basis.up * delta.y) * scale
        };

        if !session.initial.selected && !session.select_sent {
            selection.on_select(session.model);
            session.select_sent = true;
        }

        let mut next = self.ground.clamp(session.position + world_delta);
        if active_pointer_count < 2 {
            next.y = session.position.y;
        }
        session.position = next;
        session.last_pointer = pos;
        self.session = Some(session);
        sink.on_update(session.model, &TransformPatch::position(next));
        GestureResponse::Captured
    }

    /// Ends the gesture owned by `pointer_id`. A gesture that never moved
    /// past the tap threshold counts as a click and selects the model.
    pub fn on_gesture_end(
        &mut self,
        pointer_id: PointerId,
        selection: &mut dyn SelectionSink,
    ) -> GestureResponse {
        let Some(session) = self.session else {
            return GestureResponse::Ignored;
        };
        if session.pointer_id != pointer_id {
            return GestureResponse::Captured;
        }
        self.session = None;
        if !session.moved {
            debug!(model = %session.model, "tap treated as selection");
            selection.on_select(session.model);
        }
        GestureResponse::Captured
    }

    /// Pointer lost. Always clears the session.
    pub fn on_gesture_cancel(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(model = %session.model, "drag cancelled");
        }
    }
}
