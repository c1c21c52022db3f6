//! The scene controller: owns the two composite models, routes pointer
//! events to the view cube, the model drag or the camera orbit, and runs
//! the per-frame scheduler.
//!
//! Every tick first applies the queued gesture mutations, then advances
//! rotation animators, the height hold and the view cube, and finally hands
//! one [`FrameSnapshot`] to the host.

use std::time::Instant;

use cgmath::Matrix4;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tandem_base::{Error, ModelId, Result, SceneConfig};
use tandem_geometry::{
    AlignmentRule, CompositeAligner, CompositeOffsets, CompositeSources, EulerXyz, GroundBounds,
    Mat4, Point3, Quat, Vec3,
};
use tandem_view::{
    CubeMode, OrbitCamera, Point2, Rect, ViewCube, ViewFace, ViewTarget, pos2, vec2, widget_rect,
};

use crate::animator::{RotationAnimator, RotationAxis};
use crate::cache::{CachedLoader, ModelLoader};
use crate::compositing::{CompositeMaterial, CompositePart, MaterialTheme, composite_material};
use crate::drag::{DragController, GestureResponse, PointerId};
use crate::height::{HeightAdjuster, HeightDirection};
use crate::transform::{
    ModelTransform, MutationQueue, MutationSink, SelectionSink, TransformPatch, TransformStore,
};

/// The editor works on exactly this many composite models.
pub const MAX_MODELS: usize = 2;
/// Radians of camera orbit per pixel for gestures that reach the camera.
pub const ORBIT_SPEED: f64 = 0.01;

/// The application embedding the scene.
pub trait SceneHost: SelectionSink + MutationSink {
    fn render(&mut self, frame: &FrameSnapshot);

    fn theme(&self, _id: ModelId) -> MaterialTheme {
        MaterialTheme::default()
    }
}

/// Source URLs of one composite model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeUrls {
    pub reference: String,
    pub aligned: String,
    pub anchor: String,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct PartFrame {
    pub part: CompositePart,
    pub matrix: Mat4,
    pub material: CompositeMaterial,
}

#[derive(Clone, Debug, Serialize)]
pub struct ModelFrame {
    pub id: ModelId,
    pub transform: ModelTransform,
    /// True while any source mesh failed to load.
    pub placeholder: bool,
    /// Tilt pivot in the model frame, ground offset included.
    pub pivot: Option<Point3>,
    pub parts: Vec<PartFrame>,
}

/// Everything the host needs to draw one frame.
#[derive(Clone, Debug, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub models: Vec<ModelFrame>,
    pub camera: Option<OrbitCamera>,
    pub cube_orientation: Quat,
    pub active_face: Option<ViewFace>,
    pub cube_mode: CubeMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PointerRoute {
    Cube,
    Model,
    Camera,
}

#[derive(Clone, Debug)]
struct SceneModel {
    id: ModelId,
    animator: RotationAnimator,
    aligner: CompositeAligner,
    offsets: Option<CompositeOffsets>,
    placeholder: bool,
}

pub struct SceneController {
    config: SceneConfig,
    store: TransformStore,
    queue: MutationQueue,
    models: Vec<SceneModel>,
    drag: DragController,
    height: HeightAdjuster,
    view_cube: ViewCube,
    camera: Option<OrbitCamera>,
    viewport: Rect,
    route: Option<(PointerId, PointerRoute)>,
    orbit_last: Option<Point2>,
    frame: u64,
}

impl SceneController {
    pub fn new(config: SceneConfig) -> Result<Self> {
        config.validate()?;
        let ground = GroundBounds::new(config.ground_size)?;
        Ok(Self {
            store: TransformStore::new(),
            queue: MutationQueue::new(),
            models: Vec::new(),
            drag: DragController::new(config.drag.clone(), ground),
            height: HeightAdjuster::new(config.height.clone()),
            view_cube: ViewCube::new(config.view_cube.clone()),
            camera: None,
            viewport: Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0)),
            route: None,
            orbit_last: None,
            frame: 0,
            config,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn ground(&self) -> &GroundBounds {
        self.drag.ground()
    }

    pub fn add_model(&mut self, transform: ModelTransform) -> Result<ModelId> {
        let id = ModelId::new();
        self.insert_model(id, transform)?;
        Ok(id)
    }

    pub fn insert_model(&mut self, id: ModelId, transform: ModelTransform) -> Result<()> {
        if self.store.contains(id) {
            return Err(Error::InvalidParameter(format!("model {id} already exists")));
        }
        if self.models.len() >= MAX_MODELS {
            return Err(Error::InvalidParameter(format!(
                "scene holds at most {MAX_MODELS} models"
            )));
        }
        let mut transform = transform;
        transform.position = self.ground().clamp(transform.position);
        self.store.insert(id, transform);
        self.models.push(SceneModel {
            id,
            animator: RotationAnimator::new(self.config.rotation.clone(), transform.rotation),
            aligner: CompositeAligner::new(AlignmentRule::from(&self.config.alignment)),
            offsets: None,
            placeholder: false,
        });
        info!(model = %id, "model added");
        Ok(())
    }

    pub fn model_ids(&self) -> Vec<ModelId> {
        self.models.iter().map(|model| model.id).collect()
    }

    pub fn transform(&self, id: ModelId) -> Option<&ModelTransform> {
        self.store.get(id)
    }

    pub fn store(&self) -> &TransformStore {
        &self.store
    }

    pub fn offsets(&self, id: ModelId) -> Option<&CompositeOffsets> {
        self.model(id).and_then(|model| model.offsets.as_ref())
    }

    pub fn is_placeholder(&self, id: ModelId) -> bool {
        self.model(id).is_some_and(|model| model.placeholder)
    }

    pub fn animator(&self, id: ModelId) -> Option<&RotationAnimator> {
        self.model(id).map(|model| &model.animator)
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn height(&self) -> &HeightAdjuster {
        &self.height
    }

    pub fn view_cube(&self) -> &ViewCube {
        &self.view_cube
    }

    pub fn camera(&self) -> Option<&OrbitCamera> {
        self.camera.as_ref()
    }

    pub fn mount_camera(&mut self, camera: OrbitCamera) {
        self.view_cube.sync(&camera);
        self.camera = Some(camera);
    }

    pub fn unmount_camera(&mut self) -> Option<OrbitCamera> {
        self.view_cube.cancel();
        self.camera.take()
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    pub fn pending_mutations(&self) -> usize {
        self.queue.len()
    }

    /// Queues a change for the next tick.
    pub fn update(&mut self, id: ModelId, patch: TransformPatch) {
        self.queue.push(id, patch);
    }

    /// Loads the three source meshes of a model and recomputes its offsets
    /// when any URL changed. Returns whether the model is ready to draw;
    /// load failures leave it as a placeholder.
    pub fn load_model<L: ModelLoader>(
        &mut self,
        id: ModelId,
        urls: &CompositeUrls,
        loader: &mut CachedLoader<L>,
    ) -> Result<bool> {
        let model = self
            .models
            .iter_mut()
            .find(|model| model.id == id)
            .ok_or(Error::UnknownModel(id))?;
        let reference = loader.fetch(&urls.reference);
        let aligned = loader.fetch(&urls.aligned);
        let anchor = loader.fetch(&urls.anchor);

        let (Some(reference), Some(aligned), Some(anchor)) =
            (reference.mesh(), aligned.mesh(), anchor.mesh())
        else {
            model.offsets = None;
            model.placeholder = true;
            return Ok(false);
        };
        let sources = CompositeSources {
            reference,
            aligned,
            anchor,
        };
        match model.aligner.refresh(&sources) {
            Ok(offsets) => {
                model.offsets = Some(offsets);
                model.placeholder = false;
            }
            Err(err) => {
                warn!(model = %id, error = %err, "composite alignment failed");
                model.offsets = None;
                model.placeholder = true;
            }
        }
        Ok(!model.placeholder)
    }

    /// Clears remembered load failures for the model's URLs and loads again.
    pub fn reload_model<L: ModelLoader>(
        &mut self,
        id: ModelId,
        urls: &CompositeUrls,
        loader: &mut CachedLoader<L>,
    ) -> Result<bool> {
        for url in [&urls.reference, &urls.aligned, &urls.anchor] {
            if loader.has_failed(url) {
                loader.retry(url);
            }
        }
        self.load_model(id, urls, loader)
    }

    pub fn rotate_to(&mut self, id: ModelId, rotation: EulerXyz) -> Result<()> {
        self.model_mut(id)?.animator.set_target(rotation);
        Ok(())
    }

    pub fn rotate_by(&mut self, id: ModelId, axis: RotationAxis, angle: f64) -> Result<()> {
        self.model_mut(id)?.animator.rotate_by(axis, angle);
        Ok(())
    }

    pub fn height_press(
        &mut self,
        id: ModelId,
        direction: HeightDirection,
        now: Instant,
    ) -> Result<()> {
        let current = self.pending_transform(id).ok_or(Error::UnknownModel(id))?;
        self.height.press(id, direction, &current, now);
        Ok(())
    }

    pub fn height_release(&mut self) -> bool {
        self.height.release()
    }

    pub fn height_pointer_leave(&mut self) -> bool {
        self.height.pointer_leave()
    }

    pub fn navigate_to(&mut self, target: ViewTarget) -> bool {
        self.view_cube.navigate_to(self.camera.as_ref(), target)
    }

    /// Routes a new contact. `hit` is the model under the pointer, as
    /// resolved by the host's picking.
    pub fn pointer_down(
        &mut self,
        pointer_id: PointerId,
        pos: Point2,
        hit: Option<ModelId>,
    ) -> GestureResponse {
        if let Some((_, route)) = self.route {
            return match route {
                PointerRoute::Camera => GestureResponse::PassThrough,
                PointerRoute::Cube | PointerRoute::Model => GestureResponse::Captured,
            };
        }
        if widget_rect(self.viewport).contains(pos)
            && self.view_cube.press(self.camera.as_ref(), pos)
        {
            self.route = Some((pointer_id, PointerRoute::Cube));
            return GestureResponse::Captured;
        }
        if let Some(id) = hit {
            if let Some(current) = self.pending_transform(id) {
                self.route = Some((pointer_id, PointerRoute::Model));
                return self.drag.on_gesture_start(id, pointer_id, pos, &current);
            }
        }
        self.route = Some((pointer_id, PointerRoute::Camera));
        self.orbit_last = Some(pos);
        GestureResponse::PassThrough
    }

    pub fn pointer_move<H: SceneHost>(
        &mut self,
        pointer_id: PointerId,
        pos: Point2,
        active_pointers: usize,
        host: &mut H,
    ) -> GestureResponse {
        let Some((owner, route)) = self.route else {
            return GestureResponse::Ignored;
        };
        match route {
            PointerRoute::Cube => {
                if owner == pointer_id {
                    self.view_cube.drag_to(self.camera.as_mut(), pos);
                }
                GestureResponse::Captured
            }
            PointerRoute::Model => {
                let response = self.drag.on_gesture_move(
                    pointer_id,
                    pos,
                    active_pointers,
                    self.camera.as_ref(),
                    host,
                    &mut self.queue,
                );
                if response == GestureResponse::PassThrough {
                    // Only the finger that started the gesture steers the orbit.
                    if pointer_id == owner {
                        self.orbit_camera(pos);
                    }
                } else {
                    self.orbit_last = None;
                }
                response
            }
            PointerRoute::Camera => {
                if owner == pointer_id {
                    self.orbit_camera(pos);
                }
                GestureResponse::PassThrough
            }
        }
    }

    pub fn pointer_up<H: SceneHost>(
        &mut self,
        pointer_id: PointerId,
        pos: Point2,
        host: &mut H,
    ) -> GestureResponse {
        let Some((owner, route)) = self.route else {
            return GestureResponse::Ignored;
        };
        if owner != pointer_id {
            return match route {
                PointerRoute::Camera => GestureResponse::PassThrough,
                PointerRoute::Cube | PointerRoute::Model => GestureResponse::Captured,
            };
        }
        self.route = None;
        self.orbit_last = None;
        match route {
            PointerRoute::Cube => {
                if let Some(target) =
                    self.view_cube
                        .release(self.camera.as_ref(), Some(pos), self.viewport)
                {
                    debug!(view = %target.name(), "view cube clicked");
                }
                GestureResponse::Captured
            }
            PointerRoute::Model => self.drag.on_gesture_end(pointer_id, host),
            PointerRoute::Camera => GestureResponse::PassThrough,
        }
    }

    /// Pointer lost mid-gesture. Every gesture state is dropped.
    pub fn pointer_cancel(&mut self) {
        self.drag.on_gesture_cancel();
        self.view_cube.cancel();
        self.route = None;
        self.orbit_last = None;
    }

    pub fn scroll(&mut self, delta: f64) {
        if let Some(camera) = self.camera.as_mut() {
            camera.zoom(delta);
        }
    }

    /// Stops every running gesture and hold; queued mutations are dropped.
    pub fn teardown(&mut self) {
        self.height.teardown();
        self.pointer_cancel();
        self.queue.clear();
    }

    /// One frame: apply queued mutations, advance animation, render.
    pub fn tick<H: SceneHost>(&mut self, dt: f64, now: Instant, host: &mut H) {
        let pending: Vec<_> = self.queue.drain().collect();
        for (id, patch) in pending {
            if let Some(rotation) = patch.rotation {
                if let Ok(model) = self.model_mut(id) {
                    model.animator.jump_to(rotation);
                }
            }
            self.persist(id, &patch, host);
        }

        let mut animated = Vec::new();
        for model in &mut self.models {
            if let Some(rotation) = model.animator.tick(dt) {
                animated.push((model.id, TransformPatch::rotation(rotation)));
            }
        }
        for (id, patch) in animated {
            self.persist(id, &patch, host);
        }
        if let Some((id, patch)) = self.height.tick(now, &self.store) {
            self.persist(id, &patch, host);
        }
        if let Some(face) = self.view_cube.tick(self.camera.as_mut(), dt) {
            debug!(face = face.label(), "active face changed");
        }

        self.frame += 1;
        let frame = self.snapshot(host);
        host.render(&frame);
    }

    pub fn snapshot<H: SceneHost>(&self, host: &H) -> FrameSnapshot {
        let models = self
            .models
            .iter()
            .enumerate()
            .filter_map(|(index, model)| {
                let transform = *self.store.get(model.id)?;
                let theme = host.theme(model.id);
                let parts = model
                    .offsets
                    .map(|offsets| {
                        CompositePart::ALL
                            .into_iter()
                            .map(|part| PartFrame {
                                part,
                                matrix: part_matrix(&offsets, part, &transform),
                                material: composite_material(
                                    &theme,
                                    index,
                                    part,
                                    transform.selected,
                                ),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Some(ModelFrame {
                    id: model.id,
                    transform,
                    placeholder: model.placeholder,
                    pivot: model.offsets.map(|offsets| offsets.world_pivot()),
                    parts,
                })
            })
            .collect();
        FrameSnapshot {
            frame: self.frame,
            models,
            camera: self.camera,
            cube_orientation: self.view_cube.orientation(),
            active_face: self.view_cube.active_face(),
            cube_mode: self.view_cube.mode(),
        }
    }

    fn persist<H: SceneHost>(&mut self, id: ModelId, patch: &TransformPatch, host: &mut H) {
        match self.store.update(id, patch) {
            Ok(true) => host.on_update(id, patch),
            Ok(false) => {}
            Err(err) => warn!(model = %id, error = %err, "mutation dropped"),
        }
    }

    /// Stored transform with this frame's queued patches applied, so a
    /// gesture that starts before the next tick continues from them.
    fn pending_transform(&self, id: ModelId) -> Option<ModelTransform> {
        let mut transform = *self.store.get(id)?;
        for patch in self.queue.pending_for(id) {
            patch.apply_to(&mut transform);
        }
        Some(transform)
    }

    fn orbit_camera(&mut self, pos: Point2) {
        if let (Some(camera), Some(last)) = (self.camera.as_mut(), self.orbit_last) {
            let delta = pos - last;
            camera.orbit(-delta.x * ORBIT_SPEED, -delta.y * ORBIT_SPEED);
        }
        self.orbit_last = Some(pos);
    }

    fn model(&self, id: ModelId) -> Option<&SceneModel> {
        self.models.iter().find(|model| model.id == id)
    }

    fn model_mut(&mut self, id: ModelId) -> Result<&mut SceneModel> {
        self.models
            .iter_mut()
            .find(|model| model.id == id)
            .ok_or(Error::UnknownModel(id))
    }
}

/// Model-to-world matrix of one part: the assembled composite, scaled
/// about the model origin, then moved to the model position.
fn part_matrix(
    offsets: &CompositeOffsets,
    part: CompositePart,
    transform: &ModelTransform,
) -> Mat4 {
    let origin = Vec3::new(0.0, 0.0, 0.0);
    let assembled = match part {
        CompositePart::Aligned => offsets.aligned_matrix(origin, transform.rotation),
        CompositePart::Anchor => offsets.anchor_matrix(origin, transform.rotation),
    };
    let scale = transform.scale;
    Matrix4::from_translation(transform.position)
        * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
        * assembled
}
