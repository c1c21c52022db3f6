use std::collections::HashMap;
use std::time::{Duration, Instant};

use tandem_base::{Error, ModelId, Result, SceneConfig};
use tandem_geometry::math::flatten_to_ground;
use tandem_geometry::{Aabb, EulerXyz, MeshHierarchy, Point3, Quat, Vec3, assert_near};
use tandem_scene::{
    CachedLoader, CompositePart, CompositeUrls, FrameSnapshot, GestureResponse, HeightDirection,
    MaterialTheme, ModelCache, ModelLoader, ModelTransform, MutationSink, RotationAxis,
    SceneController, SceneHost, SelectionSink, TransformPatch, composite_material, render_slot,
};
use tandem_view::{CubeMode, OrbitCamera, Rect, ViewTarget, pos2, vec2, widget_rect};

const DT: f64 = 1.0 / 60.0;

#[derive(Clone, Debug, PartialEq)]
enum HostEvent {
    Select(ModelId),
    Update(ModelId, TransformPatch),
    Render(u64),
}

#[derive(Default)]
struct RecordingHost {
    events: Vec<HostEvent>,
    last_frame: Option<FrameSnapshot>,
    opacity: Option<f32>,
}

impl RecordingHost {
    fn updates(&self) -> Vec<TransformPatch> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Update(_, patch) => Some(*patch),
                _ => None,
            })
            .collect()
    }
}

impl SelectionSink for RecordingHost {
    fn on_select(&mut self, id: ModelId) {
        self.events.push(HostEvent::Select(id));
    }
}

impl MutationSink for RecordingHost {
    fn on_update(&mut self, id: ModelId, patch: &TransformPatch) {
        self.events.push(HostEvent::Update(id, *patch));
    }
}

impl SceneHost for RecordingHost {
    fn render(&mut self, frame: &FrameSnapshot) {
        self.events.push(HostEvent::Render(frame.frame));
        self.last_frame = Some(frame.clone());
    }

    fn theme(&self, _id: ModelId) -> MaterialTheme {
        MaterialTheme {
            opacity: self.opacity.unwrap_or(1.0),
            ..MaterialTheme::default()
        }
    }
}

/// Serves axis-aligned boxes by URL; anything else fails.
struct BoxLoader {
    boxes: HashMap<String, Aabb>,
}

impl BoxLoader {
    fn new() -> Self {
        let boxes = [
            ("full.glb", Aabb::new(Point3::new(-2.0, -1.0, -1.0), Point3::new(2.0, 3.0, 1.0))),
            ("rect.glb", Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 3.0, 1.0))),
            ("other.glb", Aabb::new(Point3::new(-2.0, 0.0, 0.0), Point3::new(-1.0, 2.0, 1.0))),
        ]
        .into_iter()
        .map(|(url, bounds)| (url.to_string(), bounds))
        .collect();
        Self { boxes }
    }
}

impl ModelLoader for BoxLoader {
    fn load(&mut self, url: &str) -> Result<MeshHierarchy> {
        self.boxes
            .get(url)
            .map(|bounds| MeshHierarchy::from_box(url, *bounds))
            .ok_or_else(|| Error::LoadFailed {
                url: url.to_string(),
                reason: "not found".to_string(),
            })
    }
}

fn urls(aligned: &str) -> CompositeUrls {
    CompositeUrls {
        reference: "full.glb".to_string(),
        aligned: aligned.to_string(),
        anchor: "other.glb".to_string(),
    }
}

fn scene_with_model() -> Result<(SceneController, ModelId)> {
    let mut scene = SceneController::new(SceneConfig::default())?;
    scene.mount_camera(OrbitCamera::default());
    let id = scene.add_model(ModelTransform::default())?;
    Ok((scene, id))
}

#[test]
fn tick_applies_mutations_then_animates_then_renders() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut host = RecordingHost::default();
    scene.rotate_to(id, EulerXyz::new(0.0, 1.0, 0.0))?;
    scene.update(id, TransformPatch::position(Vec3::new(1.0, 0.0, 2.0)));

    scene.tick(DT, Instant::now(), &mut host);
    assert_eq!(host.events.len(), 3);
    assert_eq!(
        host.events[0],
        HostEvent::Update(id, TransformPatch::position(Vec3::new(1.0, 0.0, 2.0)))
    );
    assert!(matches!(&host.events[1], HostEvent::Update(_, patch) if patch.rotation.is_some()));
    assert_eq!(host.events[2], HostEvent::Render(1));

    let frame = host.last_frame.as_ref().map(|frame| frame.models[0].transform);
    assert_eq!(frame.map(|t| t.position), Some(Vec3::new(1.0, 0.0, 2.0)));
    Ok(())
}

#[test]
fn drag_is_applied_on_the_next_tick() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut host = RecordingHost::default();

    assert_eq!(scene.pointer_down(1, pos2(400.0, 300.0), Some(id)), GestureResponse::Captured);
    scene.pointer_move(1, pos2(500.0, 300.0), 1, &mut host);
    assert_eq!(host.events, vec![HostEvent::Select(id)]);
    assert_eq!(scene.pending_mutations(), 1);
    assert_eq!(scene.transform(id).map(|t| t.position), Some(Vec3::new(0.0, 0.0, 0.0)));

    scene.tick(DT, Instant::now(), &mut host);
    let right = scene
        .camera()
        .and_then(|camera| flatten_to_ground(camera.right()))
        .unwrap_or(Vec3::unit_x());
    let position = scene.transform(id).map(|t| t.position).unwrap_or(Vec3::new(9.0, 9.0, 9.0));
    assert_near!(position, right);

    assert_eq!(scene.pointer_up(1, pos2(500.0, 300.0), &mut host), GestureResponse::Captured);
    assert!(!scene.drag().is_active());
    Ok(())
}

#[test]
fn unknown_model_mutations_are_dropped() -> Result<()> {
    let (mut scene, _) = scene_with_model()?;
    let mut host = RecordingHost::default();
    scene.update(ModelId::new(), TransformPatch::position(Vec3::new(1.0, 0.0, 0.0)));
    scene.tick(DT, Instant::now(), &mut host);
    assert!(host.updates().is_empty());
    assert_eq!(scene.pending_mutations(), 0);
    assert!(matches!(
        scene.rotate_to(ModelId::new(), EulerXyz::ZERO),
        Err(Error::UnknownModel(_))
    ));
    Ok(())
}

#[test]
fn scene_holds_two_models() -> Result<()> {
    let (mut scene, _) = scene_with_model()?;
    scene.add_model(ModelTransform::at(Vec3::new(50.0, 0.0, 0.0)))?;
    assert!(scene.add_model(ModelTransform::default()).is_err());
    let second = scene.model_ids()[1];
    assert_eq!(scene.transform(second).map(|t| t.position.x), Some(10.0));
    Ok(())
}

#[test]
fn rotation_commands_animate_through_the_store() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut host = RecordingHost::default();
    scene.rotate_by(id, RotationAxis::Y, 0.5)?;
    for _ in 0..240 {
        scene.tick(DT, Instant::now(), &mut host);
    }
    assert_eq!(scene.transform(id).map(|t| t.rotation), Some(EulerXyz::new(0.0, 0.5, 0.0)));

    let updates = host.updates().len();
    scene.tick(DT, Instant::now(), &mut host);
    assert_eq!(host.updates().len(), updates);
    Ok(())
}

#[test]
fn external_rotation_patch_resets_animator() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut host = RecordingHost::default();
    scene.rotate_to(id, EulerXyz::new(1.0, 0.0, 0.0))?;
    scene.update(id, TransformPatch::rotation(EulerXyz::new(0.0, 0.3, 0.0)));
    scene.tick(DT, Instant::now(), &mut host);
    assert!(scene.animator(id).is_some_and(|animator| animator.is_settled()));
    assert_eq!(scene.transform(id).map(|t| t.rotation), Some(EulerXyz::new(0.0, 0.3, 0.0)));
    Ok(())
}

#[test]
fn height_hold_runs_inside_the_tick() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut host = RecordingHost::default();
    let t0 = Instant::now();
    scene.height_press(id, HeightDirection::Up, t0)?;
    scene.tick(DT, t0 + Duration::from_secs(1), &mut host);
    assert_near!(scene.transform(id).map(|t| t.position.y).unwrap_or_default(), 1.5);

    scene.teardown();
    assert!(!scene.height().is_active());
    scene.tick(DT, t0 + Duration::from_secs(2), &mut host);
    assert_near!(scene.transform(id).map(|t| t.position.y).unwrap_or_default(), 1.5);
    assert!(!scene.height_release());

    scene.height_press(id, HeightDirection::Down, t0 + Duration::from_secs(2))?;
    assert!(scene.height_pointer_leave());
    assert!(!scene.height().is_active());
    Ok(())
}

#[test]
fn loaded_model_renders_two_aligned_parts() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut loader = CachedLoader::new(BoxLoader::new(), ModelCache::new(Duration::from_secs(60)));
    assert!(scene.load_model(id, &urls("rect.glb"), &mut loader)?);
    assert!(!scene.is_placeholder(id));

    let offsets = scene.offsets(id).copied();
    let offsets = offsets.ok_or_else(|| Error::InvalidParameter("no offsets".into()))?;
    assert_near!(offsets.ground_offset, Vec3::new(0.0, 1.0, 0.0));
    assert_near!(offsets.aligned_offset, Vec3::new(-1.0, -0.5, 0.0));
    assert!(offsets.pivot_in_union());

    let mut host = RecordingHost::default();
    scene.tick(DT, Instant::now(), &mut host);
    let frame = host.last_frame.take().ok_or_else(|| Error::InvalidParameter("no frame".into()))?;
    let model = &frame.models[0];
    assert!(!model.placeholder);
    assert_eq!(model.parts.len(), 2);
    assert_eq!(model.parts[0].part, CompositePart::Aligned);
    assert_near!(model.pivot.unwrap_or(Point3::new(0.0, 0.0, 0.0)), Point3::new(0.0, 2.0, 0.5));

    // Same URLs again: served from cache.
    scene.load_model(id, &urls("rect.glb"), &mut loader)?;
    assert_eq!(loader.loads(), 3);
    Ok(())
}

#[test]
fn failed_part_shows_placeholder_until_reload() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut loader = CachedLoader::new(BoxLoader::new(), ModelCache::new(Duration::from_secs(60)));
    assert!(!scene.load_model(id, &urls("missing.glb"), &mut loader)?);
    assert!(scene.is_placeholder(id));

    let mut host = RecordingHost::default();
    scene.tick(DT, Instant::now(), &mut host);
    let frame = host.last_frame.take().ok_or_else(|| Error::InvalidParameter("no frame".into()))?;
    assert!(frame.models[0].placeholder);
    assert!(frame.models[0].parts.is_empty());

    let loads = loader.loads();
    scene.load_model(id, &urls("missing.glb"), &mut loader)?;
    assert_eq!(loader.loads(), loads);
    scene.reload_model(id, &urls("missing.glb"), &mut loader)?;
    assert_eq!(loader.loads(), loads + 1);

    assert!(scene.load_model(id, &urls("rect.glb"), &mut loader)?);
    assert!(!scene.is_placeholder(id));
    Ok(())
}

#[test]
fn translucent_theme_disables_depth_write_in_frame() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut loader = CachedLoader::new(BoxLoader::new(), ModelCache::new(Duration::from_secs(60)));
    scene.load_model(id, &urls("rect.glb"), &mut loader)?;
    let mut host = RecordingHost {
        opacity: Some(0.4),
        ..RecordingHost::default()
    };
    scene.tick(DT, Instant::now(), &mut host);
    let frame = host.last_frame.take().ok_or_else(|| Error::InvalidParameter("no frame".into()))?;
    for part in &frame.models[0].parts {
        assert!(!part.material.depth_write);
        assert!(part.material.depth_test);
        assert!(part.material.polygon_offset.is_some());
    }
    Ok(())
}

#[test]
fn compositing_separates_every_render_slot() {
    let theme = MaterialTheme {
        opacity: 0.5,
        ..MaterialTheme::default()
    };
    let mut orders = Vec::new();
    let mut offsets = Vec::new();
    for model in 0..2 {
        for part in CompositePart::ALL {
            let material = composite_material(&theme, model, part, false);
            orders.push(material.render_order);
            offsets.push(material.polygon_offset.map(|o| o.units));
            assert_eq!(material.render_order, render_slot(model, part) as i32);
        }
    }
    orders.dedup();
    offsets.dedup();
    assert_eq!(orders.len(), 4);
    assert_eq!(offsets.len(), 4);

    let opaque = composite_material(&MaterialTheme::default(), 0, CompositePart::Anchor, false);
    assert!(opaque.depth_write);
    assert!(opaque.polygon_offset.is_none());

    let wire = MaterialTheme {
        wireframe: true,
        ..MaterialTheme::default()
    };
    assert!(!composite_material(&wire, 0, CompositePart::Aligned, false).depth_write);

    let selected = composite_material(&theme, 0, CompositePart::Aligned, true);
    let last = composite_material(&theme, 1, CompositePart::Anchor, false);
    assert!(selected.render_order > last.render_order);
}

#[test]
fn widget_drag_orbits_camera_and_cube_follows() -> Result<()> {
    let (mut scene, _) = scene_with_model()?;
    let mut host = RecordingHost::default();
    scene.set_viewport(Rect::from_min_size(pos2(0.0, 0.0), vec2(1280.0, 720.0)));
    let center = widget_rect(scene.viewport()).center();
    assert!(center.x > 1100.0);
    let before = scene.camera().map(|camera| camera.orientation());

    assert_eq!(scene.pointer_down(1, center, None), GestureResponse::Captured);
    scene.pointer_move(1, pos2(center.x + 30.0, center.y + 5.0), 1, &mut host);
    assert_eq!(scene.view_cube().mode(), CubeMode::Dragging);
    assert_ne!(scene.camera().map(|camera| camera.orientation()), before);
    scene.pointer_up(1, pos2(center.x + 30.0, center.y + 5.0), &mut host);

    scene.tick(DT, Instant::now(), &mut host);
    let camera = scene
        .camera()
        .map(|camera| camera.orientation())
        .unwrap_or(Quat::new(0.0, 0.0, 0.0, 0.0));
    assert_near!(scene.view_cube().orientation() * camera, Quat::new(1.0, 0.0, 0.0, 0.0));
    Ok(())
}

#[test]
fn extra_fingers_on_model_orbit_the_camera() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut host = RecordingHost::default();
    let before = scene.camera().map(|camera| camera.position());

    scene.pointer_down(1, pos2(400.0, 300.0), Some(id));
    scene.pointer_down(2, pos2(420.0, 300.0), Some(id));
    scene.pointer_down(3, pos2(440.0, 300.0), Some(id));
    for x in [410.0, 460.0] {
        let response = scene.pointer_move(1, pos2(x, 300.0), 3, &mut host);
        assert_eq!(response, GestureResponse::PassThrough);
    }

    let after = scene.camera().map(|camera| camera.position());
    assert_ne!(after, before);
    assert_near!(scene.camera().map(|camera| camera.distance()).unwrap_or_default(), 15.0);
    assert_eq!(scene.pending_mutations(), 0);
    Ok(())
}

fn camera_yaw(scene: &SceneController) -> f64 {
    scene
        .camera()
        .map(|camera| {
            let offset = camera.position() - camera.target();
            offset.x.atan2(offset.z)
        })
        .unwrap_or_default()
}

#[test]
fn only_the_first_finger_steers_the_orbit() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut host = RecordingHost::default();
    let starts = [(1, 400.0), (2, 420.0), (3, 440.0)];
    for (pointer, x) in starts {
        scene.pointer_down(pointer, pos2(x, 300.0), Some(id));
    }
    let before = camera_yaw(&scene);

    for step in 1..=5 {
        for (pointer, x) in starts {
            let response = scene.pointer_move(pointer, pos2(x + step as f64, 300.0), 3, &mut host);
            assert_eq!(response, GestureResponse::PassThrough);
        }
    }
    // The first move of finger 1 only sets the baseline; four 1 px steps follow.
    assert_near!((camera_yaw(&scene) - before).abs(), 0.04, eps = 1.0e-9);
    Ok(())
}

#[test]
fn gestures_within_one_frame_accumulate() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut host = RecordingHost::default();
    for pointer in [1, 2] {
        scene.pointer_down(pointer, pos2(400.0, 300.0), Some(id));
        scene.pointer_move(pointer, pos2(500.0, 300.0), 1, &mut host);
        scene.pointer_up(pointer, pos2(500.0, 300.0), &mut host);
    }
    assert_eq!(scene.pending_mutations(), 2);

    scene.tick(DT, Instant::now(), &mut host);
    let right = scene
        .camera()
        .and_then(|camera| flatten_to_ground(camera.right()))
        .unwrap_or(Vec3::unit_x());
    let position = scene.transform(id).map(|t| t.position).unwrap_or(Vec3::new(9.0, 9.0, 9.0));
    assert_near!(position, right * 2.0);
    Ok(())
}

#[test]
fn height_hold_starts_from_queued_height() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut host = RecordingHost::default();
    let t0 = Instant::now();
    scene.update(id, TransformPatch::position(Vec3::new(0.0, 2.0, 0.0)));
    scene.height_press(id, HeightDirection::Up, t0)?;
    scene.tick(DT, t0 + Duration::from_secs(1), &mut host);
    assert_near!(scene.transform(id).map(|t| t.position.y).unwrap_or_default(), 3.5);
    Ok(())
}

#[test]
fn unmounting_camera_stops_navigation() -> Result<()> {
    let (mut scene, _) = scene_with_model()?;
    let mut host = RecordingHost::default();
    assert!(scene.navigate_to(ViewTarget::Face(tandem_view::ViewFace::Top)));
    scene.tick(DT, Instant::now(), &mut host);

    let camera = scene.unmount_camera();
    assert_eq!(scene.view_cube().mode(), CubeMode::Synced);
    let camera = camera.ok_or_else(|| Error::InvalidParameter("no camera".into()))?;
    let parked = camera.position();
    scene.mount_camera(camera);
    scene.tick(DT, Instant::now(), &mut host);
    assert_eq!(scene.camera().map(|camera| camera.position()), Some(parked));
    Ok(())
}

#[test]
fn empty_space_drag_orbits_and_cancel_resets_routing() -> Result<()> {
    let (mut scene, id) = scene_with_model()?;
    let mut host = RecordingHost::default();
    assert_eq!(scene.pointer_down(1, pos2(100.0, 400.0), None), GestureResponse::PassThrough);
    let before = scene.camera().map(|camera| camera.position());
    scene.pointer_move(1, pos2(150.0, 380.0), 1, &mut host);
    assert_ne!(scene.camera().map(|camera| camera.position()), before);

    scene.pointer_cancel();
    assert_eq!(scene.pointer_move(1, pos2(200.0, 380.0), 1, &mut host), GestureResponse::Ignored);
    assert_eq!(scene.pointer_down(4, pos2(400.0, 300.0), Some(id)), GestureResponse::Captured);
    scene.pointer_cancel();
    assert!(!scene.drag().is_active());
    Ok(())
}

#[test]
fn without_camera_the_widget_does_nothing() -> Result<()> {
    let mut scene = SceneController::new(SceneConfig::default())?;
    let mut host = RecordingHost::default();
    let center = widget_rect(scene.viewport()).center();
    assert!(!scene.navigate_to(ViewTarget::Face(tandem_view::ViewFace::Top)));
    assert_ne!(scene.pointer_down(1, center, None), GestureResponse::Captured);
    scene.pointer_move(1, pos2(center.x + 40.0, center.y), 1, &mut host);
    scene.tick(DT, Instant::now(), &mut host);
    assert_eq!(scene.view_cube().mode(), CubeMode::Synced);
    assert!(host.last_frame.is_some_and(|frame| frame.camera.is_none()));
    Ok(())
}

#[test]
fn navigation_runs_on_the_frame_tick() -> Result<()> {
    let (mut scene, _) = scene_with_model()?;
    let mut host = RecordingHost::default();
    assert!(scene.navigate_to(ViewTarget::Face(tandem_view::ViewFace::Right)));
    for _ in 0..40 {
        scene.tick(DT, Instant::now(), &mut host);
    }
    assert_near!(
        scene.camera().map(|camera| camera.position()).unwrap_or(Point3::new(0.0, 0.0, 0.0)),
        Point3::new(15.0, 0.0, 0.0)
    );
    let face = host.last_frame.and_then(|frame| frame.active_face);
    assert_eq!(face, Some(tandem_view::ViewFace::Right));
    Ok(())
}
