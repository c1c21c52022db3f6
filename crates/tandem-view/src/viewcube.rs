//! The view cube: a small widget whose orientation is always the inverse of
//! the main camera's, which can in turn be dragged to orbit the camera or
//! clicked to fly the camera to a face, edge or corner view.

use cgmath::{InnerSpace, Rad, Rotation3};
use serde::Serialize;
use tracing::debug;

use tandem_base::ViewCubeConfig;
use tandem_geometry::math::{dominant_axis, ease_out_cubic, world_up};
use tandem_geometry::{Point3, Quat, Vec3};

use crate::camera::OrbitCamera;
use crate::pick::pick_target;
use crate::ui::{Point2, Rect, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ViewFace {
    Right,
    Left,
    Top,
    Bottom,
    Front,
    Back,
}

impl ViewFace {
    pub const ALL: [ViewFace; 6] = [
        ViewFace::Right,
        ViewFace::Left,
        ViewFace::Top,
        ViewFace::Bottom,
        ViewFace::Front,
        ViewFace::Back,
    ];

    pub fn normal(self) -> Vec3 {
        match self {
            ViewFace::Right => Vec3::new(1.0, 0.0, 0.0),
            ViewFace::Left => Vec3::new(-1.0, 0.0, 0.0),
            ViewFace::Top => Vec3::new(0.0, 1.0, 0.0),
            ViewFace::Bottom => Vec3::new(0.0, -1.0, 0.0),
            ViewFace::Front => Vec3::new(0.0, 0.0, 1.0),
            ViewFace::Back => Vec3::new(0.0, 0.0, -1.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewFace::Right => "right",
            ViewFace::Left => "left",
            ViewFace::Top => "top",
            ViewFace::Bottom => "bottom",
            ViewFace::Front => "front",
            ViewFace::Back => "back",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|face| face.label() == label)
    }

    /// Face whose normal best matches `dir`, by dominant component.
    pub fn from_direction(dir: Vec3) -> Option<Self> {
        if dir.magnitude() <= f64::EPSILON {
            return None;
        }
        let face = match dominant_axis(dir) {
            (0, true) => ViewFace::Right,
            (0, false) => ViewFace::Left,
            (1, true) => ViewFace::Top,
            (1, false) => ViewFace::Bottom,
            (_, true) => ViewFace::Front,
            (_, false) => ViewFace::Back,
        };
        Some(face)
    }

    fn axis_sign(sign: i8, positive: ViewFace, negative: ViewFace) -> Option<ViewFace> {
        match sign {
            s if s > 0 => Some(positive),
            s if s < 0 => Some(negative),
            _ => None,
        }
    }
}

/// Something on the cube that can be clicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ViewTarget {
    Face(ViewFace),
    Edge([ViewFace; 2]),
    Corner([ViewFace; 3]),
}

impl ViewTarget {
    /// The four vertical edges and the four upper corners.
    pub const DIAGONAL_PRESETS: [ViewTarget; 8] = [
        ViewTarget::Edge([ViewFace::Right, ViewFace::Front]),
        ViewTarget::Edge([ViewFace::Left, ViewFace::Front]),
        ViewTarget::Edge([ViewFace::Right, ViewFace::Back]),
        ViewTarget::Edge([ViewFace::Left, ViewFace::Back]),
        ViewTarget::Corner([ViewFace::Right, ViewFace::Top, ViewFace::Front]),
        ViewTarget::Corner([ViewFace::Left, ViewFace::Top, ViewFace::Front]),
        ViewTarget::Corner([ViewFace::Right, ViewFace::Top, ViewFace::Back]),
        ViewTarget::Corner([ViewFace::Left, ViewFace::Top, ViewFace::Back]),
    ];

    /// Builds a target from per-axis signs; faces are ordered x, y, z.
    pub fn from_signs(x: i8, y: i8, z: i8) -> Option<Self> {
        let faces: Vec<ViewFace> = [
            ViewFace::axis_sign(x, ViewFace::Right, ViewFace::Left),
            ViewFace::axis_sign(y, ViewFace::Top, ViewFace::Bottom),
            ViewFace::axis_sign(z, ViewFace::Front, ViewFace::Back),
        ]
        .into_iter()
        .flatten()
        .collect();
        match faces.as_slice() {
            [a] => Some(ViewTarget::Face(*a)),
            [a, b] => Some(ViewTarget::Edge([*a, *b])),
            [a, b, c] => Some(ViewTarget::Corner([*a, *b, *c])),
            _ => None,
        }
    }

    /// Parses names such as `top`, `front-right` or `top-back-left`.
    pub fn parse(name: &str) -> Option<Self> {
        let mut signs = [0i8; 3];
        for part in name.split('-') {
            let face = ViewFace::from_label(part.trim())?;
            let normal = face.normal();
            for (idx, value) in [normal.x, normal.y, normal.z].into_iter().enumerate() {
                if value != 0.0 {
                    if signs[idx] != 0 {
                        return None;
                    }
                    signs[idx] = value.signum() as i8;
                }
            }
        }
        Self::from_signs(signs[0], signs[1], signs[2])
    }

    pub fn name(&self) -> String {
        self.faces()
            .iter()
            .map(|face| face.label())
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn faces(&self) -> Vec<ViewFace> {
        match self {
            ViewTarget::Face(face) => vec![*face],
            ViewTarget::Edge(faces) => faces.to_vec(),
            ViewTarget::Corner(faces) => faces.to_vec(),
        }
    }

    /// Unit vector from the look target toward the camera for this view.
    pub fn direction(&self) -> Vec3 {
        self.faces()
            .into_iter()
            .fold(Vec3::new(0.0, 0.0, 0.0), |acc, face| acc + face.normal())
            .normalize()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CubeMode {
    Synced,
    Dragging,
    Damping,
    Navigating,
}

#[derive(Clone, Copy, Debug)]
struct CubeDrag {
    start: Point2,
    last: Point2,
    dragged: bool,
}

#[derive(Clone, Copy, Debug)]
struct Navigation {
    target: ViewTarget,
    from_position: Point3,
    to_position: Point3,
    from_target: Point3,
    to_target: Point3,
    from_orientation: Quat,
    to_orientation: Quat,
    elapsed: f64,
    duration: f64,
}

#[derive(Clone, Debug)]
pub struct ViewCube {
    config: ViewCubeConfig,
    orientation: Quat,
    active_face: Option<ViewFace>,
    velocity: Vec2,
    damping_active: bool,
    drag: Option<CubeDrag>,
    navigation: Option<Navigation>,
}

impl Default for ViewCube {
    fn default() -> Self {
        Self::new(ViewCubeConfig::default())
    }
}

impl ViewCube {
    pub fn new(config: ViewCubeConfig) -> Self {
        Self {
            config,
            orientation: Quat::new(1.0, 0.0, 0.0, 0.0),
            active_face: None,
            velocity: Vec2::ZERO,
            damping_active: false,
            drag: None,
            navigation: None,
        }
    }

    pub fn config(&self) -> &ViewCubeConfig {
        &self.config
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn active_face(&self) -> Option<ViewFace> {
        self.active_face
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_damping(&self) -> bool {
        self.damping_active
    }

    pub fn mode(&self) -> CubeMode {
        if self.drag.is_some() {
            CubeMode::Dragging
        } else if self.navigation.is_some() {
            CubeMode::Navigating
        } else if self.damping_active {
            CubeMode::Damping
        } else {
            CubeMode::Synced
        }
    }

    fn look_target(&self) -> Point3 {
        let [x, y, z] = self.config.target;
        Point3::new(x, y, z)
    }

    /// Mirrors the camera and refreshes the face label. Returns the new
    /// label when it changed.
    pub fn sync(&mut self, camera: &OrbitCamera) -> Option<ViewFace> {
        self.orientation = camera.orientation().conjugate();
        let face = ViewFace::from_direction(camera.position() - camera.target());
        if face.is_some() && face != self.active_face {
            self.active_face = face;
            return face;
        }
        None
    }

    /// Per-frame update: advances navigation or inertia, then re-syncs.
    pub fn tick(&mut self, camera: Option<&mut OrbitCamera>, dt: f64) -> Option<ViewFace> {
        let camera = camera?;
        if self.navigation.is_some() {
            self.advance_navigation(camera, dt);
        } else if self.damping_active && self.drag.is_none() {
            self.advance_damping(camera);
        }
        self.sync(camera)
    }

    /// Starts a press on the widget. Cancels inertia and any running
    /// navigation. Returns false when there is no camera to drive.
    pub fn press(&mut self, camera: Option<&OrbitCamera>, pos: Point2) -> bool {
        if camera.is_none() {
            return false;
        }
        self.damping_active = false;
        self.velocity = Vec2::ZERO;
        self.navigation = None;
        self.drag = Some(CubeDrag {
            start: pos,
            last: pos,
            dragged: false,
        });
        true
    }

    pub fn drag_to(&mut self, camera: Option<&mut OrbitCamera>, pos: Point2) -> Option<ViewFace> {
        let camera = camera?;
        let mut drag = self.drag?;
        if !drag.dragged && pos.distance(drag.start) > self.config.click_threshold_px {
            drag.dragged = true;
        }
        if drag.dragged {
            let delta = pos - drag.last;
            self.rotate_camera(camera, delta);
            self.velocity = delta;
            drag.last = pos;
        }
        self.drag = Some(drag);
        self.sync(camera)
    }

    /// Ends a press. A press that never turned into a drag is a click and
    /// starts navigation toward whatever is under `pos`; a fast drag
    /// release starts inertia.
    pub fn release(
        &mut self,
        camera: Option<&OrbitCamera>,
        pos: Option<Point2>,
        viewport: Rect,
    ) -> Option<ViewTarget> {
        let drag = self.drag.take()?;
        let camera = camera?;
        if !drag.dragged {
            self.velocity = Vec2::ZERO;
            let pick = pick_target(pos?, viewport, self.orientation)?;
            self.navigate_to(Some(camera), pick.target);
            return Some(pick.target);
        }
        if self.velocity.length() > self.config.release_velocity {
            self.damping_active = true;
        } else {
            self.velocity = Vec2::ZERO;
        }
        None
    }

    /// Pointer lost or camera gone: drop the drag, inertia and any running
    /// navigation, leaving the cube synced.
    pub fn cancel(&mut self) {
        self.drag = None;
        self.navigation = None;
        self.damping_active = false;
        self.velocity = Vec2::ZERO;
    }

    /// Starts inertia with an explicit release velocity (pixels per tick).
    pub fn fling(&mut self, camera: Option<&OrbitCamera>, velocity: Vec2) -> bool {
        if camera.is_none() || velocity.length() <= self.config.release_velocity {
            return false;
        }
        self.drag = None;
        self.navigation = None;
        self.velocity = velocity;
        self.damping_active = true;
        true
    }

    pub fn navigate_to(&mut self, camera: Option<&OrbitCamera>, target: ViewTarget) -> bool {
        let Some(camera) = camera else {
            return false;
        };
        let look_target = self.look_target();
        let to_position = look_target + target.direction() * self.config.navigation_distance;
        let destination = OrbitCamera::new(to_position, look_target);
        self.damping_active = false;
        self.velocity = Vec2::ZERO;
        self.navigation = Some(Navigation {
            target,
            from_position: camera.position(),
            to_position,
            from_target: camera.target(),
            to_target: look_target,
            from_orientation: camera.orientation(),
            to_orientation: destination.orientation(),
            elapsed: 0.0,
            duration: self.config.navigation_duration,
        });
        debug!(view = %target.name(), "view cube navigation started");
        true
    }

    fn rotate_camera(&mut self, camera: &mut OrbitCamera, delta: Vec2) {
        let speed = self.config.drag_speed;
        let yaw = Quat::from_axis_angle(world_up(), Rad(-delta.x * speed));
        let pitch = Quat::from_axis_angle(camera.right().normalize(), Rad(-delta.y * speed));
        let orientation = (yaw * pitch * camera.orientation()).normalize();
        camera.set_orientation(orientation);
        self.orientation = camera.orientation().conjugate();
    }

    fn advance_damping(&mut self, camera: &mut OrbitCamera) {
        self.rotate_camera(camera, self.velocity);
        self.velocity = self.velocity * self.config.damping;
        if self.velocity.length() < self.config.stop_velocity {
            self.velocity = Vec2::ZERO;
            self.damping_active = false;
        }
    }

    fn advance_navigation(&mut self, camera: &mut OrbitCamera, dt: f64) {
        let Some(mut nav) = self.navigation else {
            return;
        };
        nav.elapsed += dt.max(0.0);
        let t = (nav.elapsed / nav.duration).clamp(0.0, 1.0);
        if t >= 1.0 {
            camera.set_pose(nav.to_position, nav.to_target, nav.to_orientation);
            self.navigation = None;
            debug!(view = %nav.target.name(), "view cube navigation finished");
            return;
        }
        let eased = ease_out_cubic(t);
        let position = nav.from_position + (nav.to_position - nav.from_position) * eased;
        let target = nav.from_target + (nav.to_target - nav.from_target) * eased;
        let orientation = nav.from_orientation.slerp(nav.to_orientation, eased);
        camera.set_pose(position, target, orientation);
        self.navigation = Some(nav);
    }
}
