//! Camera-side pieces of the editor: the orbit camera the host renders
//! with and the view cube widget that mirrors and drives it.

pub mod camera;
pub mod pick;
pub mod ui;
pub mod viewcube;

pub use camera::OrbitCamera;
pub use pick::{ViewPick, pick_target, widget_rect};
pub use ui::{Point2, Rect, Vec2, pos2, vec2};
pub use viewcube::{CubeMode, ViewCube, ViewFace, ViewTarget};
