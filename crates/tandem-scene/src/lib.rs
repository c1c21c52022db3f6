//! Interactive two-model scene: transform state, gesture handling, rotation
//! animation, compositing parameters, model loading and the frame scheduler.

pub mod animator;
pub mod cache;
pub mod compositing;
pub mod drag;
pub mod height;
pub mod scene;
pub mod transform;

pub use animator::{AnimatorState, RotationAnimator, RotationAxis};
pub use cache::{CachedLoader, LoadState, ModelCache, ModelLoader};
pub use compositing::{
    CompositeMaterial, CompositePart, MaterialTheme, PolygonOffset, composite_material,
    render_slot,
};
pub use drag::{DragController, DragSession, GestureResponse, GroundBasis, PointerId};
pub use height::{HeightAdjuster, HeightDirection};
pub use scene::{
    CompositeUrls, FrameSnapshot, MAX_MODELS, ModelFrame, ORBIT_SPEED, PartFrame,
    SceneController, SceneHost,
};
pub use transform::{
    ModelTransform, MutationQueue, MutationSink, SelectionSink, TransformPatch, TransformStore,
};
