//! Geometry shared by the scene editor: cgmath aliases, bounding boxes, the
//! ground region, mesh hierarchies and composite-model alignment.

pub use cgmath;

pub type Vec3 = cgmath::Vector3<f64>;
pub type Point3 = cgmath::Point3<f64>;
pub type Quat = cgmath::Quaternion<f64>;
pub type Mat4 = cgmath::Matrix4<f64>;

pub mod alignment;
pub mod bounds;
pub mod ground;
pub mod math;
pub mod mesh;
pub mod tolerance;

pub use alignment::{AlignmentRule, CompositeAligner, CompositeOffsets, CompositeSources};
pub use bounds::Aabb;
pub use ground::GroundBounds;
pub use math::EulerXyz;
pub use mesh::{LocalTransform, MeshHierarchy, MeshNode};
pub use tolerance::{TOLERANCE, Tolerance};
