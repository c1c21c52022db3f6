use cgmath::{Matrix4, SquareMatrix, Transform};

use tandem_base::{Error, Result};

use crate::bounds::Aabb;
use crate::math::identity_quat;
use crate::{Mat4, Point3, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl LocalTransform {
    pub fn identity() -> Self {
        Self {
            translation: Vec3::new(0.0, 0.0, 0.0),
            rotation: identity_quat(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Matrix4::from_translation(self.translation)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// One node of a loaded model: its own vertices plus child nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshNode {
    pub name: String,
    pub local: LocalTransform,
    pub positions: Vec<Point3>,
    pub children: Vec<MeshNode>,
}

impl MeshNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: LocalTransform::identity(),
            positions: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_positions(mut self, positions: Vec<Point3>) -> Self {
        self.positions = positions;
        self
    }

    pub fn with_local(mut self, local: LocalTransform) -> Self {
        self.local = local;
        self
    }

    pub fn with_child(mut self, child: MeshNode) -> Self {
        self.children.push(child);
        self
    }

    fn bounds_under(&self, parent: &Mat4) -> Option<Aabb> {
        let world = *parent * self.local.matrix();
        let own = Aabb::from_points(self.positions.iter().map(|p| world.transform_point(*p)));
        self.children
            .iter()
            .fold(own, |acc, child| Aabb::merge(acc, child.bounds_under(&world)))
    }
}

/// A loaded model together with the URL it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshHierarchy {
    url: String,
    root: MeshNode,
}

impl MeshHierarchy {
    pub fn new(url: impl Into<String>, root: MeshNode) -> Self {
        Self {
            url: url.into(),
            root,
        }
    }

    /// Single-node hierarchy whose vertices are the corners of `bounds`.
    pub fn from_box(url: impl Into<String>, bounds: Aabb) -> Self {
        let url = url.into();
        let root = MeshNode::new(url.clone()).with_positions(bounds.corners().to_vec());
        Self { url, root }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// World bounds with the root's local transform zeroed, so parts loaded
    /// with different placements share one frame.
    pub fn detached_bounds(&self) -> Result<Aabb> {
        let mut root = self.root.clone();
        root.local = LocalTransform::identity();
        root.bounds_under(&Mat4::identity())
            .ok_or_else(|| Error::EmptyGeometry(self.url.clone()))
    }
}
