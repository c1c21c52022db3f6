//! Offsets that turn three independently loaded meshes into one composite
//! model: a full reference mesh that fixes the ground line, an aligned part
//! that gets pushed flush against an anchor part, and the pivot that tilt
//! rotations turn about.

use cgmath::Matrix4;
use tracing::{debug, warn};

use tandem_base::{AlignmentAxis, AlignmentConfig, EdgeContact, Result};

use crate::bounds::Aabb;
use crate::math::EulerXyz;
use crate::{Mat4, Point3, Vec3};

const PIVOT_CONTAINMENT_EPS: f64 = 1.0e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlignmentRule {
    pub axis: AlignmentAxis,
    pub contact: EdgeContact,
    pub vertical_nudge_fraction: f64,
}

impl Default for AlignmentRule {
    fn default() -> Self {
        Self::from(&AlignmentConfig::default())
    }
}

impl From<&AlignmentConfig> for AlignmentRule {
    fn from(config: &AlignmentConfig) -> Self {
        Self {
            axis: config.axis,
            contact: config.contact,
            vertical_nudge_fraction: config.vertical_nudge_fraction,
        }
    }
}

impl AlignmentRule {
    fn axis_vector(&self) -> Vec3 {
        match self.axis {
            AlignmentAxis::X => Vec3::unit_x(),
            AlignmentAxis::Z => Vec3::unit_z(),
        }
    }

    fn component(&self, p: Point3) -> f64 {
        match self.axis {
            AlignmentAxis::X => p.x,
            AlignmentAxis::Z => p.z,
        }
    }

    /// Distance along the rule's axis that brings `aligned` edge to edge with `anchor`.
    pub fn horizontal_offset(&self, aligned: &Aabb, anchor: &Aabb) -> f64 {
        match self.contact {
            EdgeContact::MinOntoMax => self.component(anchor.max) - self.component(aligned.min),
            EdgeContact::MaxOntoMin => self.component(anchor.min) - self.component(aligned.max),
        }
    }

    pub fn vertical_nudge(&self, aligned: &Aabb) -> f64 {
        self.vertical_nudge_fraction * aligned.height()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeOffsets {
    /// Lifts the whole composite so the reference mesh rests on y = 0.
    pub ground_offset: Vec3,
    pub aligned_offset: Vec3,
    pub anchor_offset: Vec3,
    /// Tilt centre, in the frame before `ground_offset` is applied.
    pub rotation_pivot: Point3,
    /// Union of both parts after their offsets, before `ground_offset`.
    pub union_bounds: Aabb,
}

impl CompositeOffsets {
    pub fn from_bounds(
        reference: &Aabb,
        aligned: &Aabb,
        anchor: &Aabb,
        rule: &AlignmentRule,
    ) -> Self {
        let ground_offset = Vec3::new(0.0, -reference.min.y, 0.0);
        let aligned_offset = rule.axis_vector() * rule.horizontal_offset(aligned, anchor)
            + Vec3::unit_y() * rule.vertical_nudge(aligned);
        let anchor_offset = Vec3::new(0.0, 0.0, 0.0);

        let placed = aligned.translated(aligned_offset);
        let union_bounds = placed.union(anchor.translated(anchor_offset));
        Self {
            ground_offset,
            aligned_offset,
            anchor_offset,
            rotation_pivot: placed.center(),
            union_bounds,
        }
    }

    pub fn compute(sources: &CompositeSources<'_>, rule: &AlignmentRule) -> Result<Self> {
        let reference = sources.reference.detached_bounds()?;
        let aligned = sources.aligned.detached_bounds()?;
        let anchor = sources.anchor.detached_bounds()?;
        let offsets = Self::from_bounds(&reference, &aligned, &anchor, rule);
        if !offsets.pivot_in_union() {
            warn!(pivot = ?offsets.rotation_pivot, "composite pivot outside part bounds");
        }
        Ok(offsets)
    }

    pub fn pivot_in_union(&self) -> bool {
        self.union_bounds
            .contains(self.rotation_pivot, PIVOT_CONTAINMENT_EPS)
    }

    /// Pivot with the ground offset re-added, as used at render time.
    pub fn world_pivot(&self) -> Point3 {
        self.rotation_pivot + self.ground_offset
    }

    /// Composite-to-world matrix: yaw turns about the composite origin,
    /// pitch and roll turn about the pivot.
    pub fn composite_matrix(&self, position: Vec3, rotation: EulerXyz) -> Mat4 {
        let pivot = self.rotation_pivot - Point3::new(0.0, 0.0, 0.0);
        Matrix4::from_translation(position + self.ground_offset)
            * Matrix4::from(rotation.yaw_quat())
            * Matrix4::from_translation(pivot)
            * Matrix4::from(rotation.tilt_quat())
            * Matrix4::from_translation(-pivot)
    }

    pub fn aligned_matrix(&self, position: Vec3, rotation: EulerXyz) -> Mat4 {
        self.composite_matrix(position, rotation) * Matrix4::from_translation(self.aligned_offset)
    }

    pub fn anchor_matrix(&self, position: Vec3, rotation: EulerXyz) -> Mat4 {
        self.composite_matrix(position, rotation) * Matrix4::from_translation(self.anchor_offset)
    }
}

/// The three meshes one composite model is assembled from.
#[derive(Clone, Copy, Debug)]
pub struct CompositeSources<'a> {
    pub reference: &'a crate::MeshHierarchy,
    pub aligned: &'a crate::MeshHierarchy,
    pub anchor: &'a crate::MeshHierarchy,
}

impl CompositeSources<'_> {
    fn identity(&self) -> [String; 3] {
        [
            self.reference.url().to_string(),
            self.aligned.url().to_string(),
            self.anchor.url().to_string(),
        ]
    }
}

/// Keeps the offsets of one composite and recomputes them only when one of
/// the source URLs changes.
#[derive(Clone, Debug)]
pub struct CompositeAligner {
    rule: AlignmentRule,
    identity: Option<[String; 3]>,
    offsets: Option<CompositeOffsets>,
    computations: usize,
}

impl CompositeAligner {
    pub fn new(rule: AlignmentRule) -> Self {
        Self {
            rule,
            identity: None,
            offsets: None,
            computations: 0,
        }
    }

    pub fn rule(&self) -> &AlignmentRule {
        &self.rule
    }

    pub fn offsets(&self) -> Option<&CompositeOffsets> {
        self.offsets.as_ref()
    }

    /// Number of times the offsets were actually recomputed.
    pub fn computations(&self) -> usize {
        self.computations
    }

    pub fn invalidate(&mut self) {
        self.identity = None;
        self.offsets = None;
    }

    pub fn refresh(&mut self, sources: &CompositeSources<'_>) -> Result<CompositeOffsets> {
        let identity = sources.identity();
        if let (Some(current), Some(offsets)) = (&self.identity, self.offsets) {
            if *current == identity {
                return Ok(offsets);
            }
        }
        let offsets = CompositeOffsets::compute(sources, &self.rule)?;
        debug!(
            reference = %identity[0],
            aligned = %identity[1],
            anchor = %identity[2],
            "composite offsets recomputed"
        );
        self.identity = Some(identity);
        self.offsets = Some(offsets);
        self.computations += 1;
        Ok(offsets)
    }
}
