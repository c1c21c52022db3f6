use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use tandem_base::{Error, ModelId, Result};
use tandem_geometry::{EulerXyz, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelTransform {
    pub position: Vec3,
    pub rotation: EulerXyz,
    pub scale: Vec3,
    pub selected: bool,
    pub visible: bool,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 0.0),
            rotation: EulerXyz::ZERO,
            scale: Vec3::new(1.0, 1.0, 1.0),
            selected: false,
            visible: true,
        }
    }
}

impl ModelTransform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Partial update of a [`ModelTransform`]; `None` fields are left alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<EulerXyz>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl TransformPatch {
    pub fn position(position: Vec3) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn rotation(rotation: EulerXyz) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = Some(selected);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the set fields and reports whether anything changed.
    pub fn apply_to(&self, transform: &mut ModelTransform) -> bool {
        let before = *transform;
        if let Some(position) = self.position {
            transform.position = position;
        }
        if let Some(rotation) = self.rotation {
            transform.rotation = rotation;
        }
        if let Some(scale) = self.scale {
            transform.scale = scale;
        }
        if let Some(selected) = self.selected {
            transform.selected = selected;
        }
        if let Some(visible) = self.visible {
            transform.visible = visible;
        }
        before != *transform
    }
}

/// Receives every persisted transform change.
pub trait MutationSink {
    fn on_update(&mut self, id: ModelId, patch: &TransformPatch);
}

/// Told when a gesture begins on an unselected model or on a plain click.
/// Selection state itself lives with the implementor.
pub trait SelectionSink {
    fn on_select(&mut self, id: ModelId);
}

/// Pending patches, applied in arrival order by the next frame tick.
#[derive(Clone, Debug, Default)]
pub struct MutationQueue {
    pending: VecDeque<(ModelId, TransformPatch)>,
}

impl MutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: ModelId, patch: TransformPatch) {
        if !patch.is_empty() {
            self.pending.push_back((id, patch));
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (ModelId, TransformPatch)> + '_ {
        self.pending.drain(..)
    }

    /// Patches still waiting for `id`, oldest first.
    pub fn pending_for(&self, id: ModelId) -> impl Iterator<Item = &TransformPatch> + '_ {
        self.pending
            .iter()
            .filter(move |(entry, _)| *entry == id)
            .map(|(_, patch)| patch)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl MutationSink for MutationQueue {
    fn on_update(&mut self, id: ModelId, patch: &TransformPatch) {
        self.push(id, *patch);
    }
}

/// Transforms of the models in the scene, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct TransformStore {
    entries: Vec<(ModelId, ModelTransform)>,
}

impl TransformStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ModelId, transform: ModelTransform) {
        match self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            Some((_, existing)) => *existing = transform,
            None => self.entries.push((id, transform)),
        }
    }

    pub fn remove(&mut self, id: ModelId) -> Option<ModelTransform> {
        let idx = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, id: ModelId) -> Option<&ModelTransform> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, transform)| transform)
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The only write path. Returns whether the transform changed.
    pub fn update(&mut self, id: ModelId, patch: &TransformPatch) -> Result<bool> {
        let (_, transform) = self
            .entries
            .iter_mut()
            .find(|(entry, _)| *entry == id)
            .ok_or(Error::UnknownModel(id))?;
        Ok(patch.apply_to(transform))
    }
}
