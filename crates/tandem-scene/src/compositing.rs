//! Draw-order and depth parameters for the rendered parts of the composite
//! models. Two models can overlap while translucent, so each part gets its
//! own render slot: a distinct render order and, when translucent, a
//! distinct polygon offset.

use serde::{Deserialize, Serialize};

/// Per-model look supplied by the host application.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialTheme {
    pub color: [f32; 3],
    pub opacity: f32,
    pub wireframe: bool,
    pub render_order: i32,
    pub depth_write: bool,
}

impl Default for MaterialTheme {
    fn default() -> Self {
        Self {
            color: [0.8, 0.8, 0.8],
            opacity: 1.0,
            wireframe: false,
            render_order: 0,
            depth_write: true,
        }
    }
}

impl MaterialTheme {
    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// The two rendered parts of a composite model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositePart {
    Aligned,
    Anchor,
}

impl CompositePart {
    pub const ALL: [CompositePart; 2] = [CompositePart::Aligned, CompositePart::Anchor];

    fn index(self) -> usize {
        match self {
            CompositePart::Aligned => 0,
            CompositePart::Anchor => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonOffset {
    pub factor: f32,
    pub units: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositeMaterial {
    pub color: [f32; 3],
    pub opacity: f32,
    pub wireframe: bool,
    pub render_order: i32,
    pub depth_write: bool,
    pub depth_test: bool,
    pub polygon_offset: Option<PolygonOffset>,
}

/// Render slots each model occupies.
const SLOTS_PER_MODEL: usize = CompositePart::ALL.len();
/// Selected models draw after everything else.
const SELECTED_ORDER_BOOST: i32 = 100;

pub fn render_slot(model_index: usize, part: CompositePart) -> usize {
    model_index * SLOTS_PER_MODEL + part.index()
}

/// Resolves the material for one part. Translucent and wireframe parts
/// never write depth so the part behind stays visible; translucent parts
/// get a slot-dependent polygon offset to keep coplanar faces apart.
pub fn composite_material(
    theme: &MaterialTheme,
    model_index: usize,
    part: CompositePart,
    selected: bool,
) -> CompositeMaterial {
    let slot = render_slot(model_index, part);
    let translucent = theme.is_translucent();
    let mut render_order = theme.render_order + slot as i32;
    if selected {
        render_order += SELECTED_ORDER_BOOST;
    }
    let polygon_offset = translucent.then(|| {
        let step = (slot + 1) as f32;
        PolygonOffset {
            factor: step,
            units: step,
        }
    });
    CompositeMaterial {
        color: theme.color,
        opacity: theme.opacity.clamp(0.0, 1.0),
        wireframe: theme.wireframe,
        render_order,
        depth_write: theme.depth_write && !translucent && !theme.wireframe,
        depth_test: true,
        polygon_offset,
    }
}
