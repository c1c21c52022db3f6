//! Tunables for the editor core.
//!
//! Every section carries `#[serde(default)]` so a host can override a single
//! value in JSON and inherit the rest.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, ensure_positive};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Edge length of the square ground region centred on the origin.
    pub ground_size: f64,
    pub drag: DragConfig,
    pub rotation: RotationConfig,
    pub height: HeightConfig,
    pub alignment: AlignmentConfig,
    pub view_cube: ViewCubeConfig,
    pub cache: CacheConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            ground_size: 20.0,
            drag: DragConfig::default(),
            rotation: RotationConfig::default(),
            height: HeightConfig::default(),
            alignment: AlignmentConfig::default(),
            view_cube: ViewCubeConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("ground_size", self.ground_size)?;

        ensure_positive("drag.move_speed", self.drag.move_speed)?;
        ensure_positive("drag.reference_distance", self.drag.reference_distance)?;
        ensure_positive("drag.min_distance_factor", self.drag.min_distance_factor)?;
        if self.drag.max_distance_factor < self.drag.min_distance_factor {
            return Err(Error::InvalidParameter(
                "drag.max_distance_factor must be >= drag.min_distance_factor".to_string(),
            ));
        }
        if self.drag.max_object_pointers == 0 {
            return Err(Error::InvalidParameter(
                "drag.max_object_pointers must be > 0".to_string(),
            ));
        }

        ensure_positive("rotation.responsiveness", self.rotation.responsiveness)?;
        ensure_fraction("rotation.cap_fraction", self.rotation.cap_fraction)?;
        ensure_positive("rotation.epsilon", self.rotation.epsilon)?;

        ensure_positive("height.speed", self.height.speed)?;
        if let Some(max) = self.height.max_height {
            ensure_positive("height.max_height", max)?;
        }

        if !self.alignment.vertical_nudge_fraction.is_finite() {
            return Err(Error::InvalidParameter(
                "alignment.vertical_nudge_fraction must be finite".to_string(),
            ));
        }

        ensure_positive("view_cube.drag_speed", self.view_cube.drag_speed)?;
        ensure_fraction("view_cube.damping", self.view_cube.damping)?;
        ensure_positive("view_cube.stop_velocity", self.view_cube.stop_velocity)?;
        if self.view_cube.release_velocity < self.view_cube.stop_velocity {
            return Err(Error::InvalidParameter(
                "view_cube.release_velocity must be >= view_cube.stop_velocity".to_string(),
            ));
        }
        ensure_positive(
            "view_cube.navigation_distance",
            self.view_cube.navigation_distance,
        )?;
        ensure_positive(
            "view_cube.navigation_duration",
            self.view_cube.navigation_duration,
        )?;

        ensure_positive("cache.max_age_secs", self.cache.max_age_secs)?;
        Ok(())
    }
}

fn ensure_fraction(name: &str, value: f64) -> Result<()> {
    if value.is_nan() || value <= 0.0 || value >= 1.0 {
        return Err(Error::InvalidParameter(format!("{name} must be in (0, 1)")));
    }
    Ok(())
}

/// How a single-contact drag maps screen pixels onto the ground plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMapping {
    /// Camera right/up flattened onto the ground.
    CameraRelative,
    /// Screen x onto world +X, screen y onto world +Z.
    FixedAxis,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub mapping: DragMapping,
    /// World units per pixel at `reference_distance`.
    pub move_speed: f64,
    pub reference_distance: f64,
    pub min_distance_factor: f64,
    pub max_distance_factor: f64,
    /// Moves shorter than this (pixels) are dropped.
    pub debounce_px: f64,
    /// Gestures that never travel further than this (pixels) are clicks.
    pub tap_threshold_px: f64,
    /// Contacts above this count fall through to the camera orbit.
    pub max_object_pointers: usize,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            mapping: DragMapping::CameraRelative,
            move_speed: 0.01,
            reference_distance: 15.0,
            min_distance_factor: 0.5,
            max_distance_factor: 2.0,
            debounce_px: 0.5,
            tap_threshold_px: 4.0,
            max_object_pointers: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Per-second approach rate toward the target rotation.
    pub responsiveness: f64,
    /// Upper bound on the fraction of the remaining angle covered in one frame.
    pub cap_fraction: f64,
    /// Radians under which an axis counts as settled.
    pub epsilon: f64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            responsiveness: 8.0,
            cap_fraction: 0.5,
            epsilon: 1.0e-3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightConfig {
    /// World units per second while a height button is held.
    pub speed: f64,
    pub max_height: Option<f64>,
}

impl Default for HeightConfig {
    fn default() -> Self {
        Self {
            speed: 1.5,
            max_height: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentAxis {
    X,
    Z,
}

/// Which bounding edge of the aligned part lands on which edge of the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeContact {
    /// Aligned part's min edge onto the anchor's max edge.
    MinOntoMax,
    /// Aligned part's max edge onto the anchor's min edge.
    MaxOntoMin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub axis: AlignmentAxis,
    pub contact: EdgeContact,
    /// Vertical shift of the aligned part as a fraction of its own height.
    pub vertical_nudge_fraction: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            axis: AlignmentAxis::X,
            contact: EdgeContact::MinOntoMax,
            vertical_nudge_fraction: -1.0 / 6.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewCubeConfig {
    /// Radians of camera rotation per pixel of widget drag.
    pub drag_speed: f64,
    /// Velocity multiplier applied every damping tick.
    pub damping: f64,
    /// Minimum release speed (pixels per tick) that starts inertia.
    pub release_velocity: f64,
    /// Inertia stops once speed drops below this.
    pub stop_velocity: f64,
    /// Pixels of travel before a widget press becomes a drag.
    pub click_threshold_px: f64,
    pub navigation_distance: f64,
    /// Seconds.
    pub navigation_duration: f64,
    pub target: [f64; 3],
}

impl Default for ViewCubeConfig {
    fn default() -> Self {
        Self {
            drag_speed: 0.01,
            damping: 0.92,
            release_velocity: 0.5,
            stop_velocity: 0.05,
            click_threshold_px: 3.0,
            navigation_distance: 15.0,
            navigation_duration: 0.5,
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_age_secs: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 300.0,
        }
    }
}
