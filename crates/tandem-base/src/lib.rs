use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod config;

pub use config::{
    AlignmentAxis, AlignmentConfig, CacheConfig, DragConfig, DragMapping, EdgeContact,
    HeightConfig, RotationConfig, SceneConfig, ViewCubeConfig,
};

/// Identity of one composite model in the scene.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelId(Uuid);

impl ModelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unknown model: {0}")]
    UnknownModel(ModelId),
    #[error("failed to load {url}: {reason}")]
    LoadFailed { url: String, reason: String },
    #[error("mesh has no vertices: {0}")]
    EmptyGeometry(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_nan() || value <= 0.0 {
        return Err(Error::InvalidParameter(format!("{name} must be > 0")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_positive_rejects_zero_and_nan() {
        assert!(ensure_positive("size", 1.0).is_ok());
        assert!(ensure_positive("size", 0.0).is_err());
        assert!(ensure_positive("size", f64::NAN).is_err());
    }

    #[test]
    fn model_ids_are_distinct() {
        assert_ne!(ModelId::new(), ModelId::new());
    }
}
