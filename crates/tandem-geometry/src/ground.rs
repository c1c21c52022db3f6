use tandem_base::{Result, ensure_positive};

use crate::Vec3;

/// Square placement region `[-size/2, size/2]` on X and Z, centred on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundBounds {
    size: f64,
}

impl GroundBounds {
    pub fn new(size: f64) -> Result<Self> {
        ensure_positive("ground size", size)?;
        Ok(Self { size })
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn half_extent(&self) -> f64 {
        self.size * 0.5
    }

    pub fn clamp_axis(&self, value: f64) -> f64 {
        let half = self.half_extent();
        value.clamp(-half, half)
    }

    /// Clamps X and Z; Y passes through.
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        Vec3::new(
            self.clamp_axis(position.x),
            position.y,
            self.clamp_axis(position.z),
        )
    }

    pub fn contains(&self, position: Vec3) -> bool {
        let half = self.half_extent();
        position.x.abs() <= half && position.z.abs() <= half
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_is_idempotent() -> Result<()> {
        let ground = GroundBounds::new(10.0)?;
        let once = ground.clamp(Vec3::new(12.0, 3.0, -40.0));
        assert_eq!(once, Vec3::new(5.0, 3.0, -5.0));
        assert_eq!(ground.clamp(once), once);
        assert!(ground.contains(once));
        Ok(())
    }

    #[test]
    fn rejects_non_positive_size() {
        assert!(GroundBounds::new(0.0).is_err());
    }
}
