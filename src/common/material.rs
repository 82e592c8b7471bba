//! Surface properties used by the response executor.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physical surface properties of a movable body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coefficient of restitution in [0, 1]. 0 is fully plastic.
    pub restitution: f64,
    /// Coulomb friction coefficient. Only read by `FrictionPolicy::Coulomb`.
    pub friction: f64,
}

impl Material {
    /// Out-of-range values are clamped.
    pub fn new(restitution: f64, friction: f64) -> Self {
        Material {
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.max(0.0),
        }
    }

    /// Fully plastic, frictionless.
    pub fn plastic() -> Self {
        Material {
            restitution: 0.0,
            friction: 0.0,
        }
    }

    /// Restitution of a contact between two materials: the less bouncy side wins.
    pub fn combined_restitution(&self, other: &Material) -> f64 {
        self.restitution.min(other.restitution)
    }

    pub fn combined_friction(&self, other: &Material) -> f64 {
        (self.friction * other.friction).sqrt()
    }
}

impl Default for Material {
    fn default() -> Self {
        Material {
            restitution: 0.2,
            friction: 0.5,
        }
    }
}
