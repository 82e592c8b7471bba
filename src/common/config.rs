//! Collider configuration.

use crate::collision::response::{FrictionPolicy, SolverSettings};
use crate::common::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables for `Collider::update`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColliderConfig {
    /// Maximum number of detection passes per moving body per step. The
    /// first pass counts; a limit of 1 disables subsequent-collision passes.
    pub subsequent_collision_limit: usize,
    /// Uniform acceleration applied to every movable body.
    pub gravity: Vec2,
    /// How the tangential impulse is chosen.
    pub friction_policy: FrictionPolicy,
    /// Maximum solver sweeps over the contacts of one detection pass.
    pub contact_iterations: usize,
    /// Impulse change below which the contact solver stops early.
    pub contact_tolerance: f64,
    /// When set, the breakpoint hook is never called.
    pub skip_breakpoints: bool,
    /// Log unresolved penetration at `warn` instead of `debug`.
    pub warn_on_unresolved: bool,
}

impl Default for ColliderConfig {
    fn default() -> Self {
        Self {
            subsequent_collision_limit: 8,
            gravity: Vec2::ZERO,
            friction_policy: FrictionPolicy::Unconditional,
            contact_iterations: 64,
            contact_tolerance: 1e-12,
            skip_breakpoints: true,
            warn_on_unresolved: false,
        }
    }
}

impl ColliderConfig {
    #[must_use]
    pub fn with_subsequent_collision_limit(mut self, limit: usize) -> Self {
        self.subsequent_collision_limit = limit;
        self
    }

    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    #[must_use]
    pub fn with_friction_policy(mut self, policy: FrictionPolicy) -> Self {
        self.friction_policy = policy;
        self
    }

    #[must_use]
    pub fn with_contact_iterations(mut self, iterations: usize) -> Self {
        self.contact_iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_breakpoints(mut self, enabled: bool) -> Self {
        self.skip_breakpoints = !enabled;
        self
    }

    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            iterations: self.contact_iterations,
            tolerance: self.contact_tolerance,
            policy: self.friction_policy,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.subsequent_collision_limit == 0 {
            return Err(PhysicsError::InvalidConfig {
                reason: "subsequent_collision_limit must be at least 1".to_string(),
            });
        }
        if self.contact_iterations == 0 {
            return Err(PhysicsError::InvalidConfig {
                reason: "contact_iterations must be at least 1".to_string(),
            });
        }
        if !(self.contact_tolerance >= 0.0 && self.contact_tolerance.is_finite()) {
            return Err(PhysicsError::InvalidConfig {
                reason: format!(
                    "contact_tolerance must be finite and non-negative, got {}",
                    self.contact_tolerance
                ),
            });
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig {
                reason: format!("gravity must be finite, got {:?}", self.gravity),
            });
        }
        Ok(())
    }
}
