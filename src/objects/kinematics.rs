use crate::common::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;
use crate::objects::pose::Pose;

/// Mass and rotational inertia with their cached inverses.
///
/// Infinite mass is valid and makes the body immovable: both inverses are
/// zero, so impulses and forces are absorbed without effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub mass: f64,
    pub inv_mass: f64,
    /// `None` for material-point bodies, which never rotate.
    pub inertia: Option<f64>,
    pub inv_inertia: f64,
}

impl MassProperties {
    /// Mass properties of a rigid body whose inertia is derived from its
    /// bounding radius: `I = m * r^2 / 2`.
    pub fn rigid(mass: f64, bounding_radius_squared: f64) -> Result<Self> {
        let inv_mass = Self::checked_inverse_mass(mass)?;
        let inertia = 0.5 * mass * bounding_radius_squared;
        let inv_inertia = if inertia.is_finite() && inertia > 0.0 {
            1.0 / inertia
        } else {
            0.0
        };
        Ok(Self {
            mass,
            inv_mass,
            inertia: Some(inertia),
            inv_inertia,
        })
    }

    /// Mass properties of a non-rotating material-point body.
    pub fn material_point(mass: f64) -> Result<Self> {
        let inv_mass = Self::checked_inverse_mass(mass)?;
        Ok(Self {
            mass,
            inv_mass,
            inertia: None,
            inv_inertia: 0.0,
        })
    }

    fn checked_inverse_mass(mass: f64) -> Result<f64> {
        // `!(mass > 0.0)` also rejects NaN.
        if !(mass > 0.0) {
            return Err(PhysicsError::InvalidMass(mass));
        }
        Ok(if mass.is_infinite() { 0.0 } else { 1.0 / mass })
    }

    pub fn is_immovable(&self) -> bool {
        self.inv_mass == 0.0
    }

    /// Resistance-free response along `direction` at lever arm `r`:
    /// `1/m + (r x d)^2 / I`.
    pub fn compliance(&self, r: Vec2, direction: Vec2) -> f64 {
        let arm = r.cross(direction);
        self.inv_mass + arm * arm * self.inv_inertia
    }
}

/// The per-slot kinematic state of a movable body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyState {
    pub pose: Pose,
    pub velocity: Vec2,
    pub angular_velocity: f64,
}

impl BodyState {
    /// Velocity of the material point at global lever arm `r`.
    pub fn point_velocity(&self, r: Vec2) -> Vec2 {
        self.velocity + Vec2::cross_scalar(self.angular_velocity, r)
    }
}

/// A force attached at a point given in the body's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountedForce {
    pub force: Vec2,
    pub local_point: Vec2,
}

/// Impulses mounted during the current step, folded into every integration
/// until the buffers are swapped.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImpulseAccumulator {
    pub linear: Vec2,
    pub angular: f64,
    pub count: usize,
}

impl ImpulseAccumulator {
    pub fn add(&mut self, impulse: Vec2, lever: Vec2) {
        self.linear += impulse;
        self.angular += lever.cross(impulse);
        self.count += 1;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_rigid_mass_properties() {
        let props = MassProperties::rigid(2.0, 0.5).unwrap();
        assert!((props.inv_mass - 0.5).abs() < EPSILON);
        assert!((props.inertia.unwrap() - 0.5).abs() < EPSILON);
        assert!((props.inv_inertia - 2.0).abs() < EPSILON);
        assert!(!props.is_immovable());
    }

    #[test]
    fn test_infinite_mass_is_immovable() {
        let props = MassProperties::rigid(f64::INFINITY, 1.0).unwrap();
        assert!(props.is_immovable());
        assert_eq!(props.inv_inertia, 0.0);
        assert_eq!(props.compliance(Vec2::new(1.0, 1.0), Vec2::Y), 0.0);
    }

    #[test]
    fn test_invalid_masses_are_rejected() {
        assert_eq!(
            MassProperties::rigid(0.0, 1.0).unwrap_err(),
            PhysicsError::InvalidMass(0.0)
        );
        assert!(MassProperties::material_point(-3.0).is_err());
        assert!(MassProperties::material_point(f64::NAN).is_err());
    }

    #[test]
    fn test_material_point_has_no_inertia() {
        let props = MassProperties::material_point(4.0).unwrap();
        assert_eq!(props.inertia, None);
        // Lever arm does not matter without rotation.
        assert!((props.compliance(Vec2::new(3.0, 0.0), Vec2::Y) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_compliance_includes_lever_arm() {
        let props = MassProperties::rigid(1.0, 0.5).unwrap(); // I = 0.25
        // Corner of a unit box pushed along +y: (r x n)^2 = 0.25.
        let k = props.compliance(Vec2::new(-0.5, -0.5), Vec2::Y);
        assert!((k - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_point_velocity() {
        let state = BodyState {
            velocity: Vec2::new(1.0, 0.0),
            angular_velocity: 2.0,
            ..BodyState::default()
        };
        let v = state.point_velocity(Vec2::new(0.0, 1.0));
        assert!((v - Vec2::new(-1.0, 0.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_impulse_accumulator() {
        let mut acc = ImpulseAccumulator::default();
        assert!(acc.is_empty());
        acc.add(Vec2::new(0.0, 2.0), Vec2::new(1.0, 0.0));
        acc.add(Vec2::new(1.0, 0.0), Vec2::ZERO);
        assert_eq!(acc.linear, Vec2::new(1.0, 2.0));
        assert!((acc.angular - 2.0).abs() < EPSILON);
        assert_eq!(acc.count, 2);
        acc.clear();
        assert!(acc.is_empty());
    }
}
