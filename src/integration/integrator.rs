use crate::math::vec2::Vec2;
use crate::objects::kinematics::{BodyState, ImpulseAccumulator, MassProperties, MountedForce};
use crate::objects::pose::Pose;

/// Everything a tentative step reads besides the active state.
#[derive(Debug, Clone, Copy)]
pub struct StepInputs<'a> {
    pub mass: &'a MassProperties,
    pub forces: &'a [MountedForce],
    pub impulses: &'a ImpulseAccumulator,
    pub gravity: Vec2,
    pub rotates: bool,
}

/// Semi-implicit Euler from `active` to a new tentative state.
///
/// Velocity absorbs forces, gravity and every impulse mounted this step;
/// the pose then advances with the new velocity. `active` is never touched:
/// the result goes into the background slot.
pub fn integrate(active: &BodyState, inputs: StepInputs<'_>, dt: f64) -> BodyState {
    if inputs.mass.is_immovable() {
        return *active;
    }

    let mut force = Vec2::ZERO;
    let mut torque = 0.0;
    for mounted in inputs.forces {
        force += mounted.force;
        let lever = active.pose.vector_to_global(mounted.local_point);
        torque += lever.cross(mounted.force);
    }

    let linear_acceleration = force * inputs.mass.inv_mass + inputs.gravity;
    let velocity = active.velocity
        + linear_acceleration * dt
        + inputs.impulses.linear * inputs.mass.inv_mass;
    let position = active.pose.position() + velocity * dt;

    let (angular_velocity, rotation) = if inputs.rotates {
        let w = active.angular_velocity
            + torque * inputs.mass.inv_inertia * dt
            + inputs.impulses.angular * inputs.mass.inv_inertia;
        (w, wrap_angle(active.pose.rotation() + w * dt))
    } else {
        (0.0, active.pose.rotation())
    };

    BodyState {
        pose: Pose::new(position, rotation),
        velocity,
        angular_velocity,
    }
}

/// Wraps an angle in radians to the range [-PI, PI].
fn wrap_angle(angle: f64) -> f64 {
    angle.sin().atan2(angle.cos())
}
