use bytes::{Buf, BufMut};
use tracing::trace;

use crate::collision::response::{ContactCoefficients, ImpulseRounding};
use crate::common::error::Result;
use crate::common::material::Material;
use crate::common::snapshot::{self, Snapshot, F64_SIZE, VEC2_SIZE};
use crate::integration::integrator::{self, StepInputs};
use crate::math::buffer::{ActiveSlot, Buffered};
use crate::math::transform::Transform;
use crate::math::vec2::Vec2;
use crate::objects::body::{Collidable, Crossing};
use crate::objects::kinematics::{BodyState, ImpulseAccumulator, MassProperties, MountedForce};
use crate::objects::pose::Pose;
use crate::shapes::Shape;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rigid bodies rotate; material-point bodies only translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyKind {
    Rigid,
    MaterialPoint,
}

// Pose (position + rotation), velocity, angular velocity.
const STATE_SIZE: usize = VEC2_SIZE + F64_SIZE + VEC2_SIZE + F64_SIZE;
// Linear, angular, count.
const IMPULSE_SIZE: usize = VEC2_SIZE + F64_SIZE + 8;

/// A body that moves: shape plus double-buffered kinematic state.
///
/// All reads during a step go through the active slot. Integration and
/// `apply_impulse` write the background slot only, and `swap_buffers` is the
/// one operation that promotes the background state. A single `ActiveSlot`
/// addresses every buffered field, so a swap is atomic across them.
#[derive(Debug, Clone, PartialEq)]
pub struct MovableBody {
    shape: Shape,
    kind: BodyKind,
    mass: MassProperties,
    material: Material,
    rounding: ImpulseRounding,
    slot: ActiveSlot,
    state: Buffered<BodyState>,
    forces: Vec<MountedForce>,
    impulses: ImpulseAccumulator,
}

impl MovableBody {
    /// A rotating body; inertia follows from `mass` and the shape's bounding
    /// radius.
    pub fn rigid(shape: impl Into<Shape>, mass: f64) -> Result<Self> {
        let shape = shape.into();
        let mass = MassProperties::rigid(mass, shape.bounding_radius_squared())?;
        Ok(Self::with_parts(shape, BodyKind::Rigid, mass))
    }

    pub fn material_point(shape: impl Into<Shape>, mass: f64) -> Result<Self> {
        let mass = MassProperties::material_point(mass)?;
        Ok(Self::with_parts(shape.into(), BodyKind::MaterialPoint, mass))
    }

    fn with_parts(shape: Shape, kind: BodyKind, mass: MassProperties) -> Self {
        Self {
            shape,
            kind,
            mass,
            material: Material::default(),
            rounding: ImpulseRounding::Identity,
            slot: ActiveSlot::default(),
            state: Buffered::new(BodyState::default()),
            forces: Vec::new(),
            impulses: ImpulseAccumulator::default(),
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.set_position(position);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        let position = self.active().pose.position();
        self.update_both(|state| state.pose.set(position, rotation));
        self
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.set_velocity(velocity);
        self
    }

    #[must_use]
    pub fn with_angular_velocity(mut self, angular_velocity: f64) -> Self {
        if self.kind == BodyKind::Rigid {
            self.update_both(|state| state.angular_velocity = angular_velocity);
        }
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    #[must_use]
    pub fn with_impulse_rounding(mut self, rounding: ImpulseRounding) -> Self {
        self.rounding = rounding;
        self
    }

    fn update_both(&mut self, f: impl Fn(&mut BodyState)) {
        let mut state = *self.active();
        f(&mut state);
        self.state.set_both(state);
    }

    /// Scene-setup teleport: writes both slots.
    pub fn set_position(&mut self, position: Vec2) {
        self.update_both(|state| state.pose.set_position(position));
    }

    /// Scene-setup velocity change: writes both slots.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.update_both(|state| state.velocity = velocity);
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn mass(&self) -> &MassProperties {
        &self.mass
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn impulse_rounding(&self) -> ImpulseRounding {
        self.rounding
    }

    pub fn active_slot(&self) -> ActiveSlot {
        self.slot
    }

    pub fn active(&self) -> &BodyState {
        self.state.active(self.slot)
    }

    pub fn background(&self) -> &BodyState {
        self.state.background(self.slot)
    }

    pub fn active_pose(&self) -> &Pose {
        &self.active().pose
    }

    pub fn background_pose(&self) -> &Pose {
        &self.background().pose
    }

    pub fn active_transform(&self) -> &Transform {
        self.active().pose.transform()
    }

    pub fn background_transform(&self) -> &Transform {
        self.background().pose.transform()
    }

    pub fn forces(&self) -> &[MountedForce] {
        &self.forces
    }

    pub fn pending_impulses(&self) -> &ImpulseAccumulator {
        &self.impulses
    }

    /// Attaches a force at a local point. Forces stay mounted across steps
    /// until `clear_forces`. No-op on an immovable body.
    pub fn mount_force(&mut self, force: Vec2, local_point: Vec2) {
        if self.mass.is_immovable() {
            return;
        }
        self.forces.push(MountedForce { force, local_point });
    }

    pub fn clear_forces(&mut self) {
        self.forces.clear();
    }

    /// Global lever arm of a local point, measured with the active pose.
    fn lever(&self, local_point: Vec2) -> Vec2 {
        self.active().pose.vector_to_global(local_point)
    }

    /// Applies an impulse now: the background velocity changes immediately,
    /// and the impulse is also kept so re-integration does not lose it.
    pub fn apply_impulse(&mut self, impulse: Vec2, local_point: Vec2) {
        if self.mass.is_immovable() {
            return;
        }
        let lever = self.lever(local_point);
        self.impulses.add(impulse, lever);
        let inv_mass = self.mass.inv_mass;
        let inv_inertia = self.mass.inv_inertia;
        let rotates = self.kind == BodyKind::Rigid;
        let background = self.state.background_mut(self.slot);
        background.velocity += impulse * inv_mass;
        if rotates {
            background.angular_velocity += lever.cross(impulse) * inv_inertia;
        }
    }

    /// Records an impulse at a local point to be folded into the next
    /// integration. Nothing changes until `integrate` runs.
    pub fn mount_impulse(&mut self, impulse: Vec2, local_point: Vec2) {
        if self.mass.is_immovable() {
            return;
        }
        let lever = self.lever(local_point);
        trace!(?impulse, ?lever, "mount impulse");
        self.impulses.add(impulse, lever);
    }

    /// Recomputes the background state from the active state, mounted
    /// forces, `gravity` and every impulse mounted this step.
    pub fn integrate(&mut self, dt: f64, gravity: Vec2) {
        let inputs = StepInputs {
            mass: &self.mass,
            forces: &self.forces,
            impulses: &self.impulses,
            gravity,
            rotates: self.kind == BodyKind::Rigid,
        };
        let next = integrator::integrate(self.active(), inputs, dt);
        *self.state.background_mut(self.slot) = next;
    }

    /// Commits the background state and starts a fresh impulse window.
    pub fn swap_buffers(&mut self) {
        self.slot.flip();
        self.impulses.clear();
    }

    /// The `a`/`b` coefficients of this body at a global contact point:
    /// compliance along the normal and its tangent, and the tentative
    /// velocity of the material point there.
    pub fn contact_coefficients(&self, point: Vec2, normal: Vec2) -> ContactCoefficients {
        let r = point - self.active().pose.position();
        let tangent = normal.perpendicular();
        ContactCoefficients {
            compliance: Vec2::new(
                self.mass.compliance(r, normal),
                self.mass.compliance(r, tangent),
            ),
            velocity: self.background().point_velocity(r),
        }
    }

    /// Hook applied to each impulse component before it is mounted.
    /// `normal` is the contact normal pointing towards this body.
    pub fn round_away_impulse(&self, impulse: Vec2, normal: Vec2, is_normal: bool) -> Vec2 {
        self.rounding.apply(impulse, normal, is_normal)
    }

    /// Global positions of every c-vertex in the active and background
    /// slots, in c-vertex order.
    pub fn swept_vertices(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let active = self.active_pose();
        let background = self.background_pose();
        self.shape
            .c_vertices()
            .map(move |v| (active.to_global(v), background.to_global(v)))
    }
}

impl Collidable for MovableBody {
    fn polygon_element_count(&self) -> usize {
        self.shape.polygon_element_count()
    }

    fn element_vertices(&self, i: usize) -> &[Vec2] {
        self.shape.element_vertices(i)
    }

    fn surface_test(&self, pre: Vec2, post: Vec2) -> bool {
        self.shape.swept_hit(pre, post).is_some()
    }

    fn surface_normal(&self, pre: Vec2, post: Vec2) -> Vec2 {
        self.shape
            .swept_hit(pre, post)
            .map_or(Vec2::ZERO, |hit| hit.normal)
    }

    fn effective_point(&self, pre: Vec2, post: Vec2) -> Vec2 {
        self.shape.swept_hit(pre, post).map_or(pre, |hit| hit.point)
    }

    fn crossing(&self, pre: Vec2, post: Vec2) -> Option<Crossing> {
        self.shape.swept_hit(pre, post).map(Crossing::from)
    }
}

fn put_state<B: BufMut>(buf: &mut B, state: &BodyState) {
    snapshot::put_vec2(buf, state.pose.position());
    buf.put_f64_le(state.pose.rotation());
    snapshot::put_vec2(buf, state.velocity);
    buf.put_f64_le(state.angular_velocity);
}

fn get_state<B: Buf>(buf: &mut B) -> BodyState {
    let position = snapshot::get_vec2(buf);
    let rotation = buf.get_f64_le();
    let velocity = snapshot::get_vec2(buf);
    let angular_velocity = buf.get_f64_le();
    BodyState {
        pose: Pose::new(position, rotation),
        velocity,
        angular_velocity,
    }
}

impl Snapshot for MovableBody {
    fn snapshot_size(&self) -> usize {
        2 * STATE_SIZE + IMPULSE_SIZE
    }

    /// Active state, background state, then the pending impulses.
    fn store<B: BufMut>(&self, buf: &mut B) {
        put_state(buf, self.active());
        put_state(buf, self.background());
        snapshot::put_vec2(buf, self.impulses.linear);
        buf.put_f64_le(self.impulses.angular);
        buf.put_u64_le(self.impulses.count as u64);
    }

    fn restore(&mut self, buf: &[u8]) -> Result<()> {
        snapshot::ensure_len(buf, self.snapshot_size())?;
        let mut cursor = buf;
        let active = get_state(&mut cursor);
        let background = get_state(&mut cursor);
        let linear = snapshot::get_vec2(&mut cursor);
        let angular = cursor.get_f64_le();
        let count = cursor.get_u64_le() as usize;

        self.state.set_both(active);
        *self.state.background_mut(self.slot) = background;
        self.impulses = ImpulseAccumulator {
            linear,
            angular,
            count,
        };
        Ok(())
    }
}
