//! Impulse-based collision response.
//!
//! For each recorded detection the executor splits the contact impulse into
//! a normal and a tangential part using both sides' `a` (compliance) and `b`
//! (contact-point velocity) coefficients, runs each part through the bodies'
//! rounding hooks and mounts the result. The contacts of one pass are solved
//! together. Positions only change at the next integration.

use tracing::{debug, trace};

use crate::collision::registry::{CollisionDetection, Counterpart};
use crate::math::vec2::Vec2;
use crate::objects::movable::MovableBody;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const GRAZING_EPSILON: f64 = 1e-12;

/// A body's response coefficients at one contact point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactCoefficients {
    /// `a`: compliance along the contact normal (`x`) and tangent (`y`).
    pub compliance: Vec2,
    /// `b`: tentative velocity of the body's material point at the contact.
    pub velocity: Vec2,
}

impl ContactCoefficients {
    /// Coefficients of a fixed body: no compliance, no velocity.
    pub const FIXED: ContactCoefficients = ContactCoefficients {
        compliance: Vec2::ZERO,
        velocity: Vec2::ZERO,
    };
}

/// How the tangential impulse is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrictionPolicy {
    /// Apply the full tangential impulse. This is the validated baseline.
    #[default]
    Unconditional,
    /// Static friction while the tangential impulse fits inside the friction
    /// cone, otherwise dynamic friction clamped to `mu * normal`.
    Coulomb,
}

impl FrictionPolicy {
    pub fn tangential_magnitude(self, parallel: f64, normal: f64, friction: f64) -> f64 {
        match self {
            FrictionPolicy::Unconditional => parallel,
            FrictionPolicy::Coulomb => {
                let limit = friction * normal.abs();
                if parallel.abs() <= limit {
                    parallel
                } else {
                    parallel.signum() * limit
                }
            }
        }
    }
}

/// Per-body adjustment of an impulse component before it is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ImpulseRounding {
    #[default]
    Identity,
    /// Drops a normal component that would pull the body into the surface.
    NoReversal,
}

impl ImpulseRounding {
    /// `normal` points away from the surface, towards the receiving body.
    pub fn apply(self, impulse: Vec2, normal: Vec2, is_normal: bool) -> Vec2 {
        match self {
            ImpulseRounding::NoReversal if is_normal && impulse.dot(normal) < 0.0 => Vec2::ZERO,
            _ => impulse,
        }
    }
}

/// The decomposed impulse for one contact, as seen by the moving body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseDecomposition {
    pub normal_projection: f64,
    pub parallel_projection: f64,
    /// `tan(angle) = parallel / normal`. `None` for a grazing contact whose
    /// normal projection is zero.
    pub friction_ratio: Option<f64>,
    pub normal_impulse: Vec2,
    pub tangential_impulse: Vec2,
}

impl ImpulseDecomposition {
    pub fn total(&self) -> Vec2 {
        self.normal_impulse + self.tangential_impulse
    }
}

/// Contact parameters the two sides agree on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactModel {
    pub restitution: f64,
    pub friction: f64,
    pub policy: FrictionPolicy,
}

/// Computes the impulse on the moving side of a contact with global
/// `normal` (pointing towards the moving body). Returns `None` for
/// separating contacts and for contacts with zero combined normal
/// compliance.
pub fn decompose(
    normal: Vec2,
    moving: &ContactCoefficients,
    passive: &ContactCoefficients,
    model: &ContactModel,
) -> Option<ImpulseDecomposition> {
    let tangent = normal.perpendicular();
    let relative = moving.velocity - passive.velocity;
    let approach = relative.dot(normal);
    if approach >= 0.0 {
        return None;
    }

    let normal_compliance = moving.compliance.x + passive.compliance.x;
    let tangent_compliance = moving.compliance.y + passive.compliance.y;
    if normal_compliance <= 0.0 {
        return None;
    }

    let normal_projection = -(1.0 + model.restitution) * approach / normal_compliance;
    let parallel_projection = if tangent_compliance > 0.0 {
        -relative.dot(tangent) / tangent_compliance
    } else {
        0.0
    };
    let friction_ratio = if normal_projection.abs() > GRAZING_EPSILON {
        Some(parallel_projection / normal_projection)
    } else {
        None
    };
    let tangential =
        model
            .policy
            .tangential_magnitude(parallel_projection, normal_projection, model.friction);

    Some(ImpulseDecomposition {
        normal_projection,
        parallel_projection,
        friction_ratio,
        normal_impulse: normal * normal_projection,
        tangential_impulse: tangent * tangential,
    })
}

/// Solver limits for the contacts of one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Maximum sweeps over the contacts of one pass.
    pub iterations: usize,
    /// Sweeps stop once no accumulated impulse changes by more than this.
    pub tolerance: f64,
    pub policy: FrictionPolicy,
}

/// One detection of a pass, paired with the effective point recorded for
/// its passive side.
#[derive(Debug, Clone, Copy)]
pub struct PassContact<'a> {
    pub detection: &'a CollisionDetection,
    pub passive_point: Vec2,
}

impl PassContact<'_> {
    fn passive(&self) -> Option<usize> {
        match self.detection.other {
            Counterpart::Fixed(_) => None,
            Counterpart::Movable(index) => Some(index),
        }
    }
}

/// Velocity change a body has picked up from impulses accumulated in the
/// current solve.
#[derive(Debug, Clone, Copy, Default)]
struct Motion {
    linear: Vec2,
    angular: f64,
}

impl Motion {
    fn push(&mut self, body: &MovableBody, arm: Vec2, impulse: Vec2) {
        let mass = body.mass();
        self.linear += impulse * mass.inv_mass;
        self.angular += arm.cross(impulse) * mass.inv_inertia;
    }
}

#[derive(Debug, Clone, Copy)]
struct Row {
    moving: usize,
    passive: Option<usize>,
    moving_arm: Vec2,
    passive_arm: Vec2,
    normal: Vec2,
    tangent: Vec2,
    compliance: Vec2,
    // Normal velocity the contact should leave with.
    target: f64,
    friction: f64,
    normal_total: f64,
    tangent_total: f64,
}

fn point_velocity(body: &MovableBody, motion: &Motion, arm: Vec2) -> Vec2 {
    body.background().point_velocity(arm)
        + motion.linear
        + Vec2::cross_scalar(motion.angular, arm)
}

fn contact_model(
    moving: &MovableBody,
    passive: Option<&MovableBody>,
    policy: FrictionPolicy,
) -> ContactModel {
    match passive {
        Some(body) => ContactModel {
            restitution: moving.material().combined_restitution(body.material()),
            friction: moving.material().combined_friction(body.material()),
            policy,
        },
        None => ContactModel {
            restitution: moving.material().restitution,
            friction: moving.material().friction,
            policy,
        },
    }
}

/// Resolves every contact of one pass together and mounts the result.
///
/// Contacts are swept in order, and each sweep reads the velocities left by
/// the impulses accumulated so far, so simultaneous contacts share one
/// velocity change instead of each cancelling it in full. Accumulated
/// normal impulses never pull (they are clamped at zero), and a contact
/// that was separating when the pass started takes no part. A lone contact
/// whose normal passes through the centre of mass gets the `decompose`
/// impulse.
///
/// Returns one entry per contact: the impulse mounted on its moving body,
/// or `None` when nothing was mounted.
pub fn respond_pass(
    contacts: &[PassContact<'_>],
    movables: &mut [MovableBody],
    settings: SolverSettings,
) -> Vec<Option<ImpulseDecomposition>> {
    let mut rows: Vec<Option<Row>> = contacts
        .iter()
        .map(|contact| setup_row(contact, movables, settings.policy))
        .collect();
    let mut motions = vec![Motion::default(); movables.len()];

    let mut sweeps = 0;
    while sweeps < settings.iterations {
        sweeps += 1;
        let mut largest: f64 = 0.0;
        for row in rows.iter_mut().flatten() {
            largest = largest.max(sweep_row(row, movables, &mut motions, settings.policy));
        }
        if largest <= settings.tolerance {
            break;
        }
    }
    trace!(contacts = contacts.len(), sweeps, "pass solved");

    rows.iter()
        .zip(contacts)
        .map(|(row, contact)| {
            let row = row.as_ref()?;
            if row.normal_total == 0.0 && row.tangent_total == 0.0 {
                return None;
            }
            let decomposition = accumulated(row);
            debug!(
                moving = contact.detection.moving,
                other = ?contact.detection.other,
                vertex = contact.detection.vertex,
                normal = decomposition.normal_projection,
                parallel = decomposition.parallel_projection,
                "contact impulse"
            );
            mount(contact, &decomposition, movables);
            Some(decomposition)
        })
        .collect()
}

fn setup_row(
    contact: &PassContact<'_>,
    movables: &[MovableBody],
    policy: FrictionPolicy,
) -> Option<Row> {
    let detection = contact.detection;
    let moving = movables.get(detection.moving)?;
    let passive = match contact.passive() {
        Some(index) => Some(movables.get(index)?),
        None => None,
    };
    let normal = detection.normal;
    let moving_coefficients = moving.contact_coefficients(detection.eff_global, normal);
    let passive_coefficients = passive.map_or(ContactCoefficients::FIXED, |body| {
        body.contact_coefficients(contact.passive_point, normal)
    });
    let model = contact_model(moving, passive, policy);
    if decompose(normal, &moving_coefficients, &passive_coefficients, &model).is_none() {
        trace!(moving = detection.moving, "separating contact, no impulse");
        return None;
    }

    let approach = (moving_coefficients.velocity - passive_coefficients.velocity).dot(normal);
    Some(Row {
        moving: detection.moving,
        passive: contact.passive(),
        moving_arm: detection.eff_global - moving.active_pose().position(),
        passive_arm: passive.map_or(Vec2::ZERO, |body| {
            contact.passive_point - body.active_pose().position()
        }),
        normal,
        tangent: normal.perpendicular(),
        compliance: moving_coefficients.compliance + passive_coefficients.compliance,
        target: -model.restitution * approach,
        friction: model.friction,
        normal_total: 0.0,
        tangent_total: 0.0,
    })
}

/// One correction of one contact. Returns the largest change made to its
/// accumulated impulses.
fn sweep_row(
    row: &mut Row,
    movables: &[MovableBody],
    motions: &mut [Motion],
    policy: FrictionPolicy,
) -> f64 {
    let moving = &movables[row.moving];
    let mut relative = point_velocity(moving, &motions[row.moving], row.moving_arm);
    if let Some(index) = row.passive {
        relative -= point_velocity(&movables[index], &motions[index], row.passive_arm);
    }

    let normal_total =
        (row.normal_total + (row.target - relative.dot(row.normal)) / row.compliance.x).max(0.0);
    let parallel = if row.compliance.y > 0.0 {
        row.tangent_total - relative.dot(row.tangent) / row.compliance.y
    } else {
        row.tangent_total
    };
    let tangent_total = policy.tangential_magnitude(parallel, normal_total, row.friction);

    let normal_change = normal_total - row.normal_total;
    let tangent_change = tangent_total - row.tangent_total;
    row.normal_total = normal_total;
    row.tangent_total = tangent_total;

    let impulse = row.normal * normal_change + row.tangent * tangent_change;
    motions[row.moving].push(moving, row.moving_arm, impulse);
    if let Some(index) = row.passive {
        motions[index].push(&movables[index], row.passive_arm, -impulse);
    }
    normal_change.abs().max(tangent_change.abs())
}

fn accumulated(row: &Row) -> ImpulseDecomposition {
    let friction_ratio = if row.normal_total.abs() > GRAZING_EPSILON {
        Some(row.tangent_total / row.normal_total)
    } else {
        None
    };
    ImpulseDecomposition {
        normal_projection: row.normal_total,
        parallel_projection: row.tangent_total,
        friction_ratio,
        normal_impulse: row.normal * row.normal_total,
        tangential_impulse: row.tangent * row.tangent_total,
    }
}

/// Rounds the impulse per body and mounts it on the moving body and,
/// inverted, on a movable passive body.
fn mount(
    contact: &PassContact<'_>,
    decomposition: &ImpulseDecomposition,
    movables: &mut [MovableBody],
) {
    let detection = contact.detection;
    let normal = detection.normal;
    if let Some(moving) = movables.get_mut(detection.moving) {
        let impulse = moving.round_away_impulse(decomposition.normal_impulse, normal, true)
            + moving.round_away_impulse(decomposition.tangential_impulse, normal, false);
        let local = moving.active_pose().to_local(detection.eff_global);
        moving.mount_impulse(impulse, local);
    }
    if let Some(body) = contact.passive().and_then(|index| movables.get_mut(index)) {
        let reaction = body.round_away_impulse(-decomposition.normal_impulse, -normal, true)
            + body.round_away_impulse(-decomposition.tangential_impulse, -normal, false);
        let local = body.active_pose().to_local(contact.passive_point);
        body.mount_impulse(reaction, local);
    }
}
