use tracing::{debug, trace, warn};

use crate::collision::detector::{self, DetectionPass, DetectionState};
use crate::collision::hook::{BreakpointHook, NoopBreakpoint};
use crate::collision::registry::{Counterpart, DetectionId, DetectionRegistry};
use crate::collision::response::{self, PassContact};
use crate::common::config::ColliderConfig;
use crate::common::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;
use crate::objects::body::FixedBody;
use crate::objects::movable::MovableBody;

/// What one `update` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Detection passes run, over all moving bodies.
    pub passes: usize,
    pub detections: usize,
    /// Contacts that mounted an impulse.
    pub impulses: usize,
    /// Impulses mounted on a body while it was the passive side of a contact.
    pub passive_impulses: usize,
    /// Bodies that reached the subsequent-collision limit with detections
    /// still present, in processing order.
    pub unresolved: Vec<usize>,
    /// Bodies whose tentative state was changed by a reaction impulse after
    /// their own detection loop had finished. Their committed state was not
    /// re-checked and may penetrate.
    pub disturbed: Vec<usize>,
}

impl StepReport {
    pub fn is_quiet(&self) -> bool {
        self.detections == 0
    }
}

/// Counters accumulated over the collider's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColliderStats {
    pub steps: u64,
    pub detections: u64,
    pub impulses: u64,
    pub unresolved: u64,
    pub disturbed: u64,
}

/// The step scheduler: owns every participant and advances the scene one
/// fixed tick per `update`.
pub struct Collider {
    fixed: Vec<Box<dyn FixedBody>>,
    movables: Vec<MovableBody>,
    config: ColliderConfig,
    registry: DetectionRegistry,
    hook: Box<dyn BreakpointHook>,
    stats: ColliderStats,
}

impl Collider {
    /// Creates an empty collider with the default configuration.
    pub fn new() -> Self {
        Self::build(ColliderConfig::default())
    }

    pub fn with_config(config: ColliderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ColliderConfig) -> Self {
        Self {
            fixed: Vec::new(),
            movables: Vec::new(),
            config,
            registry: DetectionRegistry::new(),
            hook: Box::new(NoopBreakpoint),
            stats: ColliderStats::default(),
        }
    }

    /// Registers a fixed body and returns its index.
    pub fn add_fixed(&mut self, body: impl FixedBody + 'static) -> usize {
        let id = self.fixed.len();
        self.fixed.push(Box::new(body));
        id
    }

    /// Registers a movable body and returns its index. Bodies are processed
    /// in registration order.
    pub fn add_movable(&mut self, body: MovableBody) -> usize {
        let id = self.movables.len();
        self.movables.push(body);
        id
    }

    pub fn set_subsequent_collision_limit(&mut self, limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(PhysicsError::InvalidConfig {
                reason: "subsequent_collision_limit must be at least 1".to_string(),
            });
        }
        self.config.subsequent_collision_limit = limit;
        Ok(())
    }

    pub fn set_breakpoint_hook(&mut self, hook: Box<dyn BreakpointHook>) {
        self.hook = hook;
    }

    pub fn set_breakpoints_enabled(&mut self, enabled: bool) {
        self.config.skip_breakpoints = !enabled;
    }

    pub fn config(&self) -> &ColliderConfig {
        &self.config
    }

    pub fn stats(&self) -> ColliderStats {
        self.stats
    }

    pub fn fixed_bodies(&self) -> &[Box<dyn FixedBody>] {
        &self.fixed
    }

    pub fn movables(&self) -> &[MovableBody] {
        &self.movables
    }

    pub fn movable(&self, id: usize) -> Option<&MovableBody> {
        let body = self.movables.get(id);
        if body.is_none() {
            warn!(id, "no movable body with this id");
        }
        body
    }

    pub fn movable_mut(&mut self, id: usize) -> Result<&mut MovableBody> {
        self.movables
            .get_mut(id)
            .ok_or(PhysicsError::UnknownBody(id))
    }

    /// Detections recorded during the last `update`, conjugates included.
    pub fn detections(&self) -> &DetectionRegistry {
        &self.registry
    }

    /// Mounts a persistent force on a movable body. Unknown ids are logged
    /// and ignored.
    pub fn mount_force(&mut self, id: usize, force: Vec2, local_point: Vec2) {
        match self.movable_mut(id) {
            Ok(body) => body.mount_force(force, local_point),
            Err(err) => warn!(%err, "mount_force ignored"),
        }
    }

    pub fn clear_forces(&mut self, id: usize) {
        match self.movable_mut(id) {
            Ok(body) => body.clear_forces(),
            Err(err) => warn!(%err, "clear_forces ignored"),
        }
    }

    /// Advances the scene by `dt`. A non-positive or non-finite `dt` is
    /// logged and leaves the scene untouched.
    pub fn update(&mut self, dt: f64) -> StepReport {
        match self.try_update(dt) {
            Ok(report) => report,
            Err(err) => {
                warn!(%err, "step skipped");
                StepReport::default()
            }
        }
    }

    pub fn try_update(&mut self, dt: f64) -> Result<StepReport> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::InvalidTimestep(dt));
        }

        self.registry.clear();
        let gravity = self.config.gravity;
        for body in self.movables.iter_mut() {
            body.integrate(dt, gravity);
        }

        let mut report = StepReport::default();
        for index in 0..self.movables.len() {
            self.resolve_body(index, dt, &mut report);
        }

        for body in self.movables.iter_mut() {
            body.swap_buffers();
        }

        self.stats.steps += 1;
        self.stats.detections += report.detections as u64;
        self.stats.impulses += report.impulses as u64;
        self.stats.unresolved += report.unresolved.len() as u64;
        self.stats.disturbed += report.disturbed.len() as u64;
        debug!(
            passes = report.passes,
            detections = report.detections,
            impulses = report.impulses,
            unresolved = report.unresolved.len(),
            disturbed = report.disturbed.len(),
            "step committed"
        );
        Ok(report)
    }

    /// Detect/respond loop of one moving body.
    fn resolve_body(&mut self, index: usize, dt: f64, report: &mut StepReport) {
        let limit = self.config.subsequent_collision_limit;
        let gravity = self.config.gravity;
        let mut state = DetectionState::Integrated;
        let mut pass = 0;

        loop {
            pass += 1;
            state = transition(index, state, DetectionState::Detecting);
            report.passes += 1;

            let hook = if self.config.skip_breakpoints {
                None
            } else {
                Some(self.hook.as_mut())
            };
            let scene = DetectionPass {
                fixed: &self.fixed,
                movables: &self.movables,
                hook,
                pass,
            };
            let found = detector::detect(index, scene, &mut self.registry);
            if found.is_empty() {
                transition(index, state, DetectionState::NoCollision);
                return;
            }
            state = transition(index, state, DetectionState::CollisionsFound);
            report.detections += found.len();
            debug!(body = index, pass, detections = found.len(), "collisions found");

            let (mounted, touched) = self.respond(&found, report);
            self.movables[index].integrate(dt, gravity);
            for &other in &touched {
                self.movables[other].integrate(dt, gravity);
                // Bodies before `index` have already finished their own loop.
                if other < index && !report.disturbed.contains(&other) {
                    report.disturbed.push(other);
                    if self.config.warn_on_unresolved {
                        warn!(body = other, by = index, "reaction after detection loop");
                    } else {
                        debug!(body = other, by = index, "reaction after detection loop");
                    }
                }
            }
            state = transition(index, state, DetectionState::Resolved);

            if mounted == 0 {
                // Every contact is separating: another pass would find the same.
                return;
            }
            if pass >= limit {
                report.unresolved.push(index);
                if self.config.warn_on_unresolved {
                    warn!(body = index, pass, "subsequent collision limit reached");
                } else {
                    debug!(body = index, pass, "subsequent collision limit reached");
                }
                return;
            }
        }
    }

    /// Runs the response executor over one pass's detections. Returns the
    /// number of contacts that mounted an impulse and the passive movable
    /// bodies that received one.
    fn respond(
        &mut self,
        found: &[DetectionId],
        report: &mut StepReport,
    ) -> (usize, Vec<usize>) {
        let (fixed_contacts, movable_contacts) = self.registry.partition(found);
        let registry = &self.registry;
        let contacts: Vec<PassContact<'_>> = fixed_contacts
            .iter()
            .chain(movable_contacts.iter())
            .filter_map(|id| registry.get(*id))
            .map(|detection| PassContact {
                detection,
                passive_point: detection
                    .conjugate
                    .and_then(|mirror| registry.get(mirror))
                    .map_or(detection.eff_global, |mirror| mirror.eff_global),
            })
            .collect();

        let applied = response::respond_pass(
            &contacts,
            &mut self.movables,
            self.config.solver_settings(),
        );

        let mut mounted = 0;
        let mut touched = Vec::new();
        for (contact, impulse) in contacts.iter().zip(&applied) {
            if impulse.is_none() {
                continue;
            }
            mounted += 1;
            if let Counterpart::Movable(other) = contact.detection.other {
                report.passive_impulses += 1;
                if !touched.contains(&other) {
                    touched.push(other);
                }
            }
        }
        report.impulses += mounted;
        (mounted, touched)
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::new()
    }
}

fn transition(body: usize, from: DetectionState, to: DetectionState) -> DetectionState {
    trace!(body, ?from, ?to, "detector state");
    to
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::registry::CollisionDetection;
    use crate::collision::response::{FrictionPolicy, ImpulseRounding};
    use crate::common::material::Material;
    use crate::objects::wall::{Wall, WallSide};
    use crate::shapes::Polygon;
    use std::sync::{Arc, Mutex};

    const EPSILON: f64 = 1e-9;

    fn unit_box(position: Vec2) -> MovableBody {
        MovableBody::rigid(Polygon::rectangle(0.5, 0.5).unwrap(), 1.0)
            .unwrap()
            .with_position(position)
            .with_material(Material::plastic())
    }

    fn collider_with_floor() -> Collider {
        let mut collider = Collider::new();
        collider.add_fixed(Wall::new(WallSide::Bottom, Vec2::ZERO));
        collider
    }

    fn corner() -> Collider {
        let mut collider = collider_with_floor();
        collider.add_fixed(Wall::new(WallSide::Left, Vec2::ZERO));
        collider
    }

    fn kinetic_energy(body: &MovableBody) -> f64 {
        let state = body.active();
        let inertia = body.mass().inertia.unwrap_or(0.0);
        0.5 * body.mass().mass * state.velocity.magnitude_squared()
            + 0.5 * inertia * state.angular_velocity * state.angular_velocity
    }

    #[test]
    fn test_collider_new() {
        let collider = Collider::new();
        assert!(collider.fixed_bodies().is_empty());
        assert!(collider.movables().is_empty());
        assert_eq!(collider.config().subsequent_collision_limit, 8);
        assert_eq!(collider.stats(), ColliderStats::default());
    }

    #[test]
    fn test_registration_returns_indices_in_order() {
        let mut collider = collider_with_floor();
        assert_eq!(collider.add_fixed(Wall::new(WallSide::Left, Vec2::ZERO)), 1);
        assert_eq!(collider.add_movable(unit_box(Vec2::new(0.0, 2.0))), 0);
        assert_eq!(collider.add_movable(unit_box(Vec2::new(3.0, 2.0))), 1);
        assert_eq!(collider.movable(1).unwrap().active().pose.position().x, 3.0);
        assert!(collider.movable(7).is_none());
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(Collider::with_config(ColliderConfig::default().with_subsequent_collision_limit(0)).is_err());
        let mut collider = Collider::new();
        assert!(collider.set_subsequent_collision_limit(0).is_err());
        assert!(collider.set_subsequent_collision_limit(2).is_ok());
        assert_eq!(collider.config().subsequent_collision_limit, 2);
    }

    #[test]
    fn test_invalid_timestep_is_skipped() {
        let mut collider = collider_with_floor();
        let id = collider.add_movable(unit_box(Vec2::new(0.0, 2.0)).with_velocity(Vec2::new(1.0, 0.0)));
        for dt in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert_eq!(collider.update(dt), StepReport::default());
            assert!(matches!(collider.try_update(dt), Err(PhysicsError::InvalidTimestep(_))));
        }
        assert_eq!(collider.movable(id).unwrap().active().pose.position(), Vec2::new(0.0, 2.0));
        assert_eq!(collider.stats().steps, 0);
    }

    #[test]
    fn test_free_motion_commits_on_update() {
        let mut collider = Collider::new();
        let id = collider.add_movable(unit_box(Vec2::ZERO).with_velocity(Vec2::new(2.0, 0.0)));
        let report = collider.update(0.5);
        assert!(report.is_quiet());
        assert_eq!(report.passes, 1);
        let body = collider.movable(id).unwrap();
        assert!((body.active().pose.position() - Vec2::new(1.0, 0.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_plastic_landing_stops_on_floor() {
        let mut collider = collider_with_floor();
        let id = collider.add_movable(unit_box(Vec2::new(0.0, 0.55)).with_velocity(Vec2::new(0.0, -1.0)));
        let report = collider.update(0.1);

        assert_eq!(report.detections, 2);
        assert_eq!(report.impulses, 2);
        assert_eq!(report.passes, 2);
        assert!(report.unresolved.is_empty());
        let body = collider.movable(id).unwrap();
        assert!(body.active().velocity.magnitude() < EPSILON);
        assert!(body.active().angular_velocity.abs() < EPSILON);
        assert!((body.active().pose.position().y - 0.55).abs() < EPSILON);
        assert!(body.pending_impulses().is_empty());
    }

    #[test]
    fn test_limit_of_one_reports_unresolved() {
        let mut collider = Collider::with_config(
            ColliderConfig::default()
                .with_subsequent_collision_limit(1)
                .with_breakpoints(false),
        )
        .unwrap();
        collider.add_fixed(Wall::new(WallSide::Bottom, Vec2::ZERO));
        collider.add_movable(unit_box(Vec2::new(0.0, 0.55)).with_velocity(Vec2::new(0.0, -1.0)));
        let report = collider.update(0.1);
        assert_eq!(report.passes, 1);
        assert_eq!(report.unresolved, vec![0]);
        assert_eq!(collider.stats().unresolved, 1);
    }

    #[test]
    fn test_forces_persist_until_cleared() {
        let mut collider = Collider::new();
        let id = collider.add_movable(unit_box(Vec2::ZERO));
        collider.mount_force(id, Vec2::new(2.0, 0.0), Vec2::ZERO);
        collider.mount_force(42, Vec2::new(2.0, 0.0), Vec2::ZERO);
        collider.update(1.0);
        collider.update(1.0);
        assert!((collider.movable(id).unwrap().active().velocity.x - 4.0).abs() < EPSILON);

        collider.clear_forces(id);
        collider.update(1.0);
        assert!((collider.movable(id).unwrap().active().velocity.x - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_gravity_from_config() {
        let mut collider =
            Collider::with_config(ColliderConfig::default().with_gravity(Vec2::new(0.0, -10.0))).unwrap();
        let id = collider.add_movable(unit_box(Vec2::new(0.0, 100.0)));
        collider.update(0.1);
        assert!((collider.movable(id).unwrap().active().velocity.y - -1.0).abs() < EPSILON);
    }

    #[derive(Clone, Default)]
    struct SharedRecorder(Arc<Mutex<Vec<usize>>>);

    impl BreakpointHook for SharedRecorder {
        fn on_detection(&mut self, detection: &CollisionDetection) {
            self.0.lock().unwrap().push(detection.vertex);
        }
    }

    #[test]
    fn test_breakpoint_hook_respects_skip_flag() {
        let recorder = SharedRecorder::default();
        let mut collider = collider_with_floor();
        collider.set_breakpoint_hook(Box::new(recorder.clone()));
        collider.add_movable(unit_box(Vec2::new(0.0, 0.55)).with_velocity(Vec2::new(0.0, -1.0)));
        collider.update(0.1);
        assert!(recorder.0.lock().unwrap().is_empty());

        let mut collider = collider_with_floor();
        collider.set_breakpoint_hook(Box::new(recorder.clone()));
        collider.set_breakpoints_enabled(true);
        collider.add_movable(unit_box(Vec2::new(0.0, 0.55)).with_velocity(Vec2::new(0.0, -1.0)));
        collider.update(0.1);
        assert_eq!(*recorder.0.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_corner_contacts_remove_energy() {
        let mut collider = corner();
        let id = collider.add_movable(
            unit_box(Vec2::new(0.55, 0.55))
                .with_material(Material::default())
                .with_velocity(Vec2::new(-1.0, -1.0)),
        );
        let before = kinetic_energy(collider.movable(id).unwrap());

        let report = collider.update(0.1);

        // One corner meets both walls; its neighbours meet one each.
        assert_eq!(report.detections, 4);
        let body = collider.movable(id).unwrap();
        assert!(kinetic_energy(body) < before);
        assert!(body.active().velocity.x < 1.0);
        assert!(body.active().velocity.y < 1.0);
    }

    #[test]
    fn test_plastic_corner_contacts_stop_the_box() {
        let mut collider = corner();
        let id = collider
            .add_movable(unit_box(Vec2::new(0.55, 0.55)).with_velocity(Vec2::new(-1.0, -1.0)));

        let report = collider.update(0.1);

        assert!(report.unresolved.is_empty());
        let body = collider.movable(id).unwrap();
        assert!(body.active().velocity.magnitude() < EPSILON);
        assert!(body.active().angular_velocity.abs() < EPSILON);
    }

    #[test]
    fn test_sliding_plastic_landing_pivots_without_rebound() {
        let mut collider = collider_with_floor();
        let id = collider
            .add_movable(unit_box(Vec2::new(0.0, 0.55)).with_velocity(Vec2::new(2.0, -1.0)));
        let before = kinetic_energy(collider.movable(id).unwrap());

        collider.update(0.1);

        let body = collider.movable(id).unwrap();
        assert!(kinetic_energy(body) < before);
        // The leading corner sticks and the box tips over it; neither
        // bottom corner moves back up off the floor faster than it pivots.
        let leading = body.active().point_velocity(Vec2::new(0.5, -0.5));
        assert!(leading.magnitude() < EPSILON);
        let trailing = body.active().point_velocity(Vec2::new(-0.5, -0.5));
        assert!(trailing.y >= -EPSILON);
        assert!(body.active().velocity.y < 1.0);
    }

    #[test]
    fn test_coulomb_friction_through_config() {
        let config = ColliderConfig::default().with_friction_policy(FrictionPolicy::Coulomb);
        let mut collider = Collider::with_config(config).unwrap();
        collider.add_fixed(Wall::new(WallSide::Bottom, Vec2::ZERO));
        let id = collider.add_movable(
            unit_box(Vec2::new(0.0, 0.55))
                .with_material(Material::new(0.0, 0.5))
                .with_velocity(Vec2::new(2.0, -1.0)),
        );

        collider.update(0.1);

        // Kinetic friction removes mu times the normal impulse (1) from vx.
        let body = collider.movable(id).unwrap();
        assert!((body.active().velocity.x - 1.5).abs() < EPSILON);
        assert!(body.active().velocity.y.abs() < EPSILON);
        assert!(body.active().angular_velocity.abs() < EPSILON);
    }

    #[test]
    fn test_subsequent_pass_finds_a_different_obstacle() {
        let mut collider = Collider::new();
        let slope = collider.add_fixed(Wall::inclined(WallSide::Bottom, Vec2::ZERO, 0.5));
        let wall = collider.add_fixed(Wall::new(WallSide::Left, Vec2::ZERO));
        let id = collider.add_movable(
            MovableBody::material_point(Polygon::rectangle(0.25, 0.25).unwrap(), 1.0)
                .unwrap()
                .with_material(Material::new(1.0, 0.0))
                .with_position(Vec2::new(0.3, 0.6))
                .with_velocity(Vec2::new(0.0, -2.0)),
        );

        let report = collider.update(0.1);

        // Pass 1 bounces off the slope towards the wall, pass 2 hits the
        // wall, pass 3 is clear.
        assert_eq!(report.passes, 3);
        assert_eq!(report.detections, 3);
        assert_eq!(report.impulses, 3);
        let by_pass = |pass: usize| -> Vec<Counterpart> {
            collider
                .detections()
                .iter()
                .filter(|(_, d)| d.pass == pass)
                .map(|(_, d)| d.other)
                .collect()
        };
        assert_eq!(by_pass(1), vec![Counterpart::Fixed(slope)]);
        assert_eq!(by_pass(2), vec![Counterpart::Fixed(wall); 2]);

        let body = collider.movable(id).unwrap();
        assert!((body.active().velocity.x - 1.0f64.sin()).abs() < EPSILON);
        assert!(body.active().velocity.y.abs() < EPSILON);
        assert!(kinetic_energy(body) < 2.0);
    }

    #[test]
    fn test_no_reversal_rounding_end_to_end() {
        let run = |rounding: ImpulseRounding| {
            let mut collider = corner();
            let id = collider.add_movable(
                unit_box(Vec2::new(0.55, 0.55))
                    .with_impulse_rounding(rounding)
                    .with_velocity(Vec2::new(-1.0, -1.0)),
            );
            let report = collider.update(0.1);
            (report, *collider.movable(id).unwrap().active())
        };
        // Accumulated normal impulses are never negative, so dropping
        // reversed normals changes nothing.
        let (identity_report, identity) = run(ImpulseRounding::Identity);
        let (no_reversal_report, no_reversal) = run(ImpulseRounding::NoReversal);
        assert_eq!(identity_report, no_reversal_report);
        assert_eq!(identity, no_reversal);
    }

    #[test]
    fn test_reaction_after_own_loop_marks_body_disturbed() {
        let mut collider = collider_with_floor();
        let lower =
            collider.add_movable(unit_box(Vec2::new(0.0, 0.5)).with_material(Material::default()));
        let upper = collider.add_movable(
            unit_box(Vec2::new(0.2, 1.55))
                .with_material(Material::default())
                .with_velocity(Vec2::new(0.0, -1.0)),
        );

        let report = collider.update(0.1);

        // The lower box is at rest, so its own pass finds nothing; the upper
        // box's contact then pushes it down.
        assert_eq!(report.disturbed, vec![lower]);
        assert!(!report.disturbed.contains(&upper));
        assert!(collider.movable(lower).unwrap().active().velocity.y < 0.0);
        assert_eq!(collider.stats().disturbed, 1);
    }
}
