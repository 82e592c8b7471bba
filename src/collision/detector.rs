//! One detection pass of a moving body.
//!
//! Every c-vertex is swept from its active to its background global
//! position. The sweep is mapped into the other object's local frame: `pre`
//! through the other's active pose, `post` through its background pose, so
//! a movable obstacle's own motion is part of the relative sweep. Fixed
//! bodies are tested before movable ones.

use tracing::trace;

use crate::collision::hook::BreakpointHook;
use crate::collision::registry::{
    CollisionDetection, CollisionPoints, Counterpart, DetectionId, DetectionRegistry,
};
use crate::math::vec2::Vec2;
use crate::objects::body::{Collidable, FixedBody};
use crate::objects::movable::MovableBody;
use crate::objects::pose::Pose;

/// Where a moving body is within its detect/respond cycle for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    /// Background slot holds the tentative step.
    Integrated,
    Detecting,
    NoCollision,
    CollisionsFound,
    /// Impulses were mounted and the affected bodies re-integrated.
    Resolved,
}

/// Borrowed view of the scene for one pass.
pub struct DetectionPass<'a> {
    pub fixed: &'a [Box<dyn FixedBody>],
    pub movables: &'a [MovableBody],
    /// Hook to call per recorded detection, `None` when breakpoints are skipped.
    pub hook: Option<&'a mut (dyn BreakpointHook + 'static)>,
    pub pass: usize,
}

/// Runs one pass for `moving`, records every detection in `registry` and
/// returns the ids of the primary records, in detection order.
pub fn detect(
    moving: usize,
    scene: DetectionPass<'_>,
    registry: &mut DetectionRegistry,
) -> Vec<DetectionId> {
    let DetectionPass {
        fixed,
        movables,
        mut hook,
        pass,
    } = scene;
    let Some(body) = movables.get(moving) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for (vertex, (pre, post)) in body.swept_vertices().enumerate() {
        for (index, obstacle) in fixed.iter().enumerate() {
            let frame = Frames {
                pre: obstacle.pose(),
                post: obstacle.pose(),
            };
            let Some(detection) = sweep_against(obstacle.as_ref(), frame, pre, post) else {
                continue;
            };
            let record = detection.into_record(moving, Counterpart::Fixed(index), vertex, pass);
            let id = registry.record(record);
            trace!(moving, fixed = index, vertex, "c-vertex crossed fixed surface");
            notify(&mut hook, registry, id);
            found.push(id);
        }

        for (index, other) in movables.iter().enumerate() {
            if index == moving {
                continue;
            }
            if registry
                .pair_owner(moving, index)
                .is_some_and(|owner| owner != moving)
            {
                continue;
            }
            let frame = Frames {
                pre: other.active_pose(),
                post: other.background_pose(),
            };
            let Some(detection) = sweep_against(other, frame, pre, post) else {
                continue;
            };
            registry.claim_pair(moving, index);
            let record = detection.into_record(moving, Counterpart::Movable(index), vertex, pass);
            let id = registry.record(record);
            let other_pose = other.active_pose();
            registry.conjugate(id, |p| other_pose.to_local(p));
            trace!(moving, movable = index, vertex, "c-vertex crossed movable surface");
            notify(&mut hook, registry, id);
            found.push(id);
        }
    }
    found
}

struct Frames<'a> {
    pre: &'a Pose,
    post: &'a Pose,
}

struct SweptContact {
    points: CollisionPoints,
    normal: Vec2,
    eff_global: Vec2,
}

impl SweptContact {
    fn into_record(
        self,
        moving: usize,
        other: Counterpart,
        vertex: usize,
        pass: usize,
    ) -> CollisionDetection {
        CollisionDetection {
            moving,
            other,
            vertex,
            points: self.points,
            normal: self.normal,
            eff_global: self.eff_global,
            pass,
            conjugate: None,
            mirror: false,
        }
    }
}

fn sweep_against<C: Collidable + ?Sized>(
    target: &C,
    frames: Frames<'_>,
    pre_global: Vec2,
    post_global: Vec2,
) -> Option<SweptContact> {
    let pre = frames.pre.to_local(pre_global);
    let post = frames.post.to_local(post_global);
    // No relative motion, nothing to sweep.
    if pre == post {
        return None;
    }
    let crossing = target.crossing(pre, post)?;
    Some(SweptContact {
        points: CollisionPoints {
            pre,
            post,
            eff: crossing.point,
        },
        normal: frames.pre.vector_to_global(crossing.normal).normalize(),
        eff_global: frames.pre.to_global(crossing.point),
    })
}

fn notify(
    hook: &mut Option<&mut (dyn BreakpointHook + 'static)>,
    registry: &DetectionRegistry,
    id: DetectionId,
) {
    if let (Some(hook), Some(detection)) = (hook.as_deref_mut(), registry.get(id)) {
        hook.on_detection(detection);
    }
}
