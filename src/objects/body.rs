//! Capability traits shared by fixed and movable bodies.

use std::fmt;

use crate::math::vec2::Vec2;
use crate::objects::pose::Pose;
use crate::shapes::SurfaceHit;

/// Where a swept segment crossed a surface, in the surface owner's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub point: Vec2,
    pub normal: Vec2,
}

impl From<SurfaceHit> for Crossing {
    fn from(hit: SurfaceHit) -> Self {
        Crossing {
            point: hit.point,
            normal: hit.normal,
        }
    }
}

/// Collision-surface queries. Every argument and result is in the
/// implementor's local frame.
pub trait Collidable {
    /// 1 for simple polygons, more for compound shapes.
    fn polygon_element_count(&self) -> usize;

    fn element_vertices(&self, i: usize) -> &[Vec2];

    /// Does the swept segment `pre -> post` cross this object's boundary?
    fn surface_test(&self, pre: Vec2, post: Vec2) -> bool;

    /// Outward unit normal at the crossing.
    fn surface_normal(&self, pre: Vec2, post: Vec2) -> Vec2;

    /// Where the collision is judged to have happened.
    fn effective_point(&self, pre: Vec2, _post: Vec2) -> Vec2 {
        pre
    }

    /// The three queries above in one call: `None` when the sweep does not
    /// cross. Implementors that share work between them override this.
    fn crossing(&self, pre: Vec2, post: Vec2) -> Option<Crossing> {
        if !self.surface_test(pre, post) {
            return None;
        }
        Some(Crossing {
            point: self.effective_point(pre, post),
            normal: self.surface_normal(pre, post),
        })
    }
}

/// An immovable participant: walls, inclined planes and static obstacles.
/// Infinite mass and no velocity are implied.
pub trait FixedBody: Collidable + fmt::Debug {
    fn pose(&self) -> &Pose;
}
