use crate::math::vec2::Vec2;
use crate::objects::body::{Collidable, Crossing, FixedBody};
use crate::objects::pose::Pose;
use crate::shapes::Shape;

/// A fixed convex polygon (or compound of them) placed with a static pose.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticObstacle {
    shape: Shape,
    pose: Pose,
}

impl StaticObstacle {
    pub fn new(shape: impl Into<Shape>, position: Vec2, rotation: f64) -> Self {
        Self {
            shape: shape.into(),
            pose: Pose::new(position, rotation),
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

impl Collidable for StaticObstacle {
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

    /// Projects onto the crossed edge instead of returning `pre`.
    fn effective_point(&self, pre: Vec2, post: Vec2) -> Vec2 {
        self.shape.swept_hit(pre, post).map_or(pre, |hit| hit.point)
    }

    fn crossing(&self, pre: Vec2, post: Vec2) -> Option<Crossing> {
        self.shape.swept_hit(pre, post).map(Crossing::from)
    }
}

impl FixedBody for StaticObstacle {
    fn pose(&self) -> &Pose {
        &self.pose
    }
}
