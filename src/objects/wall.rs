use crate::math::vec2::Vec2;
use crate::objects::body::{Collidable, FixedBody};
use crate::objects::pose::Pose;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which boundary of the arena a wall forms. The side fixes the wall's
/// inward normal in its local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WallSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl WallSide {
    /// Normal pointing into the free half-plane, in the wall's local frame.
    pub fn local_normal(self) -> Vec2 {
        match self {
            WallSide::Left => Vec2::new(1.0, 0.0),
            WallSide::Right => Vec2::new(-1.0, 0.0),
            WallSide::Top => Vec2::new(0.0, -1.0),
            WallSide::Bottom => Vec2::new(0.0, 1.0),
        }
    }
}

/// A one-sided half-plane through the wall's local origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    side: WallSide,
    pose: Pose,
    // Two points along the surface, for renderers.
    outline: [Vec2; 2],
}

impl Wall {
    const DEFAULT_EXTENT: f64 = 100.0;

    pub fn new(side: WallSide, anchor: Vec2) -> Self {
        Self::inclined(side, anchor, 0.0)
    }

    /// A wall rotated by `angle` radians about `anchor`: an inclined plane.
    pub fn inclined(side: WallSide, anchor: Vec2, angle: f64) -> Self {
        Self {
            side,
            pose: Pose::new(anchor, angle),
            outline: Self::outline_for(side, Self::DEFAULT_EXTENT),
        }
    }

    #[must_use]
    pub fn with_extent(mut self, extent: f64) -> Self {
        self.outline = Self::outline_for(self.side, extent);
        self
    }

    fn outline_for(side: WallSide, extent: f64) -> [Vec2; 2] {
        let along = side.local_normal().perpendicular() * (extent / 2.0);
        [-along, along]
    }

    pub fn side(&self) -> WallSide {
        self.side
    }

    fn beyond(&self, p: Vec2) -> bool {
        p.dot(self.side.local_normal()) < 0.0
    }

    /// Signed distance of a global point from the surface; negative beyond it.
    pub fn distance(&self, global: Vec2) -> f64 {
        self.pose.to_local(global).dot(self.side.local_normal())
    }
}

impl Collidable for Wall {
    fn polygon_element_count(&self) -> usize {
        1
    }

    fn element_vertices(&self, i: usize) -> &[Vec2] {
        if i == 0 {
            &self.outline[..]
        } else {
            &[]
        }
    }

    /// True when either end of the sweep lies beyond the wall plane.
    fn surface_test(&self, pre: Vec2, post: Vec2) -> bool {
        self.beyond(pre) || self.beyond(post)
    }

    /// Constant per side.
    fn surface_normal(&self, _pre: Vec2, _post: Vec2) -> Vec2 {
        self.side.local_normal()
    }
}

impl FixedBody for Wall {
    fn pose(&self) -> &Pose {
        &self.pose
    }
}
