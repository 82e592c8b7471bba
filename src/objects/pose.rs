use crate::math::transform::Transform;
use crate::math::vec2::Vec2;

/// Position, orientation and the cached local<->global transforms.
///
/// `transform` maps local to global; `inverse_transform` maps global to
/// local. Both are rebuilt on every setter, so their product is always the
/// identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    position: Vec2,
    rotation: f64,
    transform: Transform,
    inverse_transform: Transform,
}

impl Pose {
    pub fn new(position: Vec2, rotation: f64) -> Self {
        let transform = Transform::from_position_rotation(position, rotation);
        Self {
            position,
            rotation,
            transform,
            inverse_transform: transform.inverse(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Orientation in radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn inverse_transform(&self) -> &Transform {
        &self.inverse_transform
    }

    pub fn set_position(&mut self, position: Vec2) {
        // Fixed orientation: only the translation blocks change.
        self.position = position;
        self.transform.translation = position;
        self.inverse_transform = self.transform.inverse();
    }

    pub fn set(&mut self, position: Vec2, rotation: f64) {
        *self = Self::new(position, rotation);
    }

    pub fn to_local(&self, global: Vec2) -> Vec2 {
        self.inverse_transform.transform_point(global)
    }

    pub fn to_global(&self, local: Vec2) -> Vec2 {
        self.transform.transform_point(local)
    }

    /// Rotates a local direction into the global frame.
    pub fn vector_to_global(&self, local: Vec2) -> Vec2 {
        self.transform.transform_vector(local)
    }

    pub fn vector_to_local(&self, global: Vec2) -> Vec2 {
        self.inverse_transform.transform_vector(global)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 0.0)
    }
}
