use super::vec2::Vec2;

/// A 2D affine transform stored as a 2x2 linear block plus a translation.
///
/// Only rotation + translation transforms are built by this crate, but the
/// linear block is kept general so `inverse` and `compose` stay exact matrix
/// operations rather than angle arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Row-major linear block.
    pub linear: [[f64; 2]; 2],
    pub translation: Vec2,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        linear: [[1.0, 0.0], [0.0, 1.0]],
        translation: Vec2::ZERO,
    };

    /// Rotation by `rotation` radians followed by translation to `position`.
    pub fn from_position_rotation(position: Vec2, rotation: f64) -> Self {
        let (sin_a, cos_a) = rotation.sin_cos();
        Self {
            linear: [[cos_a, -sin_a], [sin_a, cos_a]],
            translation: position,
        }
    }

    pub fn translation(position: Vec2) -> Self {
        Self {
            translation: position,
            ..Self::IDENTITY
        }
    }

    pub fn determinant(&self) -> f64 {
        self.linear[0][0] * self.linear[1][1] - self.linear[0][1] * self.linear[1][0]
    }

    /// Inverse transform. A singular linear block yields non-finite entries;
    /// the poses built by this crate are never singular.
    pub fn inverse(&self) -> Self {
        let inv_det = 1.0 / self.determinant();
        let [[a, b], [c, d]] = self.linear;
        let linear = [[d * inv_det, -b * inv_det], [-c * inv_det, a * inv_det]];
        let t = self.translation;
        let translation = Vec2::new(
            -(linear[0][0] * t.x + linear[0][1] * t.y),
            -(linear[1][0] * t.x + linear[1][1] * t.y),
        );
        Self { linear, translation }
    }

    /// `self * other`: applies `other` first, then `self`.
    pub fn compose(&self, other: &Transform) -> Self {
        let a = self.linear;
        let b = other.linear;
        let linear = [
            [
                a[0][0] * b[0][0] + a[0][1] * b[1][0],
                a[0][0] * b[0][1] + a[0][1] * b[1][1],
            ],
            [
                a[1][0] * b[0][0] + a[1][1] * b[1][0],
                a[1][0] * b[0][1] + a[1][1] * b[1][1],
            ],
        ];
        Self {
            linear,
            translation: self.transform_point(other.translation),
        }
    }

    /// Maps a point (translation applies).
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.transform_vector(point) + self.translation
    }

    /// Maps a direction (translation ignored).
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.linear[0][0] * v.x + self.linear[0][1] * v.y,
            self.linear[1][0] * v.x + self.linear[1][1] * v.y,
        )
    }

    pub fn approx_eq(&self, other: &Transform, epsilon: f64) -> bool {
        self.linear
            .iter()
            .flatten()
            .zip(other.linear.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
            && (self.translation - other.translation).magnitude() <= epsilon
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
