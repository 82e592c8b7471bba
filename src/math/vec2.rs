use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D point or free vector. The same type is used for both; whether a
/// value is a point or a direction only matters to `Transform`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const X: Vec2 = Vec2 { x: 1.0, y: 0.0 };
    pub const Y: Vec2 = Vec2 { x: 0.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Scalar 2D cross product (z-component of the 3D cross product).
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Cross product of a scalar angular quantity with this lever arm,
    /// `w x r`, giving the tangential vector `(-w * r.y, w * r.x)`.
    pub fn cross_scalar(w: f64, r: Self) -> Self {
        Self::new(-w * r.y, w * r.x)
    }

    pub fn magnitude_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn magnitude(self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Unit vector in the same direction. A zero vector stays zero.
    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag == 0.0 {
            Self::ZERO
        } else {
            self * (1.0 / mag)
        }
    }

    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).magnitude_squared()
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).magnitude()
    }

    /// Counter-clockwise orthogonal vector.
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Rotates the vector by `angle` radians counter-clockwise.
    pub fn rotate(self, angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self::new(
            self.x * cos_a - self.y * sin_a,
            self.x * sin_a + self.y * cos_a,
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;

    fn mul(self, vec: Vec2) -> Vec2 {
        vec * self
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;

    // Division by zero follows IEEE rules (INFINITY or NaN).
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl MulAssign<f64> for Vec2 {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_vec2_arithmetic() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, 4.0);
        assert_eq!(a + b, Vec2::new(4.0, 6.0));
        assert_eq!(b - a, Vec2::new(2.0, 2.0));
        assert_eq!(a * 3.0, Vec2::new(3.0, 6.0));
        assert_eq!(3.0 * a, Vec2::new(3.0, 6.0));
        assert_eq!(-a, Vec2::new(-1.0, -2.0));

        let mut c = a;
        c += b;
        c -= Vec2::new(1.0, 1.0);
        c *= 2.0;
        assert_eq!(c, Vec2::new(6.0, 10.0));
    }

    #[test]
    fn test_vec2_dot_and_cross() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, 4.0);
        assert!((a.dot(b) - 11.0).abs() < EPSILON);
        assert!((a.cross(b) - -2.0).abs() < EPSILON);
        assert!((Vec2::X.cross(Vec2::Y) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_vec2_cross_scalar_matches_angular_velocity() {
        // w x r for w = 2 and r = (1, 0) is (0, 2)
        let v = Vec2::cross_scalar(2.0, Vec2::X);
        assert!((v.x - 0.0).abs() < EPSILON);
        assert!((v.y - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_vec2_normalize() {
        let v = Vec2::new(3.0, 4.0).normalize();
        assert!((v.magnitude() - 1.0).abs() < EPSILON);
        assert!((v.x - 0.6).abs() < EPSILON);
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_vec2_distance() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);
        assert!((a.distance_squared(b) - 25.0).abs() < EPSILON);
        assert!((b.distance(a) - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_vec2_perpendicular_is_ccw() {
        let v = Vec2::new(3.0, 4.0);
        let perp = v.perpendicular();
        assert_eq!(perp, Vec2::new(-4.0, 3.0));
        assert!(v.dot(perp).abs() < EPSILON);
        assert!(v.cross(perp) > 0.0);
    }

    #[test]
    fn test_vec2_rotate() {
        let v90 = Vec2::X.rotate(PI / 2.0);
        assert!(v90.x.abs() < EPSILON);
        assert!((v90.y - 1.0).abs() < EPSILON);

        let v = Vec2::new(1.0, 1.0).rotate(PI);
        assert!((v.x - -1.0).abs() < EPSILON);
        assert!((v.y - -1.0).abs() < EPSILON);
    }

    #[test]
    fn test_vec2_is_finite() {
        assert!(Vec2::new(1.0, -2.0).is_finite());
        assert!(!Vec2::new(f64::NAN, 0.0).is_finite());
        assert!(!(Vec2::X / 0.0).is_finite());
    }
}
