use crate::common::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;

/// Where a swept segment entered a polygon: the outward normal of the edge
/// it crossed and the point on that edge, both in the polygon's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub edge: usize,
    pub normal: Vec2,
    pub point: Vec2,
}

/// An ordered vertex loop in local coordinates. Immutable after construction.
///
/// Any vertex count of at least one is accepted so that point masses and
/// segments can carry c-vertices; only loops of three or more vertices have
/// an interior and can be hit by a swept segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
    bounding_radius_squared: f64,
    // +1 for counter-clockwise loops, -1 for clockwise.
    winding: f64,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> Result<Self> {
        if vertices.is_empty() {
            return Err(PhysicsError::EmptyPolygon);
        }
        if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(PhysicsError::NonFiniteVertex { index });
        }
        let bounding_radius_squared = vertices
            .iter()
            .map(|v| v.magnitude_squared())
            .fold(0.0, f64::max);
        let winding = if signed_area(&vertices) < 0.0 { -1.0 } else { 1.0 };
        Ok(Self {
            vertices,
            bounding_radius_squared,
            winding,
        })
    }

    /// Axis-aligned rectangle centred on the local origin, counter-clockwise
    /// starting at the bottom-left corner.
    pub fn rectangle(half_width: f64, half_height: f64) -> Result<Self> {
        Self::new(vec![
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ])
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Maximum squared distance of any vertex from the local origin.
    pub fn bounding_radius_squared(&self) -> f64 {
        self.bounding_radius_squared
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    fn has_interior(&self) -> bool {
        self.vertices.len() >= 3 && self.area() > 1e-12
    }

    fn edge(&self, i: usize) -> (Vec2, Vec2) {
        let n = self.vertices.len();
        (self.vertices[i], self.vertices[(i + 1) % n])
    }

    /// Outward unit normal of edge `i` (from vertex `i` to vertex `i + 1`).
    pub fn outward_normal(&self, i: usize) -> Vec2 {
        let (a, b) = self.edge(i);
        let e = b - a;
        Vec2::new(e.y, -e.x).normalize() * self.winding
    }

    /// Signed distance of `p` outside edge `i`'s supporting line. Negative
    /// means on the interior side.
    fn edge_distance(&self, i: usize, p: Vec2) -> f64 {
        (p - self.vertices[i]).dot(self.outward_normal(i))
    }

    /// Strict interior test. Assumes a convex loop.
    pub fn contains(&self, p: Vec2) -> bool {
        self.has_interior() && (0..self.vertices.len()).all(|i| self.edge_distance(i, p) < 0.0)
    }

    /// Tests the segment `pre -> post` against this polygon's boundary.
    ///
    /// An entering crossing (from the outer to the inner side of an edge,
    /// within the edge's extent) wins, earliest along the segment first. A
    /// segment that ends inside without a recorded crossing is resolved
    /// against the edge nearest to `post`.
    pub fn swept_hit(&self, pre: Vec2, post: Vec2) -> Option<SurfaceHit> {
        if !self.has_interior() {
            return None;
        }
        if let Some(hit) = self.first_crossing(pre, post) {
            return Some(hit);
        }
        if self.contains(post) {
            return Some(self.nearest_edge(post));
        }
        None
    }

    fn first_crossing(&self, pre: Vec2, post: Vec2) -> Option<SurfaceHit> {
        let mut best: Option<(f64, SurfaceHit)> = None;
        for i in 0..self.vertices.len() {
            if self.edge_distance(i, pre) < 0.0 || self.edge_distance(i, post) >= 0.0 {
                continue;
            }
            let (a, b) = self.edge(i);
            if let Some((point, t)) = intersect_segments(pre, post, a, b) {
                if best.map_or(true, |(best_t, _)| t < best_t) {
                    let hit = SurfaceHit {
                        edge: i,
                        normal: self.outward_normal(i),
                        point,
                    };
                    best = Some((t, hit));
                }
            }
        }
        best.map(|(_, hit)| hit)
    }

    fn nearest_edge(&self, p: Vec2) -> SurfaceHit {
        let mut edge = 0;
        let mut depth = f64::INFINITY;
        for i in 0..self.vertices.len() {
            let d = -self.edge_distance(i, p);
            if d < depth {
                depth = d;
                edge = i;
            }
        }
        let normal = self.outward_normal(edge);
        SurfaceHit {
            edge,
            normal,
            point: p + normal * depth,
        }
    }
}

fn signed_area(vertices: &[Vec2]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| vertices[i].cross(vertices[(i + 1) % n]))
        .sum();
    twice / 2.0
}

/// Intersection of segments `a1 -> a2` and `b1 -> b2`. Returns the point and
/// the parameter along the first segment. Parallel segments never intersect.
fn intersect_segments(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<(Vec2, f64)> {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let denominator = d1.cross(d2);
    if denominator.abs() < 1e-12 {
        return None;
    }
    let delta = b1 - a1;
    let t = delta.cross(d2) / denominator;
    let u = delta.cross(d1) / denominator;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((a1 + d1 * t, t))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    fn unit_square() -> Polygon {
        Polygon::rectangle(0.5, 0.5).unwrap()
    }

    #[test]
    fn test_polygon_new_rejects_empty() {
        assert_eq!(Polygon::new(vec![]).unwrap_err(), PhysicsError::EmptyPolygon);
    }

    #[test]
    fn test_polygon_new_rejects_nan_vertex() {
        let err = Polygon::new(vec![Vec2::ZERO, Vec2::new(f64::NAN, 1.0)]).unwrap_err();
        assert_eq!(err, PhysicsError::NonFiniteVertex { index: 1 });
    }

    #[test]
    fn test_single_vertex_polygon_is_allowed() {
        let point = Polygon::new(vec![Vec2::new(0.0, 2.0)]).unwrap();
        assert_eq!(point.len(), 1);
        assert!((point.bounding_radius_squared() - 4.0).abs() < EPSILON);
        assert!(point.swept_hit(Vec2::new(0.0, 3.0), Vec2::ZERO).is_none());
    }

    #[test]
    fn test_bounding_radius_squared() {
        let p = Polygon::rectangle(2.0, 1.0).unwrap();
        assert!((p.bounding_radius_squared() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_area() {
        assert!((unit_square().area() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_outward_normals_ccw() {
        let p = unit_square();
        assert!((p.outward_normal(0) - Vec2::new(0.0, -1.0)).magnitude() < EPSILON);
        assert!((p.outward_normal(1) - Vec2::new(1.0, 0.0)).magnitude() < EPSILON);
        assert!((p.outward_normal(2) - Vec2::new(0.0, 1.0)).magnitude() < EPSILON);
        assert!((p.outward_normal(3) - Vec2::new(-1.0, 0.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_outward_normals_cw_loop() {
        let mut vertices = unit_square().vertices().to_vec();
        vertices.reverse();
        let p = Polygon::new(vertices).unwrap();
        // Edge 0 now runs from the top-left to the top-right corner.
        assert!((p.outward_normal(0) - Vec2::new(0.0, 1.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_contains() {
        let p = unit_square();
        assert!(p.contains(Vec2::ZERO));
        assert!(p.contains(Vec2::new(0.49, -0.49)));
        assert!(!p.contains(Vec2::new(0.5, 0.0)));
        assert!(!p.contains(Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn test_swept_hit_from_above() {
        let p = unit_square();
        let hit = p
            .swept_hit(Vec2::new(0.1, 1.0), Vec2::new(0.1, 0.3))
            .unwrap();
        assert_eq!(hit.edge, 2);
        assert!((hit.normal - Vec2::Y).magnitude() < EPSILON);
        assert!((hit.point - Vec2::new(0.1, 0.5)).magnitude() < EPSILON);
    }

    #[test]
    fn test_swept_hit_tunnels_through() {
        // Both endpoints are outside, but the segment passes straight through.
        let p = unit_square();
        let hit = p
            .swept_hit(Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0))
            .unwrap();
        assert_eq!(hit.edge, 3);
        assert!((hit.point - Vec2::new(-0.5, 0.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_swept_hit_inside_uses_nearest_edge() {
        let p = unit_square();
        let hit = p
            .swept_hit(Vec2::new(0.0, 0.2), Vec2::new(0.45, 0.2))
            .unwrap();
        assert_eq!(hit.edge, 1);
        assert!((hit.point - Vec2::new(0.5, 0.2)).magnitude() < EPSILON);
    }

    #[test]
    fn test_swept_miss() {
        let p = unit_square();
        assert!(p.swept_hit(Vec2::new(-2.0, 1.0), Vec2::new(2.0, 1.0)).is_none());
        // Leaving the polygon is not a hit.
        assert!(p.swept_hit(Vec2::ZERO, Vec2::new(0.0, 2.0)).is_none());
    }

    #[test]
    fn test_intersect_segments_parallel() {
        assert!(intersect_segments(Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::new(1.0, 1.0)).is_none());
    }
}
