pub mod polygon;

pub use polygon::{Polygon, SurfaceHit};

use crate::common::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;

/// The collision geometry of a body: one or more polygon elements in the
/// body's local frame. Simple bodies have a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    elements: Vec<Polygon>,
    bounding_radius_squared: f64,
}

impl Shape {
    pub fn compound(elements: Vec<Polygon>) -> Result<Self> {
        if elements.is_empty() {
            return Err(PhysicsError::EmptyShape);
        }
        let bounding_radius_squared = elements
            .iter()
            .map(Polygon::bounding_radius_squared)
            .fold(0.0, f64::max);
        Ok(Self {
            elements,
            bounding_radius_squared,
        })
    }

    pub fn polygon_element_count(&self) -> usize {
        self.elements.len()
    }

    /// Vertices of element `i`; empty for an out-of-range index.
    pub fn element_vertices(&self, i: usize) -> &[Vec2] {
        match self.elements.get(i) {
            Some(element) => element.vertices(),
            None => &[],
        }
    }

    pub fn elements(&self) -> &[Polygon] {
        &self.elements
    }

    /// Every c-vertex in element order, then vertex order.
    pub fn c_vertices(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.elements
            .iter()
            .flat_map(|element| element.vertices().iter().copied())
    }

    pub fn c_vertex_count(&self) -> usize {
        self.elements.iter().map(Polygon::len).sum()
    }

    pub fn bounding_radius_squared(&self) -> f64 {
        self.bounding_radius_squared
    }

    /// First element (in element order) hit by the swept segment.
    pub fn swept_hit(&self, pre: Vec2, post: Vec2) -> Option<SurfaceHit> {
        self.elements
            .iter()
            .find_map(|element| element.swept_hit(pre, post))
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        let bounding_radius_squared = polygon.bounding_radius_squared();
        Self {
            elements: vec![polygon],
            bounding_radius_squared,
        }
    }
}
