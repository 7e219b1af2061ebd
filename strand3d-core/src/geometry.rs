/// Geometry descriptions handed to the mesh/rendering layer, and a triangle
/// soup for CPU-side picking and rasterization
use nalgebra::{Point3, Vector3};

use crate::triangle::Triangle;

/// Meaning of a vertex attribute stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position,
    Direction,
    Neighbor,
    Expansion,
}

/// Describes one attribute stream inside an interleaved vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometrySource {
    pub semantic: Semantic,
    /// Number of vertices in the buffer
    pub count: usize,
    /// Number of `f32` components per vertex
    pub components: usize,
    /// Byte offset of the attribute inside a vertex
    pub offset: usize,
    /// Byte distance between consecutive vertices
    pub stride: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Triangles,
}

/// Index list grouping vertices into primitives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryElement {
    pub primitive: PrimitiveType,
    pub indices: Vec<u32>,
}

impl GeometryElement {
    pub fn triangles(indices: Vec<u32>) -> Self {
        Self {
            primitive: PrimitiveType::Triangles,
            indices,
        }
    }

    pub fn primitive_count(&self) -> usize {
        match self.primitive {
            PrimitiveType::Triangles => self.indices.len() / 3,
        }
    }
}

/// Closest intersection found by [`Mesh::raycast`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub triangle_index: usize,
    pub point: Point3<f32>,
    /// Distance from the ray origin to `point`
    pub distance: f32,
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Find the triangle hit closest to `origin` along `ray`
    pub fn raycast(&self, ray: &Vector3<f32>, origin: &Point3<f32>) -> Option<RayHit> {
        self.triangles
            .iter()
            .enumerate()
            .filter_map(|(triangle_index, triangle)| {
                triangle.intersects_ray(ray, origin).map(|point| RayHit {
                    triangle_index,
                    point,
                    distance: (point - origin).norm(),
                })
            })
            .min_by(|lhs, rhs| lhs.distance.total_cmp(&rhs.distance))
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Triangle> for Mesh {
    fn from_iter<I: IntoIterator<Item = Triangle>>(iter: I) -> Self {
        Self {
            triangles: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_at(z: f32) -> [Triangle; 2] {
        [
            Triangle::new(
                Point3::new(-1.0, -1.0, z),
                Point3::new(1.0, -1.0, z),
                Point3::new(1.0, 1.0, z),
            ),
            Triangle::new(
                Point3::new(-1.0, -1.0, z),
                Point3::new(1.0, 1.0, z),
                Point3::new(-1.0, 1.0, z),
            ),
        ]
    }

    #[test]
    fn test_raycast_returns_nearest() {
        let mesh: Mesh = square_at(3.0).into_iter().chain(square_at(1.0)).collect();
        assert_eq!(mesh.len(), 4);

        let hit = mesh
            .raycast(&Vector3::new(0.0, 0.0, 1.0), &Point3::new(0.5, -0.25, 0.0))
            .unwrap();
        assert_eq!(hit.triangle_index, 2);
        assert_relative_eq!(hit.point, Point3::new(0.5, -0.25, 1.0), epsilon = 1e-6);
        assert_relative_eq!(hit.distance, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_raycast_miss() {
        let mut mesh = Mesh::with_capacity(2);
        for triangle in square_at(0.0) {
            mesh.add_triangle(triangle);
        }
        assert!(mesh
            .raycast(&Vector3::new(0.0, 0.0, 1.0), &Point3::new(5.0, 5.0, -1.0))
            .is_none());
        assert!(Mesh::default()
            .raycast(&Vector3::new(0.0, 0.0, 1.0), &Point3::origin())
            .is_none());
    }

    #[test]
    fn test_element_primitive_count() {
        let element = GeometryElement::triangles(vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(element.primitive, PrimitiveType::Triangles);
        assert_eq!(element.primitive_count(), 2);
    }
}
