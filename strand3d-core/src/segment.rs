/// Line segment primitive shared by the tessellator
use nalgebra::{Point3, Vector3};

/// A straight segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    a: Point3<f32>,
    b: Point3<f32>,
}

impl LineSegment {
    pub fn new(a: Point3<f32>, b: Point3<f32>) -> Self {
        Self { a, b }
    }

    pub fn a(&self) -> Point3<f32> {
        self.a
    }

    pub fn b(&self) -> Point3<f32> {
        self.b
    }

    /// Vector from A to B (not normalized)
    pub fn vector(&self) -> Vector3<f32> {
        self.b - self.a
    }

    pub fn length(&self) -> f32 {
        self.vector().norm()
    }

    /// True when both endpoints are exactly equal
    pub fn is_zero_length(&self) -> bool {
        self.a == self.b
    }

    /// Unit direction from A to B, or `None` for a zero-length segment
    pub fn direction(&self) -> Option<Vector3<f32>> {
        if self.is_zero_length() {
            return None;
        }
        self.vector().try_normalize(f32::EPSILON)
    }

    pub fn midpoint(&self) -> Point3<f32> {
        nalgebra::center(&self.a, &self.b)
    }
}
