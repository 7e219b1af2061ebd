/// Triangle primitive with cached edges and normal for picking queries
use nalgebra::{Matrix4, Point3, Vector3};
use std::fmt;

/// Rays whose normalized direction has a smaller component along the face
/// normal than this are treated as parallel to the triangle's plane.
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Relative tolerance for the edge-side tests in [`Triangle::contains_point`].
///
/// A point may sit up to `CONTAINMENT_EPSILON * magnitude` outside an edge
/// line and still count as inside, where `magnitude` is the largest absolute
/// corner coordinate. This covers f32 rounding at any coordinate scale.
pub const CONTAINMENT_EPSILON: f32 = 4.0 * f32::EPSILON;

/// A triangle defined by three corners.
///
/// Edge vectors and the unit face normal are computed once at construction.
/// A zero-area triangle is representable; its cached normal is the zero vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    a: Point3<f32>,
    b: Point3<f32>,
    c: Point3<f32>,
    seg_ab: Vector3<f32>,
    seg_bc: Vector3<f32>,
    seg_ca: Vector3<f32>,
    normal: Vector3<f32>,
}

impl Triangle {
    pub fn new(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        let seg_ab = b - a;
        let seg_bc = c - b;
        let seg_ca = a - c;
        let normal = seg_ab
            .cross(&seg_bc)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros);

        Self {
            a,
            b,
            c,
            seg_ab,
            seg_bc,
            seg_ca,
            normal,
        }
    }

    pub fn a(&self) -> Point3<f32> {
        self.a
    }

    pub fn b(&self) -> Point3<f32> {
        self.b
    }

    pub fn c(&self) -> Point3<f32> {
        self.c
    }

    /// Unit face normal following the A→B→C winding (zero when degenerate)
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Edge vectors `(B−A, C−B, A−C)`
    pub fn edges(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        (self.seg_ab, self.seg_bc, self.seg_ca)
    }

    /// True if two of the corners are exactly equal
    pub fn is_degenerate(&self) -> bool {
        self.a == self.b || self.b == self.c || self.c == self.a
    }

    /// Return the corner with the given index: 0=A, 1=B, 2=C.
    ///
    /// # Panics
    /// Panics if `index` is greater than 2.
    pub fn vertex_with_index(&self, index: usize) -> Point3<f32> {
        match index {
            0 => self.a,
            1 => self.b,
            2 => self.c,
            _ => panic!("triangle vertex index {} out of range [0, 2]", index),
        }
    }

    /// Intersect the ray starting at `origin` and heading along `ray` with this
    /// triangle.
    ///
    /// Returns `None` if the ray is parallel to the plane, hits the plane behind
    /// the origin or outside the triangle, or if the triangle has no area.
    pub fn intersects_ray(&self, ray: &Vector3<f32>, origin: &Point3<f32>) -> Option<Point3<f32>> {
        let direction = ray.try_normalize(f32::EPSILON)?;

        // A degenerate triangle has a zero normal and falls out here as well
        let denominator = self.normal.dot(&direction);
        if denominator.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (self.a - origin).dot(&self.normal) / denominator;
        if t < 0.0 {
            return None;
        }

        let point = origin + direction * t;
        if self.contains_point(&point) {
            Some(point)
        } else {
            None
        }
    }

    /// Determine if a point lying on (or near) the triangle's plane is inside
    /// the triangle, edges included.
    pub fn contains_point(&self, p: &Point3<f32>) -> bool {
        if self.normal == Vector3::zeros() {
            return false;
        }

        let magnitude = [self.a, self.b, self.c]
            .iter()
            .map(|corner| corner.coords.amax())
            .fold(0.0, f32::max);
        let tolerance = CONTAINMENT_EPSILON * magnitude;

        // Signed area over edge length is the signed distance to the edge line
        let inside = |corner: &Point3<f32>, edge: &Vector3<f32>| {
            edge.cross(&(p - corner)).dot(&self.normal) >= -tolerance * edge.norm()
        };

        inside(&self.a, &self.seg_ab) && inside(&self.b, &self.seg_bc) && inside(&self.c, &self.seg_ca)
    }

    pub fn barycenter(&self) -> Point3<f32> {
        Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    /// Transform each corner as a point by `matrix`, producing a new triangle
    pub fn transform_by_matrix(&self, matrix: &Matrix4<f32>) -> Triangle {
        Triangle::new(
            matrix.transform_point(&self.a),
            matrix.transform_point(&self.b),
            matrix.transform_point(&self.c),
        )
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A: {:.6}, {:.6}, {:.6}, B: {:.6}, {:.6}, {:.6}, C: {:.6}, {:.6}, {:.6}",
            self.a.x, self.a.y, self.a.z, self.b.x, self.b.y, self.b.z, self.c.x, self.c.y, self.c.z
        )
    }
}
