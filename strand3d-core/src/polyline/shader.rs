//! Vertex-stage modifier shared by every polyline.
//!
//! Polyline vertices sit on the centerline; the modifier pushes each one out
//! perpendicular to both the line and the view direction so the strip always
//! faces the camera. The GLSL snippet is what the material system injects,
//! and [`PolylineShaderModifiers::expand`] is the same computation on the CPU
//! for picking and software rendering.

use std::sync::OnceLock;

use log::debug;
use nalgebra::{Point3, Vector3};

use super::encode::PolylineVertex;
use crate::geometry::Semantic;

const EXPANSION_EPSILON: f32 = 1e-6;

const VERTEX_MODIFIER: &str = r#"
uniform highp vec3 polyline_view_direction;
in highp vec3 polyline_direction;
in highp vec3 polyline_neighbor;
in highp vec4 polyline_expansion;
out highp float polyline_capped;

highp vec3 perp = cross(polyline_direction, polyline_view_direction);
if (length(perp) < 1e-6) {
    highp vec3 axis = abs(polyline_direction.x) < 0.9 ? vec3(1.0, 0.0, 0.0) : vec3(0.0, 1.0, 0.0);
    perp = cross(polyline_direction, axis);
}
perp = normalize(perp);
highp vec3 fwd = cross(polyline_view_direction, perp);
fwd = length(fwd) < 1e-6 ? polyline_direction : normalize(fwd);

highp float side = polyline_expansion.x;
if (dot(perp, polyline_neighbor) < 0.0) {
    side = -side;
}
highp float rotation = polyline_expansion.y;
highp vec3 offset = cos(rotation) * perp + sin(rotation) * fwd;
_geometry.position += offset * side * polyline_expansion.z;
polyline_capped = polyline_expansion.w;
"#;

static SHADER_MODIFIERS: OnceLock<PolylineShaderModifiers> = OnceLock::new();

/// Get the process-wide polyline modifiers, creating them on first use.
///
/// Creation happens exactly once; every later call returns the same instance.
pub fn create_polyline_shader_modifiers() -> &'static PolylineShaderModifiers {
    SHADER_MODIFIERS.get_or_init(|| {
        debug!("Creating polyline shader modifiers");
        PolylineShaderModifiers {
            vertex_source: VERTEX_MODIFIER,
        }
    })
}

#[derive(Debug)]
pub struct PolylineShaderModifiers {
    vertex_source: &'static str,
}

impl PolylineShaderModifiers {
    /// GLSL body appended to the geometry stage of the vertex shader
    pub fn vertex_source(&self) -> &'static str {
        self.vertex_source
    }

    /// Shader input name for each vertex attribute
    pub fn attribute_name(&self, semantic: Semantic) -> &'static str {
        match semantic {
            Semantic::Position => "position",
            Semantic::Direction => "polyline_direction",
            Semantic::Neighbor => "polyline_neighbor",
            Semantic::Expansion => "polyline_expansion",
        }
    }

    /// Final position of `vertex` for a viewer looking along `view_direction`.
    ///
    /// The capped flag does not move a vertex; the snippet only forwards it
    /// to the fragment stage as `polyline_capped`.
    pub fn expand(&self, vertex: &PolylineVertex, view_direction: &Vector3<f32>) -> Point3<f32> {
        let direction = vertex.direction();
        let perp = direction
            .cross(view_direction)
            .try_normalize(EXPANSION_EPSILON)
            .unwrap_or_else(|| orthogonal_to(&direction));
        let forward = view_direction
            .cross(&perp)
            .try_normalize(EXPANSION_EPSILON)
            .unwrap_or(direction);

        let side = if perp.dot(&vertex.neighbor()) < 0.0 {
            -vertex.side()
        } else {
            vertex.side()
        };

        let (sin, cos) = vertex.rotation().sin_cos();
        let offset = perp * cos + forward * sin;
        vertex.position() + offset * (side * vertex.half_width())
    }
}

fn orthogonal_to(direction: &Vector3<f32>) -> Vector3<f32> {
    let axis = if direction.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    direction
        .cross(&axis)
        .try_normalize(EXPANSION_EPSILON)
        .unwrap_or_else(Vector3::z)
}
