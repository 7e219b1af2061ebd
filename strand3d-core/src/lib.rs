/// strand3d Core Library - Triangle math and polyline tessellation
///
/// This library provides the stateless geometric core used by the renderers:
/// ray/triangle queries for picking, and the conversion of 3D polylines into
/// thickened, capped vertex/index buffers ready for GPU upload.

pub mod geometry;
pub mod polyline;
pub mod segment;
pub mod triangle;

// Re-export commonly used types
pub use geometry::{GeometryElement, GeometrySource, Mesh, PrimitiveType, RayHit, Semantic};
pub use polyline::{
    create_polyline_shader_modifiers, JoinStyle, Polyline, PolylineError, PolylineGeometry,
    PolylineShaderModifiers, PolylineStyle, PolylineVertex,
};
pub use segment::LineSegment;
pub use triangle::Triangle;
