//! Vertex layout and path encoding for thick polylines.
//!
//! Every vertex is anchored on the polyline's centerline. The actual offset
//! away from the line depends on the view direction and is applied by the
//! shader modifier (see [`super::shader`]), so a vertex only records the
//! anchor, the direction that drives the expansion frame and the expansion
//! parameters.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::mem::size_of;

use nalgebra::{Point3, Vector3};

use super::shader::create_polyline_shader_modifiers;
use super::JoinStyle;
use crate::geometry::{GeometryElement, GeometrySource, Mesh, Semantic};
use crate::segment::LineSegment;
use crate::triangle::Triangle;

/// Triangles in a round endcap (half circle)
pub const CAP_SEGMENTS: usize = 8;

/// Triangles in a round join (full circle)
pub const JOIN_SEGMENTS: usize = 16;

/// Consecutive segments whose unit directions satisfy `1 - dot <= COLINEAR_EPSILON`
/// continue straight and get no join geometry.
pub const COLINEAR_EPSILON: f32 = 1e-4;

/// Size in bytes of one interleaved [`PolylineVertex`]
pub const VERTEX_STRIDE: usize = size_of::<PolylineVertex>();

const QUAD_ELEMENT: usize = 0;
const CAP_ELEMENT: usize = 1;

/// Interleaved polyline vertex as uploaded to the GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineVertex {
    /// Anchor point on the centerline
    pub position: [f32; 3],
    /// Unit direction of the segment that owns this vertex
    pub direction: [f32; 3],
    /// Direction of the adjacent segment for bevel join corners, zero otherwise
    pub neighbor: [f32; 3],
    /// `[side, rotation, half_width, capped]`.
    ///
    /// `capped` is 1 where a quad end meets a cap or join and 0 at a seamless
    /// continuation. It leaves the expansion alone and is handed on to
    /// materials as the `polyline_capped` varying.
    pub params: [f32; 4],
}

// Only f32 arrays, no padding
unsafe impl bytemuck::Pod for PolylineVertex {}
unsafe impl bytemuck::Zeroable for PolylineVertex {}

impl PolylineVertex {
    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.position)
    }

    pub fn direction(&self) -> Vector3<f32> {
        Vector3::from(self.direction)
    }

    pub fn neighbor(&self) -> Vector3<f32> {
        Vector3::from(self.neighbor)
    }

    /// +1 or -1: which side of the line the vertex expands to
    pub fn side(&self) -> f32 {
        self.params[0]
    }

    /// Angle (radians) of the vertex around a cap, measured from the side axis
    /// towards the segment direction
    pub fn rotation(&self) -> f32 {
        self.params[1]
    }

    pub fn half_width(&self) -> f32 {
        self.params[2]
    }

    /// False for quad corners at an open (seamless) continuation
    pub fn is_capped(&self) -> bool {
        self.params[3] != 0.0
    }
}

/// Which part of a circle an endcap covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CapArc {
    /// Behind the first point of a path
    Start,
    /// Ahead of the last point of a path
    End,
    /// All around an interior joint
    Full,
}

impl CapArc {
    fn start_angle(self) -> f32 {
        match self {
            CapArc::Start => PI,
            CapArc::End | CapArc::Full => 0.0,
        }
    }

    fn span(self) -> f32 {
        match self {
            CapArc::Start | CapArc::End => PI,
            CapArc::Full => TAU,
        }
    }
}

/// Encoding state of the last segment of a path
#[derive(Debug, Clone, Copy, PartialEq)]
struct SegmentTail {
    direction: Vector3<f32>,
    /// First vertex of the segment's quad
    quad_vertex: usize,
    /// Buffer lengths just before the closing endcap was written
    endcap_vertex: usize,
    endcap_index: usize,
}

/// Where encoding of a path stopped, so the path can be extended in place
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct PathCursor {
    last_point: Option<Point3<f32>>,
    tail: Option<SegmentTail>,
}

/// Vertex buffer and index elements describing a tessellated polyline.
///
/// Element 0 holds the segment quads, element 1 the caps and joins; both are
/// triangle lists indexing into the same vertex buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineGeometry {
    vertices: Vec<PolylineVertex>,
    elements: Vec<GeometryElement>,
}

impl PolylineGeometry {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            elements: vec![
                GeometryElement::triangles(Vec::new()),
                GeometryElement::triangles(Vec::new()),
            ],
        }
    }

    pub fn vertices(&self) -> &[PolylineVertex] {
        &self.vertices
    }

    pub fn elements(&self) -> &[GeometryElement] {
        &self.elements
    }

    /// Raw interleaved vertex bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Attribute descriptors over [`Self::as_bytes`]
    pub fn sources(&self) -> Vec<GeometrySource> {
        const F32: usize = size_of::<f32>();
        let count = self.vertices.len();
        let source = |semantic, components, offset| GeometrySource {
            semantic,
            count,
            components,
            offset,
            stride: VERTEX_STRIDE,
        };

        vec![
            source(Semantic::Position, 3, 0),
            source(Semantic::Direction, 3, 3 * F32),
            source(Semantic::Neighbor, 3, 6 * F32),
            source(Semantic::Expansion, 4, 9 * F32),
        ]
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.elements.iter().map(|element| element.indices.len()).sum()
    }

    pub fn quad_count(&self) -> usize {
        self.elements[QUAD_ELEMENT].indices.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Expand every vertex for a viewer looking along `view_direction` and
    /// collect the resulting non-degenerate triangles
    pub fn to_mesh(&self, view_direction: &Vector3<f32>) -> Mesh {
        let modifiers = create_polyline_shader_modifiers();
        let expanded: Vec<Point3<f32>> = self
            .vertices
            .iter()
            .map(|vertex| modifiers.expand(vertex, view_direction))
            .collect();

        self.elements
            .iter()
            .flat_map(|element| element.indices.chunks_exact(3))
            .map(|corners| {
                Triangle::new(
                    expanded[corners[0] as usize],
                    expanded[corners[1] as usize],
                    expanded[corners[2] as usize],
                )
            })
            .filter(|triangle| !triangle.is_degenerate())
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.vertices.clear();
        for element in &mut self.elements {
            element.indices.clear();
        }
    }

    /// Encode a whole path, returning the cursor needed to extend it later
    pub(crate) fn encode_line(
        &mut self,
        path: &[Point3<f32>],
        half_width: f32,
        join_style: JoinStyle,
    ) -> PathCursor {
        let mut cursor = PathCursor::default();
        for point in path {
            self.extend_line(&mut cursor, *point, half_width, join_style);
        }
        cursor
    }

    /// Add one point to the path described by `cursor`.
    ///
    /// The path's closing endcap is dropped and rewritten after the new
    /// segment, so the work done is independent of the path length and the
    /// result matches encoding the longer path from scratch.
    pub(crate) fn extend_line(
        &mut self,
        cursor: &mut PathCursor,
        point: Point3<f32>,
        half_width: f32,
        join_style: JoinStyle,
    ) {
        let Some(previous) = cursor.last_point else {
            cursor.last_point = Some(point);
            return;
        };

        let segment = LineSegment::new(previous, point);
        let Some(direction) = segment.direction() else {
            // Zero-length segment
            return;
        };

        let begin_capped = match cursor.tail {
            None => {
                self.encode_circular_endcap(previous, direction, CapArc::Start, half_width, join_style);
                true
            }
            Some(tail) => {
                self.vertices.truncate(tail.endcap_vertex);
                self.elements[CAP_ELEMENT].indices.truncate(tail.endcap_index);

                if 1.0 - tail.direction.dot(&direction) <= COLINEAR_EPSILON {
                    self.open_quad_end(tail.quad_vertex);
                    false
                } else {
                    self.encode_join(previous, tail.direction, direction, half_width, join_style);
                    true
                }
            }
        };

        let quad_vertex = self.vertices.len();
        self.encode_quad(&segment, direction, begin_capped, true, half_width);

        let endcap_vertex = self.vertices.len();
        let endcap_index = self.elements[CAP_ELEMENT].indices.len();
        self.encode_circular_endcap(point, direction, CapArc::End, half_width, join_style);

        cursor.last_point = Some(point);
        cursor.tail = Some(SegmentTail {
            direction,
            quad_vertex,
            endcap_vertex,
            endcap_index,
        });
    }

    /// Four corners (two per end) and two triangles
    fn encode_quad(
        &mut self,
        segment: &LineSegment,
        direction: Vector3<f32>,
        begin_capped: bool,
        end_capped: bool,
        half_width: f32,
    ) {
        let base = self.vertices.len() as u32;

        self.write_corner(segment.a(), direction, 1.0, half_width, begin_capped);
        self.write_corner(segment.a(), direction, -1.0, half_width, begin_capped);
        self.write_corner(segment.b(), direction, 1.0, half_width, end_capped);
        self.write_corner(segment.b(), direction, -1.0, half_width, end_capped);

        self.elements[QUAD_ELEMENT].indices.extend_from_slice(&[
            base,
            base + 1,
            base + 2,
            base + 2,
            base + 1,
            base + 3,
        ]);
    }

    /// Mark the end of an already written quad as a seamless continuation
    fn open_quad_end(&mut self, quad_vertex: usize) {
        for vertex in &mut self.vertices[quad_vertex + 2..quad_vertex + 4] {
            vertex.params[3] = 0.0;
        }
    }

    /// Round: a fan around `center`. Bevel: one triangle clipping the arc.
    fn encode_circular_endcap(
        &mut self,
        center: Point3<f32>,
        direction: Vector3<f32>,
        arc: CapArc,
        half_width: f32,
        join_style: JoinStyle,
    ) {
        let base = self.vertices.len() as u32;
        let start = arc.start_angle();

        match join_style {
            JoinStyle::Round => {
                let segments = if arc == CapArc::Full { JOIN_SEGMENTS } else { CAP_SEGMENTS };
                let step = arc.span() / segments as f32;
                // A full circle reuses its first rim vertex to close the fan
                let rim = if arc == CapArc::Full { segments } else { segments + 1 };

                self.write_endcap_corner(center, direction, 0.0, 0.0);
                for k in 0..rim {
                    self.write_endcap_corner(center, direction, start + step * k as f32, half_width);
                }

                let indices = &mut self.elements[CAP_ELEMENT].indices;
                for k in 0..segments as u32 {
                    let next = (k + 1) % rim as u32;
                    indices.extend_from_slice(&[base, base + 1 + k, base + 1 + next]);
                }
            }
            JoinStyle::Bevel => {
                for k in 0..3 {
                    self.write_endcap_corner(center, direction, start + FRAC_PI_2 * k as f32, half_width);
                }
                self.elements[CAP_ELEMENT]
                    .indices
                    .extend_from_slice(&[base, base + 1, base + 2]);
            }
        }
    }

    /// Fill the outer gap at a kink between two segments
    fn encode_join(
        &mut self,
        center: Point3<f32>,
        incoming: Vector3<f32>,
        outgoing: Vector3<f32>,
        half_width: f32,
        join_style: JoinStyle,
    ) {
        match join_style {
            JoinStyle::Round => {
                self.encode_circular_endcap(center, outgoing, CapArc::Full, half_width, join_style)
            }
            JoinStyle::Bevel => {
                let base = self.vertices.len() as u32;
                self.write_endcap_corner(center, outgoing, 0.0, 0.0);
                // The outer side is resolved at expansion time from the
                // neighbor direction, since it depends on the viewer
                self.vertices.push(PolylineVertex {
                    position: center.into(),
                    direction: incoming.into(),
                    neighbor: outgoing.into(),
                    params: [-1.0, 0.0, half_width, 1.0],
                });
                self.vertices.push(PolylineVertex {
                    position: center.into(),
                    direction: outgoing.into(),
                    neighbor: incoming.into(),
                    params: [1.0, 0.0, half_width, 1.0],
                });
                self.elements[CAP_ELEMENT]
                    .indices
                    .extend_from_slice(&[base, base + 1, base + 2]);
            }
        }
    }

    fn write_corner(
        &mut self,
        position: Point3<f32>,
        direction: Vector3<f32>,
        side: f32,
        half_width: f32,
        capped: bool,
    ) {
        self.vertices.push(PolylineVertex {
            position: position.into(),
            direction: direction.into(),
            neighbor: [0.0; 3],
            params: [side, 0.0, half_width, if capped { 1.0 } else { 0.0 }],
        });
    }

    fn write_endcap_corner(
        &mut self,
        position: Point3<f32>,
        direction: Vector3<f32>,
        rotation: f32,
        half_width: f32,
    ) {
        self.vertices.push(PolylineVertex {
            position: position.into(),
            direction: direction.into(),
            neighbor: [0.0; 3],
            params: [1.0, rotation, half_width, 1.0],
        });
    }
}

impl Default for PolylineGeometry {
    fn default() -> Self {
        Self::new()
    }
}
