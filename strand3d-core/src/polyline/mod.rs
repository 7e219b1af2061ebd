//! Thick polylines tessellated into camera-facing strips.
//!
//! A [`Polyline`] owns its paths, thickness and join style, and keeps a
//! [`PolylineGeometry`] that always reflects them: every setter rebuilds the
//! geometry before returning. [`Polyline::append_point`] is the one narrow
//! update, touching only the tail of the last path.

mod encode;
mod shader;

pub use encode::{
    PolylineGeometry, PolylineVertex, CAP_SEGMENTS, COLINEAR_EPSILON, JOIN_SEGMENTS, VERTEX_STRIDE,
};
pub use shader::{create_polyline_shader_modifiers, PolylineShaderModifiers};

use log::{debug, trace, warn};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use encode::PathCursor;

/// How consecutive segments are connected and how path ends are closed.
///
/// Round uses more triangles but looks better for all shapes; Bevel clips the
/// corners off and is cheaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStyle {
    #[default]
    Round,
    Bevel,
}

/// Appearance settings shared by configuration files and constructors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolylineStyle {
    pub thickness: f32,
    pub join_style: JoinStyle,
}

impl Default for PolylineStyle {
    fn default() -> Self {
        Self {
            thickness: 0.1,
            join_style: JoinStyle::Round,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PolylineError {
    #[error("cannot append a point: the polyline has no path")]
    NoPath,
}

#[derive(Debug, Clone)]
pub struct Polyline {
    paths: Vec<Vec<Point3<f32>>>,
    thickness: f32,
    join_style: JoinStyle,
    geometry: PolylineGeometry,
    /// Encoding state of the last path; `Some` exactly when there is a path
    cursor: Option<PathCursor>,
}

impl Polyline {
    /// Create a polyline made of several independent paths
    pub fn new(paths: Vec<Vec<Point3<f32>>>, thickness: f32, join_style: JoinStyle) -> Self {
        create_polyline_shader_modifiers();

        let mut polyline = Self {
            paths,
            thickness,
            join_style,
            geometry: PolylineGeometry::new(),
            cursor: None,
        };
        polyline.update();
        polyline
    }

    /// Create a polyline with a single path
    pub fn from_path(path: Vec<Point3<f32>>, thickness: f32, join_style: JoinStyle) -> Self {
        Self::new(vec![path], thickness, join_style)
    }

    pub fn with_style(paths: Vec<Vec<Point3<f32>>>, style: PolylineStyle) -> Self {
        Self::new(paths, style.thickness, style.join_style)
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    /// Set the thickness and rebuild. Driven every frame when animated.
    pub fn set_thickness(&mut self, thickness: f32) {
        self.thickness = thickness;
        self.update();
    }

    pub fn join_style(&self) -> JoinStyle {
        self.join_style
    }

    pub fn set_join_style(&mut self, join_style: JoinStyle) {
        self.join_style = join_style;
        self.update();
    }

    pub fn style(&self) -> PolylineStyle {
        PolylineStyle {
            thickness: self.thickness,
            join_style: self.join_style,
        }
    }

    pub fn paths(&self) -> &[Vec<Point3<f32>>] {
        &self.paths
    }

    /// Replace every path and rebuild all geometry
    pub fn set_paths(&mut self, paths: Vec<Vec<Point3<f32>>>) {
        self.paths = paths;
        self.update();
    }

    /// Append a point to the last path.
    ///
    /// Only the new segment, its join and the closing endcap are encoded, so
    /// this is much cheaper than [`Self::set_paths`] for long paths.
    pub fn append_point(&mut self, point: Point3<f32>) -> Result<(), PolylineError> {
        let (Some(path), Some(cursor)) = (self.paths.last_mut(), self.cursor.as_mut()) else {
            warn!("Ignoring appended point {:?}: polyline has no path", point);
            return Err(PolylineError::NoPath);
        };

        path.push(point);
        self.geometry
            .extend_line(cursor, point, self.thickness / 2.0, self.join_style);

        trace!(
            "Appended point, path now has {} points ({} vertices)",
            path.len(),
            self.geometry.vertex_count()
        );
        Ok(())
    }

    /// True if there are no paths
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Last point of the last path, if any
    pub fn last_point(&self) -> Option<Point3<f32>> {
        self.paths.last().and_then(|path| path.last()).copied()
    }

    pub fn geometry(&self) -> &PolylineGeometry {
        &self.geometry
    }

    pub fn shader_modifiers(&self) -> &'static PolylineShaderModifiers {
        create_polyline_shader_modifiers()
    }

    /// Rebuild the geometry from the current paths, thickness and join style
    fn update(&mut self) {
        self.geometry.clear();
        self.cursor = None;

        let half_width = self.thickness / 2.0;
        for path in &self.paths {
            self.cursor = Some(self.geometry.encode_line(path, half_width, self.join_style));
        }

        debug!(
            "Rebuilt polyline: {} paths, {} vertices, {} indices",
            self.paths.len(),
            self.geometry.vertex_count(),
            self.geometry.index_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn p(x: f32, y: f32, z: f32) -> Point3<f32> {
        Point3::new(x, y, z)
    }

    fn kinked() -> Vec<Point3<f32>> {
        vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(2.0, 1.0, 0.5)]
    }

    #[test]
    fn test_empty_paths() {
        let mut polyline = Polyline::from_path(kinked(), 1.0, JoinStyle::Round);
        assert!(!polyline.geometry().is_empty());

        polyline.set_paths(Vec::new());
        assert_eq!(polyline.geometry().vertex_count(), 0);
        assert_eq!(polyline.geometry().index_count(), 0);
        assert!(polyline.is_empty());
        assert!(polyline.last_point().is_none());
    }

    #[test]
    fn test_short_paths_are_empty() {
        let polyline = Polyline::new(vec![vec![], vec![p(1.0, 2.0, 3.0)]], 1.0, JoinStyle::Round);
        assert!(polyline.geometry().is_empty());
        assert!(!polyline.is_empty());
    }

    #[test]
    fn test_append_matches_full_rebuild() {
        let mut appended = Polyline::from_path(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)], 1.0, JoinStyle::Round);
        appended.append_point(p(2.0, 0.0, 0.0)).unwrap();

        let rebuilt = Polyline::from_path(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)],
            1.0,
            JoinStyle::Round,
        );
        assert_eq!(appended.geometry(), rebuilt.geometry());
        assert_eq!(appended.geometry().as_bytes(), rebuilt.geometry().as_bytes());
        assert_eq!(appended.paths(), rebuilt.paths());
    }

    #[test]
    fn test_append_matches_full_rebuild_with_kinks() {
        for join_style in [JoinStyle::Round, JoinStyle::Bevel] {
            let mut appended = Polyline::new(vec![vec![p(5.0, 5.0, 5.0), p(6.0, 5.0, 5.0)], vec![]], 0.3, join_style);
            for point in kinked() {
                appended.append_point(point).unwrap();
            }
            // Duplicate point is tolerated
            appended.append_point(p(2.0, 1.0, 0.5)).unwrap();

            let mut path = kinked();
            path.push(p(2.0, 1.0, 0.5));
            let rebuilt = Polyline::new(vec![vec![p(5.0, 5.0, 5.0), p(6.0, 5.0, 5.0)], path], 0.3, join_style);
            assert_eq!(appended.geometry(), rebuilt.geometry());
        }
    }

    #[test]
    fn test_append_without_path() {
        let mut polyline = Polyline::new(Vec::new(), 1.0, JoinStyle::Round);
        assert_eq!(polyline.append_point(p(0.0, 0.0, 0.0)), Err(PolylineError::NoPath));
        assert!(polyline.geometry().is_empty());
        assert!(polyline.is_empty());
    }

    #[test]
    fn test_append_to_empty_path() {
        let mut polyline = Polyline::new(vec![vec![]], 1.0, JoinStyle::Bevel);
        polyline.append_point(p(0.0, 0.0, 0.0)).unwrap();
        assert!(polyline.geometry().is_empty());

        polyline.append_point(p(0.0, 1.0, 0.0)).unwrap();
        assert_eq!(polyline.geometry().quad_count(), 1);
        assert_eq!(polyline.last_point(), Some(p(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_bevel_reduces_join_vertices() {
        let mut polyline = Polyline::from_path(kinked(), 1.0, JoinStyle::Round);
        let round_vertices = polyline.geometry().vertex_count();
        let round_quads = polyline.geometry().quad_count();

        polyline.set_join_style(JoinStyle::Bevel);
        assert_eq!(polyline.join_style(), JoinStyle::Bevel);
        assert_eq!(polyline.geometry().quad_count(), round_quads);
        assert_eq!(round_quads, 3);
        assert!(polyline.geometry().vertex_count() < round_vertices);

        // Two caps and two joins, each collapsed to a single triangle
        let cap_indices = &polyline.geometry().elements()[1].indices;
        assert_eq!(cap_indices.len(), 4 * 3);
    }

    #[test]
    fn test_set_thickness_rebuilds() {
        let mut polyline = Polyline::from_path(kinked(), 1.0, JoinStyle::Round);
        polyline.set_thickness(3.0);
        assert_eq!(polyline.thickness(), 3.0);
        assert!(polyline
            .geometry()
            .vertices()
            .iter()
            .all(|vertex| vertex.half_width() == 0.0 || vertex.half_width() == 1.5));

        // Not validated, passed straight through
        polyline.set_thickness(-2.0);
        assert!(polyline
            .geometry()
            .vertices()
            .iter()
            .all(|vertex| vertex.half_width() == 0.0 || vertex.half_width() == -1.0));
    }

    #[test]
    fn test_multiple_paths_concatenate() {
        let a = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)];
        let b = vec![p(0.0, 2.0, 0.0), p(0.0, 3.0, 0.0)];
        let single_a = Polyline::from_path(a.clone(), 1.0, JoinStyle::Round);
        let single_b = Polyline::from_path(b.clone(), 1.0, JoinStyle::Round);
        let both = Polyline::new(vec![a, b], 1.0, JoinStyle::Round);

        let offset = single_a.geometry().vertex_count();
        assert_eq!(both.geometry().vertex_count(), offset + single_b.geometry().vertex_count());
        assert_eq!(both.geometry().quad_count(), 2);

        let quads = &both.geometry().elements()[0].indices;
        let expected: Vec<u32> = single_b.geometry().elements()[0]
            .indices
            .iter()
            .map(|index| index + offset as u32)
            .collect();
        assert_eq!(&quads[6..], expected.as_slice());
    }

    #[test]
    fn test_expanded_mesh_is_pickable() {
        let polyline = Polyline::from_path(vec![p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0)], 2.0, JoinStyle::Round);
        let view = Vector3::new(0.0, 0.0, -1.0);
        let mesh = polyline.geometry().to_mesh(&view);
        assert!(!mesh.is_empty());

        let origin = |x: f32, y: f32| p(x, y, 5.0);
        let hit = mesh.raycast(&view, &origin(2.0, 0.9)).unwrap();
        assert_relative_eq!(hit.point, p(2.0, 0.9, 0.0), epsilon = 1e-5);
        assert_relative_eq!(hit.distance, 5.0, epsilon = 1e-5);

        // Inside the round start cap, outside the strip
        assert!(mesh.raycast(&view, &origin(-0.5, 0.1)).is_some());
        assert!(mesh.raycast(&view, &origin(2.0, 1.2)).is_none());
        assert!(mesh.raycast(&view, &origin(5.5, 0.0)).is_none());
    }

    #[test]
    fn test_style_round_trip() {
        let style: PolylineStyle = toml::from_str("thickness = 0.5\njoin_style = \"bevel\"").unwrap();
        assert_eq!(style.thickness, 0.5);
        assert_eq!(style.join_style, JoinStyle::Bevel);

        let defaulted: PolylineStyle = toml::from_str("").unwrap();
        assert_eq!(defaulted, PolylineStyle::default());

        let polyline = Polyline::with_style(vec![kinked()], style);
        assert_eq!(polyline.style(), style);
    }

    #[test]
    fn test_shared_shader_modifiers() {
        let a = Polyline::from_path(kinked(), 1.0, JoinStyle::Round);
        let b = Polyline::from_path(kinked(), 2.0, JoinStyle::Bevel);
        assert!(std::ptr::eq(a.shader_modifiers(), b.shader_modifiers()));
    }
}
