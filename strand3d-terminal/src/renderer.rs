/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;
use strand3d_core::{Mesh, Triangle};

use crate::camera::Camera;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Screen-space vertex: column, row, depth
type ScreenPoint = (f32, f32, f32);

/// ASCII renderer that converts triangle meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Number of cells covered by geometry since the last clear
    pub fn covered_cells(&self) -> usize {
        self.char_buffer.iter().filter(|c| **c != ' ').count()
    }

    pub fn render_mesh(&mut self, mesh: &Mesh, model_matrix: &Matrix4<f32>, camera: &Camera) {
        if self.width == 0 || self.height == 0 {
            return;
        }

        let light_dir = -camera.view_direction();
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, model_matrix, camera, &light_dir);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        light_dir: &Vector3<f32>,
    ) {
        let mut screen = [(0.0, 0.0, 0.0); 3];
        for (index, corner) in screen.iter_mut().enumerate() {
            match camera.project_to_screen(
                &triangle.vertex_with_index(index),
                model_matrix,
                self.width as u32,
                self.height as u32,
            ) {
                Some(projected) => *corner = projected,
                None => return,
            }
        }

        // Strips are two-sided, so shade by the absolute facing
        let normal = model_matrix
            .transform_vector(&triangle.normal())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        let brightness = normal.dot(light_dir).abs();

        let last = LUMINOSITY_RAMP.len() - 1;
        let char_index = ((brightness * last as f32) as usize).min(last);
        self.rasterize_triangle(&screen, LUMINOSITY_RAMP[char_index]);
    }

    fn rasterize_triangle(&mut self, screen: &[ScreenPoint; 3], character: char) {
        let [v0, v1, v2] = *screen;
        let area = edge_function(v0, v1, (v2.0, v2.1));
        if area.abs() < 1e-6 {
            return;
        }

        let min_x = v0.0.min(v1.0).min(v2.0).floor().max(0.0) as usize;
        let min_y = v0.1.min(v1.1).min(v2.1).floor().max(0.0) as usize;
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as usize).min(self.width.saturating_sub(1));
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as usize).min(self.height.saturating_sub(1));

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let sample = (x as f32 + 0.5, y as f32 + 0.5);

                // Normalized edge functions are the barycentric weights
                let w0 = edge_function(v1, v2, sample) / area;
                let w1 = edge_function(v2, v0, sample) / area;
                let w2 = edge_function(v0, v1, sample) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y * self.width + x;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.char_buffer.chunks(self.width.max(1)) {
            for c in row {
                let color = match c {
                    '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::Reset,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(Print('\n'))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Twice the signed area of the triangle `(a, b, p)` in screen space
fn edge_function(a: ScreenPoint, b: ScreenPoint, p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}
