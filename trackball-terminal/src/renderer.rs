/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;
use trackball_core::{Camera, Mesh, Triangle};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Shading floor so faces turned away from the light stay visible.
const AMBIENT: f32 = 0.15;

/// ASCII renderer that converts 3D meshes to terminal characters
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

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Reallocate the buffers for a new terminal size.
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Rasterize `mesh` through `model_view`, shading each face by how
    /// directly it faces the viewer.
    pub fn render_mesh(&mut self, mesh: &Mesh, model_view: &Matrix4<f32>, camera: &Camera) {
        let normal_matrix = model_view.fixed_view::<3, 3>(0, 0).into_owned();
        for triangle in &mesh.triangles {
            let normal = normal_matrix * triangle.face_normal();
            let brightness = normal.dot(&Vector3::z()).max(0.0) * (1.0 - AMBIENT) + AMBIENT;
            let index = ((brightness * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize)
                .min(LUMINOSITY_RAMP.len() - 1);
            self.render_triangle(triangle, model_view, camera, LUMINOSITY_RAMP[index]);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model_view: &Matrix4<f32>,
        camera: &Camera,
        character: char,
    ) {
        let (width, height) = (self.width as u32, self.height as u32);
        let mut screen = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen.iter_mut().zip(&triangle.vertices) {
            match camera.project_to_screen(&vertex.position, model_view, width, height) {
                Some(projected) => *slot = projected,
                // any vertex outside the view volume drops the face
                None => return,
            }
        }
        self.fill(screen, character);
    }

    fn fill(&mut self, [a, b, c]: [(f32, f32, f32); 3], character: char) {
        let area = edge(a, b, (c.0, c.1));
        if area.abs() < 1e-6 || self.width == 0 || self.height == 0 {
            return;
        }

        let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as usize;
        let max_x = (a.0.max(b.0).max(c.0).ceil() as usize).min(self.width - 1);
        let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as usize;
        let max_y = (a.1.max(b.1).max(c.1).ceil() as usize).min(self.height - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let wa = edge(b, c, p) / area;
                let wb = edge(c, a, p) / area;
                let wc = 1.0 - wa - wb;
                if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                    continue;
                }

                let depth = wa * a.2 + wb * b.2 + wc * c.2;
                let idx = y * self.width + x;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                }
            }
        }
    }

    /// The characters of row `y`.
    pub fn row(&self, y: usize) -> String {
        self.char_buffer[y * self.width..(y + 1) * self.width].iter().collect()
    }

    /// Queue the frame starting at terminal row `top`.
    pub fn draw<W: Write>(&self, writer: &mut W, top: u16) -> std::io::Result<()> {
        for y in 0..self.height {
            writer.queue(MoveTo(0, top + y as u16))?;
            let mut current = None;
            for &c in &self.char_buffer[y * self.width..(y + 1) * self.width] {
                let color = shade_color(c);
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn shade_color(c: char) -> Color {
    match c {
        ' ' | '.' | ':' => Color::DarkGrey,
        '-' | '=' => Color::Grey,
        '+' | '*' => Color::White,
        _ => Color::Cyan,
    }
}

/// Twice the signed area of the triangle (a, b, p).
fn edge(a: (f32, f32, f32), b: (f32, f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackball_core::RotationState;

    fn view(distance: f64) -> Matrix4<f32> {
        RotationState::new(None, None, Some(distance))
            .unwrap()
            .view_matrix()
            .cast::<f32>()
    }

    #[test]
    fn test_cube_covers_center() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let camera = Camera::new(40, 20);
        renderer.render_mesh(&Mesh::cube(2.0), &view(5.0), &camera);

        // the front face looks straight at the viewer: brightest character
        let middle = renderer.row(10);
        assert_eq!(middle.chars().nth(20), Some('@'));
        assert_eq!(middle.chars().next(), Some(' '));
    }

    #[test]
    fn test_clear_resets_buffers() {
        let mut renderer = AsciiRenderer::new(20, 10);
        let camera = Camera::new(20, 10);
        renderer.render_mesh(&Mesh::cube(2.0), &view(4.0), &camera);
        assert!(!renderer.row(5).trim().is_empty());

        renderer.clear();
        for y in 0..10 {
            assert_eq!(renderer.row(y), " ".repeat(20));
        }
    }

    #[test]
    fn test_resize_and_draw() {
        let mut renderer = AsciiRenderer::new(4, 2);
        renderer.resize(6, 3);
        assert_eq!(renderer.size(), (6, 3));

        let mut out = Vec::new();
        renderer.draw(&mut out, 1).unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn test_mesh_behind_viewer_is_skipped() {
        let mut renderer = AsciiRenderer::new(20, 10);
        let camera = Camera::new(20, 10);
        // eye sits inside the cube: every face has a vertex behind it
        renderer.render_mesh(&Mesh::cube(2.0), &view(0.0), &camera);
        for y in 0..10 {
            assert_eq!(renderer.row(y), " ".repeat(20));
        }
    }
}
