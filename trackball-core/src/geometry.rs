/// Triangle meshes shown by the trackball viewers
use nalgebra::{Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding order, zero for a degenerate face.
    pub fn face_normal(&self) -> Vector3<f32> {
        let [a, b, c] = self.vertices.map(|v| v.position);
        (b - a)
            .cross(&(c - a))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Axis-aligned cube centered on the origin.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        // outward normal and two in-face axes chosen so that u × v = normal
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ];

        let mut mesh = Self::with_capacity(12);
        for (normal, u, v) in faces {
            let (n, u, v) = (Vector3::from(normal), Vector3::from(u), Vector3::from(v));
            let corner = |su: f32, sv: f32| {
                Vertex::new(Point3::from((n + u * su + v * sv) * h), n)
            };
            let (a, b, c, d) = (corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0));
            mesh.add_triangle(Triangle::new(a, b, c));
            mesh.add_triangle(Triangle::new(a, c, d));
        }
        mesh
    }

    /// Mean of all vertex positions, the origin for an empty mesh.
    pub fn centroid(&self) -> Point3<f32> {
        let count = self.triangles.len() * 3;
        if count == 0 {
            return Point3::origin();
        }
        let sum = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter())
            .fold(Vector3::zeros(), |acc, v| acc + v.position.coords);
        Point3::from(sum / count as f32)
    }

    /// Largest distance from `center` to any vertex.
    pub fn bounding_radius(&self, center: &Point3<f32>) -> f32 {
        self.triangles
            .iter()
            .flat_map(|t| t.vertices.iter())
            .map(|v| (v.position - center).norm())
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_winding_matches_normals() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.triangles.len(), 12);
        for triangle in &cube.triangles {
            let stored = triangle.vertices[0].normal;
            assert!((triangle.face_normal() - stored).norm() < 1e-6);
            for vertex in &triangle.vertices {
                assert!(vertex.position.iter().all(|c| (c.abs() - 1.0).abs() < 1e-6));
            }
        }
    }

    #[test]
    fn test_centroid_and_radius() {
        let cube = Mesh::cube(2.0);
        assert!((cube.centroid() - Point3::origin()).norm() < 1e-6);
        assert!((cube.bounding_radius(&Point3::origin()) - 3f32.sqrt()).abs() < 1e-6);

        let empty = Mesh::new();
        assert!(empty.is_empty());
        assert_eq!(empty.centroid(), Point3::origin());
        assert_eq!(empty.bounding_radius(&Point3::origin()), 0.0);
    }

    #[test]
    fn test_degenerate_face_normal() {
        let p = Vertex::new(Point3::new(1.0, 1.0, 1.0), Vector3::zeros());
        let triangle = Triangle::new(p, p, p);
        assert_eq!(triangle.face_normal(), Vector3::zeros());
    }
}
