/// Mapping of 2D pointer positions onto the virtual trackball
use nalgebra::Vector3;

use crate::transform::RotationState;

/// Pixel dimensions of the surface a pointer is dragged across.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The trackball silhouette for one drag: a circle centered on the surface
/// whose radius is the smaller half-dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackballSphere {
    center_x: f64,
    center_y: f64,
    radius: f64,
}

impl TrackballSphere {
    pub fn from_surface(size: SurfaceSize) -> Self {
        let center_x = size.width / 2.0;
        let center_y = size.height / 2.0;
        Self {
            center_x,
            center_y,
            radius: center_x.min(center_y),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_x, self.center_y)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Convert a surface-local pixel position into a world-space ray.
    ///
    /// Inside the silhouette the point is lifted onto the hemisphere facing
    /// the viewer; outside it stays in the image plane, which turns drags
    /// there into a roll about the viewing axis.
    pub fn project(&self, x: f64, y: f64, state: &RotationState) -> Vector3<f64> {
        let dx = x - self.center_x;
        // pixel y grows downward
        let dy = self.center_y - y;
        let in_plane = state.right() * dx + state.up() * dy;

        let dist2 = in_plane.norm_squared();
        let radius2 = self.radius * self.radius;
        if dist2 > radius2 {
            in_plane
        } else {
            in_plane + state.forward() * (radius2 - dist2).sqrt()
        }
    }
}
