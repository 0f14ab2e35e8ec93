/// Trackball Core Library - Arcball rotation controller and shared geometry
///
/// This library provides the platform-neutral half of the trackball: the
/// orthonormal view basis, the hemisphere/plane ray projection, the
/// reflection-based rotation update and the press/drag/release state
/// machine. Hosts (terminal, browser) feed pointer events in and read the
/// exported view matrix out.

pub mod error;
pub mod geometry;
pub mod projection;
pub mod rotator;
pub mod stl;
pub mod trackball;
pub mod transform;
pub mod transvection;

// Re-export commonly used types
pub use error::RotatorError;
pub use geometry::{Mesh, Triangle, Vertex};
pub use projection::{Camera, ProjectionMode};
pub use rotator::{DragSource, PointerInput, Surface, TrackballRotator};
pub use trackball::{SurfaceSize, TrackballSphere};
pub use transform::RotationState;
pub use transvection::apply_transvection;
