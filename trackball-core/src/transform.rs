/// Orthonormal view basis and its conversion to a view matrix
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

use crate::error::RotatorError;

/// Default viewpoint direction; its length seeds the view distance.
pub const DEFAULT_DIRECTION: [f64; 3] = [0.0, 0.0, 10.0];

/// Default approximate up vector.
pub const DEFAULT_UP: [f64; 3] = [0.0, 1.0, 0.0];

/// Vectors shorter than this are treated as zero when building a basis.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Camera orientation as three orthonormal axes, plus the optional eye
/// distance and rotation pivot used when exporting a view matrix.
///
/// `forward` points from the rotation center toward the viewer, so the
/// camera looks down `-forward` and `right = up × forward`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    right: Vector3<f64>,
    up: Vector3<f64>,
    forward: Vector3<f64>,
    view_distance: Option<f64>,
    rotation_center: Option<Point3<f64>>,
}

impl RotationState {
    /// Build a state looking along `direction` with the given approximate
    /// `up`. Missing arguments fall back to the defaults, and a missing
    /// distance is taken from the length of `direction`.
    pub fn new(
        direction: Option<Vector3<f64>>,
        up: Option<Vector3<f64>>,
        distance: Option<f64>,
    ) -> Result<Self, RotatorError> {
        let mut state = Self::default();
        state.set_view(direction, up, distance)?;
        Ok(state)
    }

    pub fn right(&self) -> Vector3<f64> {
        self.right
    }

    pub fn up(&self) -> Vector3<f64> {
        self.up
    }

    pub fn forward(&self) -> Vector3<f64> {
        self.forward
    }

    /// Re-derive the basis from a view direction and approximate up vector.
    ///
    /// On error the state is left untouched.
    pub fn set_view(
        &mut self,
        direction: Option<Vector3<f64>>,
        up: Option<Vector3<f64>>,
        distance: Option<f64>,
    ) -> Result<(), RotatorError> {
        let direction = direction.unwrap_or_else(|| Vector3::from(DEFAULT_DIRECTION));
        let up = up.unwrap_or_else(|| Vector3::from(DEFAULT_UP));

        let (right, up, forward) = orthonormal_basis(&direction, &up).map_err(|err| {
            log::warn!("rejected view direction {direction:?} with up {up:?}");
            err
        })?;

        self.right = right;
        self.up = up;
        self.forward = forward;
        self.view_distance = Some(distance.unwrap_or_else(|| direction.norm()));
        Ok(())
    }

    pub fn view_distance(&self) -> Option<f64> {
        self.view_distance
    }

    /// Set or clear the eye distance. A positive value is needed for a
    /// usable perspective projection but is not enforced here.
    pub fn set_view_distance(&mut self, distance: Option<f64>) {
        self.view_distance = distance;
    }

    /// The pivot of rotation, the origin when none was set.
    pub fn rotation_center(&self) -> Point3<f64> {
        self.rotation_center.unwrap_or_else(Point3::origin)
    }

    pub fn set_rotation_center(&mut self, center: Option<Point3<f64>>) {
        self.rotation_center = center;
    }

    /// The 3x3 world-to-camera rotation: the basis vectors are its rows.
    pub fn rotation(&self) -> Matrix3<f64> {
        Matrix3::from_rows(&[
            self.right.transpose(),
            self.up.transpose(),
            self.forward.transpose(),
        ])
    }

    /// World-to-camera transform. Rotation pivots about the rotation
    /// center, then the eye is pulled back by the view distance.
    pub fn view_matrix(&self) -> Matrix4<f64> {
        let rotation = self.rotation();
        let mut translation = match self.rotation_center {
            Some(center) => center.coords - rotation * center.coords,
            None => Vector3::zeros(),
        };
        if let Some(distance) = self.view_distance {
            translation.z -= distance;
        }

        let mut matrix = rotation.to_homogeneous();
        matrix[(0, 3)] = translation.x;
        matrix[(1, 3)] = translation.y;
        matrix[(2, 3)] = translation.z;
        matrix
    }

    /// The view matrix as 16 column-major values.
    pub fn view_matrix_array(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.view_matrix().as_slice());
        out
    }

    /// The view matrix as 16 column-major `f32` values, ready for upload.
    pub fn view_matrix_f32(&self) -> [f32; 16] {
        self.view_matrix_array().map(|value| value as f32)
    }

    /// Resynchronise the basis from the rotation block of a column-major
    /// view matrix. Translation, distance and center are not touched.
    ///
    /// The up and forward rows are re-orthonormalised and `right` is rebuilt
    /// from them, so a mirrored block (right row pointing along
    /// `forward × up`) is rejected instead of being flipped.
    pub fn set_view_matrix(&mut self, matrix: &[f64]) -> Result<(), RotatorError> {
        if matrix.len() != 16 {
            return Err(RotatorError::MatrixLength(matrix.len()));
        }
        let given_right = Vector3::new(matrix[0], matrix[4], matrix[8]);
        let up = Vector3::new(matrix[1], matrix[5], matrix[9]);
        let forward = Vector3::new(matrix[2], matrix[6], matrix[10]);

        let (right, up, forward) = orthonormal_basis(&forward, &up)?;
        if right.dot(&given_right) < 0.0 {
            return Err(RotatorError::MirroredBasis);
        }
        self.right = right;
        self.up = up;
        self.forward = forward;
        Ok(())
    }

    /// Apply `map` to each basis vector and restore orthonormality. The
    /// basis is only replaced when the mapped vectors still span a frame.
    pub(crate) fn map_basis(&mut self, map: impl Fn(&Vector3<f64>) -> Vector3<f64>) -> bool {
        let forward = map(&self.forward);
        let up = map(&self.up);

        match orthonormal_basis(&forward, &up) {
            Ok((right, up, forward)) => {
                self.right = right;
                self.up = up;
                self.forward = forward;
                true
            }
            Err(_) => {
                log::debug!("mapped basis is degenerate, keeping the previous one");
                false
            }
        }
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self {
            right: Vector3::x(),
            up: Vector3::y(),
            forward: Vector3::z(),
            view_distance: None,
            rotation_center: None,
        }
    }
}

/// Gram-Schmidt: normalize `direction`, strip its component from `up`,
/// and complete with `right = up × forward`.
fn orthonormal_basis(
    direction: &Vector3<f64>,
    up: &Vector3<f64>,
) -> Result<(Vector3<f64>, Vector3<f64>, Vector3<f64>), RotatorError> {
    if !direction.iter().chain(up.iter()).all(|c| c.is_finite()) {
        return Err(RotatorError::DegenerateBasis);
    }
    let forward = direction
        .try_normalize(DEGENERATE_EPSILON)
        .ok_or(RotatorError::DegenerateBasis)?;
    let up = (up - forward * forward.dot(up))
        .try_normalize(DEGENERATE_EPSILON)
        .ok_or(RotatorError::DegenerateBasis)?;
    let right = up.cross(&forward);
    Ok((right, up, forward))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_eq(a: Vector3<f64>, b: Vector3<f64>) {
        assert!((a - b).norm() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_default_view() {
        let state = RotationState::new(None, None, None).unwrap();
        assert_vec_eq(state.right(), Vector3::x());
        assert_vec_eq(state.up(), Vector3::y());
        assert_vec_eq(state.forward(), Vector3::z());
        // distance seeded from the default direction [0, 0, 10]
        assert_eq!(state.view_distance(), Some(10.0));
        assert_eq!(state.rotation_center(), Point3::origin());
    }

    #[test]
    fn test_set_view_orthonormalizes_up() {
        let state = RotationState::new(
            Some(Vector3::new(1.0, 0.0, 1.0)),
            Some(Vector3::new(0.3, 1.0, 0.0)),
            Some(4.0),
        )
        .unwrap();

        for axis in [state.right(), state.up(), state.forward()] {
            assert!((axis.norm() - 1.0).abs() < 1e-12);
        }
        assert!(state.right().dot(&state.up()).abs() < 1e-12);
        assert!(state.up().dot(&state.forward()).abs() < 1e-12);
        assert!(state.forward().dot(&state.right()).abs() < 1e-12);
        assert_vec_eq(state.right(), state.up().cross(&state.forward()));
        assert_eq!(state.view_distance(), Some(4.0));
    }

    #[test]
    fn test_collinear_view_is_rejected() {
        let mut state = RotationState::default();
        let before = state;
        let result = state.set_view(Some(Vector3::new(0.0, 3.0, 0.0)), None, None);
        assert_eq!(result, Err(RotatorError::DegenerateBasis));
        assert_eq!(state, before);

        let zero = state.set_view(Some(Vector3::zeros()), None, None);
        assert_eq!(zero, Err(RotatorError::DegenerateBasis));

        let nan = state.set_view(Some(Vector3::new(f64::NAN, 0.0, 1.0)), None, None);
        assert_eq!(nan, Err(RotatorError::DegenerateBasis));
    }

    #[test]
    fn test_view_matrix_layout() {
        let state = RotationState::new(None, None, Some(5.0)).unwrap();
        let m = state.view_matrix_array();
        let expected = [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, -5.0, 1.0,
        ];
        assert_eq!(m, expected);
    }

    #[test]
    fn test_basis_vectors_are_matrix_rows() {
        let state = RotationState::new(Some(Vector3::new(1.0, 0.0, 0.0)), None, Some(2.0)).unwrap();
        let m = state.view_matrix_array();
        // column-major: element (row, col) lives at col * 4 + row
        let row = |r: usize| Vector3::new(m[r], m[4 + r], m[8 + r]);
        assert_vec_eq(row(0), state.right());
        assert_vec_eq(row(1), state.up());
        assert_vec_eq(row(2), state.forward());
    }

    #[test]
    fn test_rotation_center_is_fixed_point() {
        let mut state = RotationState::new(
            Some(Vector3::new(1.0, 1.0, 0.5)),
            Some(Vector3::new(0.0, 0.0, 1.0)),
            None,
        )
        .unwrap();
        state.set_view_distance(None);
        let center = Point3::new(1.0, -2.0, 3.0);
        state.set_rotation_center(Some(center));
        assert_eq!(state.rotation_center(), center);

        // with no distance the pivot maps onto itself
        let mapped = state.view_matrix().transform_point(&center);
        assert!((mapped - center).norm() < 1e-9);

        // the distance only pushes the pivot back along the view axis
        state.set_view_distance(Some(3.0));
        let mapped = state.view_matrix().transform_point(&center);
        assert!((mapped - Point3::new(center.x, center.y, center.z - 3.0)).norm() < 1e-9);
    }

    #[test]
    fn test_view_matrix_round_trip() {
        let mut state = RotationState::new(
            Some(Vector3::new(-2.0, 1.0, 3.0)),
            Some(Vector3::new(0.1, 1.0, 0.2)),
            Some(7.0),
        )
        .unwrap();
        state.set_rotation_center(Some(Point3::new(0.5, 0.5, 0.5)));
        let exported = state.view_matrix_array();

        let mut restored = RotationState::default();
        restored.set_view_matrix(&exported).unwrap();
        restored.set_view_distance(state.view_distance());
        restored.set_rotation_center(Some(state.rotation_center()));

        assert_vec_eq(restored.right(), state.right());
        assert_vec_eq(restored.up(), state.up());
        assert_vec_eq(restored.forward(), state.forward());
        let back = restored.view_matrix_array();
        for (a, b) in exported.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_set_view_matrix_rejects_bad_input() {
        let mut state = RotationState::default();
        assert_eq!(
            state.set_view_matrix(&[0.0; 9]),
            Err(RotatorError::MatrixLength(9))
        );
        assert_eq!(
            state.set_view_matrix(&[0.0; 16]),
            Err(RotatorError::DegenerateBasis)
        );
        assert_eq!(state, RotationState::default());
    }

    #[test]
    fn test_set_view_matrix_rejects_mirrored_rotation() {
        let mut state = RotationState::default();
        let mut mirrored = RotationState::new(Some(Vector3::new(1.0, 0.0, 1.0)), None, None)
            .unwrap()
            .view_matrix_array();
        for col in 0..3 {
            mirrored[col * 4] = -mirrored[col * 4];
        }
        assert_eq!(state.set_view_matrix(&mirrored), Err(RotatorError::MirroredBasis));
        assert_eq!(state, RotationState::default());
    }

    #[test]
    fn test_degenerate_map_keeps_previous_basis() {
        let mut state = RotationState::new(Some(Vector3::new(2.0, -1.0, 1.0)), None, None).unwrap();
        let before = state;
        assert!(!state.map_basis(|_| Vector3::new(f64::NAN, 0.0, 0.0)));
        assert_eq!(state, before);
        assert!(!state.map_basis(|_| Vector3::zeros()));
        assert_eq!(state, before);
    }

    #[test]
    fn test_f32_export_matches() {
        let state = RotationState::new(Some(Vector3::new(0.0, 2.0, 2.0)), None, None).unwrap();
        let wide = state.view_matrix_array();
        let narrow = state.view_matrix_f32();
        for (a, b) in wide.iter().zip(narrow.iter()) {
            assert!((*a as f32 - b).abs() < 1e-6);
        }
    }
}
