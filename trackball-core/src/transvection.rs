/// Rotation of the view basis by a pair of reflections
use nalgebra::Vector3;

use crate::transform::RotationState;

/// Rays shorter than this, or a bisector shorter than this, leave the basis alone.
const MIN_RAY_LENGTH: f64 = 1e-9;

/// Reflect `v` through the line spanned by the unit vector `axis`.
pub fn reflect_in_axis(axis: &Vector3<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    axis * (2.0 * axis.dot(v)) - v
}

/// Turn the view so that the world direction `from` now appears where `to`
/// appeared before: the scene follows the pointer.
///
/// Each basis vector is reflected through the bisector of the two rays and
/// then through `from`. Two line reflections compose to a rotation by twice
/// the angle between the lines, so the basis turns by the rotation carrying
/// `to` back onto `from`, and the scene, seen through the basis, by the one
/// carrying `from` onto `to`. Returns `false` without touching the state when
/// either ray is zero or non-finite, or the rays are antiparallel, since the
/// bisector is undefined.
pub fn apply_transvection(state: &mut RotationState, from: &Vector3<f64>, to: &Vector3<f64>) -> bool {
    if !from.iter().chain(to.iter()).all(|c| c.is_finite()) {
        log::debug!("skipping transvection with a non-finite ray");
        return false;
    }
    let (Some(e1), Some(e2)) = (
        from.try_normalize(MIN_RAY_LENGTH),
        to.try_normalize(MIN_RAY_LENGTH),
    ) else {
        log::debug!("skipping transvection with a zero-length ray");
        return false;
    };
    let Some(bisector) = (e1 + e2).try_normalize(MIN_RAY_LENGTH) else {
        log::debug!("skipping transvection between antiparallel rays");
        return false;
    };

    state.map_basis(|axis| reflect_in_axis(&e1, &reflect_in_axis(&bisector, axis)))
}
