use thiserror::Error;

/// Errors raised when a view basis cannot be derived from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RotatorError {
    /// The view direction is zero, non-finite, or parallel to the up vector.
    #[error("view direction and up vector do not span a plane")]
    DegenerateBasis,
    /// A view matrix slice did not hold 16 elements.
    #[error("view matrix must have 16 elements, got {0}")]
    MatrixLength(usize),
    /// A view matrix whose rotation block is a mirror image rather than a
    /// rotation.
    #[error("view matrix rotation is left-handed")]
    MirroredBasis,
}
