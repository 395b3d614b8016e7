use thiserror::Error;

/// Errors surfaced by the numeric routines.
///
/// Steppers only ever return `InvalidArgument`; the root finders and quadrature
/// routines may return any variant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericsError {
    /// A precondition on the inputs was violated (dimension mismatch, odd Verlet
    /// dimension, empty bracket, non-positive step, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An iterative method used its whole iteration budget without meeting its tolerance.
    #[error("{method} did not converge in {iterations} iterations (last estimate {estimate})")]
    NonConvergence {
        method: &'static str,
        iterations: usize,
        estimate: f64,
    },

    /// The computation would divide by (nearly) zero or has no real answer.
    #[error("numerical degeneracy: {0}")]
    Degenerate(String),
}

impl NumericsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        NumericsError::InvalidArgument(message.into())
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        NumericsError::Degenerate(message.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, NumericsError::InvalidArgument(_))
    }

    pub fn is_non_convergence(&self) -> bool {
        matches!(self, NumericsError::NonConvergence { .. })
    }
}

pub type Result<T> = std::result::Result<T, NumericsError>;
