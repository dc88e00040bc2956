use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LearnError>;

/// Failures reported by the numeric kernels, the optimizer and the models.
///
/// Every error is returned to the immediate caller; nothing in the crate
/// retries or recovers locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LearnError {
    /// Shapes cannot be aligned, even with broadcasting.
    #[error("dimension mismatch: {lhs} vs {rhs}")]
    DimensionMismatch { lhs: String, rhs: String },

    /// The rank combination is not handled by the operation.
    #[error("unsupported operands for {op}: {lhs} and {rhs}")]
    UnsupportedOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("expected a square matrix, got {rows}x{cols}")]
    NotSquareMatrix { rows: usize, cols: usize },

    #[error("matrix is singular, the system has no unique solution")]
    SingularMatrix,

    /// Jacobi eigendecomposition is only supported up to `max` dimensions.
    #[error("matrix dimension {dim} exceeds the supported maximum of {max}")]
    DimensionTooLarge { dim: usize, max: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("empty input")]
    EmptyInput,

    /// Ragged rows or a buffer that does not fill the requested shape.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("unknown axis {0}, expected 0 or 1")]
    UnknownAxis(usize),

    #[error("unknown norm: {0}")]
    UnknownNorm(String),

    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The loss became NaN or infinite during optimization.
    #[error("optimization diverged at iteration {iteration} (loss = {value})")]
    Diverged { iteration: usize, value: f64 },

    #[error("model has not been trained")]
    NotTrained,
}

impl LearnError {
    pub(crate) fn mismatch(lhs: impl std::fmt::Debug, rhs: impl std::fmt::Debug) -> Self {
        LearnError::DimensionMismatch {
            lhs: format!("{:?}", lhs),
            rhs: format!("{:?}", rhs),
        }
    }

    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        LearnError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
