//! Error types for curve and animation operations.

use thiserror::Error;

/// Errors produced by `Curve` mutation/evaluation contracts.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    #[error("keys batch change already in progress")]
    BatchAlreadyActive,
    #[error("no keys batch change in progress")]
    BatchNotActive,
    /// Approximation tables are stale while a batch is open; evaluating in
    /// that window would read geometrically wrong values.
    #[error("curve evaluated while a keys batch change is open")]
    EvaluateDuringBatch,
}

/// Errors produced by `Animation` channel management.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnimationError {
    #[error("animated value already exists for path '{0}'")]
    DuplicatePath(String),
    #[error("no animated value for path '{0}'")]
    ChannelNotFound(String),
    #[error("animated value type mismatch for path '{0}'")]
    TypeMismatch(String),
    #[error(transparent)]
    Curve(#[from] CurveError),
}
