//! Error types for shape parsing, intersection and prefix tree operations.

use thiserror::Error;

/// Errors surfaced by the spatial core.
///
/// Every operation is a deterministic computation, so none of these are
/// transient; retrying the same call yields the same error.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Malformed shape text or bytes, unparsable coordinates, unknown cell
    /// symbols, or a geometry that cannot be encoded within its size budget.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// A shape or parameter the operation cannot accept, such as a point where
    /// an area is required or an unsupported pair of shapes.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation exists but is not implemented for this combination.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl From<geozero::error::GeozeroError> for SpatialError {
    fn from(err: geozero::error::GeozeroError) -> Self {
        SpatialError::InvalidShape(err.to_string())
    }
}

impl From<geoprefix_types::operation::UnknownOperation> for SpatialError {
    fn from(err: geoprefix_types::operation::UnknownOperation) -> Self {
        SpatialError::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SpatialError>;
