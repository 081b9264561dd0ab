//! Error types for the authorization oracle.

use thiserror::Error;

/// Errors that can occur when asking the oracle for a decision.
///
/// These represent infrastructure/transport failures only.
/// Access denial is expressed as `Ok(false)`, not as an error variant.
#[derive(Debug, Error)]
pub enum AuthZResolverError {
    /// The oracle backend is not reachable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}
