use thiserror::Error;

/// Failure modes of a single fetch attempt.
///
/// Every variant is terminal for the attempt that produced it; the only
/// recovery path is a fresh user-triggered request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// One of the remote requests could not be completed.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The provider answered with an application-level error code.
    #[error("provider rejected the request: {0}")]
    ProviderRejected(String),

    /// A payload was missing required fields or carried wrong types.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The platform refused the location permission prompt.
    #[error("location permission denied")]
    PermissionDenied,

    /// Permission was granted but no position fix could be read.
    #[error("device location unavailable")]
    LocationUnavailable,
}
