//! Transport error taxonomy.

use thiserror::Error;

/// Failure starting or driving a collaborator operation.
///
/// Most transfer failures are not errors at this level; they surface as
/// `HttpEvent::Disconnected` with a reason so the state machine can decide
/// between immediate retry and waiting for the supervisor cycle.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request URL `{0}`")]
    InvalidUrl(String),

    /// A transfer is already in flight; the dispatcher's duplicate-request
    /// guard normally prevents this.
    #[error("a transfer is already in flight")]
    RequestInFlight,

    #[error("transport setup failed: {0}")]
    Setup(#[from] curl::Error),

    #[error("link driver failure: {0}")]
    Link(String),
}
