//! Error types for the server.

use skewer_coordinator::CoordinatorError;
use skewer_transport::TransportError;

/// Errors that can stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The transport failed to bind or accept.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The coordinator task is gone.
    #[error("coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    /// Binding or serving the HTTP listener failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
