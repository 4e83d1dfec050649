//! Error types for the coordinator.

/// Errors that can occur inside the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The coordinator task is no longer running.
    #[error("coordinator unavailable")]
    Unavailable,
}
