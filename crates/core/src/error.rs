use uuid::Uuid;

/// Domain-level error type shared across the workspace.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Entity not found: {entity} with uuid {uuid}")]
    NotFound { entity: &'static str, uuid: Uuid },

    /// Secret or remote ID mismatch on a station callback. Mapped to a
    /// client error; the triggering request must not mutate anything.
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// An operation was attempted against an entity in the wrong state,
    /// e.g. dispatching a job that is not PREPARED.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
