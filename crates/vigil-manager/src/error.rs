/// Errors surfaced by the manager facade.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// Input failed validation before touching storage.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The requested lifecycle transition is not allowed from the
    /// record's current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ManagerError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        ManagerError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ManagerError>;
