use thiserror::Error;

/// Errors returned by topic repository operations.
///
/// Neither variant is fatal: the repository stays usable after any failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The title is empty or already taken by a live topic.
    #[error("{0}")]
    Title(String),

    /// No live topic has the requested id.
    #[error("{0}")]
    NotFound(String),
}

impl RepositoryError {
    pub fn empty_title() -> Self {
        RepositoryError::Title("topic's title is empty".to_string())
    }

    pub fn duplicate_title(title: &str) -> Self {
        RepositoryError::Title(format!("topic with title {} already exists", title))
    }

    pub fn not_found(id: i64) -> Self {
        RepositoryError::NotFound(format!("topic with id {} does not exist", id))
    }

    // Transport layers map this to a 400-style response
    pub fn is_client_error(&self) -> bool {
        matches!(self, RepositoryError::Title(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
