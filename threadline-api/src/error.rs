use crate::CommentId;

/// Failure of a store operation
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("No record with id {0}")]
    NotFound(CommentId),
}

impl Error {
    /// Whether retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Unavailable(_) | Error::Unknown(_))
    }
}
