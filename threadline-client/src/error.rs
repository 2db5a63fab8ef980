use crate::{
    api::{self, CommentId},
    Control,
};

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The store rejected an operation; local state was left as-is
    #[error("store operation failed: {0}")]
    Store(#[from] api::Error),

    #[error("comment {0} is not in the current view")]
    UnknownComment(CommentId),

    #[error("an action is already in flight for {0:?}")]
    Busy(Control),
}

impl Error {
    /// Whether the user can reasonably try the same action again
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Store(err) => err.is_transient(),
            Error::Busy(_) => true,
            Error::UnknownComment(_) => false,
        }
    }
}
