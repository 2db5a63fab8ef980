use crate::api::{CommentId, NewRecord};

/// Whether `text` would be declined on submission
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Which comment, if any, the user is replying to, with the reply being typed
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum ReplyState {
    #[default]
    Idle,
    Composing {
        target: CommentId,
        draft: String,
    },
}

impl ReplyState {
    pub fn active_target(&self) -> Option<&CommentId> {
        match self {
            ReplyState::Idle => None,
            ReplyState::Composing { target, .. } => Some(target),
        }
    }

    pub fn draft(&self) -> &str {
        match self {
            ReplyState::Idle => "",
            ReplyState::Composing { draft, .. } => draft,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ReplyState::Idle)
    }

    /// Switching to another target drops the draft of the previous one
    pub fn start_reply(&mut self, id: CommentId) {
        if self.active_target() == Some(&id) {
            return;
        }
        *self = ReplyState::Composing {
            target: id,
            draft: String::new(),
        };
    }

    pub fn cancel(&mut self) {
        *self = ReplyState::Idle;
    }

    /// Returns false, leaving the state untouched, when not composing
    pub fn set_draft(&mut self, text: String) -> bool {
        match self {
            ReplyState::Idle => false,
            ReplyState::Composing { draft, .. } => {
                *draft = text;
                true
            }
        }
    }

    /// Returns the record to create for submitting `text`, keeping `text` as
    /// the draft until the write succeeds
    ///
    /// Returns None without touching the state when not composing or when
    /// `text` is blank.
    pub fn prepare_submit(&mut self, text: String) -> Option<NewRecord> {
        if is_blank(&text) {
            return None;
        }
        match self {
            ReplyState::Idle => None,
            ReplyState::Composing { target, draft } => {
                *draft = text.clone();
                Some(NewRecord::reply_to(target.clone(), text))
            }
        }
    }

    /// Record that the reply to `target` was stored
    ///
    /// Returns to idle only if the user did not move on to another target in
    /// the meantime.
    pub fn complete_submit(&mut self, target: &CommentId) -> bool {
        if self.active_target() == Some(target) {
            *self = ReplyState::Idle;
            true
        } else {
            false
        }
    }
}
