use chrono_tz::Tz;

use crate::api::{CommentId, RawRecord, Time, Timestamp};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,

    /// Store-assigned creation time, or a local placeholder while `pending`
    pub created_at: Time,

    /// True until the store commits the creation timestamp
    pub pending: bool,

    /// None for top-level comments
    pub parent_id: Option<CommentId>,
}

impl Comment {
    /// Canonicalize a raw record, using `placeholder` as the creation time if
    /// the store did not commit one yet
    pub fn from_raw(raw: &RawRecord, placeholder: Time) -> Comment {
        let (created_at, pending) = match raw.created_at {
            Timestamp::Committed(t) => (t, false),
            Timestamp::Pending => (placeholder, true),
        };
        Comment {
            id: raw.id.clone(),
            text: raw.text.clone().unwrap_or_default(),
            created_at,
            pending,
            parent_id: raw.parent_id.clone(),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns the text cut to `max_chars` characters, with an ellipsis if
    /// anything was cut
    pub fn preview(&self, max_chars: usize) -> String {
        match self.text.char_indices().nth(max_chars) {
            None => self.text.clone(),
            Some((end, _)) => format!("{}...", &self.text[..end]),
        }
    }

    pub fn display_time(&self, tz: Tz) -> String {
        self.created_at
            .with_timezone(&tz)
            .format("%Y/%m/%d %H:%M:%S")
            .to_string()
    }
}
