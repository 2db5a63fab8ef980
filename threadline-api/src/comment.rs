use crate::{CommentId, Time};

/// Store-assigned ordering token of a record
///
/// Right after a create, the store may deliver the record before it committed
/// its timestamp. On the wire this is a nullable instant, and a missing field
/// is read as pending too.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize,
)]
#[serde(from = "Option<Time>", into = "Option<Time>")]
pub enum Timestamp {
    #[default]
    Pending,
    Committed(Time),
}

impl Timestamp {
    pub fn committed(&self) -> Option<Time> {
        match self {
            Timestamp::Pending => None,
            Timestamp::Committed(t) => Some(*t),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Timestamp::Pending)
    }
}

impl From<Option<Time>> for Timestamp {
    fn from(t: Option<Time>) -> Timestamp {
        match t {
            None => Timestamp::Pending,
            Some(t) => Timestamp::Committed(t),
        }
    }
}

impl From<Timestamp> for Option<Time> {
    fn from(t: Timestamp) -> Option<Time> {
        t.committed()
    }
}

/// A comment record as delivered by the store, with every field but the id
/// possibly missing
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RawRecord {
    pub id: CommentId,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub created_at: Timestamp,

    #[serde(default)]
    pub parent_id: Option<CommentId>,
}

/// Fields sent to the store when creating a record
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewRecord {
    pub text: String,
    pub parent_id: Option<CommentId>,
}

impl NewRecord {
    pub fn top_level(text: String) -> NewRecord {
        NewRecord {
            text,
            parent_id: None,
        }
    }

    pub fn reply_to(parent: CommentId, text: String) -> NewRecord {
        NewRecord {
            text,
            parent_id: Some(parent),
        }
    }
}
