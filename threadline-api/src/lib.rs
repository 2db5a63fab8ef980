use chrono::Utc;
use std::fmt;

pub type Time = chrono::DateTime<Utc>;

mod comment;
pub use comment::{NewRecord, RawRecord, Timestamp};

mod db;
pub use db::{RecordStore, Snapshot, SnapshotFeed};

mod error;
pub use error::Error;

mod query;
pub use query::Filter;

/// Identifier of a comment record, assigned by the store on creation
#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CommentId {
    fn from(id: &str) -> CommentId {
        CommentId(String::from(id))
    }
}

impl From<String> for CommentId {
    fn from(id: String) -> CommentId {
        CommentId(id)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
