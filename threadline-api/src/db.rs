use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{CommentId, Error, Filter, NewRecord, RawRecord};

/// Full view of the collection, ordered by creation time
pub type Snapshot = Vec<RawRecord>;

/// Live stream of snapshots; dropping it unsubscribes
pub type SnapshotFeed = BoxStream<'static, Snapshot>;

/// Append-only, live-queryable collection of comment records
///
/// Writes issued through this trait must be reflected in the snapshots of every
/// open feed, including the feeds of the writer.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(&self, fields: NewRecord) -> Result<CommentId, Error>;

    /// Deleting a record that does not exist succeeds
    async fn delete(&self, id: &CommentId) -> Result<(), Error>;

    async fn query(&self, filter: &Filter) -> Result<Vec<RawRecord>, Error>;

    /// The first snapshot of the returned feed is the current state
    async fn subscribe(&self) -> Result<SnapshotFeed, Error>;
}
