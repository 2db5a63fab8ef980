use std::{
    collections::HashSet,
    time::{self, UNIX_EPOCH},
};

use async_trait::async_trait;
use chrono::Duration;
use futures::{channel::mpsc, StreamExt};
use parking_lot::Mutex;
use threadline_api::{
    CommentId, Error, Filter, NewRecord, RawRecord, RecordStore, Snapshot, SnapshotFeed, Time,
    Timestamp,
};
use uuid::Uuid;

/// 2024-01-01T00:00:00Z, the first timestamp handed out by a fresh store
const CLOCK_START: u64 = 1_704_067_200;

/// In-memory record store relaying a full snapshot to every open feed after
/// each write
pub struct MockStore(Mutex<Inner>);

#[derive(Debug)]
struct Inner {
    // arrival order, snapshots sort it by timestamp
    records: Vec<RawRecord>,
    feeds: Vec<mpsc::UnboundedSender<Snapshot>>,
    clock: Time,
    defer_timestamps: bool,
    offline: bool,
    failing_deletes: HashSet<CommentId>,
    failing_creates: usize,
    creates: Vec<NewRecord>,
    deletes: Vec<CommentId>,
}

impl Inner {
    fn tick(&mut self) -> Time {
        self.clock = self.clock + Duration::seconds(1);
        self.clock
    }

    fn snapshot(&self) -> Snapshot {
        let mut res = self.records.clone();
        // pending writes go last, like they would once committed
        res.sort_by_key(|r| match r.created_at {
            Timestamp::Committed(t) => (false, Some(t)),
            Timestamp::Pending => (true, None),
        });
        res
    }

    fn relay_snapshot(&mut self) {
        let snap = self.snapshot();
        self.feeds
            .retain(|f| matches!(f.unbounded_send(snap.clone()), Ok(())));
    }

    fn check_online(&self) -> Result<(), Error> {
        match self.offline {
            true => Err(Error::Unavailable(String::from("mock store is offline"))),
            false => Ok(()),
        }
    }
}

impl MockStore {
    pub fn new() -> MockStore {
        MockStore(Mutex::new(Inner {
            records: Vec::new(),
            feeds: Vec::new(),
            clock: Time::from(UNIX_EPOCH + time::Duration::from_secs(CLOCK_START)),
            defer_timestamps: false,
            offline: false,
            failing_deletes: HashSet::new(),
            failing_creates: 0,
            creates: Vec::new(),
            deletes: Vec::new(),
        }))
    }

    /// Build a store already holding `records`, as if written by remote users
    pub fn with_records(records: Vec<RawRecord>) -> MockStore {
        let res = MockStore::new();
        res.0.lock().records = records;
        res
    }

    /// Insert a record written by someone else, relaying it to the feeds
    pub fn insert_raw(&self, r: RawRecord) {
        let mut inner = self.0.lock();
        inner.records.push(r);
        inner.relay_snapshot();
    }

    /// When set, created records stay pending until `commit_pending` is called
    pub fn defer_timestamps(&self, defer: bool) {
        self.0.lock().defer_timestamps = defer;
    }

    /// Assign a timestamp to every pending record, in arrival order
    pub fn commit_pending(&self) {
        let mut inner = self.0.lock();
        let pending = inner
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.created_at.is_pending())
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        if pending.is_empty() {
            return;
        }
        for i in pending {
            let t = inner.tick();
            inner.records[i].created_at = Timestamp::Committed(t);
        }
        inner.relay_snapshot();
    }

    /// Make every operation fail with `Error::Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.0.lock().offline = offline;
    }

    /// Make deletes of `id` fail with `Error::PermissionDenied`
    pub fn fail_deletes_of(&self, id: CommentId) {
        self.0.lock().failing_deletes.insert(id);
    }

    /// Make the next `n` creates fail
    pub fn fail_next_creates(&self, n: usize) {
        self.0.lock().failing_creates = n;
    }

    /// Return the current records, in snapshot order
    pub fn test_records(&self) -> Vec<RawRecord> {
        self.0.lock().snapshot()
    }

    pub fn test_contains(&self, id: &CommentId) -> bool {
        self.0.lock().records.iter().any(|r| r.id == *id)
    }

    /// Return the fields of every create call that reached the store
    pub fn test_creates(&self) -> Vec<NewRecord> {
        self.0.lock().creates.clone()
    }

    /// Return the ids of every delete call that reached the store
    pub fn test_deletes(&self) -> Vec<CommentId> {
        self.0.lock().deletes.clone()
    }

    /// Drop every open feed, as if the store went away
    pub fn test_close_feeds(&self) {
        self.0.lock().feeds.clear();
    }

    /// Return the number of feeds whose receiver is still alive
    pub fn test_num_feeds(&self) -> usize {
        let mut inner = self.0.lock();
        inner.feeds.retain(|f| !f.is_closed());
        inner.feeds.len()
    }
}

impl Default for MockStore {
    fn default() -> MockStore {
        MockStore::new()
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn create(&self, fields: NewRecord) -> Result<CommentId, Error> {
        let mut inner = self.0.lock();
        inner.check_online()?;
        inner.creates.push(fields.clone());
        if inner.failing_creates > 0 {
            inner.failing_creates -= 1;
            return Err(Error::Unavailable(String::from("injected create failure")));
        }
        let id = CommentId(Uuid::new_v4().to_string());
        let created_at = match inner.defer_timestamps {
            true => Timestamp::Pending,
            false => Timestamp::Committed(inner.tick()),
        };
        tracing::debug!(%id, ?created_at, "mock store creating record");
        inner.records.push(RawRecord {
            id: id.clone(),
            text: Some(fields.text),
            created_at,
            parent_id: fields.parent_id,
        });
        inner.relay_snapshot();
        Ok(id)
    }

    async fn delete(&self, id: &CommentId) -> Result<(), Error> {
        let mut inner = self.0.lock();
        inner.check_online()?;
        inner.deletes.push(id.clone());
        if inner.failing_deletes.contains(id) {
            return Err(Error::PermissionDenied);
        }
        let before = inner.records.len();
        inner.records.retain(|r| r.id != *id);
        if inner.records.len() != before {
            inner.relay_snapshot();
        }
        Ok(())
    }

    async fn query(&self, filter: &Filter) -> Result<Vec<RawRecord>, Error> {
        let inner = self.0.lock();
        inner.check_online()?;
        Ok(inner
            .snapshot()
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect())
    }

    async fn subscribe(&self) -> Result<SnapshotFeed, Error> {
        let mut inner = self.0.lock();
        inner.check_online()?;
        let (sender, receiver) = mpsc::unbounded();
        sender
            .unbounded_send(inner.snapshot())
            .map_err(|_| Error::Unknown(String::from("feed closed before first snapshot")))?;
        inner.feeds.push(sender);
        Ok(receiver.boxed())
    }
}
