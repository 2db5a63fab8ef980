use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use futures::{
    channel::oneshot,
    future::{self, Either},
    StreamExt,
};
use parking_lot::Mutex;

use crate::{
    api::{CommentId, NewRecord, RawRecord, RecordStore, SnapshotFeed},
    collect_subtree, delete_subtree, is_blank, CascadeReport, Comment, CommentTree, Error,
    Normalizer, ReplyState, SurfaceConfig,
};

/// A UI affordance that can trigger a write
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Control {
    /// The top-level post box
    Post,
    /// The reply box of a comment
    Reply(CommentId),
    /// The delete button of a comment
    Delete(CommentId),
}

#[derive(Debug, Default)]
struct State {
    normalizer: Normalizer,
    /// Latest snapshot, normalized, including comments hidden from the view
    comments: Vec<Comment>,
    /// Comments whose deletion is in flight, hidden with all their replies
    deleting: HashSet<CommentId>,
    tree: Arc<CommentTree>,
    reply: ReplyState,
    post_draft: String,
    busy: HashSet<Control>,
    num_views: usize,
}

impl State {
    fn rebuild_tree(&mut self) {
        if self.deleting.is_empty() {
            self.tree = Arc::new(CommentTree::materialize(self.comments.clone()));
            return;
        }
        let full = CommentTree::materialize(self.comments.clone());
        let mut hidden = self.deleting.clone();
        for id in &self.deleting {
            hidden.extend(full.descendants(id).into_iter().map(|c| c.id.clone()));
        }
        let visible = self
            .comments
            .iter()
            .filter(|c| !hidden.contains(&c.id))
            .cloned()
            .collect();
        self.tree = Arc::new(CommentTree::materialize(visible));
    }
}

/// The commenting surface of one user, as seen by the rendering layer
///
/// Clones share the same state. The state is only ever locked for synchronous
/// sections, so snapshots keep flowing while writes are in flight.
pub struct Session<S: ?Sized> {
    store: Arc<S>,
    config: Arc<SurfaceConfig>,
    state: Arc<Mutex<State>>,
}

impl<S: ?Sized> Clone for Session<S> {
    fn clone(&self) -> Session<S> {
        Session {
            store: self.store.clone(),
            config: self.config.clone(),
            state: self.state.clone(),
        }
    }
}

/// Marks a control as busy until dropped
struct InFlight {
    state: Arc<Mutex<State>>,
    control: Control,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.state.lock().busy.remove(&self.control);
    }
}

impl<S: ?Sized + RecordStore> Session<S> {
    pub fn new(store: Arc<S>, config: SurfaceConfig) -> Session<S> {
        Session {
            store,
            config: Arc::new(config),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Open the live feed of the store; the view lives as long as the
    /// returned handle
    pub async fn subscribe(&self) -> Result<LiveView<S>, Error> {
        let feed = self.store.subscribe().await?;
        self.state.lock().num_views += 1;
        tracing::info!("subscribed to comment feed");
        Ok(LiveView {
            session: self.clone(),
            feed,
        })
    }

    /// Replace the view with the contents of `records`
    pub fn apply_snapshot(&self, records: &[RawRecord]) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.comments = state.normalizer.normalize(records, Utc::now());
        let present = state.comments.iter().map(|c| &c.id).collect::<HashSet<_>>();
        state.deleting.retain(|id| present.contains(id));
        state.rebuild_tree();
        let target_gone = state
            .reply
            .active_target()
            .map_or(false, |t| !state.tree.contains(t));
        if target_gone {
            tracing::info!(
                reply_target = ?state.reply.active_target(),
                "reply target disappeared, dropping reply"
            );
            state.reply.cancel();
        }
        tracing::debug!(
            num_comments = state.tree.len(),
            num_hidden = state.comments.len().saturating_sub(state.tree.len()),
            num_pending = state.normalizer.num_pending(),
            "applied snapshot"
        );
    }

    fn teardown_view(&self) {
        let mut state = self.state.lock();
        state.num_views = state.num_views.saturating_sub(1);
        if state.num_views == 0 {
            state.tree = Arc::new(CommentTree::default());
            state.comments.clear();
            state.deleting.clear();
            state.normalizer = Normalizer::new();
            state.reply.cancel();
            tracing::info!("unsubscribed from comment feed");
        }
    }

    pub fn tree(&self) -> Arc<CommentTree> {
        self.state.lock().tree.clone()
    }

    pub fn reply_state(&self) -> ReplyState {
        self.state.lock().reply.clone()
    }

    pub fn post_draft(&self) -> String {
        self.state.lock().post_draft.clone()
    }

    pub fn is_busy(&self, control: &Control) -> bool {
        self.state.lock().busy.contains(control)
    }

    pub fn reply_label(&self, id: &CommentId) -> Option<String> {
        self.tree().reply_label(id, self.config.preview_chars)
    }

    pub fn display_time(&self, comment: &Comment) -> String {
        comment.display_time(self.config.time_zone)
    }

    fn begin(&self, control: Control) -> Result<InFlight, Error> {
        if !self.state.lock().busy.insert(control.clone()) {
            return Err(Error::Busy(control));
        }
        Ok(InFlight {
            state: self.state.clone(),
            control,
        })
    }

    fn hide(&self, ids: impl IntoIterator<Item = CommentId>) {
        let mut state = self.state.lock();
        state.deleting.extend(ids);
        state.rebuild_tree();
        let target_hidden = state
            .reply
            .active_target()
            .map_or(false, |t| !state.tree.contains(t));
        if target_hidden {
            state.reply.cancel();
        }
    }

    fn unhide<'a>(&self, ids: impl IntoIterator<Item = &'a CommentId>) {
        let mut state = self.state.lock();
        for id in ids {
            state.deleting.remove(id);
        }
        state.rebuild_tree();
    }

    pub fn set_post_draft(&self, text: impl Into<String>) {
        self.state.lock().post_draft = text.into();
    }

    /// Post a top-level comment
    ///
    /// Returns Ok(None) without contacting the store if `text` is blank. On
    /// failure the post box keeps `text`.
    pub async fn post(&self, text: impl Into<String>) -> Result<Option<CommentId>, Error> {
        let text = text.into();
        if is_blank(&text) {
            tracing::debug!("declining to post blank comment");
            return Ok(None);
        }
        let _in_flight = self.begin(Control::Post)?;
        self.state.lock().post_draft = text.clone();
        match self.store.create(NewRecord::top_level(text.clone())).await {
            Ok(id) => {
                let mut state = self.state.lock();
                if state.post_draft == text {
                    state.post_draft.clear();
                }
                tracing::debug!(%id, "posted comment");
                Ok(Some(id))
            }
            Err(err) => {
                tracing::error!(?err, "failed posting comment");
                Err(err.into())
            }
        }
    }

    pub fn start_reply(&self, id: CommentId) -> Result<(), Error> {
        let mut state = self.state.lock();
        if !state.tree.contains(&id) {
            return Err(Error::UnknownComment(id));
        }
        state.reply.start_reply(id);
        Ok(())
    }

    /// Returns false if no reply is being composed
    pub fn set_reply_draft(&self, text: impl Into<String>) -> bool {
        self.state.lock().reply.set_draft(text.into())
    }

    pub fn cancel_reply(&self) {
        self.state.lock().reply.cancel();
    }

    /// Submit `text` as a reply to the current reply target
    ///
    /// Returns Ok(None) without contacting the store if no reply is being
    /// composed or `text` is blank. On failure the reply box stays open with
    /// `text` as its draft.
    pub async fn submit_reply(&self, text: impl Into<String>) -> Result<Option<CommentId>, Error> {
        let text = text.into();
        let target = match self.state.lock().reply.active_target() {
            Some(t) if !is_blank(&text) => t.clone(),
            _ => {
                tracing::debug!("declining to submit reply");
                return Ok(None);
            }
        };
        let _in_flight = self.begin(Control::Reply(target.clone()))?;
        let record = match self.state.lock().reply.prepare_submit(text) {
            Some(r) => r,
            None => return Ok(None),
        };
        match self.store.create(record).await {
            Ok(id) => {
                self.state.lock().reply.complete_submit(&target);
                tracing::debug!(%id, parent = %target, "posted reply");
                Ok(Some(id))
            }
            Err(err) => {
                tracing::error!(?err, parent = %target, "failed posting reply");
                Err(err.into())
            }
        }
    }

    /// Delete a comment of the current view together with all its replies
    ///
    /// The comment and its replies leave the view before the first record is
    /// deleted. Replies the store refused to delete come back once the
    /// cascade is over; if the comment itself could not be deleted, the whole
    /// thread comes back.
    pub async fn delete_comment(&self, id: CommentId) -> Result<CascadeReport, Error> {
        if !self.state.lock().tree.contains(&id) {
            return Err(Error::UnknownComment(id));
        }
        let _in_flight = self.begin(Control::Delete(id.clone()))?;
        let descendants = match collect_subtree(&*self.store, &id).await {
            Ok(d) => d,
            Err(err) => {
                tracing::error!(?err, %id, "failed listing replies of comment");
                return Err(err.into());
            }
        };
        self.hide(std::iter::once(id.clone()).chain(descendants.iter().cloned()));
        let res = delete_subtree(
            &*self.store,
            &id,
            descendants.clone(),
            self.config.delete_concurrency(),
        )
        .await;
        match res {
            Ok(report) => {
                self.unhide(report.failed.iter().map(|(d, _)| d));
                tracing::debug!(
                    %id,
                    num_deleted = report.num_deleted(),
                    "deleted comment thread"
                );
                Ok(report)
            }
            Err(err) => {
                self.unhide(std::iter::once(&id).chain(descendants.iter()));
                tracing::error!(?err, %id, "failed deleting comment");
                Err(err.into())
            }
        }
    }
}

/// Live subscription of a session to the store
///
/// Dropping it releases the store listener and empties the view.
pub struct LiveView<S: ?Sized + RecordStore> {
    session: Session<S>,
    feed: SnapshotFeed,
}

impl<S: ?Sized + RecordStore> LiveView<S> {
    /// Wait for one snapshot and apply it; returns false if the feed ended
    pub async fn next_snapshot(&mut self) -> bool {
        match self.feed.next().await {
            Some(snap) => {
                self.session.apply_snapshot(&snap);
                true
            }
            None => false,
        }
    }

    /// Apply snapshots until the feed ends or `cancel` fires
    pub async fn run(mut self, mut cancel: oneshot::Receiver<()>) {
        loop {
            match future::select(&mut cancel, self.feed.next()).await {
                Either::Left(_) => {
                    tracing::info!("comment feed cancelled");
                    return;
                }
                Either::Right((None, _)) => {
                    tracing::warn!("comment feed ended");
                    return;
                }
                Either::Right((Some(snap), _)) => self.session.apply_snapshot(&snap),
            }
        }
    }
}

impl<S: ?Sized + RecordStore> Drop for LiveView<S> {
    fn drop(&mut self) {
        self.session.teardown_view();
    }
}
