use std::collections::HashSet;

use futures::{future, stream, StreamExt};

use crate::api::{self, CommentId, Filter, RecordStore};

/// Outcome of a cascade delete whose target was removed
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CascadeReport {
    pub target: CommentId,

    /// Descendants deleted, in breadth-first order
    pub deleted: Vec<CommentId>,

    /// Descendants that could not be deleted; they stay displayed as orphans
    pub failed: Vec<(CommentId, api::Error)>,
}

impl CascadeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of records removed, target included
    pub fn num_deleted(&self) -> usize {
        self.deleted.len() + 1
    }
}

/// Returns the ids of every record below `id`, breadth-first, querying the
/// store one level at a time
pub async fn collect_subtree<S>(store: &S, id: &CommentId) -> Result<Vec<CommentId>, api::Error>
where
    S: ?Sized + RecordStore,
{
    let mut res = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(id.clone());
    let mut level = vec![id.clone()];
    while !level.is_empty() {
        let children = future::try_join_all(
            level
                .iter()
                .map(|parent| async move { store.query(&Filter::children_of(parent)).await }),
        )
        .await?;
        level = children
            .into_iter()
            .flatten()
            .map(|r| r.id)
            .filter(|c| seen.insert(c.clone()))
            .collect();
        res.extend(level.iter().cloned());
    }
    Ok(res)
}

/// Delete `id` and its whole reply subtree
///
/// Nothing is deleted if listing the subtree or deleting the target fails.
/// Once the target is gone, failures to delete descendants are reported in the
/// result instead of failing the whole operation.
pub async fn cascade_delete<S>(
    store: &S,
    id: &CommentId,
    max_concurrent: usize,
) -> Result<CascadeReport, api::Error>
where
    S: ?Sized + RecordStore,
{
    let descendants = collect_subtree(store, id).await?;
    delete_subtree(store, id, descendants, max_concurrent).await
}

/// Delete `id`, then the already-collected `descendants`
///
/// Nothing is deleted if deleting the target fails.
pub async fn delete_subtree<S>(
    store: &S,
    id: &CommentId,
    descendants: Vec<CommentId>,
    max_concurrent: usize,
) -> Result<CascadeReport, api::Error>
where
    S: ?Sized + RecordStore,
{
    store.delete(id).await?;

    let mut deleted = Vec::with_capacity(descendants.len());
    let mut failed = Vec::new();
    let mut results = stream::iter(descendants)
        .map(|d| async move {
            let res = store.delete(&d).await;
            (d, res)
        })
        .buffered(max_concurrent.max(1));
    while let Some((d, res)) = results.next().await {
        match res {
            Ok(()) => deleted.push(d),
            Err(err) => failed.push((d, err)),
        }
    }

    if !failed.is_empty() {
        tracing::warn!(
            comment = %id,
            num_deleted = deleted.len(),
            num_failed = failed.len(),
            "cascade delete left some replies behind"
        );
    }
    Ok(CascadeReport {
        target: id.clone(),
        deleted,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::NewRecord;
    use threadline_mock_store::MockStore;

    async fn reply(store: &MockStore, parent: Option<&CommentId>, text: &str) -> CommentId {
        store
            .create(NewRecord {
                text: String::from(text),
                parent_id: parent.cloned(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn leaf_delete_removes_one_record() {
        let store = MockStore::new();
        let a = reply(&store, None, "a").await;
        let b = reply(&store, None, "b").await;

        let report = cascade_delete(&store, &a, 16).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.num_deleted(), 1);
        assert_eq!(store.test_deletes(), vec![a]);
        assert_eq!(store.test_records().len(), 1);
        assert!(store.test_contains(&b));
    }

    #[tokio::test]
    async fn deep_subtree_is_removed() {
        let store = MockStore::new();
        let a = reply(&store, None, "A").await;
        let b = reply(&store, Some(&a), "B").await;
        let c = reply(&store, Some(&b), "C").await;
        let d = reply(&store, Some(&c), "D").await;
        let other = reply(&store, None, "other").await;

        assert_eq!(
            collect_subtree(&store, &a).await.unwrap(),
            vec![b.clone(), c.clone(), d.clone()]
        );
        let report = cascade_delete(&store, &a, 2).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.deleted, vec![b.clone(), c.clone(), d.clone()]);
        for id in [&a, &b, &c, &d] {
            assert!(!store.test_contains(id));
        }
        assert!(store.test_contains(&other));
    }

    #[tokio::test]
    async fn failing_target_deletes_nothing() {
        let store = MockStore::new();
        let a = reply(&store, None, "A").await;
        let b = reply(&store, Some(&a), "B").await;
        store.fail_deletes_of(a.clone());

        assert_eq!(
            cascade_delete(&store, &a, 16).await,
            Err(api::Error::PermissionDenied)
        );
        assert!(store.test_contains(&a));
        assert!(store.test_contains(&b));
        assert_eq!(store.test_deletes(), vec![a]);
    }

    #[tokio::test]
    async fn partial_failure_is_reported() {
        let store = MockStore::new();
        let a = reply(&store, None, "A").await;
        let b = reply(&store, Some(&a), "B").await;
        let c = reply(&store, Some(&a), "C").await;
        let d = reply(&store, Some(&b), "D").await;
        store.fail_deletes_of(b.clone());

        let report = cascade_delete(&store, &a, 16).await.unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.failed, vec![(b.clone(), api::Error::PermissionDenied)]);
        assert_eq!(report.deleted, vec![c.clone(), d.clone()]);
        assert!(!store.test_contains(&a));
        assert!(store.test_contains(&b));
    }

    #[tokio::test]
    async fn offline_store_deletes_nothing() {
        let store = MockStore::new();
        let a = reply(&store, None, "A").await;
        store.set_offline(true);
        assert!(matches!(
            cascade_delete(&store, &a, 16).await,
            Err(api::Error::Unavailable(_))
        ));
        store.set_offline(false);
        assert!(store.test_contains(&a));
    }
}
