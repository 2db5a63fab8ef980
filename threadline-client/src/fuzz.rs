#![cfg(test)]

use std::collections::HashMap;

use chrono::{Duration, TimeZone, Utc};

use crate::{
    api::{CommentId, RawRecord, Timestamp},
    CommentTree, Normalizer,
};

// (timestamp in seconds, parent index if any, pending) per record; parent
// indices may point past the end of the list to produce orphans
type FuzzForest = Vec<(u8, Option<u8>, bool)>;

fn build_records(forest: &FuzzForest) -> Vec<RawRecord> {
    let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    forest
        .iter()
        .enumerate()
        .map(|(i, (secs, parent, pending))| RawRecord {
            id: CommentId(format!("c{i}")),
            text: Some(format!("comment {i}")),
            created_at: match pending {
                true => Timestamp::Pending,
                false => Timestamp::Committed(base + Duration::seconds(i64::from(*secs))),
            },
            parent_id: parent.map(|p| CommentId(format!("c{p}"))),
        })
        .collect()
}

fn materialize(forest: &FuzzForest) -> CommentTree {
    let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 2, 0).unwrap();
    CommentTree::materialize(Normalizer::new().normalize(&build_records(forest), now))
}

#[test]
fn fuzz_groups_partition_comments() {
    bolero::check!()
        .with_type::<FuzzForest>()
        .cloned()
        .for_each(|forest| {
            let tree = materialize(&forest);
            let mut seen = HashMap::new();
            let mut total = 0;
            for (parent, group) in tree.groups() {
                for c in group {
                    assert_eq!(c.parent_id.as_ref(), parent, "{c:?} is in the wrong group");
                    *seen.entry(c.id.clone()).or_insert(0) += 1;
                    total += 1;
                }
            }
            assert_eq!(total, forest.len());
            assert!(seen.values().all(|&n| n == 1));
        })
}

#[test]
fn fuzz_siblings_are_ordered_and_stable() {
    bolero::check!()
        .with_type::<FuzzForest>()
        .cloned()
        .for_each(|forest| {
            let tree = materialize(&forest);
            let arrival = tree
                .comments()
                .iter()
                .enumerate()
                .map(|(i, c)| (c.id.clone(), i))
                .collect::<HashMap<_, _>>();
            for (_, group) in tree.groups() {
                for pair in group.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    assert!(a.created_at <= b.created_at);
                    if a.created_at == b.created_at {
                        assert!(arrival[&a.id] < arrival[&b.id]);
                    }
                }
            }
        })
}

#[test]
fn fuzz_walk_and_descendants_agree() {
    bolero::check!()
        .with_type::<FuzzForest>()
        .cloned()
        .for_each(|forest| {
            let tree = materialize(&forest);
            let walk = tree.walk();
            // every displayed comment appears once
            let mut ids = walk.iter().map(|(_, c)| &c.id).collect::<Vec<_>>();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), walk.len());
            for (depth, c) in walk.iter().filter(|(d, _)| *d == 0) {
                assert_eq!(*depth, 0);
                let below = tree.descendants(&c.id);
                let shown_below = walk
                    .iter()
                    .skip_while(|(_, w)| w.id != c.id)
                    .skip(1)
                    .take_while(|(d, _)| *d > 0)
                    .count();
                assert_eq!(below.len(), shown_below);
            }
        })
}
