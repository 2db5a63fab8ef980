use std::collections::HashMap;

use crate::{
    api::{CommentId, RawRecord, Time, Timestamp},
    Comment,
};

/// Turns snapshots into canonical comments
///
/// Pending records get the local time of the first snapshot they appeared in
/// as placeholder, and keep it on later snapshots until the store commits
/// their timestamp. This keeps a just-posted comment from moving around while
/// it waits for the store.
#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    placeholders: HashMap<CommentId, Time>,
}

impl Normalizer {
    pub fn new() -> Normalizer {
        Normalizer::default()
    }

    /// Returns one comment per record, in the same order
    pub fn normalize(&mut self, records: &[RawRecord], now: Time) -> Vec<Comment> {
        let mut placeholders = HashMap::new();
        let res = records
            .iter()
            .map(|r| {
                let placeholder = match r.created_at {
                    Timestamp::Committed(_) => now,
                    Timestamp::Pending => {
                        let p = self.placeholders.get(&r.id).copied().unwrap_or(now);
                        placeholders.insert(r.id.clone(), p);
                        p
                    }
                };
                Comment::from_raw(r, placeholder)
            })
            .collect();
        // committed or deleted records forget their placeholder
        self.placeholders = placeholders;
        res
    }

    pub fn num_pending(&self) -> usize {
        self.placeholders.len()
    }
}
