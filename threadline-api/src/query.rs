use crate::{CommentId, RawRecord};

/// Equality filter understood by the store's query operation
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Filter {
    All,
    /// Records whose parent is exactly this one, None meaning top-level
    ParentIs(Option<CommentId>),
}

impl Filter {
    pub fn children_of(id: &CommentId) -> Filter {
        Filter::ParentIs(Some(id.clone()))
    }

    pub fn matches(&self, r: &RawRecord) -> bool {
        match self {
            Filter::All => true,
            Filter::ParentIs(p) => r.parent_id == *p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timestamp;

    fn record(id: &str, parent: Option<&str>) -> RawRecord {
        RawRecord {
            id: CommentId::from(id),
            text: None,
            created_at: Timestamp::Pending,
            parent_id: parent.map(CommentId::from),
        }
    }

    #[test]
    fn parent_filter() {
        let top = record("1", None);
        let reply = record("2", Some("1"));
        assert!(Filter::ParentIs(None).matches(&top));
        assert!(!Filter::ParentIs(None).matches(&reply));
        assert!(Filter::children_of(&CommentId::from("1")).matches(&reply));
        assert!(!Filter::children_of(&CommentId::from("2")).matches(&reply));
        assert!(Filter::All.matches(&top) && Filter::All.matches(&reply));
    }
}
