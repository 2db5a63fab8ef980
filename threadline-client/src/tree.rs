use std::collections::{HashMap, HashSet, VecDeque};

use crate::{api::CommentId, Comment};

/// Parent → children index over the flat list of comments of one snapshot
///
/// Comments live in an arena in arrival order; groups hold arena indices,
/// sorted by creation time with ties kept in arrival order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentTree {
    comments: Vec<Comment>,
    index: HashMap<CommentId, usize>,
    roots: Vec<usize>,
    children: HashMap<CommentId, Vec<usize>>,
}

impl CommentTree {
    pub fn materialize(comments: Vec<Comment>) -> CommentTree {
        let mut index = HashMap::with_capacity(comments.len());
        let mut roots = Vec::new();
        let mut children = HashMap::<CommentId, Vec<usize>>::new();
        for (i, c) in comments.iter().enumerate() {
            index.insert(c.id.clone(), i);
            match &c.parent_id {
                None => roots.push(i),
                Some(p) => children.entry(p.clone()).or_default().push(i),
            }
        }
        // sort_by_key is stable, so equal timestamps stay in arrival order
        roots.sort_by_key(|&i| comments[i].created_at);
        for group in children.values_mut() {
            group.sort_by_key(|&i| comments[i].created_at);
        }
        CommentTree {
            comments,
            index,
            roots,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// All comments, in snapshot order
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.index.get(id).map(|&i| &self.comments[i])
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.index.contains_key(id)
    }

    /// Comments without a parent
    pub fn roots(&self) -> impl Iterator<Item = &Comment> + '_ {
        self.roots.iter().map(|&i| &self.comments[i])
    }

    /// Direct replies to `id`, empty if there are none
    pub fn children(&self, id: &CommentId) -> impl Iterator<Item = &Comment> + '_ {
        self.children
            .get(id)
            .map(|g| g.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&i| &self.comments[i])
    }

    /// Every group of siblings, keyed by their parent id, None being the roots
    pub fn groups(&self) -> impl Iterator<Item = (Option<&CommentId>, Vec<&Comment>)> + '_ {
        std::iter::once((None, self.roots().collect::<Vec<_>>())).chain(
            self.children.iter().map(|(parent, g)| {
                (Some(parent), g.iter().map(|&i| &self.comments[i]).collect())
            }),
        )
    }

    /// The parent of `id`, if both are in the tree
    pub fn parent_of(&self, id: &CommentId) -> Option<&Comment> {
        self.get(id)?.parent_id.as_ref().and_then(|p| self.get(p))
    }

    /// Replies whose parent is not in the tree anymore, in snapshot order
    pub fn orphans(&self) -> impl Iterator<Item = &Comment> + '_ {
        self.comments.iter().filter(|c| self.is_orphan(c))
    }

    fn is_orphan(&self, c: &Comment) -> bool {
        c.parent_id.as_ref().map_or(false, |p| !self.contains(p))
    }

    /// Comments shown at the top level: roots and orphans, sorted by creation
    /// time
    pub fn top_level(&self) -> Vec<&Comment> {
        let mut res = self
            .comments
            .iter()
            .filter(|c| c.is_top_level() || self.is_orphan(c))
            .collect::<Vec<_>>();
        res.sort_by_key(|c| c.created_at);
        res
    }

    /// The whole subtree below `id`, breadth-first, `id` excluded
    pub fn descendants(&self, id: &CommentId) -> Vec<&Comment> {
        let mut res = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(id);
        while let Some(parent) = queue.pop_front() {
            for &i in self.children.get(parent).map(|g| g.as_slice()).unwrap_or(&[]) {
                // a malformed parent chain could loop back
                if !seen.insert(i) {
                    continue;
                }
                let c = &self.comments[i];
                if c.id == *id {
                    continue;
                }
                res.push(c);
                queue.push_back(&c.id);
            }
        }
        res
    }

    /// Number of ancestors of `id` present in the tree
    pub fn depth(&self, id: &CommentId) -> usize {
        let mut depth = 0;
        let mut current = self.parent_of(id);
        while let Some(c) = current {
            depth += 1;
            if depth >= self.len() {
                break;
            }
            current = self.parent_of(&c.id);
        }
        depth
    }

    /// Depth-first pre-order over the displayed forest, with each comment's
    /// nesting level
    pub fn walk(&self) -> Vec<(usize, &Comment)> {
        let mut res = Vec::with_capacity(self.len());
        let mut stack = self
            .top_level()
            .into_iter()
            .rev()
            .map(|c| (0, c))
            .collect::<Vec<_>>();
        while let Some((depth, c)) = stack.pop() {
            res.push((depth, c));
            let children = self.children(&c.id).collect::<Vec<_>>();
            stack.extend(children.into_iter().rev().map(|c| (depth + 1, c)));
        }
        res
    }

    /// The "Reply to" label shown above a reply whose parent is displayed
    pub fn reply_label(&self, id: &CommentId, preview_chars: usize) -> Option<String> {
        self.parent_of(id)
            .map(|p| format!("Reply to 「{}」", p.preview(preview_chars)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn comment(id: &str, secs: i64, parent: Option<&str>) -> Comment {
        Comment {
            id: CommentId::from(id),
            text: format!("comment {id}"),
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
                + Duration::seconds(secs),
            pending: false,
            parent_id: parent.map(CommentId::from),
        }
    }

    fn ids<'a>(it: impl IntoIterator<Item = &'a Comment>) -> Vec<&'a str> {
        it.into_iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn single_root() {
        let tree = CommentTree::materialize(vec![comment("1", 0, None)]);
        assert_eq!(ids(tree.roots()), vec!["1"]);
        assert_eq!(tree.children(&CommentId::from("1")).count(), 0);
    }

    #[test]
    fn siblings_sorted_by_time_then_arrival() {
        let tree = CommentTree::materialize(vec![
            comment("late", 10, None),
            comment("tie-a", 5, None),
            comment("early", 1, None),
            comment("tie-b", 5, None),
        ]);
        assert_eq!(ids(tree.roots()), vec!["early", "tie-a", "tie-b", "late"]);
    }

    #[test]
    fn nested_replies() {
        let tree = CommentTree::materialize(vec![
            comment("a", 0, None),
            comment("b", 1, Some("a")),
            comment("c", 2, Some("b")),
            comment("d", 3, Some("a")),
            comment("e", 4, None),
        ]);
        let a = CommentId::from("a");
        assert_eq!(ids(tree.roots()), vec!["a", "e"]);
        assert_eq!(ids(tree.children(&a)), vec!["b", "d"]);
        assert_eq!(ids(tree.descendants(&a)), vec!["b", "d", "c"]);
        assert_eq!(tree.depth(&CommentId::from("c")), 2);
        assert_eq!(tree.parent_of(&CommentId::from("c")).unwrap().id.as_str(), "b");
        assert_eq!(
            tree.walk()
                .into_iter()
                .map(|(d, c)| (d, c.id.as_str()))
                .collect::<Vec<_>>(),
            vec![(0, "a"), (1, "b"), (2, "c"), (1, "d"), (0, "e")]
        );
    }

    #[test]
    fn orphans_are_displayed_at_top_level() {
        let tree = CommentTree::materialize(vec![
            comment("a", 0, None),
            comment("orphan", 1, Some("gone")),
            comment("child", 2, Some("orphan")),
        ]);
        assert_eq!(ids(tree.orphans()), vec!["orphan"]);
        assert_eq!(ids(tree.children(&CommentId::from("gone"))), vec!["orphan"]);
        assert_eq!(ids(tree.top_level()), vec!["a", "orphan"]);
        assert_eq!(
            tree.walk()
                .into_iter()
                .map(|(d, c)| (d, c.id.as_str()))
                .collect::<Vec<_>>(),
            vec![(0, "a"), (0, "orphan"), (1, "child")]
        );
        assert_eq!(tree.reply_label(&CommentId::from("orphan"), 30), None);
    }

    #[test]
    fn descendants_terminate_on_cycles() {
        let tree = CommentTree::materialize(vec![
            comment("x", 0, Some("y")),
            comment("y", 1, Some("x")),
        ]);
        assert_eq!(ids(tree.descendants(&CommentId::from("x"))), vec!["y"]);
        assert_eq!(tree.walk().len(), 0);
        assert!(tree.depth(&CommentId::from("x")) <= 2);
    }

    #[test]
    fn reply_label_previews_parent() {
        let mut parent = comment("p", 0, None);
        parent.text = String::from("0123456789012345678901234567890123456789");
        let tree = CommentTree::materialize(vec![parent, comment("r", 1, Some("p"))]);
        assert_eq!(
            tree.reply_label(&CommentId::from("r"), 30).as_deref(),
            Some("Reply to 「012345678901234567890123456789...」")
        );
        assert_eq!(tree.reply_label(&CommentId::from("p"), 30), None);
    }

    #[test]
    fn empty_tree() {
        let tree = CommentTree::default();
        assert!(tree.is_empty());
        assert_eq!(tree.roots().count(), 0);
        assert_eq!(tree.walk().len(), 0);
        assert_eq!(tree.groups().count(), 1);
    }
}
