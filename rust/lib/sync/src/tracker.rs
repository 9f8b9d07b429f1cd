use std::collections::BTreeMap;
use std::fmt;

/// A server-side collection whose size the client watches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WatchKey {
    BlogComments(String),
    GroupDiscussions(String),
    DiscussionReplies { group: String, discussion: String },
}

impl WatchKey {
    fn noun(&self, n: usize) -> &'static str {
        match (self, n) {
            (WatchKey::BlogComments(_), 1) => "comment",
            (WatchKey::BlogComments(_), _) => "comments",
            (WatchKey::GroupDiscussions(_), 1) => "discussion",
            (WatchKey::GroupDiscussions(_), _) => "discussions",
            (WatchKey::DiscussionReplies { .. }, 1) => "reply",
            (WatchKey::DiscussionReplies { .. }, _) => "replies",
        }
    }
}

impl fmt::Display for WatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchKey::BlogComments(blog) => write!(f, "blog {} comments", blog),
            WatchKey::GroupDiscussions(group) => write!(f, "group {} discussions", group),
            WatchKey::DiscussionReplies { group, discussion } => {
                write!(f, "group {} discussion {} replies", group, discussion)
            }
        }
    }
}

/// Collection sizes as of one server answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    counts: BTreeMap<WatchKey, usize>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: WatchKey, count: usize) -> Self {
        self.set(key, count);
        self
    }

    pub fn set(&mut self, key: WatchKey, count: usize) {
        self.counts.insert(key, count);
    }

    pub fn get(&self, key: &WatchKey) -> Option<usize> {
        self.counts.get(key).copied()
    }

    /// Fold another snapshot in; its counts win on overlap.
    pub fn merge(&mut self, other: Snapshot) {
        self.counts.extend(other.counts);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WatchKey, usize)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// How changes found in one tick are grouped into notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coalescing {
    /// One notification per collection that grew.
    #[default]
    PerCollection,
    /// One notification summarizing every collection that grew.
    PerTick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub key: WatchKey,
    pub new_items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub changes: Vec<Change>,
}

impl Notification {
    pub fn total(&self) -> usize {
        self.changes.iter().map(|c| c.new_items).sum()
    }

    /// Human-readable summary, e.g. "2 new comments".
    pub fn message(&self) -> String {
        match self.changes.as_slice() {
            [one] => format!("{} new {}", one.new_items, one.key.noun(one.new_items)),
            many => format!("{} new items in {} places", self.total(), many.len()),
        }
    }
}

/// Last-seen count per watched collection.
///
/// Counts only move up. A collection that shrank (a deletion) is silent and
/// keeps its high-water mark, so an item the client already counted through
/// [`SyncTracker::record_local_add`] is never announced by a stale answer.
#[derive(Debug, Clone, Default)]
pub struct SyncTracker {
    last_seen: BTreeMap<WatchKey, usize>,
    coalescing: Coalescing,
}

impl SyncTracker {
    pub fn new(coalescing: Coalescing) -> Self {
        Self {
            last_seen: BTreeMap::new(),
            coalescing,
        }
    }

    /// Take `snapshot` as the baseline without notifying.
    pub fn prime(&mut self, snapshot: &Snapshot) {
        for (key, count) in snapshot.iter() {
            self.last_seen.insert(key.clone(), count);
        }
    }

    /// Diff `snapshot` against what was last seen and advance.
    ///
    /// Collections appearing for the first time are baselined silently.
    pub fn observe(&mut self, snapshot: &Snapshot) -> Vec<Notification> {
        let mut changes = Vec::new();
        for (key, current) in snapshot.iter() {
            match self.last_seen.get_mut(key) {
                Some(seen) if current > *seen => {
                    changes.push(Change {
                        key: key.clone(),
                        new_items: current - *seen,
                    });
                    *seen = current;
                }
                Some(_) => {}
                None => {
                    self.last_seen.insert(key.clone(), current);
                }
            }
        }

        if changes.is_empty() {
            return Vec::new();
        }
        match self.coalescing {
            Coalescing::PerCollection => changes
                .into_iter()
                .map(|c| Notification { changes: vec![c] })
                .collect(),
            Coalescing::PerTick => vec![Notification { changes }],
        }
    }

    /// The client itself just added one item to `key`.
    pub fn record_local_add(&mut self, key: &WatchKey) {
        *self.last_seen.entry(key.clone()).or_insert(0) += 1;
    }

    pub fn last_seen(&self, key: &WatchKey) -> Option<usize> {
        self.last_seen.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comments(blog: &str) -> WatchKey {
        WatchKey::BlogComments(blog.into())
    }

    fn replies(d: &str) -> WatchKey {
        WatchKey::DiscussionReplies {
            group: "g".into(),
            discussion: d.into(),
        }
    }

    #[test]
    fn growth_notifies_once_with_delta() {
        let mut t = SyncTracker::new(Coalescing::PerCollection);
        t.prime(&Snapshot::new().with(comments("b"), 2));

        let notes = t.observe(&Snapshot::new().with(comments("b"), 5));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].total(), 3);
        assert_eq!(notes[0].message(), "3 new comments");

        assert!(t.observe(&Snapshot::new().with(comments("b"), 5)).is_empty());
        assert_eq!(t.last_seen(&comments("b")), Some(5));
    }

    #[test]
    fn deletions_never_notify() {
        let mut t = SyncTracker::new(Coalescing::PerCollection);
        t.prime(&Snapshot::new().with(comments("b"), 4));
        assert!(t.observe(&Snapshot::new().with(comments("b"), 3)).is_empty());
        assert_eq!(t.last_seen(&comments("b")), Some(4));
        assert!(t.observe(&Snapshot::new().with(comments("b"), 4)).is_empty());
    }

    #[test]
    fn own_addition_stays_silent() {
        let mut t = SyncTracker::new(Coalescing::PerCollection);
        t.prime(&Snapshot::new().with(comments("b"), 1));
        t.record_local_add(&comments("b"));
        assert!(t.observe(&Snapshot::new().with(comments("b"), 2)).is_empty());

        // A stale answer that predates the local add is silent as well.
        t.record_local_add(&comments("b"));
        assert!(t.observe(&Snapshot::new().with(comments("b"), 2)).is_empty());
        assert!(t.observe(&Snapshot::new().with(comments("b"), 3)).is_empty());
        assert_eq!(t.observe(&Snapshot::new().with(comments("b"), 4))[0].total(), 1);
    }

    #[test]
    fn new_collections_are_baselined() {
        let mut t = SyncTracker::new(Coalescing::PerCollection);
        t.prime(&Snapshot::new().with(WatchKey::GroupDiscussions("g".into()), 1));

        let snap = Snapshot::new()
            .with(WatchKey::GroupDiscussions("g".into()), 2)
            .with(replies("d2"), 0);
        let notes = t.observe(&snap);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message(), "1 new discussion");
        assert_eq!(t.last_seen(&replies("d2")), Some(0));

        let notes = t.observe(&snap.clone().with(replies("d2"), 1));
        assert_eq!(notes[0].message(), "1 new reply");
    }

    #[test]
    fn coalescing_modes() {
        let before = Snapshot::new().with(comments("a"), 0).with(comments("b"), 0);
        let after = Snapshot::new().with(comments("a"), 2).with(comments("b"), 1);

        let mut per_collection = SyncTracker::new(Coalescing::PerCollection);
        per_collection.prime(&before);
        assert_eq!(per_collection.observe(&after).len(), 2);

        let mut per_tick = SyncTracker::new(Coalescing::PerTick);
        per_tick.prime(&before);
        let notes = per_tick.observe(&after);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].changes.len(), 2);
        assert_eq!(notes[0].total(), 3);
        assert_eq!(notes[0].message(), "3 new items in 2 places");
    }
}
