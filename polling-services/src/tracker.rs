//! Remembers which unread messages were present at the last successful poll.

use std::collections::HashSet;

/// Seen set of message ids.
///
/// The state is replaced wholesale on every [`commit`](Self::commit); it is the
/// unread set as of the last successful fetch, not a history. A message that is
/// read and later marked unread again is therefore reported as new again.
#[derive(Debug, Default)]
pub struct SeenSetTracker {
    seen: HashSet<String>,
    primed: bool,
}

impl SeenSetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids in `current` that were not present at the last commit.
    pub fn diff(&self, current: &HashSet<String>) -> HashSet<String> {
        current.difference(&self.seen).cloned().collect()
    }

    /// Replace the remembered set with `current`
    pub fn commit(&mut self, current: HashSet<String>) {
        self.seen = current;
        self.primed = true;
    }

    /// Whether any fetch has been committed yet
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_diff_reports_everything() {
        let tracker = SeenSetTracker::new();
        assert!(!tracker.is_primed());
        assert_eq!(tracker.diff(&ids(&["m1", "m2"])), ids(&["m1", "m2"]));
    }

    #[test]
    fn test_reports_only_new_ids() {
        let mut tracker = SeenSetTracker::new();
        tracker.commit(ids(&["m1", "m2"]));

        let current = ids(&["m1", "m2", "m3"]);
        assert_eq!(tracker.diff(&current), ids(&["m3"]));

        tracker.commit(current);
        assert_eq!(tracker.seen(), &ids(&["m1", "m2", "m3"]));
    }

    #[test]
    fn test_diff_is_idempotent() {
        let mut tracker = SeenSetTracker::new();
        tracker.commit(ids(&["m1"]));

        let current = ids(&["m1", "m2"]);
        let first = tracker.diff(&current);
        let second = tracker.diff(&current);
        assert_eq!(first, second);
        assert_eq!(tracker.seen(), &ids(&["m1"]));
    }

    #[test]
    fn test_empty_fetch_clears_state() {
        let mut tracker = SeenSetTracker::new();
        tracker.commit(ids(&["m1", "m2"]));

        let current = HashSet::new();
        assert!(tracker.diff(&current).is_empty());

        tracker.commit(current);
        assert!(tracker.seen().is_empty());
        assert!(tracker.is_primed());
    }

    #[test]
    fn test_sequence_tracks_latest_set_not_union() {
        let steps: [&[&str]; 5] = [
            &["a", "b"],
            &["a", "b", "c"],
            &["c"],
            &["a", "c", "d"],
            &[],
        ];

        let mut tracker = SeenSetTracker::new();
        let mut previous = HashSet::new();

        for step in steps {
            let current = ids(step);
            let expected: HashSet<String> = current.difference(&previous).cloned().collect();

            assert_eq!(tracker.diff(&current), expected);
            tracker.commit(current.clone());
            assert_eq!(tracker.seen(), &current);

            previous = current;
        }
    }

    #[test]
    fn test_message_leaving_unread_set_is_forgotten() {
        let mut tracker = SeenSetTracker::new();
        tracker.commit(ids(&["m1", "m2"]));
        tracker.commit(ids(&["m2"]));

        assert!(!tracker.seen().contains("m1"));
        assert_eq!(tracker.diff(&ids(&["m1", "m2"])), ids(&["m1"]));
    }
}
