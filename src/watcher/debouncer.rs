//! Per-path coalescing of filesystem changes.
//!
//! Editors rarely save with a single write. Some write several times, others
//! write a temporary file and rename it over the original, or unlink the
//! original first. Everything that happens to one path within the quiet
//! period collapses into a single [`ChangeKind`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// What a settled path amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The path exists and may be new.
    Added,
    Changed,
    Removed,
}

impl ChangeKind {
    /// Fold a newer change into the one already pending for a path.
    ///
    /// A path that reappears after being removed counts as added, so an
    /// unlink-then-recreate save ends up as an update of the same route.
    fn merge(self, next: ChangeKind) -> ChangeKind {
        match (self, next) {
            (_, ChangeKind::Removed) => ChangeKind::Removed,
            (ChangeKind::Removed, _) => ChangeKind::Added,
            (ChangeKind::Added, ChangeKind::Changed) => ChangeKind::Added,
            (_, next) => next,
        }
    }
}

/// Holds changed paths until they have been quiet for `duration`.
#[derive(Debug)]
pub struct Debouncer {
    /// path -> (coalesced kind, time of last change)
    pending: HashMap<PathBuf, (ChangeKind, Instant)>,
    duration: Duration,
}

impl Debouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            duration: Duration::from_millis(debounce_ms),
        }
    }

    /// Record a change, restarting the quiet period for this path.
    pub fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        let now = Instant::now();
        self.pending
            .entry(path)
            .and_modify(|(pending, last_change)| {
                *pending = pending.merge(kind);
                *last_change = now;
            })
            .or_insert((kind, now));
    }

    /// Forget a path.
    pub fn remove(&mut self, path: &Path) {
        self.pending.remove(path);
    }

    /// Drain every path that has been quiet long enough, in path order.
    pub fn take_ready(&mut self) -> Vec<(PathBuf, ChangeKind)> {
        let now = Instant::now();
        let mut ready = Vec::new();

        self.pending.retain(|path, (kind, last_change)| {
            if now.duration_since(*last_change) >= self.duration {
                ready.push((path.clone(), *kind));
                false
            } else {
                true
            }
        });

        ready.sort_by(|a, b| a.0.cmp(&b.0));
        ready
    }

    /// Earliest instant at which some pending path becomes ready.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .map(|(_, last_change)| *last_change)
            .min()
            .map(|last_change| last_change + self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_debouncer_basic() {
        let mut debouncer = Debouncer::new(50);

        let path = PathBuf::from("guide/setup.adoc");
        debouncer.record(path.clone(), ChangeKind::Changed);

        assert!(debouncer.take_ready().is_empty());
        assert!(debouncer.next_deadline().is_some());

        sleep(Duration::from_millis(60));

        assert_eq!(debouncer.take_ready(), vec![(path, ChangeKind::Changed)]);
        assert!(debouncer.next_deadline().is_none());
    }

    #[test]
    fn test_debouncer_resets_on_new_change() {
        let mut debouncer = Debouncer::new(50);

        let path = PathBuf::from("intro.adoc");
        debouncer.record(path.clone(), ChangeKind::Changed);
        sleep(Duration::from_millis(30));

        // Second write restarts the quiet period
        debouncer.record(path.clone(), ChangeKind::Changed);
        sleep(Duration::from_millis(30));
        assert!(debouncer.take_ready().is_empty());

        sleep(Duration::from_millis(30));
        assert_eq!(debouncer.take_ready().len(), 1);
    }

    #[test]
    fn test_debouncer_multiple_files() {
        let mut debouncer = Debouncer::new(50);

        let first = PathBuf::from("a.adoc");
        let second = PathBuf::from("b.adoc");

        debouncer.record(first.clone(), ChangeKind::Changed);
        sleep(Duration::from_millis(30));
        debouncer.record(second.clone(), ChangeKind::Added);
        sleep(Duration::from_millis(25));

        assert_eq!(debouncer.take_ready(), vec![(first, ChangeKind::Changed)]);

        sleep(Duration::from_millis(30));
        assert_eq!(debouncer.take_ready(), vec![(second, ChangeKind::Added)]);
    }

    #[test]
    fn test_debouncer_remove_and_deadline() {
        let mut debouncer = Debouncer::new(50);
        assert!(debouncer.next_deadline().is_none());

        let before = Instant::now();
        let path = PathBuf::from("part.txt");
        debouncer.record(path.clone(), ChangeKind::Changed);

        let deadline = debouncer.next_deadline().unwrap();
        assert!(deadline >= before + Duration::from_millis(50));

        debouncer.remove(&path);
        assert!(debouncer.next_deadline().is_none());
    }

    #[test]
    fn test_unlink_then_recreate_settles_as_added() {
        let mut debouncer = Debouncer::new(0);
        let path = PathBuf::from("intro.adoc");

        debouncer.record(path.clone(), ChangeKind::Removed);
        debouncer.record(path.clone(), ChangeKind::Added);
        debouncer.record(path.clone(), ChangeKind::Changed);

        assert_eq!(debouncer.take_ready(), vec![(path, ChangeKind::Added)]);
    }

    #[test]
    fn test_merge_rules() {
        use ChangeKind::*;

        assert_eq!(Added.merge(Changed), Added);
        assert_eq!(Added.merge(Removed), Removed);
        assert_eq!(Changed.merge(Removed), Removed);
        assert_eq!(Changed.merge(Added), Added);
        assert_eq!(Removed.merge(Changed), Added);
        assert_eq!(Removed.merge(Added), Added);
        assert_eq!(Changed.merge(Changed), Changed);
    }
}
