use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::items::{Item, ItemSet};

/// Whether elapsed time is currently accruing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
}

impl RunState {
    pub fn flipped(self) -> Self {
        match self {
            RunState::Running => RunState::Paused,
            RunState::Paused => RunState::Running,
        }
    }
}

/// How the session total is measured
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SessionClock {
    /// wall-clock time since the first start, pauses included
    #[default]
    WallClock,
    /// wall-clock time minus every paused interval
    ActiveOnly,
}

/// What "clear files" does to the banked durations
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ClearFilesPolicy {
    /// drop the files and every record, like starting over
    #[default]
    FullReset,
    /// drop the files but keep the records and the session clock
    KeepRecords,
}

/// Outcome of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved { from: usize, to: usize },
    Rejected,
}

/// Whole seconds banked per item name, iterated in first-banked order.
///
/// Items are keyed by display name only, so two files with the same name
/// share one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Records {
    order: Vec<String>,
    secs: HashMap<String, u64>,
}

impl Records {
    pub fn add(&mut self, name: &str, secs: u64) {
        match self.secs.get_mut(name) {
            Some(total) => *total += secs,
            None => {
                self.order.push(name.to_string());
                self.secs.insert(name.to_string(), secs);
            }
        }
    }

    pub fn get(&self, name: &str) -> u64 {
        self.secs.get(name).copied().unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.secs.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.get(name)))
    }

    pub fn total(&self) -> u64 {
        self.secs.values().sum()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.secs.clear();
    }
}

/// Floor of `now - start` in whole seconds; a clock that stepped backwards counts as zero
pub fn whole_secs_between(start: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(start)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn duration_between(start: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(start).unwrap_or_default()
}

/// Per-item elapsed time bookkeeping for one practice session.
///
/// Every time-dependent call takes `now` explicitly so the whole tracker can
/// be driven by a test clock. All operations are total: requests that make
/// no sense in the current state are no-ops.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    items: ItemSet,
    current_index: usize,
    run_state: RunState,
    active_segment_start: Option<SystemTime>,
    session_start: Option<SystemTime>,
    records: Records,
    session_clock: SessionClock,
    paused_total: Duration,
    paused_since: Option<SystemTime>,
}

impl SessionTracker {
    pub fn new(items: ItemSet, run_state: RunState, session_clock: SessionClock) -> Self {
        Self {
            items,
            current_index: 0,
            run_state,
            active_segment_start: None,
            session_start: None,
            records: Records::default(),
            session_clock,
            paused_total: Duration::ZERO,
            paused_since: None,
        }
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_item(&self) -> Option<&Item> {
        self.items.get(self.current_index)
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn active_segment_start(&self) -> Option<SystemTime> {
        self.active_segment_start
    }

    pub fn session_start(&self) -> Option<SystemTime> {
        self.session_start
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    pub fn session_clock(&self) -> SessionClock {
        self.session_clock
    }

    pub fn set_session_clock(&mut self, clock: SessionClock) {
        self.session_clock = clock;
    }

    pub fn can_go_prev(&self) -> bool {
        !self.items.is_empty() && self.current_index > 0
    }

    pub fn can_go_next(&self) -> bool {
        !self.items.is_empty() && self.current_index + 1 < self.items.len()
    }

    /// Bank the active segment into `item_name`. Leaves the segment start in place.
    pub fn commit_segment(&mut self, item_name: &str, now: SystemTime) {
        if let Some(start) = self.active_segment_start {
            let elapsed = whole_secs_between(start, now);
            self.records.add(item_name, elapsed);
            debug!(item = item_name, elapsed, "committed segment");
        }
    }

    fn commit_current(&mut self, now: SystemTime) {
        if let Some(name) = self.current_item().map(|item| item.name().to_string()) {
            self.commit_segment(&name, now);
        }
    }

    /// Start timing the current item if running and nothing is being timed yet.
    pub fn begin_segment_if_running(&mut self, now: SystemTime) {
        if self.run_state != RunState::Running {
            return;
        }
        if self.active_segment_start.is_none() {
            self.active_segment_start = Some(now);
        }
        if self.session_start.is_none() {
            self.session_start = Some(now);
            debug!("session started");
        }
    }

    /// Move by `delta` items without wrapping. Out-of-range moves leave everything untouched.
    pub fn navigate(&mut self, delta: isize, now: SystemTime) -> Navigation {
        if self.items.is_empty() {
            return Navigation::Rejected;
        }
        let from = self.current_index;
        let target = from as isize + delta;
        if target < 0 || target >= self.items.len() as isize {
            return Navigation::Rejected;
        }

        if self.is_running() {
            self.commit_current(now);
        }
        self.current_index = target as usize;
        self.active_segment_start = None;
        debug!(from, to = self.current_index, "navigated");

        Navigation::Moved {
            from,
            to: self.current_index,
        }
    }

    /// Switch to `new_state`. Returns false when already in that state.
    pub fn toggle_run(&mut self, new_state: RunState, now: SystemTime) -> bool {
        if new_state == self.run_state {
            return false;
        }

        match new_state {
            RunState::Paused => {
                self.commit_current(now);
                if self.session_start.is_some() {
                    self.paused_since = Some(now);
                }
            }
            RunState::Running => {
                if let Some(since) = self.paused_since.take() {
                    self.paused_total += duration_between(since, now);
                }
            }
        }

        self.run_state = new_state;
        self.active_segment_start = None;
        debug!(state = ?new_state, "run state changed");
        true
    }

    /// Seconds to show for `item_name`: banked time plus the live segment while running.
    ///
    /// The live segment always belongs to the current item, so callers pass
    /// the current item's name.
    pub fn display_elapsed(&self, item_name: &str, now: SystemTime) -> u64 {
        let banked = self.records.get(item_name);
        match (self.run_state, self.active_segment_start) {
            (RunState::Running, Some(start)) => banked + whole_secs_between(start, now),
            _ => banked,
        }
    }

    pub fn display_current_elapsed(&self, now: SystemTime) -> Option<u64> {
        self.current_item()
            .map(|item| self.display_elapsed(item.name(), now))
    }

    /// Seconds since the first start of this session, measured per the session clock.
    pub fn display_session_elapsed(&self, now: SystemTime) -> Option<u64> {
        let start = self.session_start?;
        let wall = duration_between(start, now);
        let secs = match self.session_clock {
            SessionClock::WallClock => wall,
            SessionClock::ActiveOnly => {
                let ongoing_pause = self
                    .paused_since
                    .map(|since| duration_between(since, now))
                    .unwrap_or_default();
                wall.saturating_sub(self.paused_total + ongoing_pause)
            }
        };
        Some(secs.as_secs())
    }

    /// Banked records with the live segment folded into the current item, without mutating anything.
    pub fn snapshot(&self, now: SystemTime) -> Records {
        let mut records = self.records.clone();
        if let (RunState::Running, Some(start), Some(item)) =
            (self.run_state, self.active_segment_start, self.current_item())
        {
            records.add(item.name(), whole_secs_between(start, now));
        }
        records
    }

    /// Drop every duration but keep the items and position.
    pub fn reset_records(&mut self) {
        self.records.clear();
        self.active_segment_start = None;
        self.session_start = None;
        self.paused_total = Duration::ZERO;
        self.paused_since = None;
        debug!("records reset");
    }

    /// Drop every duration, the items and the position.
    pub fn reset_all(&mut self) {
        self.reset_records();
        self.items = ItemSet::default();
        self.current_index = 0;
        debug!("session reset");
    }

    /// Empty the item set according to `policy`.
    pub fn clear_items(&mut self, policy: ClearFilesPolicy, now: SystemTime) {
        match policy {
            ClearFilesPolicy::FullReset => self.reset_all(),
            ClearFilesPolicy::KeepRecords => {
                if self.is_running() {
                    self.commit_current(now);
                }
                self.items = ItemSet::default();
                self.current_index = 0;
                self.active_segment_start = None;
            }
        }
    }

    /// Swap in a new batch. Time on the outgoing item is banked first; records survive.
    pub fn replace_items(&mut self, items: ItemSet, now: SystemTime) {
        if self.is_running() {
            self.commit_current(now);
        }
        self.items = items;
        self.current_index = 0;
        self.active_segment_start = None;
        debug!(count = self.items.len(), "items replaced");
    }

    /// Reset the position to 0 if it no longer points into the item set.
    pub fn clamp_index(&mut self) {
        if self.current_index >= self.items.len() {
            self.current_index = 0;
        }
    }

    /// Bank the live segment before shutting down.
    pub fn finish(&mut self, now: SystemTime) {
        if self.is_running() {
            self.commit_current(now);
        }
        self.active_segment_start = None;
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new(ItemSet::default(), RunState::Running, SessionClock::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::time::UNIX_EPOCH;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    fn tracker_with(names: &[&str]) -> SessionTracker {
        SessionTracker::new(
            ItemSet::from_names(names),
            RunState::Running,
            SessionClock::WallClock,
        )
    }

    #[test]
    fn sketch_session_scenario() {
        let mut t = tracker_with(&["item0", "item1", "item2"]);
        t.begin_segment_if_running(at(0));

        assert_matches!(t.navigate(1, at(5)), Navigation::Moved { from: 0, to: 1 });
        t.begin_segment_if_running(at(5));
        assert_eq!(t.display_elapsed("item1", at(5)), 0);

        assert!(t.toggle_run(RunState::Paused, at(5)));
        assert!(t.toggle_run(RunState::Running, at(15)));
        t.begin_segment_if_running(at(15));
        t.toggle_run(RunState::Paused, at(18));

        assert_eq!(t.records().get("item0"), 5);
        assert_eq!(t.records().get("item1"), 3);
        assert_eq!(t.records().len(), 2);
    }

    #[test]
    fn commit_without_segment_is_noop() {
        let mut t = tracker_with(&["a"]);
        t.commit_segment("a", at(10));
        assert!(t.records().is_empty());
    }

    #[test]
    fn commit_keeps_segment_start() {
        let mut t = tracker_with(&["a"]);
        t.begin_segment_if_running(at(0));
        t.commit_segment("a", at(4));
        assert_eq!(t.active_segment_start(), Some(at(0)));
        assert_eq!(t.records().get("a"), 4);
    }

    #[test]
    fn commit_floors_partial_seconds() {
        let mut t = tracker_with(&["a"]);
        t.begin_segment_if_running(at(0));
        t.commit_segment("a", at(2) + Duration::from_millis(999));
        assert_eq!(t.records().get("a"), 2);
    }

    #[test]
    fn begin_segment_is_idempotent() {
        let mut t = tracker_with(&["a"]);
        t.begin_segment_if_running(at(1));
        t.begin_segment_if_running(at(7));
        assert_eq!(t.active_segment_start(), Some(at(1)));
        assert_eq!(t.session_start(), Some(at(1)));
    }

    #[test]
    fn begin_segment_does_nothing_when_paused() {
        let mut t = SessionTracker::new(
            ItemSet::from_names(&["a"]),
            RunState::Paused,
            SessionClock::WallClock,
        );
        t.begin_segment_if_running(at(1));
        assert_eq!(t.active_segment_start(), None);
        assert_eq!(t.session_start(), None);
    }

    #[test]
    fn session_start_survives_navigation() {
        let mut t = tracker_with(&["a", "b"]);
        t.begin_segment_if_running(at(0));
        t.navigate(1, at(3));
        t.begin_segment_if_running(at(3));
        assert_eq!(t.session_start(), Some(at(0)));
        assert_eq!(t.active_segment_start(), Some(at(3)));
    }

    #[test]
    fn navigation_past_ends_is_rejected() {
        let mut t = tracker_with(&["a", "b"]);
        t.begin_segment_if_running(at(0));

        assert_eq!(t.navigate(-1, at(2)), Navigation::Rejected);
        assert_eq!(t.current_index(), 0);
        assert!(t.records().is_empty());
        assert_eq!(t.active_segment_start(), Some(at(0)));

        t.navigate(1, at(2));
        assert_eq!(t.navigate(1, at(4)), Navigation::Rejected);
        assert_eq!(t.current_index(), 1);
    }

    #[test]
    fn navigation_with_no_items_is_rejected() {
        let mut t = tracker_with(&[]);
        assert_eq!(t.navigate(1, at(0)), Navigation::Rejected);
        assert_eq!(t.navigate(-1, at(0)), Navigation::Rejected);
        assert!(!t.can_go_next());
        assert!(!t.can_go_prev());
    }

    #[test]
    fn navigation_while_paused_banks_nothing() {
        let mut t = tracker_with(&["a", "b"]);
        t.begin_segment_if_running(at(0));
        t.toggle_run(RunState::Paused, at(2));
        t.navigate(1, at(30));
        assert_eq!(t.records().get("a"), 2);
        assert_eq!(t.records().get("b"), 0);
        assert_eq!(t.active_segment_start(), None);
    }

    #[test]
    fn paused_display_is_stable() {
        let mut t = tracker_with(&["a"]);
        t.begin_segment_if_running(at(0));
        t.toggle_run(RunState::Paused, at(7));

        let first = t.display_elapsed("a", at(8));
        let second = t.display_elapsed("a", at(500));
        assert_eq!(first, 7);
        assert_eq!(first, second);
    }

    #[test]
    fn running_display_includes_live_segment() {
        let mut t = tracker_with(&["a", "b"]);
        t.begin_segment_if_running(at(0));
        t.navigate(1, at(4));
        t.navigate(-1, at(4));
        t.begin_segment_if_running(at(10));
        assert_eq!(t.display_elapsed("a", at(13)), 7);
        assert_eq!(t.display_current_elapsed(at(13)), Some(7));
    }

    #[test]
    fn toggle_to_same_state_is_noop() {
        let mut t = tracker_with(&["a"]);
        t.begin_segment_if_running(at(0));
        assert!(!t.toggle_run(RunState::Running, at(5)));
        assert_eq!(t.active_segment_start(), Some(at(0)));
        assert!(t.records().is_empty());
    }

    #[test]
    fn toggle_with_no_items_does_not_panic() {
        let mut t = tracker_with(&[]);
        t.begin_segment_if_running(at(0));
        assert!(t.toggle_run(RunState::Paused, at(3)));
        assert!(t.toggle_run(RunState::Running, at(4)));
        assert!(t.records().is_empty());
        assert_eq!(t.current_item(), None);
    }

    #[test]
    fn reset_records_keeps_items_and_position() {
        let mut t = tracker_with(&["a", "b", "c"]);
        t.begin_segment_if_running(at(0));
        t.navigate(1, at(5));
        t.begin_segment_if_running(at(5));
        t.navigate(1, at(9));

        t.reset_records();

        assert_eq!(t.items().len(), 3);
        assert_eq!(t.current_index(), 2);
        assert!(t.records().is_empty());
        assert_eq!(t.session_start(), None);
        assert_eq!(t.active_segment_start(), None);
        assert_eq!(t.display_elapsed("a", at(20)), 0);
    }

    #[test]
    fn reset_all_clears_items() {
        let mut t = tracker_with(&["a", "b"]);
        t.begin_segment_if_running(at(0));
        t.navigate(1, at(5));
        t.reset_all();
        assert!(t.items().is_empty());
        assert_eq!(t.current_index(), 0);
        assert!(t.records().is_empty());
        assert_eq!(t.run_state(), RunState::Running);
    }

    #[test]
    fn clear_files_full_reset_drops_records() {
        let mut t = tracker_with(&["a", "b"]);
        t.begin_segment_if_running(at(0));
        t.navigate(1, at(5));
        t.clear_items(ClearFilesPolicy::FullReset, at(6));
        assert!(t.records().is_empty());
        assert_eq!(t.session_start(), None);
    }

    #[test]
    fn clear_files_keep_records_banks_live_segment() {
        let mut t = tracker_with(&["a", "b"]);
        t.begin_segment_if_running(at(0));
        t.navigate(1, at(5));
        t.begin_segment_if_running(at(5));
        t.clear_items(ClearFilesPolicy::KeepRecords, at(8));

        assert!(t.items().is_empty());
        assert_eq!(t.records().get("a"), 5);
        assert_eq!(t.records().get("b"), 3);
        assert_eq!(t.session_start(), Some(at(0)));
        assert_eq!(t.active_segment_start(), None);
    }

    #[test]
    fn replace_items_banks_and_resets_position() {
        let mut t = tracker_with(&["a", "b"]);
        t.begin_segment_if_running(at(0));
        t.navigate(1, at(2));
        t.begin_segment_if_running(at(2));

        t.replace_items(ItemSet::from_names(&["x", "y", "z"]), at(6));

        assert_eq!(t.current_index(), 0);
        assert_eq!(t.current_item().map(|i| i.name()), Some("x"));
        assert_eq!(t.records().get("b"), 4);
        assert_eq!(t.active_segment_start(), None);
    }

    #[test]
    fn clamp_index_after_shrink() {
        let mut t = tracker_with(&["a", "b", "c"]);
        t.navigate(1, at(0));
        t.navigate(1, at(0));
        t.items = ItemSet::from_names(&["a"]);
        t.clamp_index();
        assert_eq!(t.current_index(), 0);
    }

    #[test]
    fn duplicate_names_share_a_bucket() {
        let mut t = tracker_with(&["same.png", "same.png"]);
        t.begin_segment_if_running(at(0));
        t.navigate(1, at(3));
        t.begin_segment_if_running(at(3));
        t.finish(at(5));
        assert_eq!(t.records().len(), 1);
        assert_eq!(t.records().get("same.png"), 5);
    }

    #[test]
    fn wall_clock_session_includes_pauses() {
        let mut t = tracker_with(&["a"]);
        assert_eq!(t.display_session_elapsed(at(0)), None);
        t.begin_segment_if_running(at(0));
        t.toggle_run(RunState::Paused, at(10));
        assert_eq!(t.display_session_elapsed(at(25)), Some(25));
    }

    #[test]
    fn active_only_session_excludes_pauses() {
        let mut t = SessionTracker::new(
            ItemSet::from_names(&["a"]),
            RunState::Running,
            SessionClock::ActiveOnly,
        );
        t.begin_segment_if_running(at(0));
        t.toggle_run(RunState::Paused, at(10));
        assert_eq!(t.display_session_elapsed(at(25)), Some(10));

        t.toggle_run(RunState::Running, at(30));
        t.begin_segment_if_running(at(30));
        assert_eq!(t.display_session_elapsed(at(34)), Some(14));
    }

    #[test]
    fn accumulated_matches_running_time() {
        let mut t = tracker_with(&["a", "b", "c"]);
        let mut clock = 0;
        let mut running_secs = 0;
        t.begin_segment_if_running(at(clock));

        let steps: [(isize, u64, bool); 6] = [
            (1, 4, false),
            (1, 7, true),
            (-1, 2, false),
            (0, 9, true),
            (-1, 3, false),
            (1, 6, false),
        ];
        for (delta, secs, pause) in steps {
            if t.is_running() {
                running_secs += secs;
            }
            clock += secs;
            if pause {
                let next = t.run_state().flipped();
                t.toggle_run(next, at(clock));
            } else if delta != 0 {
                t.navigate(delta, at(clock));
            }
            t.begin_segment_if_running(at(clock));
        }
        t.finish(at(clock));

        assert_eq!(t.records().total(), running_secs);
    }

    #[test]
    fn snapshot_includes_live_segment_only() {
        let mut t = tracker_with(&["a", "b"]);
        t.begin_segment_if_running(at(0));
        t.navigate(1, at(2));
        t.begin_segment_if_running(at(2));

        let snap = t.snapshot(at(6));
        assert_eq!(snap.get("a"), 2);
        assert_eq!(snap.get("b"), 4);
        assert!(!t.records().contains("b"));
    }

    #[test]
    fn records_iterate_in_first_banked_order() {
        let mut records = Records::default();
        records.add("b", 1);
        records.add("a", 2);
        records.add("b", 3);
        let listed: Vec<_> = records.iter().collect();
        assert_eq!(listed, vec![("b", 4), ("a", 2)]);
        assert_eq!(records.total(), 6);
    }

    #[test]
    fn backwards_clock_counts_as_zero() {
        assert_eq!(whole_secs_between(at(10), at(5)), 0);
        assert_eq!(whole_secs_between(at(5), at(10)), 5);
    }

    #[test]
    fn policy_display_matches_cli_names() {
        assert_eq!(SessionClock::ActiveOnly.to_string(), "active-only");
        assert_eq!(ClearFilesPolicy::KeepRecords.to_string(), "keep-records");
    }
}
