//! Bounded snapshot history for the freehand coloring surface.
//!
//! Standard linear undo: past and future stacks over owned snapshots of
//! the filled-region map. Pushing after an undo discards the redo branch.
//! This is independent of the numbered-mode engine's timestamp-based
//! `undo_last_fill` — one undo model per coloring mode.

use crate::game::FilledRegion;
use std::collections::{HashMap, VecDeque};

/// Maximum retained past states; the oldest is evicted first.
pub const MAX_HISTORY: usize = 50;

pub type Snapshot = HashMap<String, FilledRegion>;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub filled_regions: Snapshot,
    pub timestamp: u64,
}

#[derive(Debug)]
pub struct HistoryManager {
    past: VecDeque<HistoryEntry>,
    current: HistoryEntry,
    future: Vec<HistoryEntry>,
}

impl HistoryManager {
    /// Snapshots are owned copies — callers hand in a clone of the live
    /// map, so later mutation can never reach back into stored history.
    pub fn new(initial: Snapshot, timestamp: u64) -> Self {
        HistoryManager {
            past: VecDeque::new(),
            current: HistoryEntry {
                filled_regions: initial,
                timestamp,
            },
            future: Vec::new(),
        }
    }

    pub fn push(&mut self, snapshot: Snapshot, timestamp: u64) {
        let previous = std::mem::replace(
            &mut self.current,
            HistoryEntry {
                filled_regions: snapshot,
                timestamp,
            },
        );
        self.past.push_back(previous);
        if self.past.len() > MAX_HISTORY {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Step back one state. `None` (and no change) when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        let entry = self.past.pop_back()?;
        let displaced = std::mem::replace(&mut self.current, entry);
        self.future.push(displaced);
        Some(&self.current.filled_regions)
    }

    /// Step forward one state. `None` (and no change) when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let entry = self.future.pop()?;
        let displaced = std::mem::replace(&mut self.current, entry);
        self.past.push_back(displaced);
        Some(&self.current.filled_regions)
    }

    pub fn current(&self) -> &Snapshot {
        &self.current.filled_regions
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(n: u32) -> Snapshot {
        let mut map = HashMap::new();
        map.insert(
            format!("region-{}", n),
            FilledRegion {
                region_id: format!("region-{}", n),
                color_number: n,
                is_correct: true,
                filled_at: n as u64,
            },
        );
        map
    }

    #[test]
    fn test_undo_redo_symmetry() {
        let mut history = HistoryManager::new(Snapshot::new(), 0);
        let states: Vec<Snapshot> = (1..=5).map(snap).collect();
        for (i, s) in states.iter().enumerate() {
            history.push(s.clone(), i as u64 + 1);
        }

        // Walk all the way back, checking each intermediate state
        for i in (0..4).rev() {
            let undone = history.undo().unwrap().clone();
            assert_eq!(undone, states[i]);
        }
        let bottom = history.undo().unwrap().clone();
        assert_eq!(bottom, Snapshot::new());
        assert!(history.undo().is_none());

        // And forward again
        for state in &states {
            let redone = history.redo().unwrap().clone();
            assert_eq!(&redone, state);
        }
        assert!(history.redo().is_none());
        assert_eq!(history.current(), states.last().unwrap());
    }

    #[test]
    fn test_push_clears_redo_branch() {
        let mut history = HistoryManager::new(Snapshot::new(), 0);
        history.push(snap(1), 1);
        history.push(snap(2), 2);
        history.undo();
        assert!(history.can_redo());

        history.push(snap(3), 3);
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
        assert_eq!(history.current(), &snap(3));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = HistoryManager::new(Snapshot::new(), 0);
        for i in 1..=(MAX_HISTORY as u32 + 10) {
            history.push(snap(i), i as u64);
        }

        let mut undo_count = 0;
        while history.undo().is_some() {
            undo_count += 1;
        }
        assert_eq!(undo_count, MAX_HISTORY);
        // Oldest surviving state is the one pushed just past the cap
        assert_eq!(history.current(), &snap(10));
    }

    #[test]
    fn test_snapshots_are_independent_copies() {
        let mut live = snap(1);
        let mut history = HistoryManager::new(live.clone(), 0);
        history.push(live.clone(), 1);

        // Mutating the live map must not reach stored history
        live.get_mut("region-1").unwrap().color_number = 99;
        let undone = history.undo().unwrap();
        assert_eq!(undone.get("region-1").unwrap().color_number, 1);
    }

    #[test]
    fn test_empty_undo_is_noop_not_error() {
        let mut history = HistoryManager::new(snap(7), 0);
        assert!(history.undo().is_none());
        assert_eq!(history.current(), &snap(7));
    }
}
