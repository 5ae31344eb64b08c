//! Linear undo/redo log.
//!
//! The cursor counts applied entries: `index() == -1` means nothing is
//! applied. Pushing while entries are undone discards them (no branching),
//! and pushing past the limit evicts the oldest entry. Both kinds of dropped
//! entries are handed back so the table can free the cell ids they retained.

use gridcalc_engine::engine::{Area, Id};
use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::cell::Cell;

/// Before/after cell states keyed by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellDiff {
    pub before: BTreeMap<Id, Cell>,
    pub after: BTreeMap<Id, Cell>,
}

impl CellDiff {
    pub fn is_empty(&self) -> bool {
        self.after.is_empty()
    }
}

/// Ids at each position of a rectangle; None where nothing was moved.
pub type IdMatrix = Vec<Vec<Option<Id>>>;

#[derive(Clone, Debug, PartialEq)]
pub enum HistoryEntry {
    Update {
        diff: CellDiff,
        partial: bool,
    },
    Move {
        src: Area,
        dst: Area,
        matrix_from: IdMatrix,
        matrix_to: IdMatrix,
        matrix_new: IdMatrix,
        /// Ids overwritten at the destination and no longer on the grid.
        lost: Vec<Id>,
    },
    AddRows {
        y: usize,
        /// One id row per inserted row, header column included.
        ids: Vec<Vec<Id>>,
        diff: Option<CellDiff>,
    },
    AddCols {
        x: usize,
        /// One id column per inserted column, header row included.
        ids: Vec<Vec<Id>>,
        diff: Option<CellDiff>,
    },
    DeleteRows {
        /// Original positions, ascending.
        ys: Vec<usize>,
        removed: Vec<Vec<Id>>,
    },
    DeleteCols {
        xs: Vec<usize>,
        removed: Vec<Vec<Id>>,
    },
}

impl HistoryEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryEntry::Update { .. } => "update",
            HistoryEntry::Move { .. } => "move",
            HistoryEntry::AddRows { .. } => "add rows",
            HistoryEntry::AddCols { .. } => "add cols",
            HistoryEntry::DeleteRows { .. } => "delete rows",
            HistoryEntry::DeleteCols { .. } => "delete cols",
        }
    }

    /// Every cell id this entry holds on to.
    pub fn ids(&self) -> Vec<Id> {
        fn diff_ids(diff: &CellDiff) -> impl Iterator<Item = &Id> {
            diff.before.keys().chain(diff.after.keys())
        }
        fn matrix_ids(matrix: &IdMatrix) -> impl Iterator<Item = &Id> {
            matrix.iter().flatten().flatten()
        }

        match self {
            HistoryEntry::Update { diff, .. } => diff_ids(diff).cloned().collect(),
            HistoryEntry::Move {
                matrix_from,
                matrix_to,
                matrix_new,
                lost,
                ..
            } => matrix_ids(matrix_from)
                .chain(matrix_ids(matrix_to))
                .chain(matrix_ids(matrix_new))
                .chain(lost.iter())
                .cloned()
                .collect(),
            HistoryEntry::AddRows { ids, diff, .. } | HistoryEntry::AddCols { ids, diff, .. } => ids
                .iter()
                .flatten()
                .chain(diff.iter().flat_map(diff_ids))
                .cloned()
                .collect(),
            HistoryEntry::DeleteRows { removed, .. } | HistoryEntry::DeleteCols { removed, .. } => {
                removed.iter().flatten().cloned().collect()
            }
        }
    }
}

/// An entry pushed out of the log.
#[derive(Debug)]
pub enum Dropped {
    /// An undone entry cut off by a new push.
    Discarded(HistoryEntry),
    /// The oldest applied entry, removed to respect the limit.
    Evicted(HistoryEntry),
}

impl Dropped {
    pub fn entry(&self) -> &HistoryEntry {
        match self {
            Dropped::Discarded(entry) | Dropped::Evicted(entry) => entry,
        }
    }
}

#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        History {
            entries: VecDeque::new(),
            cursor: 0,
            limit,
        }
    }

    /// Position of the last applied entry, -1 when none.
    pub fn index(&self) -> isize {
        self.cursor as isize - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn push(&mut self, entry: HistoryEntry) -> Vec<Dropped> {
        let mut dropped: Vec<Dropped> = self
            .entries
            .drain(self.cursor..)
            .map(Dropped::Discarded)
            .collect();
        log::debug!("history push: {}", entry.kind());
        self.entries.push_back(entry);
        while self.entries.len() > self.limit {
            let Some(oldest) = self.entries.pop_front() else {
                break;
            };
            log::debug!("history evict: {}", oldest.kind());
            dropped.push(Dropped::Evicted(oldest));
        }
        self.cursor = self.entries.len();
        dropped
    }

    /// Step the cursor back, returning the entry to revert.
    pub fn undo_entry(&mut self) -> Option<HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Step the cursor forward, returning the entry to replay.
    pub fn redo_entry(&mut self) -> Option<HistoryEntry> {
        let entry = self.entries.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(entry)
    }

    /// Ids referenced by any entry still in the log.
    pub fn referenced_ids(&self) -> HashSet<Id> {
        self.entries.iter().flat_map(HistoryEntry::ids).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: &str) -> HistoryEntry {
        HistoryEntry::Update {
            diff: CellDiff {
                before: BTreeMap::new(),
                after: BTreeMap::from([(id.to_string(), Cell::default())]),
            },
            partial: true,
        }
    }

    #[test]
    fn test_push_undo_redo_cursor() {
        let mut history = History::new(10);
        assert_eq!(history.index(), -1);
        assert!(history.undo_entry().is_none());
        history.push(update("a"));
        history.push(update("b"));
        assert_eq!(history.index(), 1);
        assert_eq!(history.undo_entry(), Some(update("b")));
        assert_eq!(history.index(), 0);
        assert_eq!(history.redo_entry(), Some(update("b")));
        assert!(history.redo_entry().is_none());
    }

    #[test]
    fn test_push_discards_redo_tail() {
        let mut history = History::new(10);
        history.push(update("a"));
        history.push(update("b"));
        history.undo_entry();
        let dropped = history.push(update("c"));
        assert_eq!(dropped.len(), 1);
        assert!(matches!(&dropped[0], Dropped::Discarded(e) if *e == update("b")));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut history = History::new(2);
        history.push(update("a"));
        history.push(update("b"));
        let dropped = history.push(update("c"));
        assert!(matches!(&dropped[0], Dropped::Evicted(e) if *e == update("a")));
        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), 1);
        assert!(!history.referenced_ids().contains("a"));
    }
}
