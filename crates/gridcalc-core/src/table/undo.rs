//! Applying history entries backwards and forwards.

use gridcalc_engine::engine::Id;
use std::collections::BTreeMap;

use super::{Axis, Store, Table};
use crate::cell::Cell;
use crate::history::{CellDiff, HistoryEntry};

impl Store {
    fn restore(&mut self, cells: &BTreeMap<Id, Cell>) {
        for (id, cell) in cells {
            self.data.insert(id.clone(), cell.clone());
        }
    }

    fn restore_before(&mut self, diff: &Option<CellDiff>) {
        if let Some(diff) = diff {
            self.restore(&diff.before);
        }
    }

    fn restore_after(&mut self, diff: &Option<CellDiff>) {
        if let Some(diff) = diff {
            self.restore(&diff.after);
        }
    }

    fn revert(&mut self, entry: &HistoryEntry) {
        match entry {
            HistoryEntry::Update { diff, .. } => self.restore(&diff.before),
            HistoryEntry::Move {
                src,
                dst,
                matrix_from,
                matrix_to,
                ..
            } => {
                self.place(dst.top_left(), matrix_to);
                self.place(src.top_left(), matrix_from);
            }
            HistoryEntry::AddRows { y, ids, diff } => {
                self.restore_before(diff);
                self.remove_lines(Axis::Row, *y, ids.len());
            }
            HistoryEntry::AddCols { x, ids, diff } => {
                self.restore_before(diff);
                self.remove_lines(Axis::Col, *x, ids.len());
            }
            HistoryEntry::DeleteRows { ys, removed } => {
                for (y, line) in ys.iter().zip(removed) {
                    self.insert_lines(Axis::Row, *y, std::slice::from_ref(line));
                }
            }
            HistoryEntry::DeleteCols { xs, removed } => {
                for (x, line) in xs.iter().zip(removed) {
                    self.insert_lines(Axis::Col, *x, std::slice::from_ref(line));
                }
            }
        }
    }

    fn replay(&mut self, entry: &HistoryEntry) {
        match entry {
            HistoryEntry::Update { diff, .. } => self.restore(&diff.after),
            HistoryEntry::Move {
                src,
                dst,
                matrix_from,
                matrix_new,
                ..
            } => {
                self.place(src.top_left(), matrix_new);
                self.place(dst.top_left(), matrix_from);
            }
            HistoryEntry::AddRows { y, ids, diff } => {
                self.insert_lines(Axis::Row, *y, ids);
                self.restore_after(diff);
            }
            HistoryEntry::AddCols { x, ids, diff } => {
                self.insert_lines(Axis::Col, *x, ids);
                self.restore_after(diff);
            }
            HistoryEntry::DeleteRows { ys, .. } => {
                for y in ys.iter().rev() {
                    self.remove_lines(Axis::Row, *y, 1);
                }
            }
            HistoryEntry::DeleteCols { xs, .. } => {
                for x in xs.iter().rev() {
                    self.remove_lines(Axis::Col, *x, 1);
                }
            }
        }
    }
}

impl Table {
    /// Revert the last applied entry. A no-op when there is none.
    pub fn undo(&self) -> Table {
        let mut store = self.store_mut();
        let Some(entry) = store.history.undo_entry() else {
            return self.clone();
        };
        log::debug!("undo {}", entry.kind());
        store.revert(&entry);
        store.rebuild_positions();
        self.bumped(&mut store)
    }

    /// Re-apply the next undone entry. A no-op when there is none.
    pub fn redo(&self) -> Table {
        let mut store = self.store_mut();
        let Some(entry) = store.history.redo_entry() else {
            return self.clone();
        };
        log::debug!("redo {}", entry.kind());
        store.replay(&entry);
        store.rebuild_positions();
        self.bumped(&mut store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::prevention::Prevention;
    use crate::table::{Operator, ReadOptions};
    use gridcalc_engine::engine::{Area, Point, Value};
    use std::collections::HashMap;

    fn table() -> Table {
        let config = TableConfig {
            num_rows: 4,
            num_cols: 3,
            ..TableConfig::default()
        };
        let initial = HashMap::from([
            ("A1".to_string(), Cell::with_value(1.0)),
            ("A2".to_string(), Cell::with_value(2.0)),
            ("A3".to_string(), Cell::with_value(3.0)),
            ("B1".to_string(), Cell::with_value("=SUM(A1:A3)")),
            ("C".to_string(), Cell::default().with_prevention(Prevention::STYLE)),
        ]);
        Table::new(config, initial).unwrap()
    }

    /// Everything undo/redo must reproduce.
    fn snapshot(table: &Table) -> (Vec<Vec<Option<Id>>>, Area, BTreeMap<String, Cell>) {
        let ids = (0..=table.num_rows())
            .map(|y| (0..=table.num_cols()).map(|x| table.get_id(Point::new(y, x))).collect())
            .collect();
        (ids, table.area(), table.get_object(ReadOptions::default()))
    }

    fn assert_round_trip(before: &Table, apply: impl Fn(&Table) -> Table) {
        let start = snapshot(before);
        let after = apply(before);
        let done = snapshot(&after);
        let undone = after.undo();
        assert_eq!(snapshot(&undone), start);
        let redone = undone.redo();
        assert_eq!(snapshot(&redone), done);
    }

    #[test]
    fn test_undo_redo_update() {
        assert_round_trip(&table(), |t| t.write(Point::new(1, 1), "10", Operator::User).unwrap());
    }

    #[test]
    fn test_undo_redo_add_rows_and_cols() {
        assert_round_trip(&table(), |t| t.add_rows(2, 2, 1, Operator::User, None).unwrap());
        assert_round_trip(&table(), |t| {
            let diff = BTreeMap::from([(Point::new(1, 2), Cell::with_value("new"))]);
            t.add_cols(2, 1, 1, Operator::User, Some(diff)).unwrap()
        });
    }

    #[test]
    fn test_undo_redo_delete() {
        assert_round_trip(&table(), |t| t.delete_rows(&[1, 3], Operator::User).unwrap());
        assert_round_trip(&table(), |t| t.delete_cols(&[2], Operator::User).unwrap());
    }

    #[test]
    fn test_undo_redo_move_and_copy() {
        assert_round_trip(&table(), |t| {
            t.move_cells(Area::new(1, 1, 2, 1), Area::new(2, 1, 3, 1), Operator::User)
                .unwrap()
        });
        assert_round_trip(&table(), |t| {
            t.copy_cells(Area::new(1, 2, 1, 2), Area::new(2, 2, 3, 3), Operator::User)
                .unwrap()
        });
    }

    #[test]
    fn test_undo_restores_formula_result() {
        let table = table();
        let deleted = table.delete_rows(&[2], Operator::User).unwrap();
        assert_eq!(deleted.solve_point(Point::new(1, 2)).unwrap(), Value::Number(4.0));
        let restored = deleted.undo();
        assert_eq!(restored.solve_point(Point::new(1, 2)).unwrap(), Value::Number(6.0));
        assert_eq!(restored.history_index(), -1);
    }

    #[test]
    fn test_undo_redo_at_ends_are_noops() {
        let table = table();
        let same = table.undo();
        assert_eq!(same.version(), table.version());
        let written = table.write(Point::new(1, 1), "9", Operator::User).unwrap();
        let same = written.redo();
        assert_eq!(same.version(), written.version());
    }

    #[test]
    fn test_new_edit_discards_redo() {
        let table = table();
        let t1 = table.write(Point::new(1, 1), "10", Operator::User).unwrap();
        let t2 = t1.undo();
        let t3 = t2.write(Point::new(2, 1), "20", Operator::User).unwrap();
        assert_eq!(t3.history_size(), 1);
        let t4 = t3.redo();
        assert_eq!(t4.version(), t3.version());
        assert_eq!(
            t4.get_by_point(Point::new(1, 1), false).unwrap().value(),
            Value::Number(1.0)
        );
    }
}
