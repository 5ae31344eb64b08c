//! Row and column insertion and deletion.
//!
//! Rows and columns share one implementation parameterised by [`Axis`]. An id
//! "line" is one row of ids (indexed by x) or one column of ids (indexed by y),
//! header cell included.

use gridcalc_engine::engine::{Id, Point, point_to_address};
use std::collections::BTreeMap;

use super::{Axis, Operator, Store, Table};
use crate::cell::Cell;
use crate::error::{Result, TableError};
use crate::history::HistoryEntry;
use crate::prevention::{Prevention, is_prevented};

impl Axis {
    fn header(self, index: usize) -> Point {
        match self {
            Axis::Row => Point::new(index, 0),
            Axis::Col => Point::new(0, index),
        }
    }

    /// The point at `index` along this axis and `cross` along the other.
    fn point(self, index: usize, cross: usize) -> Point {
        match self {
            Axis::Row => Point::new(index, cross),
            Axis::Col => Point::new(cross, index),
        }
    }

    fn delete_flag(self) -> Prevention {
        match self {
            Axis::Row => Prevention::DELETE_ROW,
            Axis::Col => Prevention::DELETE_COL,
        }
    }

    /// `before` is true when the new lines go above (left of) the base line.
    fn add_flag(self, before: bool) -> Prevention {
        match (self, before) {
            (Axis::Row, true) => Prevention::ADD_ROW_ABOVE,
            (Axis::Row, false) => Prevention::ADD_ROW_BELOW,
            (Axis::Col, true) => Prevention::ADD_COL_LEFT,
            (Axis::Col, false) => Prevention::ADD_COL_RIGHT,
        }
    }
}

impl Store {
    pub(crate) fn len_of(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.num_rows(),
            Axis::Col => self.num_cols(),
        }
    }

    fn cross_len(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.num_cols(),
            Axis::Col => self.num_rows(),
        }
    }

    fn header_mask(&self, axis: Axis, index: usize) -> Option<Prevention> {
        self.cell_at(axis.header(index)).and_then(|c| c.prevention)
    }
}

impl Table {
    /// Insert `count` rows so the first new row sits at `y`. Layout fields
    /// of row `base_y` are copied into the new cells. An optional `diff` is
    /// applied after the insert and undone together with it.
    pub fn add_rows(
        &self,
        y: usize,
        count: usize,
        base_y: usize,
        operator: Operator,
        diff: Option<BTreeMap<Point, Cell>>,
    ) -> Result<Table> {
        self.add_lines(Axis::Row, y, count, base_y, operator, diff)
    }

    pub fn add_cols(
        &self,
        x: usize,
        count: usize,
        base_x: usize,
        operator: Operator,
        diff: Option<BTreeMap<Point, Cell>>,
    ) -> Result<Table> {
        self.add_lines(Axis::Col, x, count, base_x, operator, diff)
    }

    /// Delete rows by index. Rows a user may not delete are skipped.
    pub fn delete_rows(&self, ys: &[usize], operator: Operator) -> Result<Table> {
        self.delete_lines(Axis::Row, ys, operator)
    }

    pub fn delete_cols(&self, xs: &[usize], operator: Operator) -> Result<Table> {
        self.delete_lines(Axis::Col, xs, operator)
    }

    fn add_lines(
        &self,
        axis: Axis,
        at: usize,
        count: usize,
        base: usize,
        operator: Operator,
        diff: Option<BTreeMap<Point, Cell>>,
    ) -> Result<Table> {
        let mut store = self.store_mut();
        let len = store.len_of(axis);
        if at == 0 || at > len + 1 {
            return Err(Table::out_of_bounds(axis.point(at, 1)));
        }
        if base > len {
            return Err(Table::out_of_bounds(axis.point(base, 1)));
        }
        if count == 0 {
            drop(store);
            return match diff {
                Some(cells) if !cells.is_empty() => self.update(cells, true, operator),
                _ => Ok(self.clone()),
            };
        }
        let max = match axis {
            Axis::Row => store.config.max_rows(),
            Axis::Col => store.config.max_cols(),
        };
        if let Some(max) = max {
            if len + count > max {
                return Err(TableError::LimitExceeded {
                    axis: axis.name(),
                    requested: len + count,
                    max,
                });
            }
        }
        if operator == Operator::User {
            let flag = axis.add_flag(base >= at);
            if is_prevented(store.header_mask(axis, base), flag) {
                let address = point_to_address(axis.header(base));
                log::warn!("refused to add {} next to {}", axis.name(), address);
                return Err(TableError::Prevented {
                    operation: format!("adding {}", axis.name()),
                    address,
                });
            }
        }

        let cross = store.cross_len(axis);
        let mut lines: Vec<Vec<Id>> = Vec::with_capacity(count);
        for _ in 0..count {
            let mut line = Vec::with_capacity(cross + 1);
            for k in 0..=cross {
                let layout = store
                    .cell_at(axis.point(base, k))
                    .map(Cell::layout)
                    .unwrap_or_default();
                let id = store.new_id();
                store.data.insert(id.clone(), layout);
                line.push(id);
            }
            lines.push(line);
        }
        store.insert_lines(axis, at, &lines);
        store.rebuild_positions();

        let diff = diff
            .map(|cells| store.apply_cells(cells, true, operator))
            .filter(|record| !record.is_empty());
        let entry = match axis {
            Axis::Row => HistoryEntry::AddRows {
                y: at,
                ids: lines,
                diff,
            },
            Axis::Col => HistoryEntry::AddCols {
                x: at,
                ids: lines,
                diff,
            },
        };
        store.push_history(entry);
        Ok(self.bumped(&mut store))
    }

    fn delete_lines(&self, axis: Axis, indexes: &[usize], operator: Operator) -> Result<Table> {
        let mut store = self.store_mut();
        let len = store.len_of(axis);
        let mut targets: Vec<usize> = indexes
            .iter()
            .copied()
            .filter(|&i| i >= 1 && i <= len)
            .collect();
        targets.sort_unstable();
        targets.dedup();
        if operator == Operator::User {
            targets.retain(|&i| {
                let prevented = is_prevented(store.header_mask(axis, i), axis.delete_flag());
                if prevented {
                    log::warn!(
                        "skipped protected {} at {}",
                        axis.name(),
                        point_to_address(axis.header(i))
                    );
                }
                !prevented
            });
        }
        if targets.is_empty() {
            return Ok(self.clone());
        }
        let min = match axis {
            Axis::Row => store.config.min_num_rows,
            Axis::Col => store.config.min_num_cols,
        };
        let remaining = len - targets.len();
        if remaining < min {
            return Err(TableError::BelowMinimum {
                axis: axis.name(),
                requested: remaining,
                min,
            });
        }

        // Remove from the bottom up so earlier indexes stay valid.
        let mut removed = Vec::with_capacity(targets.len());
        for &i in targets.iter().rev() {
            removed.extend(store.remove_lines(axis, i, 1));
        }
        removed.reverse();
        store.rebuild_positions();

        let entry = match axis {
            Axis::Row => HistoryEntry::DeleteRows {
                ys: targets,
                removed,
            },
            Axis::Col => HistoryEntry::DeleteCols {
                xs: targets,
                removed,
            },
        };
        store.push_history(entry);
        Ok(self.bumped(&mut store))
    }
}
