//! Moving and copying rectangles of cells.

use gridcalc_engine::engine::{Area, Id, Point, Value, point_to_address, slide_formula};
use std::collections::BTreeMap;

use super::{Operator, Store, Table};
use crate::cell::Cell;
use crate::error::Result;
use crate::history::{HistoryEntry, IdMatrix};
use crate::prevention::{Prevention, is_prevented};

impl Store {
    /// Put the ids of `matrix` on the grid with its top-left at `origin`.
    pub(crate) fn place(&mut self, origin: Point, matrix: &IdMatrix) {
        for (dy, row) in matrix.iter().enumerate() {
            for (dx, id) in row.iter().enumerate() {
                let Some(id) = id else { continue };
                if let Some(slot) = self
                    .matrix
                    .get_mut(origin.y + dy)
                    .and_then(|r| r.get_mut(origin.x + dx))
                {
                    *slot = id.clone();
                }
            }
        }
    }
}

/// `area`'s shape placed at `origin`.
fn shaped_at(area: &Area, origin: Point) -> Area {
    Area {
        top: origin.y,
        left: origin.x,
        bottom: origin.y + area.height() - 1,
        right: origin.x + area.width() - 1,
    }
}

impl Table {
    /// Move the cells of `src` so its top-left lands on `dst`'s top-left.
    ///
    /// Moved cells keep their ids, so formulas pointing at them follow. The
    /// vacated source gets fresh empty cells. Cells overwritten at the
    /// destination leave the grid; formulas pointing at them read `#REF!`.
    /// For a user move, pairs whose source forbids moving out or whose
    /// destination forbids moving in are left where they are.
    pub fn move_cells(&self, src: Area, dst: Area, operator: Operator) -> Result<Table> {
        let mut store = self.store_mut();
        let bounds = store.bounds();
        let src = src
            .clip(&bounds)
            .ok_or_else(|| Table::out_of_bounds(src.top_left()))?;
        let dst = shaped_at(&src, dst.top_left())
            .clip(&bounds)
            .ok_or_else(|| Table::out_of_bounds(dst.top_left()))?;

        let mut matrix_from: IdMatrix = Vec::with_capacity(dst.height());
        let mut matrix_to: IdMatrix = Vec::with_capacity(dst.height());
        let mut matrix_new: IdMatrix = Vec::with_capacity(dst.height());
        for dy in 0..dst.height() {
            let (mut from_row, mut to_row, mut new_row) = (Vec::new(), Vec::new(), Vec::new());
            for dx in 0..dst.width() {
                let p = Point::new(src.top + dy, src.left + dx);
                let q = Point::new(dst.top + dy, dst.left + dx);
                let blocked = operator == Operator::User
                    && (is_prevented(
                        store.cell_at(p).and_then(|c| c.prevention),
                        Prevention::MOVE_FROM,
                    ) || is_prevented(
                        store.cell_at(q).and_then(|c| c.prevention),
                        Prevention::MOVE_TO,
                    ));
                if blocked {
                    log::warn!(
                        "skipped protected move {} -> {}",
                        point_to_address(p),
                        point_to_address(q)
                    );
                    from_row.push(None);
                    to_row.push(None);
                    new_row.push(None);
                    continue;
                }
                from_row.push(store.id_at(p).cloned());
                to_row.push(store.id_at(q).cloned());
                let id = store.new_id();
                store.data.insert(id.clone(), Cell::default());
                new_row.push(Some(id));
            }
            matrix_from.push(from_row);
            matrix_to.push(to_row);
            matrix_new.push(new_row);
        }

        store.place(src.top_left(), &matrix_new);
        store.place(dst.top_left(), &matrix_from);
        store.rebuild_positions();

        // Fresh ids that were immediately covered by the destination are
        // dropped again.
        let covered: Vec<Id> = matrix_new
            .iter()
            .flatten()
            .flatten()
            .filter(|id| !store.is_live(id.as_str()))
            .cloned()
            .collect();
        for id in &covered {
            store.data.remove(id);
        }
        let matrix_new: IdMatrix = matrix_new
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|id| id.filter(|id| !covered.contains(id)))
                    .collect()
            })
            .collect();

        let lost: Vec<Id> = matrix_to
            .iter()
            .flatten()
            .flatten()
            .filter(|id| !store.is_live(id.as_str()))
            .cloned()
            .collect();
        store.push_history(HistoryEntry::Move {
            src,
            dst,
            matrix_from,
            matrix_to,
            matrix_new,
            lost,
        });
        Ok(self.bumped(&mut store))
    }

    /// Copy the cells of `src` onto `dst`, tiling the source when the
    /// destination is larger. Formula references slide by the distance
    /// travelled, except on `$`-anchored axes. Destination cells keep their
    /// own protection.
    pub fn copy_cells(&self, src: Area, dst: Area, operator: Operator) -> Result<Table> {
        let bounds = self.store().bounds();
        let src = src
            .clip(&bounds)
            .ok_or_else(|| Table::out_of_bounds(src.top_left()))?;
        let target = if dst.height() >= src.height() && dst.width() >= src.width() {
            dst
        } else {
            shaped_at(&src, dst.top_left())
        };
        let target = target
            .clip(&bounds)
            .ok_or_else(|| Table::out_of_bounds(dst.top_left()))?;

        let mut diff = BTreeMap::new();
        for q in target.points() {
            let p = Point::new(
                src.top + (q.y - target.top) % src.height(),
                src.left + (q.x - target.left) % src.width(),
            );
            let Some(mut cell) = self.get_by_point(p, false) else {
                continue;
            };
            if let Some(Value::Text(text)) = &cell.value {
                if text.starts_with('=') {
                    let dy = q.y as isize - p.y as isize;
                    let dx = q.x as isize - p.x as isize;
                    cell.value = Some(Value::Text(slide_formula(text, dy, dx, self)));
                }
            }
            let current = self.get_by_point(q, false).unwrap_or_default();
            cell.prevention = current.prevention;
            cell.width = current.width;
            cell.height = current.height;
            diff.insert(q, cell);
        }
        self.update(diff, false, operator)
    }
}
