//! Content writes.

use chrono::Utc;
use gridcalc_engine::engine::{Point, Value, absolutize, point_to_address};
use std::collections::BTreeMap;

use super::{Operator, Store, Table};
use crate::cell::Cell;
use crate::error::{Result, TableError};
use crate::history::{CellDiff, HistoryEntry};
use crate::prevention::{Prevention, is_prevented};

/// Put back every field the cell's protection does not let a user change.
/// Returns the names of the fields that were reset. The mask itself is
/// never a user's to change.
pub(crate) fn guard_fields(next: &mut Cell, current: &Cell) -> Vec<&'static str> {
    let mask = current.prevention;
    let mut reset = Vec::new();
    if next.prevention != current.prevention {
        next.prevention = current.prevention;
        reset.push("prevention");
    }
    if is_prevented(mask, Prevention::WRITE) && next.value != current.value {
        next.value = current.value.clone();
        reset.push("value");
    }
    if is_prevented(mask, Prevention::STYLE) && next.style != current.style {
        next.style = current.style.clone();
        reset.push("style");
    }
    if is_prevented(mask, Prevention::RESIZE)
        && (next.width != current.width || next.height != current.height)
    {
        next.width = current.width;
        next.height = current.height;
        reset.push("size");
    }
    if is_prevented(mask, Prevention::SET_RENDERER) && next.renderer != current.renderer {
        next.renderer = current.renderer.clone();
        reset.push("renderer");
    }
    if is_prevented(mask, Prevention::SET_PARSER) && next.parser != current.parser {
        next.parser = current.parser.clone();
        reset.push("parser");
    }
    reset
}

impl Store {
    fn absolutized(&self, mut cell: Cell) -> Cell {
        if let Some(Value::Text(formula)) = &cell.value {
            if formula.starts_with('=') {
                cell.value = Some(Value::Text(absolutize(formula, self)));
            }
        }
        cell
    }

    /// Write cells in place and return what changed, keyed by id.
    ///
    /// Formulas are absolutized against the current layout. Header cells
    /// (row 0 or column 0) carry layout only, so their value is left alone.
    pub(crate) fn apply_cells(
        &mut self,
        diff: BTreeMap<Point, Cell>,
        partial: bool,
        operator: Operator,
    ) -> CellDiff {
        let now = Utc::now();
        let mut record = CellDiff::default();
        for (point, incoming) in diff {
            let Some(id) = self.id_at(point).cloned() else {
                continue;
            };
            let incoming = self.absolutized(incoming);
            let current = self.data.get(&id).cloned().unwrap_or_default();
            let mut next = if partial {
                let mut next = current.clone();
                next.patch(&incoming);
                next
            } else {
                incoming
            };
            if point.y == 0 || point.x == 0 {
                next.value = current.value.clone();
            }
            if operator == Operator::User {
                let reset = guard_fields(&mut next, &current);
                if !reset.is_empty() {
                    log::warn!(
                        "{}: kept protected {}",
                        point_to_address(point),
                        reset.join(", ")
                    );
                }
            }
            next.changed_at = Some(now);
            record.before.insert(id.clone(), current);
            record.after.insert(id.clone(), next.clone());
            self.data.insert(id, next);
        }
        record
    }
}

impl Table {
    /// Parse `text` with the cell's parser and write the result.
    pub fn write(&self, point: Point, text: &str, operator: Operator) -> Result<Table> {
        let cell = self.parse_input(point, text)?;
        self.update(BTreeMap::from([(point, cell)]), true, operator)
    }

    /// Write a block of texts with its top-left corner at `origin`.
    pub fn write_matrix<S: AsRef<str>>(
        &self,
        origin: Point,
        rows: &[Vec<S>],
        operator: Operator,
    ) -> Result<Table> {
        let mut diff = BTreeMap::new();
        for (dy, row) in rows.iter().enumerate() {
            for (dx, text) in row.iter().enumerate() {
                let point = Point::new(origin.y + dy, origin.x + dx);
                diff.insert(point, self.parse_input(point, text.as_ref())?);
            }
        }
        self.update(diff, true, operator)
    }

    fn parse_input(&self, point: Point, text: &str) -> Result<Cell> {
        self.check_point(point)?;
        let current = self.get_by_point(point, false).unwrap_or_default();
        let parser = self.parser_for(current.parser.as_deref());
        Ok(parser.parse(text, &current))
    }

    /// Apply cell changes as one undoable step.
    ///
    /// With `partial`, only the set fields of each incoming cell replace the
    /// current ones; otherwise the incoming cell replaces it whole. For
    /// [`Operator::User`], fields the cell's protection covers keep their
    /// current value instead of failing the write, and the protection mask
    /// is kept as it is. Header points are accepted for layout changes such
    /// as `width` on a column header or `height` on a row header.
    pub fn update(
        &self,
        diff: BTreeMap<Point, Cell>,
        partial: bool,
        operator: Operator,
    ) -> Result<Table> {
        for point in diff.keys() {
            self.check_grid_point(*point)?;
        }

        let mut store = self.store_mut();
        let record = store.apply_cells(diff, partial, operator);
        if !record.is_empty() {
            store.push_history(HistoryEntry::Update {
                diff: record,
                partial,
            });
        }
        Ok(self.bumped(&mut store))
    }

    /// Convenience for a single system-side value change, bypassing parsing.
    pub fn set_value(&self, point: Point, value: impl Into<Value>) -> Result<Table> {
        let cell = Cell::with_value(value);
        self.update(BTreeMap::from([(point, cell)]), true, Operator::System)
    }

    pub(crate) fn out_of_bounds(point: Point) -> TableError {
        TableError::OutOfBounds {
            address: point_to_address(point),
        }
    }
}
