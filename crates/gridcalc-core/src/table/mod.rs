//! The cell store.
//!
//! A [`Table`] is a cheap handle onto a shared store: an id matrix
//! (`matrix[y][x]`, header row and column included), the cells keyed by id,
//! and the undo history. Every mutating call returns a fresh handle with a new
//! [`Table::version`], so callers can tell a new state exists by comparing
//! versions; all handles keep seeing the same underlying data.
//!
//! Formulas are stored absolutized (`=#1f+#2k`) and resolved through
//! [`Sheet`], so inserting or deleting rows elsewhere does not change what
//! they point at.

mod ops;
mod read;
mod structure;
mod transfer;
mod undo;

pub use read::ReadOptions;

use dashmap::DashMap;
use gridcalc_engine::builtins::{FunctionMapping, default_functions};
use gridcalc_engine::engine::{
    Area, Id, Point, Sheet, SolveCache, Solver, Value, absolutize, parse_address,
    point_to_address, stringify_to_ref, to_base36,
};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cell::Cell;
use crate::collab::{CellParser, DefaultParser, DefaultRenderer, Renderer};
use crate::config::TableConfig;
use crate::error::{Result, TableError};
use crate::history::{History, HistoryEntry};

/// Who is making a change. Protection is only enforced for `User`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Operator {
    #[default]
    User,
    System,
}

/// Row or column, for operations that work the same along either.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    Row,
    Col,
}

impl Axis {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Axis::Row => "rows",
            Axis::Col => "cols",
        }
    }
}

pub(crate) const DEFAULT_KEY: &str = "default";

/// Shared state behind every [`Table`] handle.
pub(crate) struct Store {
    pub(crate) matrix: Vec<Vec<Id>>,
    pub(crate) data: HashMap<Id, Cell>,
    pub(crate) positions: HashMap<Id, Point>,
    pub(crate) head: u64,
    pub(crate) history: History,
    pub(crate) generation: u64,
    pub(crate) config: TableConfig,
    pub(crate) functions: Arc<FunctionMapping>,
    pub(crate) parsers: HashMap<String, Arc<dyn CellParser>>,
    pub(crate) renderers: HashMap<String, Arc<dyn Renderer>>,
}

impl Store {
    pub(crate) fn num_rows(&self) -> usize {
        self.matrix.len().saturating_sub(1)
    }

    pub(crate) fn num_cols(&self) -> usize {
        self.matrix.first().map_or(0, |row| row.len().saturating_sub(1))
    }

    pub(crate) fn bounds(&self) -> Area {
        Area {
            top: 1,
            left: 1,
            bottom: self.num_rows(),
            right: self.num_cols(),
        }
    }

    pub(crate) fn id_at(&self, point: Point) -> Option<&Id> {
        self.matrix.get(point.y)?.get(point.x)
    }

    pub(crate) fn cell_at(&self, point: Point) -> Option<&Cell> {
        self.data.get(self.id_at(point)?)
    }

    pub(crate) fn new_id(&mut self) -> Id {
        let id = to_base36(self.head);
        self.head += 1;
        id
    }

    pub(crate) fn is_live(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub(crate) fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (y, row) in self.matrix.iter().enumerate() {
            for (x, id) in row.iter().enumerate() {
                self.positions.insert(id.clone(), Point::new(y, x));
            }
        }
    }

    /// Insert id lines at `at`. A row line is indexed by x; a column line by y.
    pub(crate) fn insert_lines(&mut self, axis: Axis, at: usize, lines: &[Vec<Id>]) {
        match axis {
            Axis::Row => {
                let at = at.min(self.matrix.len());
                self.matrix.splice(at..at, lines.iter().cloned());
            }
            Axis::Col => {
                for (y, row) in self.matrix.iter_mut().enumerate() {
                    let at = at.min(row.len());
                    row.splice(at..at, lines.iter().filter_map(|line| line.get(y).cloned()));
                }
            }
        }
    }

    /// Remove `count` lines starting at `at`, returning them.
    pub(crate) fn remove_lines(&mut self, axis: Axis, at: usize, count: usize) -> Vec<Vec<Id>> {
        match axis {
            Axis::Row => {
                let end = (at + count).min(self.matrix.len());
                self.matrix.drain(at.min(end)..end).collect()
            }
            Axis::Col => {
                let mut lines = vec![Vec::with_capacity(self.matrix.len()); count];
                for row in self.matrix.iter_mut() {
                    let end = (at + count).min(row.len());
                    for (k, id) in row.drain(at.min(end)..end).enumerate() {
                        lines[k].push(id);
                    }
                }
                lines.retain(|line| !line.is_empty());
                lines
            }
        }
    }

    /// Record a history entry and free ids that dropped entries alone kept.
    pub(crate) fn push_history(&mut self, entry: HistoryEntry) {
        let dropped = self.history.push(entry);
        if dropped.is_empty() {
            return;
        }
        let referenced = self.history.referenced_ids();
        let mut freed = 0usize;
        for d in &dropped {
            for id in d.entry().ids() {
                if !self.is_live(&id) && !referenced.contains(&id) && self.data.remove(&id).is_some()
                {
                    freed += 1;
                }
            }
        }
        if freed > 0 {
            log::debug!("freed {} unreachable cell ids", freed);
        }
    }
}

/// A versioned handle onto a shared cell store.
#[derive(Clone)]
pub struct Table {
    store: Arc<RwLock<Store>>,
    cache: SolveCache,
    area: Area,
    version: u64,
}

fn layer(initial: &HashMap<String, Cell>, key: &str, into: &mut Cell) {
    if let Some(cell) = initial.get(key) {
        into.merge(cell);
    }
}

impl Table {
    /// Build a table from configured bounds and a sparse initial cell map.
    ///
    /// Keys of `initial` are `"default"`, a row label (`"3"`), column letters
    /// (`"B"`) or an address (`"B3"`). A cell is the merge of default, row,
    /// column and address entries in that order. Headers only take their own
    /// row/column entries, and keep `height` (row header) or `width`
    /// (column header) which data cells drop. Ids are assigned row-major.
    pub fn new(config: TableConfig, initial: HashMap<String, Cell>) -> Result<Table> {
        config.validate()?;

        let mut rows = config.num_rows.max(config.min_num_rows);
        let mut cols = config.num_cols.max(config.min_num_cols);
        for key in initial.keys().filter(|k| k.as_str() != DEFAULT_KEY) {
            let parts =
                parse_address(key).ok_or_else(|| TableError::InvalidAddress(key.clone()))?;
            rows = rows.max(parts.point.y);
            cols = cols.max(parts.point.x);
        }
        if let Some(max) = config.max_rows() {
            if rows > max {
                return Err(TableError::LimitExceeded {
                    axis: "rows",
                    requested: rows,
                    max,
                });
            }
        }
        if let Some(max) = config.max_cols() {
            if cols > max {
                return Err(TableError::LimitExceeded {
                    axis: "cols",
                    requested: cols,
                    max,
                });
            }
        }

        let mut store = Store {
            matrix: Vec::with_capacity(rows + 1),
            data: HashMap::new(),
            positions: HashMap::new(),
            head: 0,
            history: History::new(config.history_limit),
            generation: 0,
            config,
            functions: Arc::new(default_functions()),
            parsers: HashMap::new(),
            renderers: HashMap::new(),
        };

        for y in 0..=rows {
            let mut row = Vec::with_capacity(cols + 1);
            for x in 0..=cols {
                let id = store.new_id();
                let mut cell = Cell::default();
                let row_key = point_to_address(Point::new(y, 0));
                let col_key = point_to_address(Point::new(0, x));
                match (y, x) {
                    (0, 0) => {
                        cell.height = Some(store.config.header_height);
                        cell.width = Some(store.config.header_width);
                    }
                    (0, _) => {
                        layer(&initial, &col_key, &mut cell);
                        cell.height = None;
                    }
                    (_, 0) => {
                        layer(&initial, &row_key, &mut cell);
                        cell.width = None;
                    }
                    _ => {
                        layer(&initial, DEFAULT_KEY, &mut cell);
                        layer(&initial, &row_key, &mut cell);
                        layer(&initial, &col_key, &mut cell);
                        layer(&initial, &point_to_address(Point::new(y, x)), &mut cell);
                        cell.width = None;
                        cell.height = None;
                    }
                }
                store.data.insert(id.clone(), cell);
                row.push(id);
            }
            store.matrix.push(row);
        }
        store.rebuild_positions();

        let area = store.bounds();
        let table = Table {
            store: Arc::new(RwLock::new(store)),
            cache: Arc::new(DashMap::new()),
            area,
            version: 0,
        };

        // Formulas can only be absolutized once every cell has an id.
        {
            let mut store = table.store_mut();
            let rewritten: Vec<(Id, String)> = store
                .data
                .iter()
                .filter_map(|(id, cell)| match &cell.value {
                    Some(Value::Text(text)) if text.starts_with('=') => {
                        Some((id.clone(), absolutize(text, &*store)))
                    }
                    _ => None,
                })
                .collect();
            for (id, text) in rewritten {
                if let Some(cell) = store.data.get_mut(&id) {
                    cell.value = Some(Value::Text(text));
                }
            }
        }
        Ok(table)
    }

    pub(crate) fn store(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn store_mut(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A new handle over the full table after a mutation.
    pub(crate) fn bumped(&self, store: &mut Store) -> Table {
        store.generation += 1;
        self.cache.clear();
        Table {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            area: store.bounds(),
            version: store.generation,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// The area this handle views. The full table unless [`Table::trim`]med.
    pub fn area(&self) -> Area {
        self.area
    }

    /// A view of the same store limited to `area` (clipped to the table).
    pub fn trim(&self, area: Area) -> Table {
        let bounds = self.store().bounds();
        Table {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            area: area.clip(&bounds).unwrap_or(area),
            version: self.version,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.store().num_rows()
    }

    pub fn num_cols(&self) -> usize {
        self.store().num_cols()
    }

    pub fn config(&self) -> TableConfig {
        self.store().config.clone()
    }

    pub fn get_id(&self, point: Point) -> Option<Id> {
        self.store().id_at(point).cloned()
    }

    pub fn get_point_by_id(&self, id: &str) -> Option<Point> {
        self.store().positions.get(id).copied()
    }

    pub fn get_address_by_id(&self, id: &str) -> Option<String> {
        self.get_point_by_id(id).map(point_to_address)
    }

    pub fn history_index(&self) -> isize {
        self.store().history.index()
    }

    pub fn history_size(&self) -> usize {
        self.store().history.len()
    }

    /// Rewrite a formula's address references as id references.
    pub fn absolutize(&self, formula: &str) -> String {
        absolutize(formula, self)
    }

    /// Rewrite a formula's id references as current addresses.
    pub fn stringify_to_ref(&self, formula: &str) -> String {
        stringify_to_ref(formula, self)
    }

    /// Merge host functions over the built-ins (same name replaces).
    pub fn set_functions(&self, functions: FunctionMapping) {
        let mut store = self.store_mut();
        let mut merged = (*store.functions).clone();
        merged.extend(functions);
        store.functions = Arc::new(merged);
        drop(store);
        self.cache.clear();
    }

    pub fn set_parser(&self, key: impl Into<String>, parser: Arc<dyn CellParser>) {
        self.store_mut().parsers.insert(key.into(), parser);
    }

    pub fn set_renderer(&self, key: impl Into<String>, renderer: Arc<dyn Renderer>) {
        self.store_mut().renderers.insert(key.into(), renderer);
    }

    pub(crate) fn parser_for(&self, key: Option<&str>) -> Arc<dyn CellParser> {
        let store = self.store();
        key.and_then(|k| store.parsers.get(k).cloned())
            .unwrap_or_else(|| Arc::new(DefaultParser) as Arc<dyn CellParser>)
    }

    pub(crate) fn renderer_for(&self, key: Option<&str>) -> Arc<dyn Renderer> {
        let store = self.store();
        key.and_then(|k| store.renderers.get(k).cloned())
            .unwrap_or_else(|| Arc::new(DefaultRenderer) as Arc<dyn Renderer>)
    }

    /// Solve the cell at `point`, raising its error if it has one.
    pub fn solve_point(&self, point: Point) -> gridcalc_engine::engine::Result<Value> {
        let functions = Arc::clone(&self.store().functions);
        Solver::new(self, &functions, &self.cache).solve_point(point)
    }

    /// Solve an arbitrary value as if it were stored in this table.
    pub fn solve_formula(&self, value: &Value, raise: bool) -> gridcalc_engine::engine::Result<Value> {
        let functions = Arc::clone(&self.store().functions);
        Solver::new(self, &functions, &self.cache).solve_formula(value, raise)
    }

    pub(crate) fn check_point(&self, point: Point) -> Result<()> {
        if self.store().bounds().contains(point) {
            Ok(())
        } else {
            Err(Table::out_of_bounds(point))
        }
    }

    /// Like [`Table::check_point`], but header cells are accepted too.
    pub(crate) fn check_grid_point(&self, point: Point) -> Result<()> {
        let store = self.store();
        if point.y <= store.num_rows() && point.x <= store.num_cols() {
            Ok(())
        } else {
            Err(Table::out_of_bounds(point))
        }
    }
}

// The store resolves references on its own so formulas can be rewritten
// while the write lock is held.
impl Sheet for Store {
    fn bounds(&self) -> Area {
        Area {
            top: 1,
            left: 1,
            bottom: self.num_rows(),
            right: self.num_cols(),
        }
    }

    fn cell_value(&self, point: Point) -> Option<Value> {
        self.cell_at(point).and_then(|cell| cell.value.clone())
    }

    fn id_at(&self, point: Point) -> Option<Id> {
        self.matrix.get(point.y)?.get(point.x).cloned()
    }

    fn point_of(&self, id: &str) -> Option<Point> {
        let point = self.positions.get(id).copied()?;
        (point.y > 0 && point.x > 0).then_some(point)
    }

    fn sheet_id(&self) -> Option<String> {
        self.config.sheet_id.clone()
    }
}

impl Sheet for Table {
    fn bounds(&self) -> Area {
        self.store().bounds()
    }

    fn cell_value(&self, point: Point) -> Option<Value> {
        Sheet::cell_value(&*self.store(), point)
    }

    fn id_at(&self, point: Point) -> Option<Id> {
        Sheet::id_at(&*self.store(), point)
    }

    fn point_of(&self, id: &str) -> Option<Point> {
        Sheet::point_of(&*self.store(), id)
    }

    fn sheet_id(&self) -> Option<String> {
        Sheet::sheet_id(&*self.store())
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("area", &self.area)
            .field("version", &self.version)
            .finish()
    }
}
