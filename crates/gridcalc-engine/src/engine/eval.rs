//! Formula evaluation.
//!
//! A [`Solver`] walks an [`Expr`] tree against a [`Sheet`]. References and
//! ranges evaluate to [`SubTable`] views of the sheet; functions are looked up
//! in a [`FunctionMapping`] and called with their unevaluated arguments, so
//! `IF`/`IFERROR` only evaluate the branch they need.
//!
//! Finished results are memoized per address in a shared [`SolveCache`];
//! errors are memoized just like values. The cells a solver is still in the
//! middle of evaluating are tracked per solver, never in the shared cache:
//! re-entering one of them is a circular reference and produces `#CIRC!`
//! rather than unbounded recursion, while another thread solving the same
//! cell at the same time just computes it too.

use dashmap::DashMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use super::address::{Point, parse_address, point_to_address};
use super::area::{Area, range_to_area, zone_to_area, Zone};
use super::error::{FormulaError, Result};
use super::id::{Id, IdRef};
use super::parser::{Expr, parse_formula};
use super::value::{SubTable, Value};
use crate::builtins::{Args, FunctionMapping};

/// Read access to the cell store, as seen by the evaluator.
pub trait Sheet {
    /// The full table area (rows and columns from 1).
    fn bounds(&self) -> Area;
    /// Raw stored value at `point` (formulas are returned unevaluated).
    fn cell_value(&self, point: Point) -> Option<Value>;
    fn id_at(&self, point: Point) -> Option<Id>;
    /// Current position of a cell id, if it is still on the grid.
    fn point_of(&self, id: &str) -> Option<Point>;
    /// Identifier used by `#<sheet>!` prefixed ids.
    fn sheet_id(&self) -> Option<String> {
        None
    }
}

/// Memo slot for one finished address.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    Value(Value),
    Error(FormulaError),
}

/// Shared memo of solved cells, keyed by address. Clones share storage.
pub type SolveCache = Arc<DashMap<String, Slot>>;

/// One evaluation pass. Clones share the set of cells in progress.
#[derive(Clone)]
pub struct Solver<'a> {
    sheet: &'a dyn Sheet,
    functions: &'a FunctionMapping,
    cache: &'a DashMap<String, Slot>,
    solving: Rc<RefCell<HashSet<String>>>,
    origin: Option<Point>,
}

impl<'a> Solver<'a> {
    pub fn new(
        sheet: &'a dyn Sheet,
        functions: &'a FunctionMapping,
        cache: &'a DashMap<String, Slot>,
    ) -> Solver<'a> {
        Solver {
            sheet,
            functions,
            cache,
            solving: Rc::new(RefCell::new(HashSet::new())),
            origin: None,
        }
    }

    /// The cell whose formula is being solved (used by `ROW()`/`COL()`).
    pub fn with_origin(mut self, origin: Point) -> Solver<'a> {
        self.origin = Some(origin);
        self
    }

    pub fn origin(&self) -> Option<Point> {
        self.origin
    }

    pub fn sheet(&self) -> &'a dyn Sheet {
        self.sheet
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Value(v) => Ok(v.clone()),
            Expr::Ref(text) => {
                let parts = parse_address(text)
                    .filter(|p| p.has_row() && p.has_col())
                    .ok_or_else(|| FormulaError::name(format!("invalid reference {}", text)))?;
                self.view(Area::point(parts.point), text)
            }
            Expr::Range(text) => {
                let bounds = self.sheet.bounds();
                let area = range_to_area(text, &bounds).ok_or_else(|| {
                    FormulaError::reference(format!("{} is outside the table", text))
                })?;
                Ok(Value::Table(SubTable { area }))
            }
            Expr::Id(text) => {
                let point = self.resolve_id(text)?;
                self.view(Area::point(point), text)
            }
            Expr::IdRange(text) => {
                let (start, end) = text
                    .split_once(':')
                    .ok_or_else(|| FormulaError::name(format!("invalid range {}", text)))?;
                let start = self.resolve_id(start)?;
                let end = self.resolve_id(end)?;
                let area = zone_to_area(Zone {
                    start_y: start.y,
                    start_x: start.x,
                    end_y: end.y,
                    end_x: end.x,
                });
                Ok(Value::Table(SubTable { area }))
            }
            Expr::Function { name, args } => {
                let key = name.to_ascii_lowercase();
                let function = self
                    .functions
                    .get(&key)
                    .ok_or_else(|| FormulaError::name(format!("unknown function {}", name)))?;
                function.call(&Args::new(args, self))
            }
            Expr::Unreferenced => Err(FormulaError::reference("reference was deleted")),
            Expr::InvalidRef(text) => Err(FormulaError::name(format!("invalid name {}", text))),
        }
    }

    fn view(&self, area: Area, text: &str) -> Result<Value> {
        if self.sheet.bounds().contains(area.top_left()) {
            Ok(Value::Table(SubTable { area }))
        } else {
            Err(FormulaError::reference(format!("{} is outside the table", text)))
        }
    }

    fn resolve_id(&self, text: &str) -> Result<Point> {
        let id = IdRef::parse(text)
            .ok_or_else(|| FormulaError::name(format!("invalid id {}", text)))?;
        if let Some(sheet) = &id.sheet {
            if self.sheet.sheet_id().as_deref() != Some(sheet.as_str()) {
                return Err(FormulaError::reference(format!("unknown sheet {}", sheet)));
            }
        }
        self.sheet
            .point_of(&id.id)
            .ok_or_else(|| FormulaError::reference(format!("cell {} no longer exists", text)))
    }

    /// Solve a raw cell value. Formulas are lexed, parsed and evaluated, and a
    /// range result collapses to its top-left cell; `'`-prefixed text is
    /// literal. Everything else passes through. With `raise` unset, errors are
    /// replaced by null.
    pub fn solve_formula(&self, value: &Value, raise: bool) -> Result<Value> {
        let result = match value {
            Value::Text(text) => match (text.strip_prefix('='), text.strip_prefix('\'')) {
                (Some(formula), _) => self.solve_text(formula),
                (None, Some(literal)) => Ok(Value::Text(literal.to_string())),
                (None, None) => Ok(value.clone()),
            },
            other => Ok(other.clone()),
        };
        match result {
            Err(_) if !raise => Ok(Value::Null),
            other => other,
        }
    }

    fn solve_text(&self, formula: &str) -> Result<Value> {
        let expr = parse_formula(formula)?;
        let value = self.evaluate(&expr)?;
        self.collapse(value)
    }

    /// Replace a range by the solved value of its top-left cell.
    pub fn collapse(&self, value: Value) -> Result<Value> {
        match value {
            Value::Table(sub) => self.solve_point(sub.area.top_left()),
            other => Ok(other),
        }
    }

    /// Solve the cell at `point`, memoized by address.
    pub fn solve_point(&self, point: Point) -> Result<Value> {
        let key = point_to_address(point);
        if self.solving.borrow().contains(&key) {
            return Err(FormulaError::circular(format!("{} depends on itself", key)));
        }
        let cached = self.cache.get(&key).map(|slot| slot.clone());
        match cached {
            Some(Slot::Value(v)) => {
                log::trace!("solve cache hit for {}", key);
                return Ok(v);
            }
            Some(Slot::Error(e)) => return Err(e),
            None => {}
        }

        self.solving.borrow_mut().insert(key.clone());
        let raw = self.sheet.cell_value(point).unwrap_or_default();
        let result = self.clone().with_origin(point).solve_formula(&raw, true);
        self.solving.borrow_mut().remove(&key);
        let slot = match &result {
            Ok(v) => Slot::Value(v.clone()),
            Err(e) => Slot::Error(e.clone()),
        };
        self.cache.insert(key, slot);
        result
    }

    /// Solve every cell of `area` row by row. With `raise` unset, failing
    /// cells become null instead of aborting the pass.
    pub fn solve_area(&self, area: &Area, raise: bool) -> Result<Vec<Vec<Value>>> {
        let mut matrix = Vec::with_capacity(area.height());
        for y in area.top..=area.bottom {
            let mut row = Vec::with_capacity(area.width());
            for x in area.left..=area.right {
                match self.solve_point(Point::new(y, x)) {
                    Ok(v) => row.push(v),
                    Err(e) if raise => return Err(e),
                    Err(_) => row.push(Value::Null),
                }
            }
            matrix.push(row);
        }
        Ok(matrix)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::builtins::default_functions;
    use crate::engine::ErrorKind;
    use crate::engine::address::address_to_point;
    use std::collections::HashMap;

    /// Minimal in-memory sheet; ids are the addresses in lower case.
    pub(crate) struct MapSheet {
        pub cells: HashMap<Point, Value>,
        pub bounds: Area,
    }

    impl MapSheet {
        pub(crate) fn new(cells: &[(&str, Value)]) -> MapSheet {
            MapSheet {
                cells: cells
                    .iter()
                    .map(|(addr, v)| (address_to_point(addr).unwrap(), v.clone()))
                    .collect(),
                bounds: Area::new(1, 1, 10, 10),
            }
        }
    }

    impl Sheet for MapSheet {
        fn bounds(&self) -> Area {
            self.bounds
        }
        fn cell_value(&self, point: Point) -> Option<Value> {
            self.cells.get(&point).cloned()
        }
        fn id_at(&self, point: Point) -> Option<Id> {
            self.bounds
                .contains(point)
                .then(|| point_to_address(point).to_ascii_lowercase())
        }
        fn point_of(&self, id: &str) -> Option<Point> {
            address_to_point(id).filter(|p| self.bounds.contains(*p))
        }
    }

    pub(crate) fn solve(sheet: &MapSheet, formula: &str) -> Result<Value> {
        let functions = default_functions();
        let cache = DashMap::new();
        Solver::new(sheet, &functions, &cache).solve_formula(&Value::from(formula), true)
    }

    #[test]
    fn test_reference_arithmetic() {
        let sheet = MapSheet::new(&[("A1", Value::Number(5.0)), ("A2", Value::from("=A1+3"))]);
        assert_eq!(solve(&sheet, "=A2").unwrap(), Value::Number(8.0));
    }

    #[test]
    fn test_circular_reference_is_reported() {
        let sheet = MapSheet::new(&[("A1", Value::from("=B1")), ("B1", Value::from("=A1"))]);
        let err = solve(&sheet, "=A1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Circular);
    }

    #[test]
    fn test_errors_are_memoized() {
        let sheet = MapSheet::new(&[("A1", Value::from("=1/0"))]);
        let functions = default_functions();
        let cache = DashMap::new();
        let solver = Solver::new(&sheet, &functions, &cache);
        assert!(solver.solve_point(Point::new(1, 1)).is_err());
        assert!(matches!(
            cache.get("A1").map(|s| s.clone()),
            Some(Slot::Error(e)) if e.kind == ErrorKind::DivZero
        ));
    }

    #[test]
    fn test_cell_in_progress_elsewhere_is_not_circular() {
        let sheet = MapSheet::new(&[("A1", Value::Number(2.0)), ("B1", Value::from("=A1*3"))]);
        let functions = default_functions();
        let cache = DashMap::new();
        // Another pass is half way through A1; this one must not see a cycle.
        let other = Solver::new(&sheet, &functions, &cache);
        other.solving.borrow_mut().insert("A1".to_string());
        let solver = Solver::new(&sheet, &functions, &cache);
        assert_eq!(solver.solve_point(Point::new(1, 2)).unwrap(), Value::Number(6.0));
        assert_eq!(
            cache.get("B1").map(|s| s.clone()),
            Some(Slot::Value(Value::Number(6.0)))
        );
        assert!(other.solve_point(Point::new(1, 1)).is_err());
    }

    #[test]
    fn test_raise_false_substitutes_null() {
        let sheet = MapSheet::new(&[("A1", Value::from("=foo(1)"))]);
        let functions = default_functions();
        let cache = DashMap::new();
        let solver = Solver::new(&sheet, &functions, &cache);
        let matrix = solver.solve_area(&Area::new(1, 1, 1, 2), false).unwrap();
        assert_eq!(matrix, vec![vec![Value::Null, Value::Null]]);
        assert!(solver.solve_area(&Area::new(1, 1, 1, 1), true).is_err());
    }

    #[test]
    fn test_id_references_resolve_through_sheet() {
        let sheet = MapSheet::new(&[("B2", Value::Number(4.0))]);
        assert_eq!(solve(&sheet, "=#b2*2").unwrap(), Value::Number(8.0));
        assert_eq!(
            solve(&sheet, "=#z99").unwrap_err().kind,
            ErrorKind::Ref
        );
        assert_eq!(
            solve(&sheet, "=#other!#b2").unwrap_err().kind,
            ErrorKind::Ref
        );
    }

    #[test]
    fn test_literal_text_is_not_evaluated() {
        let sheet = MapSheet::new(&[]);
        assert_eq!(solve(&sheet, "'=1+1").unwrap(), Value::from("=1+1"));
        assert_eq!(solve(&sheet, "plain").unwrap(), Value::from("plain"));
    }

    #[test]
    fn test_range_result_collapses_to_top_left() {
        let sheet = MapSheet::new(&[("A1", Value::Number(1.0)), ("A2", Value::Number(2.0))]);
        assert_eq!(solve(&sheet, "=A1:A2").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_unknown_function_and_bad_refs() {
        let sheet = MapSheet::new(&[]);
        assert_eq!(solve(&sheet, "=NOPE(1)").unwrap_err().kind, ErrorKind::Name);
        assert_eq!(solve(&sheet, "=foo").unwrap_err().kind, ErrorKind::Name);
        assert_eq!(solve(&sheet, "=#REF!").unwrap_err().kind, ErrorKind::Ref);
        assert_eq!(solve(&sheet, "=Z99").unwrap_err().kind, ErrorKind::Ref);
    }
}
