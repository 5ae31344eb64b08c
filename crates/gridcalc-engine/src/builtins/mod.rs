//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing names are ALL CAPS in the tables (`SUM`, `VLOOKUP`);
//!   lookup is case-insensitive, so the registry is keyed by the lower-cased
//!   name.
//! - Infix operators are ordinary built-ins (`1+2` calls `ADD`), so they can
//!   also be written out as functions: `=DIVIDE(4, 0)`.
//! - Each module exposes a `FUNCTIONS` table; a new function goes in the table
//!   of the module it belongs to and is picked up by [`default_functions`].
//!
//! Arguments reach a function unevaluated. [`Args`] evaluates them on demand,
//! which is what lets `IF` and `IFERROR` skip the branch they don't take.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{
    Area, Expr, FormulaError, Result, Solver, Value, ensure_boolean, ensure_number,
    ensure_string,
};

mod aggregate;
mod arith;
mod compare;
mod criteria;
mod info;
mod logic;
mod lookup;
mod math;
mod text;

pub use compare::compare_values;

/// Accepted argument count. `max: None` means variadic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

pub trait Function: Send + Sync {
    fn name(&self) -> &str;

    fn arity(&self) -> Arity;

    /// Check the argument count before anything is evaluated.
    fn validate(&self, args: &Args<'_, '_>) -> Result<()> {
        let arity = self.arity();
        if arity.accepts(args.len()) {
            return Ok(());
        }
        let expected = match arity.max {
            Some(max) if max == arity.min => format!("{}", max),
            Some(max) => format!("{} to {}", arity.min, max),
            None => format!("at least {}", arity.min),
        };
        Err(FormulaError::not_available(format!(
            "{} expects {} arguments, got {}",
            self.name(),
            expected,
            args.len()
        )))
    }

    fn main(&self, args: &Args<'_, '_>) -> Result<Value>;

    fn call(&self, args: &Args<'_, '_>) -> Result<Value> {
        self.validate(args)?;
        self.main(args)
    }
}

/// A function defined by a row in one of the `FUNCTIONS` tables.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: Option<usize>,
    pub description: &'static str,
    pub main: fn(&Args<'_, '_>) -> Result<Value>,
}

impl Function for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> Arity {
        Arity {
            min: self.min_args,
            max: self.max_args,
        }
    }

    fn main(&self, args: &Args<'_, '_>) -> Result<Value> {
        (self.main)(args)
    }
}

/// Name (lower case) to implementation. Hosts override or add entries with
/// `extend`/`insert`.
pub type FunctionMapping = HashMap<String, Arc<dyn Function>>;

pub fn builtin_tables() -> [&'static [Builtin]; 9] {
    [
        arith::FUNCTIONS,
        compare::FUNCTIONS,
        math::FUNCTIONS,
        aggregate::FUNCTIONS,
        criteria::FUNCTIONS,
        lookup::FUNCTIONS,
        logic::FUNCTIONS,
        info::FUNCTIONS,
        text::FUNCTIONS,
    ]
}

pub fn default_functions() -> FunctionMapping {
    let mut functions = FunctionMapping::new();
    for table in builtin_tables() {
        for builtin in table {
            functions.insert(
                builtin.name.to_ascii_lowercase(),
                Arc::new(*builtin) as Arc<dyn Function>,
            );
        }
    }
    functions
}

/// The unevaluated arguments of one call, plus the solver to evaluate them with.
pub struct Args<'e, 's> {
    exprs: &'e [Expr],
    solver: &'e Solver<'s>,
}

impl<'e, 's> Args<'e, 's> {
    pub fn new(exprs: &'e [Expr], solver: &'e Solver<'s>) -> Args<'e, 's> {
        Args { exprs, solver }
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn solver(&self) -> &Solver<'s> {
        self.solver
    }

    /// True when argument `i` was not given or was left empty (`F(1,)`).
    pub fn is_omitted(&self, i: usize) -> bool {
        matches!(self.exprs.get(i), None | Some(Expr::Value(Value::Null)))
    }

    /// Evaluate argument `i`; ranges stay as [`Value::Table`].
    pub fn value(&self, i: usize) -> Result<Value> {
        match self.exprs.get(i) {
            Some(expr) => self.solver.evaluate(expr),
            None => Ok(Value::Null),
        }
    }

    /// Evaluate argument `i` to a scalar, unwrapping a single-cell range.
    pub fn scalar(&self, i: usize) -> Result<Value> {
        match self.value(i)? {
            Value::Table(sub) if sub.area.height() == 1 && sub.area.width() == 1 => {
                self.solver.solve_point(sub.area.top_left())
            }
            Value::Table(sub) => Err(FormulaError::value(format!(
                "expected a single cell, got range {}",
                sub.area
            ))),
            other => Ok(other),
        }
    }

    pub fn number(&self, i: usize) -> Result<f64> {
        ensure_number(&self.scalar(i)?)
    }

    pub fn string(&self, i: usize) -> Result<String> {
        ensure_string(&self.scalar(i)?)
    }

    pub fn boolean(&self, i: usize) -> Result<bool> {
        ensure_boolean(&self.scalar(i)?)
    }

    pub fn number_or(&self, i: usize, default: f64) -> Result<f64> {
        if self.is_omitted(i) {
            Ok(default)
        } else {
            self.number(i)
        }
    }

    pub fn boolean_or(&self, i: usize, default: bool) -> Result<bool> {
        if self.is_omitted(i) {
            Ok(default)
        } else {
            self.boolean(i)
        }
    }

    /// The area argument `i` refers to; scalars are a `#VALUE!` error.
    pub fn area(&self, i: usize) -> Result<Area> {
        match self.value(i)? {
            Value::Table(sub) => Ok(sub.area),
            other => Err(FormulaError::value(format!(
                "expected a range, got {}",
                other.type_name()
            ))),
        }
    }

    /// Solved values of every cell in `area`, row-major.
    pub fn cells(&self, area: &Area) -> Result<Vec<Value>> {
        Ok(self
            .solver
            .solve_area(area, true)?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Argument `i` as a flat list: every cell of a range, or the single scalar.
    pub fn flatten(&self, i: usize) -> Result<Vec<Value>> {
        match self.value(i)? {
            Value::Table(sub) => self.cells(&sub.area),
            Value::Array(items) => Ok(items),
            other => Ok(vec![other]),
        }
    }
}

/// Reject NaN/infinite results as a domain error.
pub(crate) fn finite(name: &str, n: f64) -> Result<Value> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(FormulaError::num(format!("{} result is out of range", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for table in builtin_tables() {
            for b in table {
                assert!(seen.insert(b.name), "duplicate builtin {}", b.name);
                assert_eq!(b.name, b.name.to_ascii_uppercase());
            }
        }
        assert!(seen.len() >= 50);
    }

    #[test]
    fn test_arity_accepts() {
        let variadic = Arity { min: 1, max: None };
        assert!(!variadic.accepts(0));
        assert!(variadic.accepts(30));
        let fixed = Arity { min: 2, max: Some(3) };
        assert!(fixed.accepts(3));
        assert!(!fixed.accepts(4));
    }

    #[test]
    fn test_default_functions_keyed_lowercase() {
        let functions = default_functions();
        assert!(functions.contains_key("vlookup"));
        assert!(functions.contains_key("add"));
        assert!(!functions.contains_key("SUM"));
    }
}
