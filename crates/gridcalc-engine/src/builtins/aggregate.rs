//! Aggregates over scalars and ranges.
//!
//! Range arguments contribute only their numeric cells; scalar arguments are
//! coerced and fail with `#VALUE!` when they are not numeric.

use super::{Args, Builtin, finite};
use crate::engine::{FormulaError, Result, Value, ensure_number};

pub const FUNCTIONS: &[Builtin] = &[
    Builtin {
        name: "SUM",
        min_args: 1,
        max_args: None,
        description: "Sum of numbers and numeric cells in ranges",
        main: sum,
    },
    Builtin {
        name: "AVERAGE",
        min_args: 1,
        max_args: None,
        description: "Arithmetic mean of numbers and numeric cells in ranges",
        main: average,
    },
    Builtin {
        name: "MAX",
        min_args: 1,
        max_args: None,
        description: "Largest number (0 when there are none)",
        main: max,
    },
    Builtin {
        name: "MIN",
        min_args: 1,
        max_args: None,
        description: "Smallest number (0 when there are none)",
        main: min,
    },
    Builtin {
        name: "PRODUCT",
        min_args: 1,
        max_args: None,
        description: "Product of numbers and numeric cells in ranges",
        main: product,
    },
    Builtin {
        name: "COUNT",
        min_args: 1,
        max_args: None,
        description: "Count of numeric values",
        main: count,
    },
    Builtin {
        name: "COUNTA",
        min_args: 1,
        max_args: None,
        description: "Count of non-blank values",
        main: counta,
    },
];

/// Every number contributed by the arguments.
fn numbers(args: &Args<'_, '_>) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for i in 0..args.len() {
        match args.value(i)? {
            Value::Table(sub) => {
                out.extend(args.cells(&sub.area)?.iter().filter_map(Value::as_number));
            }
            Value::Array(items) => out.extend(items.iter().filter_map(Value::as_number)),
            other => out.push(ensure_number(&other)?),
        }
    }
    Ok(out)
}

fn sum(args: &Args<'_, '_>) -> Result<Value> {
    finite("SUM", numbers(args)?.iter().sum())
}

fn average(args: &Args<'_, '_>) -> Result<Value> {
    let values = numbers(args)?;
    if values.is_empty() {
        return Err(FormulaError::div_zero("AVERAGE of no numbers"));
    }
    finite("AVERAGE", values.iter().sum::<f64>() / values.len() as f64)
}

fn max(args: &Args<'_, '_>) -> Result<Value> {
    let values = numbers(args)?;
    let best = values.iter().copied().reduce(f64::max).unwrap_or(0.0);
    Ok(Value::Number(best))
}

fn min(args: &Args<'_, '_>) -> Result<Value> {
    let values = numbers(args)?;
    let best = values.iter().copied().reduce(f64::min).unwrap_or(0.0);
    Ok(Value::Number(best))
}

fn product(args: &Args<'_, '_>) -> Result<Value> {
    let values = numbers(args)?;
    if values.is_empty() {
        return Ok(Value::Number(0.0));
    }
    finite("PRODUCT", values.iter().product())
}

fn count(args: &Args<'_, '_>) -> Result<Value> {
    let mut n = 0usize;
    for i in 0..args.len() {
        match args.value(i)? {
            Value::Table(sub) => {
                n += args.cells(&sub.area)?.iter().filter(|v| v.as_number().is_some()).count();
            }
            Value::Array(items) => n += items.iter().filter(|v| v.as_number().is_some()).count(),
            other => n += usize::from(!other.is_null() && ensure_number(&other).is_ok()),
        }
    }
    Ok(Value::Number(n as f64))
}

fn counta(args: &Args<'_, '_>) -> Result<Value> {
    let mut n = 0usize;
    for i in 0..args.len() {
        n += args.flatten(i)?.iter().filter(|v| !v.is_blank()).count();
    }
    Ok(Value::Number(n as f64))
}
