//! Comparison operators.
//!
//! Values of different kinds order as numbers < dates < deltas < text <
//! booleans. Text compares case-insensitively. A blank on one side takes the
//! other side's kind (0, "" or FALSE).

use std::cmp::Ordering;

use super::{Args, Builtin};
use crate::engine::{Result, Value};

pub const FUNCTIONS: &[Builtin] = &[
    Builtin {
        name: "EQ",
        min_args: 2,
        max_args: Some(2),
        description: "Equality (the = operator)",
        main: eq,
    },
    Builtin {
        name: "NE",
        min_args: 2,
        max_args: Some(2),
        description: "Inequality (the <> operator)",
        main: ne,
    },
    Builtin {
        name: "GT",
        min_args: 2,
        max_args: Some(2),
        description: "Greater than (the > operator)",
        main: gt,
    },
    Builtin {
        name: "GTE",
        min_args: 2,
        max_args: Some(2),
        description: "Greater than or equal (the >= operator)",
        main: gte,
    },
    Builtin {
        name: "LT",
        min_args: 2,
        max_args: Some(2),
        description: "Less than (the < operator)",
        main: lt,
    },
    Builtin {
        name: "LTE",
        min_args: 2,
        max_args: Some(2),
        description: "Less than or equal (the <= operator)",
        main: lte,
    },
];

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null | Value::Number(_) => 0,
        Value::Date(_) => 1,
        Value::Delta(_) => 2,
        Value::Text(_) => 3,
        Value::Bool(_) => 4,
        Value::Array(_) | Value::Table(_) => 5,
    }
}

fn blank_like(other: &Value) -> Value {
    match other {
        Value::Text(_) => Value::Text(String::new()),
        Value::Bool(_) => Value::Bool(false),
        _ => Value::Number(0.0),
    }
}

/// Total order over scalar values used by the comparison operators and lookups.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, other) => compare_values(&blank_like(other), other),
        (other, Value::Null) => compare_values(other, &blank_like(other)),
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Delta(x), Value::Delta(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => rank(x).cmp(&rank(y)),
    }
}

fn ordering(args: &Args<'_, '_>) -> Result<Ordering> {
    Ok(compare_values(&args.scalar(0)?, &args.scalar(1)?))
}

fn eq(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(ordering(args)? == Ordering::Equal))
}

fn ne(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(ordering(args)? != Ordering::Equal))
}

fn gt(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(ordering(args)? == Ordering::Greater))
}

fn gte(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(ordering(args)? != Ordering::Less))
}

fn lt(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(ordering(args)? == Ordering::Less))
}

fn lte(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(ordering(args)? != Ordering::Greater))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::eval::tests::{MapSheet, solve};

    #[test]
    fn test_mixed_kinds_order() {
        assert_eq!(
            compare_values(&Value::Number(100.0), &Value::from("a")),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::from("z"), &Value::Bool(false)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::from("ABC"), &Value::from("abc")),
            Ordering::Equal
        );
        assert_eq!(compare_values(&Value::Null, &Value::Number(0.0)), Ordering::Equal);
        assert_eq!(compare_values(&Value::Null, &Value::from("")), Ordering::Equal);
    }

    #[test]
    fn test_comparison_operators() {
        let sheet = MapSheet::new(&[("A1", Value::Number(3.0))]);
        assert_eq!(solve(&sheet, "=A1>2").unwrap(), Value::Bool(true));
        assert_eq!(solve(&sheet, "=A1<>3").unwrap(), Value::Bool(false));
        assert_eq!(solve(&sheet, "=B1=0").unwrap(), Value::Bool(true));
        assert_eq!(solve(&sheet, "=1+1=2").unwrap(), Value::Bool(true));
        assert_eq!(solve(&sheet, "=\"b\">=\"A\"").unwrap(), Value::Bool(true));
    }
}
