//! Arithmetic operators, including date and time-delta arithmetic.

use chrono::{NaiveDateTime, TimeDelta};

use super::{Args, Builtin, finite};
use crate::engine::{FormulaError, Result, Value, ensure_number};

pub const FUNCTIONS: &[Builtin] = &[
    Builtin {
        name: "ADD",
        min_args: 2,
        max_args: Some(2),
        description: "Sum of two values (the + operator); dates add days or deltas",
        main: add,
    },
    Builtin {
        name: "MINUS",
        min_args: 2,
        max_args: Some(2),
        description: "Difference of two values (the - operator); date - date is a delta",
        main: minus,
    },
    Builtin {
        name: "MULTIPLY",
        min_args: 2,
        max_args: Some(2),
        description: "Product of two numbers (the * operator)",
        main: multiply,
    },
    Builtin {
        name: "DIVIDE",
        min_args: 2,
        max_args: Some(2),
        description: "Quotient of two numbers (the / operator)",
        main: divide,
    },
    Builtin {
        name: "POWER",
        min_args: 2,
        max_args: Some(2),
        description: "Base raised to an exponent (the ^ operator)",
        main: power,
    },
    Builtin {
        name: "MOD",
        min_args: 2,
        max_args: Some(2),
        description: "Floored remainder; the result takes the divisor's sign",
        main: modulo,
    },
    Builtin {
        name: "UMINUS",
        min_args: 1,
        max_args: Some(1),
        description: "Negation (unary -)",
        main: uminus,
    },
];

const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn days(n: f64) -> Result<TimeDelta> {
    let millis = n * MILLIS_PER_DAY;
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return Err(FormulaError::num("day offset is out of range"));
    }
    TimeDelta::try_milliseconds(millis as i64)
        .ok_or_else(|| FormulaError::num("day offset is out of range"))
}

fn shift(date: NaiveDateTime, delta: TimeDelta) -> Result<Value> {
    date.checked_add_signed(delta)
        .map(Value::Date)
        .ok_or_else(|| FormulaError::num("date is out of range"))
}

fn add(args: &Args<'_, '_>) -> Result<Value> {
    match (args.scalar(0)?, args.scalar(1)?) {
        (Value::Date(d), Value::Delta(t)) | (Value::Delta(t), Value::Date(d)) => shift(d, t),
        (Value::Date(d), other) | (other, Value::Date(d)) => shift(d, days(ensure_number(&other)?)?),
        (Value::Delta(a), Value::Delta(b)) => a
            .checked_add(&b)
            .map(Value::Delta)
            .ok_or_else(|| FormulaError::num("time delta is out of range")),
        (a, b) => finite("ADD", ensure_number(&a)? + ensure_number(&b)?),
    }
}

fn minus(args: &Args<'_, '_>) -> Result<Value> {
    match (args.scalar(0)?, args.scalar(1)?) {
        (Value::Date(a), Value::Date(b)) => Ok(Value::Delta(a.signed_duration_since(b))),
        (Value::Date(d), Value::Delta(t)) => shift(d, -t),
        (Value::Date(d), other) => shift(d, -days(ensure_number(&other)?)?),
        (Value::Delta(a), Value::Delta(b)) => a
            .checked_sub(&b)
            .map(Value::Delta)
            .ok_or_else(|| FormulaError::num("time delta is out of range")),
        (a, b) => finite("MINUS", ensure_number(&a)? - ensure_number(&b)?),
    }
}

fn multiply(args: &Args<'_, '_>) -> Result<Value> {
    finite("MULTIPLY", args.number(0)? * args.number(1)?)
}

fn divide(args: &Args<'_, '_>) -> Result<Value> {
    let (a, b) = (args.number(0)?, args.number(1)?);
    if b == 0.0 {
        return Err(FormulaError::div_zero("division by zero"));
    }
    finite("DIVIDE", a / b)
}

fn power(args: &Args<'_, '_>) -> Result<Value> {
    finite("POWER", args.number(0)?.powf(args.number(1)?))
}

fn modulo(args: &Args<'_, '_>) -> Result<Value> {
    let (a, b) = (args.number(0)?, args.number(1)?);
    if b == 0.0 {
        return Err(FormulaError::div_zero("modulo by zero"));
    }
    finite("MOD", a - b * (a / b).floor())
}

fn uminus(args: &Args<'_, '_>) -> Result<Value> {
    match args.scalar(0)? {
        Value::Delta(t) => Ok(Value::Delta(-t)),
        other => Ok(Value::Number(-ensure_number(&other)?)),
    }
}
