//! Conditionals and boolean logic. `IF` and `IFERROR` evaluate only the
//! argument they return.

use super::{Args, Builtin};
use crate::engine::{FormulaError, Result, Value, ensure_boolean};

pub const FUNCTIONS: &[Builtin] = &[
    Builtin {
        name: "IF",
        min_args: 2,
        max_args: Some(3),
        description: "Choose between two values on a condition",
        main: if_,
    },
    Builtin {
        name: "IFERROR",
        min_args: 1,
        max_args: Some(2),
        description: "The first argument, or the second if the first is an error",
        main: iferror,
    },
    Builtin {
        name: "AND",
        min_args: 1,
        max_args: None,
        description: "TRUE when every argument is true",
        main: and,
    },
    Builtin {
        name: "OR",
        min_args: 1,
        max_args: None,
        description: "TRUE when any argument is true",
        main: or,
    },
    Builtin {
        name: "NOT",
        min_args: 1,
        max_args: Some(1),
        description: "Logical negation",
        main: not,
    },
];

fn if_(args: &Args<'_, '_>) -> Result<Value> {
    if args.boolean(0)? {
        args.value(1)
    } else if args.len() > 2 {
        args.value(2)
    } else {
        Ok(Value::Bool(false))
    }
}

fn iferror(args: &Args<'_, '_>) -> Result<Value> {
    let first = args
        .value(0)
        .and_then(|value| args.solver().collapse(value));
    match first {
        Ok(value) => Ok(value),
        Err(e) => {
            log::trace!("IFERROR recovered from {}", e.code());
            args.value(1)
        }
    }
}

/// Booleans contributed by every argument. Range cells that are not
/// booleans or numbers are ignored.
fn booleans(args: &Args<'_, '_>) -> Result<Vec<bool>> {
    let mut out = Vec::new();
    for i in 0..args.len() {
        match args.value(i)? {
            Value::Table(sub) => {
                for cell in args.cells(&sub.area)? {
                    if matches!(cell, Value::Bool(_) | Value::Number(_)) {
                        out.push(ensure_boolean(&cell)?);
                    }
                }
            }
            other => out.push(ensure_boolean(&other)?),
        }
    }
    if out.is_empty() {
        return Err(FormulaError::value("no logical values"));
    }
    Ok(out)
}

fn and(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(booleans(args)?.iter().all(|b| *b)))
}

fn or(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(booleans(args)?.iter().any(|b| *b)))
}

fn not(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(!args.boolean(0)?))
}

#[cfg(test)]
mod tests {
    use crate::engine::eval::tests::{MapSheet, solve};
    use crate::engine::{ErrorKind, Value};

    fn sheet() -> MapSheet {
        MapSheet::new(&[
            ("A1", Value::Number(0.0)),
            ("A2", Value::from("=1/A1")),
            ("B1", Value::Bool(true)),
            ("B2", Value::Number(1.0)),
        ])
    }

    #[test]
    fn test_iferror_recovers() {
        let sheet = sheet();
        assert_eq!(solve(&sheet, "=IFERROR(A2, \"div\")").unwrap(), Value::from("div"));
        assert_eq!(solve(&sheet, "=IFERROR(#REF!, 1)").unwrap(), Value::Number(1.0));
        assert_eq!(solve(&sheet, "=IFERROR(nope, 2)").unwrap(), Value::Number(2.0));
        assert_eq!(solve(&sheet, "=IFERROR(1/0)").unwrap(), Value::Null);
        assert_eq!(solve(&sheet, "=IFERROR(B2, 0)").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_if_is_lazy() {
        let sheet = sheet();
        assert_eq!(solve(&sheet, "=IF(TRUE, 1, 1/0)").unwrap(), Value::Number(1.0));
        assert_eq!(solve(&sheet, "=IF(A1, #REF!, \"no\")").unwrap(), Value::from("no"));
        assert_eq!(solve(&sheet, "=IF(FALSE, 1)").unwrap(), Value::Bool(false));
        assert_eq!(solve(&sheet, "=IF(1/0, 1, 2)").unwrap_err().kind, ErrorKind::DivZero);
    }

    #[test]
    fn test_and_or_not() {
        let sheet = sheet();
        assert_eq!(solve(&sheet, "=AND(B1:B2, TRUE)").unwrap(), Value::Bool(true));
        assert_eq!(solve(&sheet, "=AND(B1, A1)").unwrap(), Value::Bool(false));
        assert_eq!(solve(&sheet, "=OR(A1, FALSE)").unwrap(), Value::Bool(false));
        assert_eq!(solve(&sheet, "=NOT(A1)").unwrap(), Value::Bool(true));
        assert_eq!(solve(&sheet, "=AND(C1:C3)").unwrap_err().kind, ErrorKind::Value);
    }
}
