//! `VLOOKUP` / `HLOOKUP`.

use std::cmp::Ordering;
use std::mem::discriminant;

use super::{Args, Builtin, compare_values};
use crate::engine::{FormulaError, Point, Result, Value};

pub const FUNCTIONS: &[Builtin] = &[
    Builtin {
        name: "VLOOKUP",
        min_args: 3,
        max_args: Some(4),
        description: "Find a key in the first column and return a value from the same row",
        main: vlookup,
    },
    Builtin {
        name: "HLOOKUP",
        min_args: 3,
        max_args: Some(4),
        description: "Find a key in the first row and return a value from the same column",
        main: hlookup,
    },
];

fn vlookup(args: &Args<'_, '_>) -> Result<Value> {
    lookup(args, true)
}

fn hlookup(args: &Args<'_, '_>) -> Result<Value> {
    lookup(args, false)
}

/// Shared scan. `vertical` searches down the first column and indexes
/// across; otherwise searches along the first row and indexes down.
///
/// Exact mode (`is_sorted = FALSE`) returns the first equal key. Approximate
/// mode assumes ascending keys and returns the last key `<=` the search key.
fn lookup(args: &Args<'_, '_>, vertical: bool) -> Result<Value> {
    let key = args.scalar(0)?;
    let area = args.area(1)?;
    let index = args.number(2)?.trunc();
    let is_sorted = args.boolean_or(3, true)?;

    let span = if vertical { area.width() } else { area.height() };
    if index < 1.0 {
        return Err(FormulaError::value(format!("lookup index {} is below 1", index)));
    }
    if index > span as f64 {
        return Err(FormulaError::reference(format!(
            "lookup index {} is outside the range",
            index
        )));
    }
    let offset = index as usize - 1;

    let solver = args.solver();
    let length = if vertical { area.height() } else { area.width() };
    let key_at = |i: usize| {
        if vertical {
            Point::new(area.top + i, area.left)
        } else {
            Point::new(area.top, area.left + i)
        }
    };

    let mut found = None;
    for i in 0..length {
        let candidate = solver.solve_point(key_at(i))?;
        if candidate.is_null() || discriminant(&candidate) != discriminant(&key) {
            continue;
        }
        let ordering = compare_values(&candidate, &key);
        if is_sorted {
            match ordering {
                Ordering::Greater => break,
                _ => found = Some(i),
            }
        } else if ordering == Ordering::Equal {
            found = Some(i);
            break;
        }
    }

    let Some(i) = found else {
        return Err(FormulaError::not_available(format!("{:?} was not found", key)));
    };
    let hit = key_at(i);
    let target = if vertical {
        Point::new(hit.y, hit.x + offset)
    } else {
        Point::new(hit.y + offset, hit.x)
    };
    solver.solve_point(target)
}

#[cfg(test)]
mod tests {
    use crate::engine::eval::tests::{MapSheet, solve};
    use crate::engine::{ErrorKind, Value};

    fn table() -> MapSheet {
        MapSheet::new(&[
            ("A1", Value::Number(1.0)),
            ("B1", Value::from("a")),
            ("A2", Value::Number(2.0)),
            ("B2", Value::from("b")),
            ("A3", Value::Number(3.0)),
            ("B3", Value::from("c")),
        ])
    }

    #[test]
    fn test_vlookup_exact() {
        let sheet = table();
        assert_eq!(
            solve(&sheet, "=VLOOKUP(2, A1:B3, 2, FALSE)").unwrap(),
            Value::from("b")
        );
        assert_eq!(
            solve(&sheet, "=VLOOKUP(5, A1:B3, 2, FALSE)").unwrap_err().kind,
            ErrorKind::NotAvailable
        );
    }

    #[test]
    fn test_vlookup_approximate() {
        let sheet = table();
        assert_eq!(solve(&sheet, "=VLOOKUP(2.5, A1:B3, 2)").unwrap(), Value::from("b"));
        assert_eq!(solve(&sheet, "=VLOOKUP(9, A1:B3, 2, TRUE)").unwrap(), Value::from("c"));
        assert_eq!(
            solve(&sheet, "=VLOOKUP(0, A1:B3, 2)").unwrap_err().kind,
            ErrorKind::NotAvailable
        );
    }

    #[test]
    fn test_lookup_index_bounds() {
        let sheet = table();
        assert_eq!(
            solve(&sheet, "=VLOOKUP(2, A1:B3, 0)").unwrap_err().kind,
            ErrorKind::Value
        );
        assert_eq!(
            solve(&sheet, "=VLOOKUP(2, A1:B3, 3)").unwrap_err().kind,
            ErrorKind::Ref
        );
    }

    #[test]
    fn test_hlookup() {
        let sheet = MapSheet::new(&[
            ("A1", Value::from("x")),
            ("B1", Value::from("y")),
            ("A2", Value::Number(10.0)),
            ("B2", Value::Number(20.0)),
        ]);
        assert_eq!(
            solve(&sheet, "=HLOOKUP(\"Y\", A1:B2, 2, FALSE)").unwrap(),
            Value::Number(20.0)
        );
    }
}
