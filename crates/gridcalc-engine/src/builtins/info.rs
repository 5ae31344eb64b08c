use chrono::Local;

use super::{Args, Builtin};
use crate::engine::{Area, FormulaError, Result, Value};

pub const FUNCTIONS: &[Builtin] = &[
    Builtin {
        name: "ROW",
        min_args: 0,
        max_args: Some(1),
        description: "Row number of a reference (default: the formula's own cell)",
        main: row,
    },
    Builtin {
        name: "COL",
        min_args: 0,
        max_args: Some(1),
        description: "Column number of a reference (default: the formula's own cell)",
        main: col,
    },
    Builtin {
        name: "COLUMN",
        min_args: 0,
        max_args: Some(1),
        description: "Alias of COL",
        main: col,
    },
    Builtin {
        name: "NOW",
        min_args: 0,
        max_args: Some(0),
        description: "Current local date and time",
        main: now,
    },
];

fn target(args: &Args<'_, '_>) -> Result<Area> {
    if !args.is_omitted(0) {
        return args.area(0);
    }
    args.solver()
        .origin()
        .map(Area::point)
        .ok_or_else(|| FormulaError::value("no reference and no current cell"))
}

fn row(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Number(target(args)?.top as f64))
}

fn col(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Number(target(args)?.left as f64))
}

fn now(_args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Date(Local::now().naive_local()))
}

#[cfg(test)]
mod tests {
    use crate::engine::address::address_to_point;
    use crate::engine::eval::tests::{MapSheet, solve};
    use crate::engine::{ErrorKind, Solver, Value};
    use crate::builtins::default_functions;
    use dashmap::DashMap;

    #[test]
    fn test_row_col_of_reference() {
        let sheet = MapSheet::new(&[]);
        assert_eq!(solve(&sheet, "=ROW(C4:D9)").unwrap(), Value::Number(4.0));
        assert_eq!(solve(&sheet, "=COL(C4)").unwrap(), Value::Number(3.0));
        assert_eq!(solve(&sheet, "=COLUMN(E2)").unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_row_defaults_to_own_cell() {
        let sheet = MapSheet::new(&[("B7", Value::from("=ROW()*100+COL()"))]);
        let functions = default_functions();
        let cache = DashMap::new();
        let solver = Solver::new(&sheet, &functions, &cache);
        let point = address_to_point("B7").unwrap();
        assert_eq!(solver.solve_point(point).unwrap(), Value::Number(702.0));
        assert_eq!(solve(&sheet, "=ROW()").unwrap_err().kind, ErrorKind::Value);
    }

    #[test]
    fn test_now_is_a_date() {
        assert!(matches!(solve(&MapSheet::new(&[]), "=NOW()"), Ok(Value::Date(_))));
    }
}
