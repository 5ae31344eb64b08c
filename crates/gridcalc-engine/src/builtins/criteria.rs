//! Conditional aggregates (`COUNTIF`, `SUMIF`).
//!
//! A condition is an optional comparator (`>`, `>=`, `<`, `<=`, `<>`, `=`)
//! followed by a target. A numeric target compares numerically; anything else
//! compares as text, where `*` and `?` are wildcards and `~*` / `~?` match the
//! literal characters.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

use super::{Args, Builtin, finite};
use crate::engine::{FormulaError, Point, Result, Value, ensure_string};

pub const FUNCTIONS: &[Builtin] = &[
    Builtin {
        name: "COUNTIF",
        min_args: 2,
        max_args: Some(2),
        description: "Count cells in a range matching a condition",
        main: countif,
    },
    Builtin {
        name: "SUMIF",
        min_args: 2,
        max_args: Some(3),
        description: "Sum cells (or a parallel sum range) where the condition matches",
        main: sumif,
    },
];

fn condition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^(<=|>=|<>|<|>|=)?(.*)$").expect("condition regex must compile")
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Comparator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Gte => ordering != Ordering::Less,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Lte => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug)]
enum Target {
    Number(f64),
    Text { text: String, pattern: Regex },
}

#[derive(Debug)]
pub(crate) struct Criterion {
    comparator: Comparator,
    target: Target,
}

/// Translate a wildcard pattern into an anchored, case-insensitive regex.
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut out = String::from("(?is)^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '~' if matches!(chars.peek(), Some('*') | Some('?')) => {
                if let Some(literal) = chars.next() {
                    out.push_str(&regex::escape(&literal.to_string()));
                }
            }
            '*' => out.push_str(".*"),
            '?' => out.push_str(".?"),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out).map_err(|e| FormulaError::value(format!("bad condition pattern: {}", e)))
}

impl Criterion {
    pub(crate) fn parse(condition: &Value) -> Result<Criterion> {
        if let Value::Number(n) = condition {
            return Ok(Criterion {
                comparator: Comparator::Eq,
                target: Target::Number(*n),
            });
        }
        let text = ensure_string(condition)?;
        let caps = condition_re()
            .captures(&text)
            .ok_or_else(|| FormulaError::value(format!("bad condition {}", text)))?;
        let comparator = match caps.get(1).map(|m| m.as_str()) {
            Some(">") => Comparator::Gt,
            Some(">=") => Comparator::Gte,
            Some("<") => Comparator::Lt,
            Some("<=") => Comparator::Lte,
            Some("<>") => Comparator::Ne,
            _ => Comparator::Eq,
        };
        let raw = caps.get(2).map_or("", |m| m.as_str());
        let target = match raw.trim().parse::<f64>() {
            Ok(n) if !raw.trim().is_empty() => Target::Number(n),
            _ => Target::Text {
                text: raw.to_lowercase(),
                pattern: wildcard_regex(raw)?,
            },
        };
        Ok(Criterion { comparator, target })
    }

    pub(crate) fn matches(&self, value: &Value) -> bool {
        match &self.target {
            Target::Number(target) => match value {
                Value::Number(n) => self
                    .comparator
                    .holds(n.partial_cmp(target).unwrap_or(Ordering::Less)),
                _ => self.comparator == Comparator::Ne,
            },
            Target::Text { text, pattern } => {
                let Ok(cell) = ensure_string(value) else {
                    return self.comparator == Comparator::Ne;
                };
                match self.comparator {
                    Comparator::Eq => pattern.is_match(&cell),
                    Comparator::Ne => !pattern.is_match(&cell),
                    ordered => {
                        matches!(value, Value::Text(_))
                            && ordered.holds(cell.to_lowercase().cmp(text))
                    }
                }
            }
        }
    }
}

fn countif(args: &Args<'_, '_>) -> Result<Value> {
    let area = args.area(0)?;
    let criterion = Criterion::parse(&args.scalar(1)?)?;
    let n = args
        .cells(&area)?
        .iter()
        .filter(|v| criterion.matches(v))
        .count();
    Ok(Value::Number(n as f64))
}

fn sumif(args: &Args<'_, '_>) -> Result<Value> {
    let area = args.area(0)?;
    let criterion = Criterion::parse(&args.scalar(1)?)?;
    // The sum range takes the shape of the condition range from its top-left.
    let sum_origin = if args.is_omitted(2) {
        area.top_left()
    } else {
        args.area(2)?.top_left()
    };
    let bounds = args.solver().sheet().bounds();

    let mut total = 0.0;
    for point in area.points() {
        if !criterion.matches(&args.solver().solve_point(point)?) {
            continue;
        }
        let target = Point::new(
            sum_origin.y + (point.y - area.top),
            sum_origin.x + (point.x - area.left),
        );
        if !bounds.contains(target) {
            continue;
        }
        if let Value::Number(n) = args.solver().solve_point(target)? {
            total += n;
        }
    }
    finite("SUMIF", total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::eval::tests::{MapSheet, solve};

    fn numbers_sheet() -> MapSheet {
        MapSheet::new(&[
            ("A1", Value::Number(1.0)),
            ("A2", Value::Number(5.0)),
            ("A3", Value::Number(3.0)),
            ("A4", Value::Number(7.0)),
            ("A5", Value::Number(2.0)),
            ("B1", Value::Number(10.0)),
            ("B2", Value::Number(20.0)),
            ("B3", Value::Number(30.0)),
            ("B4", Value::Number(40.0)),
            ("B5", Value::Number(50.0)),
        ])
    }

    #[test]
    fn test_countif_comparator() {
        let sheet = numbers_sheet();
        assert_eq!(solve(&sheet, "=COUNTIF(A1:A5, \">3\")").unwrap(), Value::Number(2.0));
        assert_eq!(solve(&sheet, "=COUNTIF(A1:A5, \"<=2\")").unwrap(), Value::Number(2.0));
        assert_eq!(solve(&sheet, "=COUNTIF(A1:A5, 3)").unwrap(), Value::Number(1.0));
        assert_eq!(solve(&sheet, "=COUNTIF(A1:A5, \"<>3\")").unwrap(), Value::Number(4.0));
    }

    #[test]
    fn test_sumif_with_sum_range() {
        let sheet = numbers_sheet();
        assert_eq!(
            solve(&sheet, "=SUMIF(A1:A5, \">3\", B1:B5)").unwrap(),
            Value::Number(60.0)
        );
        assert_eq!(solve(&sheet, "=SUMIF(A1:A5, \">3\")").unwrap(), Value::Number(12.0));
    }

    #[test]
    fn test_wildcards() {
        let c = Criterion::parse(&Value::from("ap*")).unwrap();
        assert!(c.matches(&Value::from("Apple")));
        assert!(!c.matches(&Value::from("grape")));

        let c = Criterion::parse(&Value::from("a?c")).unwrap();
        assert!(c.matches(&Value::from("abc")));
        assert!(c.matches(&Value::from("ac")));

        let c = Criterion::parse(&Value::from("what~?")).unwrap();
        assert!(c.matches(&Value::from("what?")));
        assert!(!c.matches(&Value::from("whatx")));
    }

    #[test]
    fn test_text_target_is_not_numeric() {
        let c = Criterion::parse(&Value::from("=b")).unwrap();
        assert!(c.matches(&Value::from("B")));
        assert!(!c.matches(&Value::Number(1.0)));
        let blank = Criterion::parse(&Value::from("")).unwrap();
        assert!(blank.matches(&Value::Null));
    }
}
