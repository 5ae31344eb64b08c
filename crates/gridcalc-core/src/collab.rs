//! Pluggable input parsing and display.
//!
//! A cell names its parser and renderer by key; the table looks the key up in
//! its registries ([`crate::Table::set_parser`], [`crate::Table::set_renderer`])
//! and falls back to [`DefaultParser`] / [`DefaultRenderer`].

use chrono::{NaiveDate, NaiveDateTime};
use gridcalc_engine::engine::{Point, Value, format_value};
use regex::Regex;
use std::sync::OnceLock;

use crate::cell::Cell;
use crate::table::Table;

/// Turns typed text into the cell fields to write.
pub trait CellParser: Send + Sync {
    /// Only the fields set on the result are written.
    fn parse(&self, text: &str, current: &Cell) -> Cell;
}

/// Turns a stored cell into text.
pub trait Renderer: Send + Sync {
    /// What the cell shows.
    fn render(&self, table: &Table, point: Point) -> String;
    /// What an editor should start from.
    fn stringify(&self, table: &Table, point: Point) -> String;
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("number regex must compile")
    })
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

fn parse_date(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Infers numbers, booleans and dates. Formulas and `'`-quoted text are
/// stored verbatim; empty text clears the value.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultParser;

impl DefaultParser {
    pub fn parse_value(text: &str) -> Value {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if text.starts_with('=') || text.starts_with('\'') {
            return Value::Text(text.to_string());
        }
        if number_re().is_match(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                return Value::Number(n);
            }
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Some(date) = parse_date(trimmed) {
            return Value::Date(date);
        }
        Value::Text(text.to_string())
    }
}

impl CellParser for DefaultParser {
    fn parse(&self, text: &str, _current: &Cell) -> Cell {
        Cell {
            value: Some(Self::parse_value(text)),
            ..Cell::default()
        }
    }
}

/// Shows solved values, or the error code when solving fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRenderer;

impl Renderer for DefaultRenderer {
    fn render(&self, table: &Table, point: Point) -> String {
        match table.solve_point(point) {
            Ok(value) => format_value(&value),
            Err(e) => e.code().to_string(),
        }
    }

    fn stringify(&self, table: &Table, point: Point) -> String {
        let value = table
            .get_by_point(point, false)
            .map(|cell| cell.value())
            .unwrap_or_default();
        match &value {
            Value::Text(text) if text.starts_with('=') => table.stringify_to_ref(text),
            other => format_value(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::table::Operator;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_default_parser_inference() {
        assert_eq!(DefaultParser::parse_value("42"), Value::Number(42.0));
        assert_eq!(DefaultParser::parse_value(" -1.5e3 "), Value::Number(-1500.0));
        assert_eq!(DefaultParser::parse_value(".5"), Value::Number(0.5));
        assert_eq!(DefaultParser::parse_value("TRUE"), Value::Bool(true));
        assert_eq!(DefaultParser::parse_value(""), Value::Null);
        assert_eq!(DefaultParser::parse_value("=1+2"), Value::from("=1+2"));
        assert_eq!(DefaultParser::parse_value("'42"), Value::from("'42"));
        assert_eq!(DefaultParser::parse_value("1e"), Value::from("1e"));
        assert!(matches!(DefaultParser::parse_value("2024-03-01"), Value::Date(_)));
        assert!(matches!(
            DefaultParser::parse_value("2024/03/01 12:30:00"),
            Value::Date(_)
        ));
    }

    struct Upper;

    impl CellParser for Upper {
        fn parse(&self, text: &str, _current: &Cell) -> Cell {
            Cell::with_value(text.to_uppercase())
        }
    }

    struct Stars;

    impl Renderer for Stars {
        fn render(&self, table: &Table, point: Point) -> String {
            let n = table
                .solve_point(point)
                .ok()
                .and_then(|v| v.as_number())
                .unwrap_or(0.0);
            "*".repeat(n as usize)
        }

        fn stringify(&self, _table: &Table, _point: Point) -> String {
            String::new()
        }
    }

    #[test]
    fn test_registered_parser_and_renderer() {
        let initial = HashMap::from([(
            "A1".to_string(),
            Cell {
                parser: Some("upper".to_string()),
                renderer: Some("stars".to_string()),
                ..Cell::default()
            },
        )]);
        let config = TableConfig {
            num_rows: 2,
            num_cols: 2,
            ..TableConfig::default()
        };
        let table = Table::new(config, initial).unwrap();
        table.set_parser("upper", Arc::new(Upper));
        table.set_renderer("stars", Arc::new(Stars));

        let table = table.write(Point::new(1, 1), "abc", Operator::User).unwrap();
        assert_eq!(table.get_by_point(Point::new(1, 1), false).unwrap().value(), Value::from("ABC"));

        let table = table.write(Point::new(2, 1), "3", Operator::User).unwrap();
        let table = table
            .update(
                std::collections::BTreeMap::from([(
                    Point::new(2, 1),
                    Cell {
                        renderer: Some("stars".to_string()),
                        ..Cell::default()
                    },
                )]),
                true,
                Operator::User,
            )
            .unwrap();
        assert_eq!(table.render(Point::new(2, 1)), "***");
    }

    #[test]
    fn test_default_renderer_literal_and_dates() {
        let initial = HashMap::from([
            ("A1".to_string(), Cell::with_value("'=not a formula")),
            ("A2".to_string(), Cell::with_value(DefaultParser::parse_value("2024-03-01"))),
        ]);
        let config = TableConfig {
            num_rows: 2,
            num_cols: 1,
            ..TableConfig::default()
        };
        let table = Table::new(config, initial).unwrap();
        assert_eq!(table.render(Point::new(1, 1)), "=not a formula");
        assert_eq!(table.stringify(Point::new(1, 1)), "'=not a formula");
        assert_eq!(table.render(Point::new(2, 1)), "2024-03-01");
    }
}
