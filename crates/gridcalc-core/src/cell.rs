use chrono::{DateTime, Utc};
use gridcalc_engine::engine::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::prevention::Prevention;

/// Opaque style properties, passed through to the renderer.
pub type Style = BTreeMap<String, String>;

/// One grid entry: a value plus display and permission metadata.
///
/// Every field is optional so a `Cell` can also describe a partial update.
/// `width` is only meaningful on the column header row (y = 0) and `height`
/// on the row header column (x = 0).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: Option<Value>,
    pub style: Option<Style>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub labeler: Option<String>,
    pub renderer: Option<String>,
    pub parser: Option<String>,
    pub prevention: Option<Prevention>,
    pub changed_at: Option<DateTime<Utc>>,
}

impl Cell {
    pub fn with_value(value: impl Into<Value>) -> Cell {
        Cell {
            value: Some(value.into()),
            ..Cell::default()
        }
    }

    pub fn with_prevention(mut self, prevention: Prevention) -> Cell {
        self.prevention = Some(prevention);
        self
    }

    /// The raw value, null when unset.
    pub fn value(&self) -> Value {
        self.value.clone().unwrap_or_default()
    }

    /// Layer `other` over this cell as configured defaults are layered at
    /// construction: set fields win, style keys are merged, and prevention
    /// bits accumulate.
    pub fn merge(&mut self, other: &Cell) {
        if other.value.is_some() {
            self.value = other.value.clone();
        }
        if let Some(style) = &other.style {
            self.style
                .get_or_insert_with(Style::new)
                .extend(style.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        self.width = other.width.or(self.width);
        self.height = other.height.or(self.height);
        if other.labeler.is_some() {
            self.labeler = other.labeler.clone();
        }
        if other.renderer.is_some() {
            self.renderer = other.renderer.clone();
        }
        if other.parser.is_some() {
            self.parser = other.parser.clone();
        }
        if let Some(bits) = other.prevention {
            self.prevention = Some(self.prevention.unwrap_or_default() | bits);
        }
        self.changed_at = other.changed_at.or(self.changed_at);
    }

    /// Apply a partial update: every set field of `other` replaces ours.
    pub fn patch(&mut self, other: &Cell) {
        if other.value.is_some() {
            self.value = other.value.clone();
        }
        if other.style.is_some() {
            self.style = other.style.clone();
        }
        if other.width.is_some() {
            self.width = other.width;
        }
        if other.height.is_some() {
            self.height = other.height;
        }
        if other.labeler.is_some() {
            self.labeler = other.labeler.clone();
        }
        if other.renderer.is_some() {
            self.renderer = other.renderer.clone();
        }
        if other.parser.is_some() {
            self.parser = other.parser.clone();
        }
        if other.prevention.is_some() {
            self.prevention = other.prevention;
        }
    }

    /// The fields a newly inserted row or column inherits from its neighbour.
    pub fn layout(&self) -> Cell {
        Cell {
            style: self.style.clone(),
            width: self.width,
            height: self.height,
            labeler: self.labeler.clone(),
            renderer: self.renderer.clone(),
            parser: self.parser.clone(),
            ..Cell::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_accumulates_prevention_and_style() {
        let mut cell = Cell {
            style: Some(Style::from([("color".to_string(), "red".to_string())])),
            prevention: Some(Prevention::WRITE),
            ..Cell::default()
        };
        cell.merge(&Cell {
            value: Some(Value::Number(1.0)),
            style: Some(Style::from([("weight".to_string(), "bold".to_string())])),
            prevention: Some(Prevention::DELETE_ROW),
            ..Cell::default()
        });
        assert_eq!(cell.value, Some(Value::Number(1.0)));
        assert_eq!(cell.style.as_ref().map(|s| s.len()), Some(2));
        assert_eq!(
            cell.prevention,
            Some(Prevention::WRITE | Prevention::DELETE_ROW)
        );
    }

    #[test]
    fn test_patch_replaces_only_set_fields() {
        let mut cell = Cell::with_value(1.0).with_prevention(Prevention::STYLE);
        cell.patch(&Cell {
            renderer: Some("money".to_string()),
            ..Cell::default()
        });
        assert_eq!(cell.value, Some(Value::Number(1.0)));
        assert_eq!(cell.renderer.as_deref(), Some("money"));
        assert_eq!(cell.prevention, Some(Prevention::STYLE));
    }

    #[test]
    fn test_layout_drops_value_and_prevention() {
        let cell = Cell {
            value: Some(Value::from("x")),
            width: Some(80),
            prevention: Some(Prevention::READ_ONLY),
            ..Cell::default()
        };
        let layout = cell.layout();
        assert_eq!(layout.value, None);
        assert_eq!(layout.width, Some(80));
        assert_eq!(layout.prevention, None);
    }
}
