//! Stable cell identities.
//!
//! Every cell gets an id from a base-36 counter when it is created. Formulas
//! refer to cells through `#<id>` literals so that inserting or deleting rows
//! elsewhere does not change what they point at.
//!
//! Literal form: `[#<sheet>!]#[$]<id>[$]`. A leading `$` anchors the column
//! and a trailing `$` anchors the row; anchored axes do not slide when the
//! formula is copied.

use std::fmt;

pub type Id = String;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

pub fn from_base36(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    u64::from_str_radix(text, 36).ok()
}

/// A parsed `#id` literal.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct IdRef {
    pub sheet: Option<String>,
    pub id: Id,
    pub abs_col: bool,
    pub abs_row: bool,
}

impl IdRef {
    pub fn new(id: impl Into<Id>) -> IdRef {
        IdRef {
            sheet: None,
            id: id.into(),
            abs_col: false,
            abs_row: false,
        }
    }

    pub fn anchored(mut self, abs_col: bool, abs_row: bool) -> IdRef {
        self.abs_col = abs_col;
        self.abs_row = abs_row;
        self
    }

    pub fn parse(text: &str) -> Option<IdRef> {
        let (sheet, rest) = match text.split_once('!') {
            Some((prefix, rest)) => (Some(prefix.strip_prefix('#')?.to_string()), rest),
            None => (None, text),
        };
        let body = rest.strip_prefix('#')?;
        let (abs_col, body) = match body.strip_prefix('$') {
            Some(body) => (true, body),
            None => (false, body),
        };
        let (abs_row, body) = match body.strip_suffix('$') {
            Some(body) => (true, body),
            None => (false, body),
        };
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        Some(IdRef {
            sheet,
            id: body.to_ascii_lowercase(),
            abs_col,
            abs_row,
        })
    }
}

impl fmt::Display for IdRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "#{}!", sheet)?;
        }
        f.write_str("#")?;
        if self.abs_col {
            f.write_str("$")?;
        }
        f.write_str(&self.id)?;
        if self.abs_row {
            f.write_str("$")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base36_counter() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(from_base36("10"), Some(36));
        assert_eq!(from_base36(""), None);
    }

    #[test]
    fn test_id_ref_anchors() {
        let id = IdRef::parse("#$1a$").unwrap();
        assert_eq!(id.id, "1a");
        assert!(id.abs_col && id.abs_row);
        assert_eq!(id.to_string(), "#$1a$");

        let id = IdRef::parse("#k$").unwrap();
        assert!(!id.abs_col && id.abs_row);
    }

    #[test]
    fn test_id_ref_sheet_prefix() {
        let id = IdRef::parse("#2!#x").unwrap();
        assert_eq!(id.sheet.as_deref(), Some("2"));
        assert_eq!(id.to_string(), "#2!#x");
    }

    #[test]
    fn test_id_ref_rejects_non_ids() {
        assert!(IdRef::parse("#").is_none());
        assert!(IdRef::parse("#REF!").is_none());
        assert!(IdRef::parse("A1").is_none());
    }
}
