//! Formula reference rewriting.
//!
//! - **Absolutizing**: `A1` → `#<id>` so structural edits elsewhere in the
//!   table do not change what a stored formula points at.
//! - **Stringifying**: `#<id>` → the id's current address, for display.
//! - **Sliding**: offset every reference by a row/column delta, used when
//!   copied formulas must keep their relative references.
//!
//! All three work on the token stream so whitespace, strings and the rest of
//! the formula come back out unchanged. `$` anchors survive every rewrite.

use super::address::{AddressParts, parse_address};
use super::eval::Sheet;
use super::id::IdRef;
use super::lexer::{Lexer, Token, TokenKind, stringify_tokens};

const DELETED: &str = "#REF!";

/// Rewrite the tokens of a formula (text starting with `=`). Non-formulas
/// are returned unchanged.
fn rewrite(formula: &str, mut f: impl FnMut(&Token) -> Option<String>) -> String {
    let Some(body) = formula.strip_prefix('=') else {
        return formula.to_string();
    };
    let mut tokens = Lexer::new(body).tokenize();
    for token in tokens.iter_mut() {
        if let Some(text) = f(token) {
            token.text = text;
        }
    }
    format!("={}", stringify_tokens(&tokens))
}

fn full_address(text: &str) -> Option<AddressParts> {
    parse_address(text).filter(|p| p.has_row() && p.has_col())
}

fn id_for(parts: &AddressParts, sheet: &dyn Sheet) -> Option<String> {
    if !sheet.bounds().contains(parts.point) {
        return None;
    }
    let id = sheet.id_at(parts.point)?;
    Some(
        IdRef::new(id)
            .anchored(parts.abs_col, parts.abs_row)
            .to_string(),
    )
}

/// Rewrite address references as id references. Axis-only ranges (`A:A`)
/// and references outside the table are left as written.
pub fn absolutize(formula: &str, sheet: &dyn Sheet) -> String {
    rewrite(formula, |token| match token.kind {
        TokenKind::Ref => id_for(&full_address(&token.text)?, sheet),
        TokenKind::Range => {
            let (start, end) = token.text.split_once(':')?;
            let start = id_for(&full_address(start)?, sheet)?;
            let end = id_for(&full_address(end)?, sheet)?;
            Some(format!("{}:{}", start, end))
        }
        _ => None,
    })
}

fn address_for(text: &str, sheet: &dyn Sheet) -> Option<String> {
    let id = IdRef::parse(text)?;
    if let Some(name) = &id.sheet {
        if sheet.sheet_id().as_deref() != Some(name.as_str()) {
            return None;
        }
    }
    let point = sheet.point_of(&id.id)?;
    Some(
        AddressParts {
            point,
            abs_col: id.abs_col,
            abs_row: id.abs_row,
        }
        .to_string(),
    )
}

/// Rewrite id references as the addresses they currently occupy. Ids that
/// no longer exist become `#REF!`.
pub fn stringify_to_ref(formula: &str, sheet: &dyn Sheet) -> String {
    rewrite(formula, |token| match token.kind {
        TokenKind::Id => Some(address_for(&token.text, sheet).unwrap_or_else(|| DELETED.into())),
        TokenKind::IdRange => {
            let converted = token.text.split_once(':').and_then(|(start, end)| {
                Some(format!(
                    "{}:{}",
                    address_for(start, sheet)?,
                    address_for(end, sheet)?
                ))
            });
            Some(converted.unwrap_or_else(|| DELETED.into()))
        }
        _ => None,
    })
}

fn shift_axis(value: usize, delta: isize, limit: usize) -> Option<usize> {
    let shifted = value.checked_add_signed(delta)?;
    (1..=limit).contains(&shifted).then_some(shifted)
}

fn slide_parts(parts: AddressParts, dy: isize, dx: isize, sheet: &dyn Sheet) -> Option<AddressParts> {
    let bounds = sheet.bounds();
    let mut moved = parts;
    if parts.has_row() && !parts.abs_row {
        moved.point.y = shift_axis(parts.point.y, dy, bounds.bottom)?;
    }
    if parts.has_col() && !parts.abs_col {
        moved.point.x = shift_axis(parts.point.x, dx, bounds.right)?;
    }
    Some(moved)
}

fn slide_address(text: &str, dy: isize, dx: isize, sheet: &dyn Sheet) -> Option<String> {
    Some(slide_parts(parse_address(text)?, dy, dx, sheet)?.to_string())
}

fn slide_id(text: &str, dy: isize, dx: isize, sheet: &dyn Sheet) -> Option<String> {
    let id = IdRef::parse(text)?;
    let point = sheet.point_of(&id.id)?;
    let parts = AddressParts {
        point,
        abs_col: id.abs_col,
        abs_row: id.abs_row,
    };
    let moved = slide_parts(parts, dy, dx, sheet)?;
    let new_id = sheet.id_at(moved.point)?;
    Some(
        IdRef {
            id: new_id,
            ..id
        }
        .to_string(),
    )
}

/// Offset every reference by `(dy, dx)`, leaving `$`-anchored axes alone.
/// References pushed off the table become `#REF!`.
pub fn slide_formula(formula: &str, dy: isize, dx: isize, sheet: &dyn Sheet) -> String {
    rewrite(formula, |token| {
        let slid = match token.kind {
            TokenKind::Ref => slide_address(&token.text, dy, dx, sheet),
            TokenKind::Id => slide_id(&token.text, dy, dx, sheet),
            TokenKind::Range => token.text.split_once(':').and_then(|(start, end)| {
                Some(format!(
                    "{}:{}",
                    slide_address(start, dy, dx, sheet)?,
                    slide_address(end, dy, dx, sheet)?
                ))
            }),
            TokenKind::IdRange => token.text.split_once(':').and_then(|(start, end)| {
                Some(format!(
                    "{}:{}",
                    slide_id(start, dy, dx, sheet)?,
                    slide_id(end, dy, dx, sheet)?
                ))
            }),
            _ => return None,
        };
        Some(slid.unwrap_or_else(|| DELETED.into()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::eval::tests::MapSheet;

    // MapSheet ids are lower-cased addresses, so `#b2` sits at B2.

    #[test]
    fn test_absolutize_keeps_anchors_and_spacing() {
        let sheet = MapSheet::new(&[]);
        assert_eq!(
            absolutize("=SUM( A1:$B$2 ) + C3*\"A1\"", &sheet),
            "=SUM( #a1:#$b2$ ) + #c3*\"A1\""
        );
        assert_eq!(absolutize("=SUM(A:A)", &sheet), "=SUM(A:A)");
        assert_eq!(absolutize("plain A1", &sheet), "plain A1");
    }

    #[test]
    fn test_stringify_to_ref() {
        let sheet = MapSheet::new(&[]);
        assert_eq!(stringify_to_ref("=#a1+#$b2$", &sheet), "=A1+$B$2");
        assert_eq!(stringify_to_ref("=SUM(#a1:#c3)", &sheet), "=SUM(A1:C3)");
        assert_eq!(stringify_to_ref("=#zz99+1", &sheet), "=#REF!+1");
    }

    #[test]
    fn test_slide_respects_anchors() {
        let sheet = MapSheet::new(&[]);
        assert_eq!(slide_formula("=A1+$A1+A$1+$A$1", 1, 2, &sheet), "=C2+$A2+C$1+$A$1");
        assert_eq!(slide_formula("=SUM(A1:B2)", 2, 0, &sheet), "=SUM(A3:B4)");
        assert_eq!(slide_formula("=#a1+#$a1$", 1, 1, &sheet), "=#b2+#$a1$");
    }

    #[test]
    fn test_slide_off_table_is_ref_error() {
        let sheet = MapSheet::new(&[]);
        assert_eq!(slide_formula("=A1", -1, 0, &sheet), "=#REF!");
        assert_eq!(slide_formula("=J10+1", 0, 1, &sheet), "=#REF!+1");
    }
}
