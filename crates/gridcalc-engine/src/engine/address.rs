//! Cell coordinates and A1-style addresses.
//!
//! Provides bidirectional conversion between 1-based `(y, x)` points and
//! spreadsheet-style addresses (e.g., "A1", "$B$2", "AA100"). Row 0 and
//! column 0 are the header row/column, so an address may omit an axis:
//! `"B"` is the header of column B and `"3"` is the header of row 3.
//!
//! # Examples
//!
//! ```ignore
//! let point = address_to_point("B3").unwrap();
//! assert_eq!(point, Point::new(3, 2));
//! assert_eq!(point_to_address(point), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::OnceLock;

/// A logical cell position. Both axes are 1-based; 0 addresses a header.
#[derive(
    Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Point {
    pub y: usize,
    pub x: usize,
}

impl Point {
    pub fn new(y: usize, x: usize) -> Point {
        Point { y, x }
    }

    /// Offset both axes, returning None if either would drop below 1.
    pub fn offset(self, dy: isize, dx: isize) -> Option<Point> {
        let y = self.y.checked_add_signed(dy)?;
        let x = self.x.checked_add_signed(dx)?;
        if y == 0 || x == 0 {
            return None;
        }
        Some(Point { y, x })
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&point_to_address(*self))
    }
}

/// A parsed address together with its `$` anchors.
///
/// An axis of 0 means the address did not mention it (`"A"` or `"3"`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AddressParts {
    pub point: Point,
    pub abs_col: bool,
    pub abs_row: bool,
}

impl AddressParts {
    pub fn has_row(&self) -> bool {
        self.point.y > 0
    }

    pub fn has_col(&self) -> bool {
        self.point.x > 0
    }
}

impl fmt::Display for AddressParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_col() {
            if self.abs_col {
                f.write_str("$")?;
            }
            f.write_str(&x_to_col(self.point.x))?;
        }
        if self.has_row() {
            if self.abs_row {
                f.write_str("$")?;
            }
            write!(f, "{}", self.point.y)?;
        }
        Ok(())
    }
}

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<abs_col>\$)?(?<letters>[A-Za-z]*)(?<abs_row>\$)?(?<numbers>[0-9]*)$")
            .expect("address regex must compile")
    })
}

/// Parse an address such as `"A1"`, `"$A$1"`, `"A"` or `"12"`.
/// Returns None when neither axis is present or a component overflows.
pub fn parse_address(text: &str) -> Option<AddressParts> {
    let caps = address_re().captures(text)?;
    let letters = &caps["letters"];
    let numbers = &caps["numbers"];
    if letters.is_empty() && numbers.is_empty() {
        return None;
    }

    let x = if letters.is_empty() {
        0
    } else {
        col_to_x(letters)?
    };
    let y = if numbers.is_empty() {
        0
    } else {
        numbers.parse::<usize>().ok()?
    };

    let leading = caps.name("abs_col").is_some();
    let middle = caps.name("abs_row").is_some();
    // "$3" carries a row anchor even though it sits in the column slot.
    let (abs_col, abs_row) = if letters.is_empty() {
        (false, leading || middle)
    } else {
        (leading, middle)
    };

    Some(AddressParts {
        point: Point { y, x },
        abs_col,
        abs_row,
    })
}

/// Convert an address to a point, ignoring anchors.
pub fn address_to_point(text: &str) -> Option<Point> {
    parse_address(text).map(|parts| parts.point)
}

/// Convert a point to its address. A zero axis is omitted.
pub fn point_to_address(point: Point) -> String {
    format!("{}{}", x_to_col(point.x), y_to_row(point.y))
}

/// [`point_to_address`] with the column letters taken from `cache`.
pub fn point_to_address_in(point: Point, cache: &mut ColumnCache) -> String {
    format!("{}{}", cache.letters(point.x), y_to_row(point.y))
}

/// Convert a 1-based column number to letters (1 -> A, 26 -> Z, 27 -> AA).
/// Column 0 (the row header) has no letters.
pub fn x_to_col(x: usize) -> String {
    let mut result = String::new();
    let mut n = x as u128;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// Convert column letters to a 1-based column number. Case-insensitive.
pub fn col_to_x(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut acc = 0usize;
    for c in letters.bytes() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc)
}

/// Convert a 1-based row number to its label. Row 0 (the column header) has none.
pub fn y_to_row(y: usize) -> String {
    if y == 0 { String::new() } else { y.to_string() }
}

pub fn row_to_y(label: &str) -> Option<usize> {
    label.parse::<usize>().ok()
}

/// Bounded memo for column letter conversions.
///
/// Owned by whoever needs it and passed by reference; entries are evicted in
/// insertion order once `capacity` is reached.
#[derive(Debug)]
pub struct ColumnCache {
    capacity: usize,
    letters: HashMap<usize, String>,
    numbers: HashMap<String, usize>,
    order: VecDeque<usize>,
}

impl ColumnCache {
    pub fn new(capacity: usize) -> ColumnCache {
        ColumnCache {
            capacity: capacity.max(1),
            letters: HashMap::new(),
            numbers: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Column letters for `x`, memoized. The row header column has none.
    pub fn letters(&mut self, x: usize) -> String {
        if x == 0 {
            return String::new();
        }
        if let Some(letters) = self.letters.get(&x) {
            return letters.clone();
        }
        let letters = x_to_col(x);
        self.remember(x, letters.clone());
        letters
    }

    /// Column number for `letters`, memoized.
    pub fn number(&mut self, letters: &str) -> Option<usize> {
        let key = letters.to_ascii_uppercase();
        if let Some(x) = self.numbers.get(&key) {
            return Some(*x);
        }
        let x = col_to_x(&key)?;
        self.remember(x, key);
        Some(x)
    }

    fn remember(&mut self, x: usize, letters: String) {
        if self.letters.contains_key(&x) {
            return;
        }
        while self.order.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(old_letters) = self.letters.remove(&oldest) {
                self.numbers.remove(&old_letters);
            }
        }
        self.order.push_back(x);
        self.numbers.insert(letters.clone(), x);
        self.letters.insert(x, letters);
    }
}

impl Default for ColumnCache {
    fn default() -> Self {
        ColumnCache::new(1024)
    }
}
