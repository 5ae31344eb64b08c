//! Formula engine API.
//!
//! - [`Point`], [`Area`], [`Zone`], [`IdRef`] - coordinates, selections and
//!   stable-id literals, with their address conversions
//! - [`Lexer`], [`parse`] - formula text to token stream to [`Expr`] tree
//! - [`Solver`], [`Sheet`] - evaluation against a cell store, with a
//!   per-address memo that detects circular references
//! - [`absolutize`], [`stringify_to_ref`], [`slide_formula`] - reference rewriting
//! - [`format_value`] - display formatting

pub mod address;
pub mod area;
pub mod error;
pub mod eval;
pub mod format;
pub mod id;
pub mod lexer;
pub mod parser;
pub mod transform;
pub mod value;

pub use address::{
    AddressParts, ColumnCache, Point, address_to_point, col_to_x, parse_address,
    point_to_address, point_to_address_in, row_to_y, x_to_col, y_to_row,
};
pub use area::{
    Area, Zone, area_shape, area_to_range, area_to_zone, parse_range, range_to_area, zone_to_area,
};
pub use error::{ErrorKind, FormulaError, Result};
pub use eval::{Sheet, Slot, SolveCache, Solver};
pub use format::{format_date, format_delta, format_number, format_value};
pub use id::{Id, IdRef, from_base36, to_base36};
pub use lexer::{Lexer, Token, TokenKind, stringify_tokens};
pub use parser::{Expr, parse, parse_formula};
pub use transform::{absolutize, slide_formula, stringify_to_ref};
pub use value::{SubTable, Value, ensure_boolean, ensure_number, ensure_string};
