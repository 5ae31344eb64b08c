//! Gridcalc cell store.
//!
//! A [`Table`] keeps cells under stable ids so formulas survive structural
//! edits, enforces per-cell [`Prevention`] for user-driven changes, and
//! records every mutation in a bounded undo/redo [`History`].

pub mod cell;
pub mod collab;
pub mod config;
pub mod error;
pub mod history;
pub mod prevention;
pub mod table;

pub use cell::{Cell, Style};
pub use collab::{CellParser, DefaultParser, DefaultRenderer, Renderer};
pub use config::TableConfig;
pub use error::{Result, TableError};
pub use history::{CellDiff, History, HistoryEntry};
pub use prevention::{Prevention, is_prevented};
pub use table::{Operator, ReadOptions, Table};
