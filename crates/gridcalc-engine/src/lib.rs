//! Gridcalc formula engine.
//!
//! Lexes, parses and evaluates spreadsheet formulas. The engine does not own
//! any cells: it reads them through the [`engine::Sheet`] trait, which the
//! cell store implements.

pub mod builtins;
pub mod engine;
