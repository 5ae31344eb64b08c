//! Error types for the gridcalc cell store.

use gridcalc_engine::engine::FormulaError;
use thiserror::Error;

/// Errors returned by [`crate::Table`] operations.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("formula error: {0}")]
    Formula(#[from] FormulaError),

    #[error("cannot grow to {requested} {axis}: the limit is {max}")]
    LimitExceeded {
        axis: &'static str,
        requested: usize,
        max: usize,
    },

    #[error("cannot shrink to {requested} {axis}: the minimum is {min}")]
    BelowMinimum {
        axis: &'static str,
        requested: usize,
        min: usize,
    },

    #[error("{operation} is prevented at {address}")]
    Prevented { operation: String, address: String },

    #[error("{address} is outside the table")]
    OutOfBounds { address: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TableError>;
