//! Error types for the gridcalc command line

use thiserror::Error;

/// Errors raised while turning arguments into a table
#[derive(Error, Debug)]
pub enum CliError {
    #[error("expected ADDR=TEXT, got {0:?}")]
    InvalidAssignment(String),

    #[error("invalid cell address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
