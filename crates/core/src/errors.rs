//! Core error types for the cost-basis engine.
//!
//! Data problems found while settling a run (unresolved rates, malformed
//! corporate actions, bad operation fields) are not errors here: they are
//! collected as [`Diagnostic`](crate::diagnostics::Diagnostic) values so that a
//! run always completes. The types below cover configuration mistakes and
//! broken internal invariants.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration value: {0}")]
    Config(String),

    #[error("Ledger invariant violated: {0}")]
    Invariant(String),
}

/// Input the engine refuses to process.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
