//! Capgains Core - FIFO cost-basis engine for realized capital gains.
//!
//! Settles sales against per-instrument lot queues, applies security
//! conversions found in broker statements, tracks sales that exceed known
//! holdings until later purchases cover them, and converts every amount into
//! a single reporting currency at historical rates.

pub mod config;
pub mod constants;
pub mod corporate_actions;
pub mod diagnostics;
pub mod errors;
pub mod fx;
pub mod lots;
pub mod operations;
pub mod reports;
pub mod settlement;
pub mod shorts;

pub use config::EngineConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use reports::{CostBasisService, CostBasisServiceTrait, RunReport, RunRequest};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
