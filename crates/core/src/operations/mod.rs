//! Operations module - the trade records a settlement run consumes.

mod operations_constants;
mod operations_model;

#[cfg(test)]
mod operations_model_tests;

pub use operations_constants::*;
pub use operations_model::{
    first_out_of_order, parse_decimal_tolerant, parse_timestamp, sort_chronologically, Operation,
    OperationKind, RawDecimal, RawOperation,
};
