//! Settlement module - FIFO matching of sales against lots, conversions and later purchases.

mod settlement_engine;
mod settlement_model;


pub use settlement_engine::SettlementEngine;
pub use settlement_model::{CostSource, CoverageStatus, SaleResult, SettlementOutcome};
