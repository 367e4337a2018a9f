//! Lots module - per-instrument FIFO queues of open acquisitions.

mod lot_ledger;
mod lots_model;

#[cfg(test)]
mod lot_ledger_tests;

pub use lot_ledger::{LotLedger, LotQueue};
pub use lots_model::{
    is_quantity_significant, ConsumeResult, DrainResult, InstrumentHoldings, Lot, LotConsumption,
};
