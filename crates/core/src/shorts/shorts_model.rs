use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quantity a sale took beyond the holdings known at the time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShortEntry {
    pub instrument_id: String,
    /// Position of the originating sale in the run's sale results.
    pub sale_index: usize,
    pub sale_id: String,
    pub sold_at: DateTime<Utc>,
    pub outstanding: Decimal,
    /// Realized cost of the sale so far: its own commission plus every cover.
    pub accumulated_cost: Decimal,
}
