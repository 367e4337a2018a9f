use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::corporate_actions::SourceDataset;
use crate::diagnostics::Diagnostics;
use crate::fx::PublishedRate;
use crate::lots::InstrumentHoldings;
use crate::operations::RawOperation;
use crate::settlement::SaleResult;
use crate::shorts::ShortEntry;

/// Input of one cost-basis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub owner: String,
    pub tax_year: i32,
    /// Used when the caller's configuration does not fix the reporting currency.
    #[serde(default)]
    pub reporting_currency: Option<String>,
    #[serde(default)]
    pub operations: Vec<RawOperation>,
    #[serde(default)]
    pub exchange_rates: Vec<PublishedRate>,
    #[serde(default)]
    pub sources: Vec<SourceDataset>,
}

/// Totals over the resolved sales of the tax year, rounded for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub proceeds: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    /// Sales left out of the totals because a rate was missing.
    pub unresolved_sales: usize,
    /// Sales of the year still (partially) uncovered.
    pub open_shorts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub owner: String,
    pub tax_year: i32,
    pub reporting_currency: String,
    pub had_error: bool,
    /// Sales dated in the tax year, in processing order.
    pub sales: Vec<SaleResult>,
    pub summary: YearSummary,
    pub diagnostics: Diagnostics,
    /// Open lots at the end of the run.
    pub ledger: Vec<InstrumentHoldings>,
    pub shorts: Vec<ShortEntry>,
}
