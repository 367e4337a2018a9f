use chrono::Datelike;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

use super::reports_model::{RunReport, RunRequest, YearSummary};
use super::reports_traits::CostBasisServiceTrait;
use crate::config::EngineConfig;
use crate::corporate_actions::CorporateActionResolver;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::errors::Result;
use crate::fx::{HistoricalRateResolver, InMemoryRateSource};
use crate::operations::{sort_chronologically, Operation};
use crate::settlement::{SaleResult, SettlementEngine};

/// Rounds to `precision` places and pads to exactly that many.
fn round_for_display(value: Decimal, precision: u32) -> Decimal {
    let mut rounded = value.round_dp(precision);
    rounded.rescale(precision);
    rounded
}

/// Runs one (owner, tax year) settlement from raw records.
pub struct CostBasisService {
    config: EngineConfig,
}

impl CostBasisService {
    pub fn new(config: EngineConfig) -> Self {
        CostBasisService { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalizes the records, drops repeated ids and sorts the rest.
    fn prepare_operations(request: &RunRequest, diagnostics: &mut Diagnostics) -> Vec<Operation> {
        let mut seen = HashSet::new();
        let mut operations = Vec::with_capacity(request.operations.len());

        for (position, raw) in request.operations.iter().enumerate() {
            let Some(operation) = raw.normalize(position, diagnostics) else {
                continue;
            };
            if !seen.insert(operation.id.clone()) {
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::MalformedOperation,
                        "Duplicate operation id. Skipped.",
                    )
                    .for_operation(&operation.id)
                    .for_instrument(&operation.instrument_id),
                );
                continue;
            }
            operations.push(operation);
        }

        sort_chronologically(&mut operations);
        operations
    }

    fn summarize(&self, sales: &[SaleResult]) -> YearSummary {
        let precision = self.config.display_precision;
        let mut summary = YearSummary::default();

        for sale in sales {
            if sale.is_open() {
                summary.open_shorts += 1;
            }
            match (sale.proceeds, sale.profit) {
                (Some(proceeds), Some(profit)) if sale.rate_resolved => {
                    summary.proceeds += proceeds;
                    summary.cost += sale.realized_cost;
                    summary.profit += profit;
                }
                _ => summary.unresolved_sales += 1,
            }
        }

        summary.proceeds = round_for_display(summary.proceeds, precision);
        summary.cost = round_for_display(summary.cost, precision);
        summary.profit = round_for_display(summary.profit, precision);
        summary
    }
}

impl CostBasisServiceTrait for CostBasisService {
    fn run(&self, request: RunRequest) -> Result<RunReport> {
        self.config.validate()?;
        let reporting_currency = self.config.reporting_currency.clone();
        if let Some(requested) = &request.reporting_currency {
            if !requested.trim().eq_ignore_ascii_case(&reporting_currency) {
                warn!(
                    "Request asks for {} but the run reports in {}",
                    requested, reporting_currency
                );
            }
        }

        info!(
            "Cost-basis run for {} ({}): {} records, {} rates, {} statements",
            request.owner,
            request.tax_year,
            request.operations.len(),
            request.exchange_rates.len(),
            request.sources.len()
        );

        let mut diagnostics = Diagnostics::new();
        let operations = Self::prepare_operations(&request, &mut diagnostics);
        debug!("{} operations after normalization", operations.len());

        let source = Arc::new(InMemoryRateSource::new(
            request.exchange_rates,
            self.config.alias_window_days,
        ));
        let resolver = Arc::new(HistoricalRateResolver::new(&reporting_currency, source));
        let actions = CorporateActionResolver::new(request.sources);

        let mut engine = SettlementEngine::new(self.config.clone(), resolver, actions)?;
        let outcome = engine.process(&operations)?;
        diagnostics.extend(outcome.diagnostics);

        let tax_year = request.tax_year;
        let sales: Vec<SaleResult> = outcome
            .sales
            .into_iter()
            .filter(|sale| sale.sold_at.year() == tax_year)
            .collect();
        let summary = self.summarize(&sales);

        info!(
            "{} sales in {}: proceeds {}, cost {}, profit {} {}",
            sales.len(),
            tax_year,
            summary.proceeds,
            summary.cost,
            summary.profit,
            reporting_currency
        );

        Ok(RunReport {
            owner: request.owner,
            tax_year,
            reporting_currency,
            had_error: diagnostics.had_error(),
            sales,
            summary,
            diagnostics,
            ledger: outcome.holdings,
            shorts: outcome.open_shorts,
        })
    }
}

impl Default for CostBasisService {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
