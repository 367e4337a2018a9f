use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::settlement_model::{CostSource, CoverageStatus, SaleResult, SettlementOutcome};
use crate::config::EngineConfig;
use crate::corporate_actions::CorporateActionResolver;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::errors::{Error, Result, ValidationError};
use crate::fx::RateResolverTrait;
use crate::lots::{is_quantity_significant, ConsumeResult, Lot, LotLedger};
use crate::operations::{first_out_of_order, Operation, OperationKind};
use crate::shorts::ShortTracker;

/// Reporting-currency amounts of one operation. `None` marks an unresolved rate.
struct ReportingAmounts {
    gross: Option<Decimal>,
    commission: Option<Decimal>,
}

impl ReportingAmounts {
    fn resolved(&self) -> bool {
        self.gross.is_some() && self.commission.is_some()
    }

    /// Gross plus commission, unresolved parts counted as zero.
    fn total_cost(&self) -> Decimal {
        self.gross.unwrap_or_default() + self.commission.unwrap_or_default()
    }
}

/// Settles the operations of one (owner, tax year) run.
///
/// The engine owns the lot ledger and short tracker for the run. Data problems
/// become diagnostics and never stop processing; an `Err` means a broken
/// precondition (unsorted input, inconsistent configuration) or a broken
/// ledger invariant.
pub struct SettlementEngine {
    config: EngineConfig,
    rates: Arc<dyn RateResolverTrait>,
    actions: CorporateActionResolver,
    ledger: LotLedger,
    shorts: ShortTracker,
    sales: Vec<SaleResult>,
    diagnostics: Diagnostics,
}

impl SettlementEngine {
    pub fn new(
        config: EngineConfig,
        rates: Arc<dyn RateResolverTrait>,
        actions: CorporateActionResolver,
    ) -> Result<Self> {
        config.validate()?;
        if !rates
            .reporting_currency()
            .eq_ignore_ascii_case(&config.reporting_currency)
        {
            return Err(Error::Config(format!(
                "rate resolver reports in {} but the run reports in {}",
                rates.reporting_currency(),
                config.reporting_currency
            )));
        }

        let epsilon = config.quantity_epsilon;
        Ok(SettlementEngine {
            config,
            rates,
            actions,
            ledger: LotLedger::new(epsilon),
            shorts: ShortTracker::new(epsilon),
            sales: Vec::new(),
            diagnostics: Diagnostics::new(),
        })
    }

    /// Settles `operations`, which must be in ascending timestamp order.
    pub fn process(&mut self, operations: &[Operation]) -> Result<SettlementOutcome> {
        if let Some(index) = first_out_of_order(operations) {
            return Err(ValidationError::InvalidInput(format!(
                "operation {} at position {} is earlier than its predecessor",
                operations[index].id, index
            ))
            .into());
        }

        info!(
            "Settling {} operations in {}",
            operations.len(),
            self.config.reporting_currency
        );

        for operation in operations {
            if !operation.quantity.is_sign_positive() || operation.quantity.is_zero() {
                self.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::MalformedOperation,
                        format!(
                            "{} with non-positive quantity {}. Skipped.",
                            operation.kind.as_str(),
                            operation.quantity
                        ),
                    )
                    .for_operation(&operation.id)
                    .for_instrument(&operation.instrument_id)
                    .on(operation.trade_date()),
                );
                continue;
            }

            match operation.kind {
                OperationKind::InitialHolding | OperationKind::Buy => self.acquire(operation)?,
                OperationKind::Sell => self.sell(operation),
            }
        }

        self.ledger.check_invariants()?;
        Ok(self.outcome())
    }

    /// Current results, with a review warning for every sale still open.
    pub fn outcome(&self) -> SettlementOutcome {
        let mut diagnostics = self.diagnostics.clone();
        for sale in self.sales.iter().filter(|sale| sale.is_open()) {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::OpenShort,
                    format!(
                        "{} of {} units sold without known holdings; realized cost {} needs review",
                        sale.uncovered_quantity, sale.quantity, sale.realized_cost
                    ),
                )
                .for_operation(&sale.sale_id)
                .for_instrument(&sale.instrument_id)
                .on(sale.sold_at.date_naive()),
            );
        }

        SettlementOutcome {
            sales: self.sales.clone(),
            diagnostics,
            holdings: self.ledger.snapshot(),
            open_shorts: self.shorts.snapshot(),
        }
    }

    pub fn ledger(&self) -> &LotLedger {
        &self.ledger
    }

    pub fn shorts(&self) -> &ShortTracker {
        &self.shorts
    }

    pub fn actions(&self) -> &CorporateActionResolver {
        &self.actions
    }

    pub fn sales(&self) -> &[SaleResult] {
        &self.sales
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reporting-currency value of one unit of `currency` on the operation's date.
    /// Pushes a `RateUnresolved` diagnostic and returns `None` when no rate exists.
    fn unit_rate(&mut self, operation: &Operation, currency: &str) -> Option<Decimal> {
        if currency.eq_ignore_ascii_case(&self.config.reporting_currency) {
            return Some(Decimal::ONE);
        }
        if currency.eq_ignore_ascii_case(&operation.currency) {
            if let Some(rate) = operation.exchange_rate {
                return Some(rate);
            }
        }

        match self.rates.resolve_rate(currency, operation.trade_date()) {
            Ok(resolved) => {
                if !resolved.exact {
                    debug!(
                        "Using {} rate of {} for operation {} dated {}",
                        currency,
                        resolved.rate_date,
                        operation.id,
                        operation.trade_date()
                    );
                }
                Some(resolved.unit_rate)
            }
            Err(e) => {
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::RateUnresolved,
                        format!("{}. Counted as zero.", e),
                    )
                    .for_operation(&operation.id)
                    .for_instrument(&operation.instrument_id)
                    .on(operation.trade_date()),
                );
                None
            }
        }
    }

    fn reporting_amounts(&mut self, operation: &Operation) -> ReportingAmounts {
        let trade_rate = self.unit_rate(operation, &operation.currency);
        let gross = trade_rate.map(|rate| operation.gross_amount() * rate);

        let commission = if operation.commission.is_zero() {
            Some(Decimal::ZERO)
        } else if operation
            .commission_currency()
            .eq_ignore_ascii_case(&operation.currency)
        {
            trade_rate.map(|rate| operation.commission * rate)
        } else {
            let currency = operation.commission_currency().to_string();
            self.unit_rate(operation, &currency)
                .map(|rate| operation.commission * rate)
        };

        ReportingAmounts { gross, commission }
    }

    /// Buy or initial holding: covers open shorts first, the rest becomes a lot.
    fn acquire(&mut self, operation: &Operation) -> Result<()> {
        let amounts = self.reporting_amounts(operation);
        let total_cost = amounts.total_cost();
        let unit_cost = total_cost / operation.quantity;

        let covered = self.shorts.try_cover(
            &operation.instrument_id,
            operation.quantity,
            amounts.resolved().then_some(unit_cost),
            &operation.id,
            operation.timestamp,
            &mut self.sales,
        )?;
        if !covered.is_zero() {
            debug!(
                "{} {} of {} covered open shorts",
                covered, operation.instrument_id, operation.id
            );
        }

        let remaining = operation.quantity - covered;
        if is_quantity_significant(&remaining, &self.config.quantity_epsilon) {
            let cost_basis = if covered.is_zero() {
                total_cost
            } else {
                total_cost - covered * unit_cost
            };
            self.ledger.append_or_insert(
                &operation.instrument_id,
                Lot::new(&operation.id, operation.timestamp, remaining, cost_basis),
            );
        }
        Ok(())
    }

    fn sell(&mut self, operation: &Operation) {
        let amounts = self.reporting_amounts(operation);
        let instrument_id = operation.instrument_id.as_str();
        let epsilon = self.config.quantity_epsilon;

        let mut sale = SaleResult::pending(
            &operation.id,
            instrument_id,
            operation.timestamp,
            operation.quantity,
        );
        sale.rate_resolved = amounts.resolved();
        sale.commission = amounts.commission.unwrap_or_default();
        sale.set_proceeds(amounts.gross);
        sale.add_cost(sale.commission);

        let mut uncovered = operation.quantity;
        let consumed = self.ledger.consume(instrument_id, uncovered);
        uncovered -= take_consumption(&mut sale, consumed);

        let mut attempts = 0;
        while is_quantity_significant(&uncovered, &epsilon)
            && attempts < self.config.max_conversion_attempts
        {
            let Some(event) = self.actions.find_applicable(
                instrument_id,
                operation.trade_date(),
                &mut self.diagnostics,
            ) else {
                break;
            };
            attempts += 1;

            if self
                .actions
                .apply(&event, &mut self.ledger, &mut self.diagnostics)
            {
                sale.conversions_applied.push(event.action_id.clone());
            }
            let consumed = self.ledger.consume(instrument_id, uncovered);
            uncovered -= take_consumption(&mut sale, consumed);
        }

        if is_quantity_significant(&uncovered, &epsilon)
            && attempts >= self.config.max_conversion_attempts
            && self
                .actions
                .find_applicable(instrument_id, operation.trade_date(), &mut self.diagnostics)
                .is_some()
        {
            self.diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::ConversionRetryBoundExceeded,
                    format!(
                        "Still {} uncovered after {} conversions with more pending",
                        uncovered, attempts
                    ),
                )
                .for_operation(&operation.id)
                .for_instrument(instrument_id)
                .on(operation.trade_date()),
            );
        }

        let index = self.sales.len();
        if is_quantity_significant(&uncovered, &epsilon) {
            let covered_any = uncovered < operation.quantity;
            sale.uncovered_quantity = uncovered;
            sale.status = if covered_any {
                CoverageStatus::PartiallyCoveredOpen
            } else {
                CoverageStatus::OpenShort
            };
            self.shorts.register(uncovered, index, &sale);
        } else {
            sale.uncovered_quantity = Decimal::ZERO;
            sale.status = if sale.conversions_applied.is_empty() {
                CoverageStatus::FullyCoveredByPast
            } else {
                CoverageStatus::FullyCoveredByConversion
            };
        }

        debug!(
            "Sale {} of {} {}: {:?}, cost {}",
            sale.sale_id, sale.quantity, sale.instrument_id, sale.status, sale.realized_cost
        );
        self.sales.push(sale);
    }
}

/// Charges a ledger consumption to the sale. Returns the quantity covered.
fn take_consumption(sale: &mut SaleResult, consumed: ConsumeResult) -> Decimal {
    if consumed.is_empty() {
        return Decimal::ZERO;
    }
    sale.add_cost(consumed.cost);
    sale.lineage
        .extend(consumed.lineage.into_iter().map(CostSource::from));
    consumed.quantity
}
