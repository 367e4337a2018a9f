use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, VecDeque};

use super::shorts_model::ShortEntry;
use crate::errors::{Error, Result};
use crate::lots::is_quantity_significant;
use crate::settlement::{CostSource, CoverageStatus, SaleResult};

/// Per-instrument queues of uncovered sale quantity, oldest sale first.
#[derive(Debug, Clone)]
pub struct ShortTracker {
    entries: BTreeMap<String, VecDeque<ShortEntry>>,
    epsilon: Decimal,
}

impl ShortTracker {
    pub fn new(epsilon: Decimal) -> Self {
        ShortTracker {
            entries: BTreeMap::new(),
            epsilon,
        }
    }

    /// Queues the uncovered part of a sale. Sales arrive in time order, so
    /// appending keeps each queue ordered by sale date.
    pub fn register(&mut self, quantity: Decimal, sale_index: usize, sale: &SaleResult) {
        debug!(
            "Registering short of {} {} from sale {}",
            quantity, sale.instrument_id, sale.sale_id
        );
        self.entries
            .entry(sale.instrument_id.clone())
            .or_default()
            .push_back(ShortEntry {
                instrument_id: sale.instrument_id.clone(),
                sale_index,
                sale_id: sale.sale_id.clone(),
                sold_at: sale.sold_at,
                outstanding: quantity,
                accumulated_cost: sale.realized_cost,
            });
    }

    /// Covers open entries of `instrument_id` with up to `available` units
    /// bought at `unit_cost`, oldest entry first, charging the cost to each
    /// entry's sale. Returns the quantity used.
    ///
    /// `unit_cost` is `None` when the purchase could not be valued; covered
    /// sales are then charged nothing and marked unresolved.
    pub fn try_cover(
        &mut self,
        instrument_id: &str,
        available: Decimal,
        unit_cost: Option<Decimal>,
        cover_origin_id: &str,
        covered_at: DateTime<Utc>,
        sales: &mut [SaleResult],
    ) -> Result<Decimal> {
        let Some(queue) = self.entries.get_mut(instrument_id) else {
            return Ok(Decimal::ZERO);
        };

        let mut consumed = Decimal::ZERO;
        while is_quantity_significant(&(available - consumed), &self.epsilon) {
            let Some(entry) = queue.front_mut() else {
                break;
            };

            let taken = std::cmp::min(entry.outstanding, available - consumed);
            let cost = taken * unit_cost.unwrap_or(Decimal::ZERO);
            entry.outstanding -= taken;
            entry.accumulated_cost += cost;
            consumed += taken;

            let sale = sales
                .get_mut(entry.sale_index)
                .filter(|sale| sale.sale_id == entry.sale_id)
                .ok_or_else(|| {
                    Error::Invariant(format!(
                        "short entry for sale {} points at missing result {}",
                        entry.sale_id, entry.sale_index
                    ))
                })?;

            sale.add_cost(cost);
            if unit_cost.is_none() {
                sale.rate_resolved = false;
            }
            sale.lineage.push(CostSource {
                origin_id: cover_origin_id.to_string(),
                acquired_at: covered_at,
                quantity: taken,
                cost,
                retroactive: true,
            });

            if is_quantity_significant(&entry.outstanding, &self.epsilon) {
                sale.uncovered_quantity = entry.outstanding;
                sale.status = CoverageStatus::PartiallyCoveredOpen;
            } else {
                debug!(
                    "Sale {} fully covered by {} at {}",
                    sale.sale_id, cover_origin_id, covered_at
                );
                sale.uncovered_quantity = Decimal::ZERO;
                sale.status = CoverageStatus::FullyCoveredRetroactively;
                queue.pop_front();
            }
        }

        if queue.is_empty() {
            self.entries.remove(instrument_id);
        }
        Ok(consumed)
    }

    pub fn outstanding(&self, instrument_id: &str) -> Decimal {
        self.entries
            .get(instrument_id)
            .map(|queue| queue.iter().map(|e| e.outstanding).sum())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every open entry, grouped by instrument, oldest first.
    pub fn snapshot(&self) -> Vec<ShortEntry> {
        self.entries
            .values()
            .flat_map(|queue| queue.iter().cloned())
            .collect()
    }
}
