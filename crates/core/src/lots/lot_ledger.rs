use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, VecDeque};

use super::lots_model::{
    is_quantity_significant, ConsumeResult, DrainResult, InstrumentHoldings, Lot, LotConsumption,
};
use crate::errors::{Error, Result};

/// Open lots of one instrument, oldest acquisition first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LotQueue {
    lots: VecDeque<Lot>,
}

impl LotQueue {
    pub fn lots(&self) -> impl Iterator<Item = &Lot> {
        self.lots.iter()
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn total_quantity(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.quantity).sum()
    }

    pub fn total_cost(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.cost_basis).sum()
    }

    /// Appends when the lot is not older than the tail, otherwise inserts it
    /// after every lot dated on or before it.
    fn append_or_insert(&mut self, lot: Lot) {
        match self.lots.back() {
            None => self.lots.push_back(lot),
            Some(tail) if lot.acquisition_date >= tail.acquisition_date => {
                self.lots.push_back(lot)
            }
            Some(_) => {
                let position = self
                    .lots
                    .iter()
                    .position(|existing| existing.acquisition_date > lot.acquisition_date)
                    .unwrap_or(self.lots.len());
                debug!(
                    "Inserting back-dated lot {} at position {} of {}",
                    lot.origin_id,
                    position,
                    self.lots.len()
                );
                self.lots.insert(position, lot);
            }
        }
    }

    /// Takes up to `quantity` from the front of the queue.
    fn consume(&mut self, quantity: Decimal, epsilon: &Decimal) -> ConsumeResult {
        let mut result = ConsumeResult::default();
        let mut remaining = quantity;

        while is_quantity_significant(&remaining, epsilon) {
            let Some(lot) = self.lots.front_mut() else {
                break;
            };

            let taken = std::cmp::min(lot.quantity, remaining);
            let cost = if taken == lot.quantity {
                lot.cost_basis
            } else {
                lot.cost_basis * taken / lot.quantity
            };

            result.quantity += taken;
            result.cost += cost;
            result.lineage.push(LotConsumption {
                origin_id: lot.origin_id.clone(),
                acquisition_date: lot.acquisition_date,
                quantity: taken,
                cost,
            });
            remaining -= taken;

            lot.quantity -= taken;
            lot.cost_basis -= cost;
            if !is_quantity_significant(&lot.quantity, epsilon) {
                if !lot.quantity.is_zero() {
                    debug!(
                        "Dropping residue {} (cost {}) of lot {}",
                        lot.quantity, lot.cost_basis, lot.origin_id
                    );
                }
                self.lots.pop_front();
            }
        }

        result
    }

    fn drain(&mut self) -> DrainResult {
        let lots: Vec<Lot> = self.lots.drain(..).collect();
        DrainResult {
            quantity: lots.iter().map(|lot| lot.quantity).sum(),
            cost: lots.iter().map(|lot| lot.cost_basis).sum(),
            lots,
        }
    }
}

/// Per-instrument FIFO queues of open lots for one run.
#[derive(Debug, Clone)]
pub struct LotLedger {
    queues: BTreeMap<String, LotQueue>,
    epsilon: Decimal,
}

impl LotLedger {
    pub fn new(epsilon: Decimal) -> Self {
        LotLedger {
            queues: BTreeMap::new(),
            epsilon,
        }
    }

    pub fn epsilon(&self) -> Decimal {
        self.epsilon
    }

    /// Consumes up to `quantity` of `instrument_id`, oldest lots first.
    /// The result never carries more cost than the consumed lots held.
    pub fn consume(&mut self, instrument_id: &str, quantity: Decimal) -> ConsumeResult {
        if !quantity.is_sign_positive() {
            warn!(
                "Ignoring consume of non-positive quantity {} for {}",
                quantity, instrument_id
            );
            return ConsumeResult::default();
        }

        let Some(queue) = self.queues.get_mut(instrument_id) else {
            return ConsumeResult::default();
        };

        let result = queue.consume(quantity, &self.epsilon);
        if queue.is_empty() {
            self.queues.remove(instrument_id);
        }
        result
    }

    /// Adds a lot keeping the queue in ascending acquisition-date order.
    /// Lots with insignificant quantity are not queued.
    pub fn append_or_insert(&mut self, instrument_id: &str, lot: Lot) {
        if !lot.quantity.is_sign_positive() || !is_quantity_significant(&lot.quantity, &self.epsilon)
        {
            warn!(
                "Not queueing lot {} for {} with insignificant quantity {}",
                lot.origin_id, instrument_id, lot.quantity
            );
            return;
        }
        self.queues
            .entry(instrument_id.to_string())
            .or_default()
            .append_or_insert(lot);
    }

    pub fn peek_remaining(&self, instrument_id: &str) -> Decimal {
        self.queues
            .get(instrument_id)
            .map(LotQueue::total_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Removes every open lot of `instrument_id`.
    pub fn drain_all(&mut self, instrument_id: &str) -> DrainResult {
        self.queues
            .remove(instrument_id)
            .map(|mut queue| queue.drain())
            .unwrap_or_default()
    }

    pub fn queue(&self, instrument_id: &str) -> Option<&LotQueue> {
        self.queues.get(instrument_id)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &String> {
        self.queues.keys()
    }

    pub fn snapshot(&self) -> Vec<InstrumentHoldings> {
        self.queues
            .iter()
            .map(|(instrument_id, queue)| InstrumentHoldings {
                instrument_id: instrument_id.clone(),
                quantity: queue.total_quantity(),
                cost_basis: queue.total_cost(),
                lots: queue.lots().cloned().collect(),
            })
            .collect()
    }

    /// Verifies that no queue holds an insignificant lot and that every queue is date-ordered.
    pub fn check_invariants(&self) -> Result<()> {
        for (instrument_id, queue) in &self.queues {
            for lot in queue.lots() {
                if !is_quantity_significant(&lot.quantity, &self.epsilon)
                    || lot.quantity.is_sign_negative()
                {
                    return Err(Error::Invariant(format!(
                        "lot {} of {} has quantity {}",
                        lot.origin_id, instrument_id, lot.quantity
                    )));
                }
            }
            let ordered = queue
                .lots
                .iter()
                .zip(queue.lots.iter().skip(1))
                .all(|(a, b)| a.acquisition_date <= b.acquisition_date);
            if !ordered {
                return Err(Error::Invariant(format!(
                    "lots of {} are not in acquisition order",
                    instrument_id
                )));
            }
        }
        Ok(())
    }
}
