use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

use super::comment_parser::{parse_action_date, ticker_refs};
use super::corporate_actions_constants::{CONVERSION_ACTION_TYPES, SECURITY_ASSET_CLASSES};
use super::corporate_actions_model::{ActionNode, ConversionEvent, ConversionOutcome, SourceDataset};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::lots::{is_quantity_significant, Lot, LotLedger};

/// Outcomes are cached per action id and credited instrument.
type OutcomeKey = (String, String);

fn is_conversion_type(action_type: &str) -> bool {
    let action_type = action_type.trim();
    CONVERSION_ACTION_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(action_type))
}

fn is_security_class(asset_class: &str) -> bool {
    let asset_class = asset_class.trim();
    SECURITY_ASSET_CLASSES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(asset_class))
}

/// Validates a credit node of `action_id` against the other nodes of its dataset.
pub fn validate_conversion(
    action_id: &str,
    node: &ActionNode,
    siblings: &[ActionNode],
) -> ConversionOutcome {
    if !is_conversion_type(&node.action_type) || !is_security_class(&node.asset_class) {
        return ConversionOutcome::NotRelevant;
    }

    let Some(credited) = node.quantity.parse() else {
        return ConversionOutcome::ParseError(format!(
            "non-numeric quantity '{}'",
            node.quantity.display()
        ));
    };
    // A zero credit is a removal without replacement (delisting).
    if credited.is_sign_negative() && !credited.is_zero() {
        return ConversionOutcome::NotRelevant;
    }

    // The first pair is the old instrument. The new one is the pair naming
    // this node's instrument, wherever it sits after the first.
    let refs = ticker_refs(&node.comment);
    let new_instrument_id = node.instrument_id.trim();
    let Some(old) = refs.first() else {
        return ConversionOutcome::NotRelevant;
    };
    let Some(new) = refs
        .iter()
        .skip(1)
        .find(|r| r.instrument_id == new_instrument_id)
    else {
        if refs.len() == 1 && old.instrument_id == new_instrument_id {
            return ConversionOutcome::ParseError(format!(
                "comment names {} but no instrument it converts from",
                new_instrument_id
            ));
        }
        return ConversionOutcome::NotRelevant;
    };
    if old.instrument_id == new.instrument_id {
        return ConversionOutcome::ParseError(format!(
            "conversion of {} into itself",
            new.instrument_id
        ));
    }

    let debit = siblings
        .iter()
        .filter(|s| s.action_id == action_id && s.instrument_id.trim() == old.instrument_id)
        .filter_map(|s| s.quantity.parse())
        .find(|q| q.is_sign_negative() && !q.is_zero());
    let Some(debit) = debit else {
        return ConversionOutcome::ParseError(format!(
            "no debit of {} ({}) paired with the credit of {}",
            old.ticker, old.instrument_id, new.ticker
        ));
    };

    let Some(effective_date) = parse_action_date(&node.date) else {
        return ConversionOutcome::ParseError(format!("invalid date '{}'", node.date));
    };

    ConversionOutcome::Applicable(ConversionEvent {
        action_id: action_id.to_string(),
        old_instrument_id: old.instrument_id.clone(),
        new_instrument_id: new_instrument_id.to_string(),
        removed_quantity: debit.abs(),
        credited_quantity: credited,
        effective_date,
        comment: node.comment.clone(),
    })
}

#[derive(Debug, Clone)]
struct Candidate {
    dataset: usize,
    node: usize,
    action_id: String,
    date: Option<DateTime<Utc>>,
}

/// Finds, validates and applies security conversions for one run.
///
/// Credit nodes are indexed by credited instrument when the resolver is built.
/// A node is validated the first time it is looked at and its outcome is kept
/// for the rest of the run; an action is applied at most once.
#[derive(Debug, Clone, Default)]
pub struct CorporateActionResolver {
    datasets: Vec<SourceDataset>,
    candidates: HashMap<String, Vec<Candidate>>,
    outcomes: HashMap<OutcomeKey, ConversionOutcome>,
    applied: HashSet<String>,
    reported: HashSet<OutcomeKey>,
}

impl CorporateActionResolver {
    pub fn new(datasets: Vec<SourceDataset>) -> Self {
        let mut candidates: HashMap<String, Vec<Candidate>> = HashMap::new();

        for (dataset_index, dataset) in datasets.iter().enumerate() {
            for (node_index, node) in dataset.actions.iter().enumerate() {
                if !is_conversion_type(&node.action_type) {
                    continue;
                }
                // Debits are found as siblings of their credit.
                let is_debit = node
                    .quantity
                    .parse()
                    .is_some_and(|q| q.is_sign_negative() && !q.is_zero());
                if is_debit {
                    continue;
                }
                candidates
                    .entry(node.instrument_id.trim().to_string())
                    .or_default()
                    .push(Candidate {
                        dataset: dataset_index,
                        node: node_index,
                        action_id: node.action_id.clone(),
                        date: parse_action_date(&node.date),
                    });
            }
        }

        for list in candidates.values_mut() {
            list.sort_by(|a, b| {
                (a.date.is_none(), a.date, &a.action_id).cmp(&(b.date.is_none(), b.date, &b.action_id))
            });
        }

        debug!(
            "Discovered conversion credits for {} instruments in {} datasets",
            candidates.len(),
            datasets.len()
        );

        CorporateActionResolver {
            datasets,
            candidates,
            outcomes: HashMap::new(),
            applied: HashSet::new(),
            reported: HashSet::new(),
        }
    }

    /// Validates `node` once; later calls for the same action and instrument
    /// return the cached outcome.
    pub fn resolve(
        &mut self,
        action_id: &str,
        node: &ActionNode,
        siblings: &[ActionNode],
    ) -> ConversionOutcome {
        let key = (action_id.to_string(), node.instrument_id.trim().to_string());
        self.outcomes
            .entry(key)
            .or_insert_with(|| validate_conversion(action_id, node, siblings))
            .clone()
    }

    /// Returns the earliest un-applied conversion into `instrument_id` effective
    /// on or before `date`. Parse errors met on the way are reported once.
    pub fn find_applicable(
        &mut self,
        instrument_id: &str,
        date: NaiveDate,
        diagnostics: &mut Diagnostics,
    ) -> Option<ConversionEvent> {
        let candidates = self.candidates.get(instrument_id)?;

        for candidate in candidates {
            if self.applied.contains(&candidate.action_id) {
                continue;
            }
            let Some(dataset) = self.datasets.get(candidate.dataset) else {
                continue;
            };
            let Some(node) = dataset.actions.get(candidate.node) else {
                continue;
            };

            let key = (candidate.action_id.clone(), instrument_id.to_string());
            let outcome = self.outcomes.entry(key.clone()).or_insert_with(|| {
                validate_conversion(&candidate.action_id, node, &dataset.actions)
            });

            match outcome {
                ConversionOutcome::Applicable(event)
                    if event.effective_date.date_naive() <= date =>
                {
                    return Some(event.clone());
                }
                ConversionOutcome::ParseError(reason) => {
                    if self.reported.insert(key) {
                        let mut diagnostic = Diagnostic::error(
                            DiagnosticKind::ConversionParseError,
                            format!(
                                "Corporate action {} in {}: {}. Not applied.",
                                candidate.action_id, dataset.source_id, reason
                            ),
                        )
                        .for_instrument(instrument_id);
                        if let Some(date) = candidate.date {
                            diagnostic = diagnostic.on(date.date_naive());
                        }
                        diagnostics.push(diagnostic);
                    }
                }
                _ => {}
            }
        }

        None
    }

    /// Moves every open lot of the old instrument into a single lot of the new
    /// one, dated at the effective date and carrying the drained cost basis.
    /// Returns `false` when the action was already applied.
    pub fn apply(
        &mut self,
        event: &ConversionEvent,
        ledger: &mut LotLedger,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        if !self.applied.insert(event.action_id.clone()) {
            debug!("Conversion {} already applied", event.action_id);
            return false;
        }

        let epsilon = ledger.epsilon();
        let drained = ledger.drain_all(&event.old_instrument_id);

        if !is_quantity_significant(&event.credited_quantity, &epsilon) {
            if is_quantity_significant(&drained.quantity, &epsilon) {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::ConversionRemovedHoldings,
                        format!(
                            "Conversion {} removed {} {} (cost {}) without crediting {}",
                            event.action_id,
                            drained.quantity,
                            event.old_instrument_id,
                            drained.cost,
                            event.new_instrument_id
                        ),
                    )
                    .for_instrument(&event.old_instrument_id)
                    .on(event.effective_date.date_naive()),
                );
            }
            return true;
        }

        if !is_quantity_significant(&drained.quantity, &epsilon) {
            warn!(
                "Conversion {} credits {} {} but no {} was held; the new lot has no cost",
                event.action_id,
                event.credited_quantity,
                event.new_instrument_id,
                event.old_instrument_id
            );
        } else if drained.quantity != event.removed_quantity {
            debug!(
                "Conversion {} drained {} {} while the statement debits {}",
                event.action_id, drained.quantity, event.old_instrument_id, event.removed_quantity
            );
        }

        let lot = Lot::new(
            &event.action_id,
            event.effective_date,
            event.credited_quantity,
            drained.cost,
        );
        info!(
            "Applied conversion {}: {} {} -> {} {} at blended unit cost {}",
            event.action_id,
            drained.quantity,
            event.old_instrument_id,
            event.credited_quantity,
            event.new_instrument_id,
            lot.unit_cost()
        );
        ledger.append_or_insert(&event.new_instrument_id, lot);
        true
    }

    pub fn is_applied(&self, action_id: &str) -> bool {
        self.applied.contains(action_id)
    }

    /// Cached outcome for an action's credit of `instrument_id`, if it was resolved.
    pub fn outcome(&self, action_id: &str, instrument_id: &str) -> Option<&ConversionOutcome> {
        self.outcomes
            .get(&(action_id.to_string(), instrument_id.to_string()))
    }
}
