#[cfg(test)]
mod tests {
    use crate::errors::Error;
    use crate::lots::{Lot, LotLedger};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn at(date_str: &str) -> DateTime<Utc> {
        let naive = NaiveDate::from_str(date_str)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Utc.from_utc_datetime(&naive)
    }

    fn ledger() -> LotLedger {
        LotLedger::new(dec!(0.000001))
    }

    fn origins(ledger: &LotLedger, instrument: &str) -> Vec<String> {
        ledger
            .queue(instrument)
            .map(|q| q.lots().map(|l| l.origin_id.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_consume_takes_oldest_first() {
        let mut ledger = ledger();
        ledger.append_or_insert("AAPL", Lot::at_unit_cost("b1", at("2023-01-02"), dec!(100), dec!(10.10)));
        ledger.append_or_insert("AAPL", Lot::at_unit_cost("b2", at("2023-01-03"), dec!(100), dec!(12.10)));

        let result = ledger.consume("AAPL", dec!(150));

        assert_eq!(result.quantity, dec!(150));
        assert_eq!(result.cost, dec!(1615.00));
        assert_eq!(result.lineage.len(), 2);
        assert_eq!(result.lineage[0].origin_id, "b1");
        assert_eq!(result.lineage[0].quantity, dec!(100));
        assert_eq!(result.lineage[1].origin_id, "b2");
        assert_eq!(result.lineage[1].cost, dec!(605.00));

        assert_eq!(ledger.peek_remaining("AAPL"), dec!(50));
        assert_eq!(origins(&ledger, "AAPL"), vec!["b2"]);
        assert_eq!(ledger.queue("AAPL").unwrap().total_cost(), dec!(605.00));
    }

    #[test]
    fn test_consume_more_than_available_returns_partial() {
        let mut ledger = ledger();
        ledger.append_or_insert("XYZ", Lot::new("b1", at("2023-01-02"), dec!(30), dec!(300)));

        let result = ledger.consume("XYZ", dec!(50));

        assert_eq!(result.quantity, dec!(30));
        assert_eq!(result.cost, dec!(300));
        assert_eq!(ledger.peek_remaining("XYZ"), dec!(0));
        assert!(ledger.queue("XYZ").is_none());
    }

    #[test]
    fn test_consume_unknown_instrument_is_empty() {
        let mut ledger = ledger();
        let result = ledger.consume("NOPE", dec!(1));
        assert!(result.is_empty());
        assert_eq!(result.quantity, Decimal::ZERO);
    }

    #[test]
    fn test_residue_below_epsilon_drops_lot() {
        let mut ledger = ledger();
        // 1/3 split three ways leaves a rounding residue behind
        let third = dec!(1) / dec!(3);
        ledger.append_or_insert("XYZ", Lot::new("b1", at("2023-01-02"), dec!(1), dec!(9)));

        ledger.consume("XYZ", third);
        ledger.consume("XYZ", third);
        let last = ledger.consume("XYZ", third);

        assert!(last.quantity > dec!(0.333333));
        assert!(ledger.queue("XYZ").is_none());
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_back_dated_lot_is_inserted_in_order() {
        let mut ledger = ledger();
        ledger.append_or_insert("Y", Lot::new("b1", at("2023-01-10"), dec!(1), dec!(1)));
        ledger.append_or_insert("Y", Lot::new("b2", at("2023-03-10"), dec!(1), dec!(1)));
        ledger.append_or_insert("Y", Lot::new("conv", at("2023-02-01"), dec!(1), dec!(1)));
        ledger.append_or_insert("Y", Lot::new("early", at("2022-12-01"), dec!(1), dec!(1)));
        ledger.append_or_insert("Y", Lot::new("same-day", at("2023-01-10"), dec!(1), dec!(1)));

        assert_eq!(
            origins(&ledger, "Y"),
            vec!["early", "b1", "same-day", "conv", "b2"]
        );
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_insignificant_lot_is_not_queued() {
        let mut ledger = ledger();
        ledger.append_or_insert("Y", Lot::new("dust", at("2023-01-10"), dec!(0.0000001), dec!(1)));
        assert!(ledger.queue("Y").is_none());
    }

    #[test]
    fn test_drain_all_returns_totals_and_empties_queue() {
        let mut ledger = ledger();
        ledger.append_or_insert("X", Lot::new("b1", at("2023-01-10"), dec!(600), dec!(600)));
        ledger.append_or_insert("X", Lot::new("b2", at("2023-01-11"), dec!(400), dec!(440)));

        let drained = ledger.drain_all("X");

        assert_eq!(drained.quantity, dec!(1000));
        assert_eq!(drained.cost, dec!(1040));
        assert_eq!(drained.lots.len(), 2);
        assert_eq!(ledger.peek_remaining("X"), dec!(0));
        assert!(ledger.drain_all("X").lots.is_empty());
    }

    #[test]
    fn test_partial_consumption_keeps_unit_cost() {
        let mut ledger = ledger();
        ledger.append_or_insert("X", Lot::new("b1", at("2023-01-10"), dec!(3), dec!(10)));

        let result = ledger.consume("X", dec!(1));
        let remaining = ledger.queue("X").unwrap().lots().next().unwrap().clone();

        assert_eq!(result.cost + remaining.cost_basis, dec!(10));
        assert_eq!(remaining.quantity, dec!(2));
    }

    #[test]
    fn test_snapshot_lists_instruments() {
        let mut ledger = ledger();
        ledger.append_or_insert("B", Lot::new("b1", at("2023-01-10"), dec!(2), dec!(20)));
        ledger.append_or_insert("A", Lot::new("a1", at("2023-01-10"), dec!(1), dec!(5)));

        let snapshot = ledger.snapshot();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].instrument_id, "A");
        assert_eq!(snapshot[1].cost_basis, dec!(20));
        assert!(!matches!(ledger.check_invariants(), Err(Error::Invariant(_))));
    }
}
