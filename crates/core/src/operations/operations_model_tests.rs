#[cfg(test)]
mod tests {
    use crate::diagnostics::{DiagnosticKind, Diagnostics};
    use crate::operations::{
        first_out_of_order, parse_timestamp, sort_chronologically, Operation, OperationKind,
        RawDecimal, RawOperation,
    };
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn raw(kind: &str, quantity: &str, price: &str, commission: &str) -> RawOperation {
        RawOperation {
            id: Some("t-1".to_string()),
            kind: kind.to_string(),
            instrument_id: "US0378331005".to_string(),
            timestamp: "2023-04-03".to_string(),
            quantity: Some(RawDecimal::Text(quantity.to_string())),
            unit_price: Some(RawDecimal::Text(price.to_string())),
            commission: Some(RawDecimal::Text(commission.to_string())),
            currency: "usd".to_string(),
            commission_currency: None,
            exchange_rate: None,
            source_id: Some("statement-2023.xml".to_string()),
        }
    }

    #[test]
    fn test_normalize_valid_buy() {
        let mut diagnostics = Diagnostics::new();
        let op = raw("buy", "10", "150.25", "-1.5")
            .normalize(0, &mut diagnostics)
            .unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(op.kind, OperationKind::Buy);
        assert_eq!(op.quantity, dec!(10));
        assert_eq!(op.unit_price, dec!(150.25));
        assert_eq!(op.commission, dec!(1.5));
        assert_eq!(op.currency, "USD");
        assert_eq!(op.trade_date(), NaiveDate::from_ymd_opt(2023, 4, 3).unwrap());
    }

    #[test]
    fn test_non_numeric_commission_defaults_to_zero_and_flags() {
        let mut diagnostics = Diagnostics::new();
        let op = raw("SELL", "5", "20", "n/a")
            .normalize(0, &mut diagnostics)
            .unwrap();

        assert_eq!(op.commission, dec!(0));
        assert!(diagnostics.had_error());
        assert_eq!(diagnostics.count_of(DiagnosticKind::MalformedOperation), 1);
    }

    #[test]
    fn test_non_positive_quantity_is_skipped_without_error() {
        let mut diagnostics = Diagnostics::new();
        assert!(raw("SELL", "-5", "20", "0")
            .normalize(0, &mut diagnostics)
            .is_none());
        assert!(raw("BUY", "0", "20", "0")
            .normalize(1, &mut diagnostics)
            .is_none());

        assert_eq!(diagnostics.len(), 2);
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn test_non_numeric_quantity_is_skipped_with_error() {
        let mut diagnostics = Diagnostics::new();
        assert!(raw("BUY", "ten", "20", "0")
            .normalize(0, &mut diagnostics)
            .is_none());
        assert!(diagnostics.had_error());
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let mut diagnostics = Diagnostics::new();
        assert!(raw("DIVIDEND", "1", "1", "0")
            .normalize(0, &mut diagnostics)
            .is_none());
        assert_eq!(diagnostics.count_of(DiagnosticKind::MalformedOperation), 1);
    }

    #[test]
    fn test_json_numbers_and_scientific_notation() {
        let json = r#"{
            "kind": "BUY",
            "instrumentId": "XYZ",
            "timestamp": "20230105;093000",
            "quantity": 1.5e2,
            "unitPrice": "1E1",
            "currency": "EUR",
            "exchangeRate": 24.5
        }"#;
        let raw: RawOperation = serde_json::from_str(json).unwrap();
        let mut diagnostics = Diagnostics::new();
        let op = raw.normalize(4, &mut diagnostics).unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(op.id, "op-5");
        assert_eq!(op.quantity, dec!(150));
        assert_eq!(op.unit_price, dec!(10));
        assert_eq!(op.exchange_rate, Some(dec!(24.5)));
        assert_eq!(
            op.timestamp,
            Utc.with_ymd_and_hms(2023, 1, 5, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        let expected = Utc.with_ymd_and_hms(2022, 12, 30, 15, 45, 10).unwrap();
        assert_eq!(parse_timestamp("2022-12-30T15:45:10Z"), Some(expected));
        assert_eq!(parse_timestamp("2022-12-30 15:45:10"), Some(expected));
        assert_eq!(parse_timestamp("2022-12-30;154510"), Some(expected));
        assert_eq!(parse_timestamp("2022-12-30, 15:45:10"), Some(expected));
        assert!(parse_timestamp("30/12/2022").is_none());
    }

    #[test]
    fn test_sort_puts_acquisitions_before_sales_on_same_timestamp() {
        let at = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2023, 6, 2, 0, 0, 0).unwrap();
        let mut operations = vec![
            Operation::new("s1", OperationKind::Sell, "X", at, dec!(1), dec!(1), dec!(0), "USD"),
            Operation::new("b2", OperationKind::Buy, "X", later, dec!(1), dec!(1), dec!(0), "USD"),
            Operation::new("b1", OperationKind::Buy, "X", at, dec!(1), dec!(1), dec!(0), "USD"),
            Operation::new(
                "h1",
                OperationKind::InitialHolding,
                "X",
                at,
                dec!(1),
                dec!(1),
                dec!(0),
                "USD",
            ),
        ];
        assert_eq!(first_out_of_order(&operations), Some(2));

        sort_chronologically(&mut operations);

        let ids: Vec<&str> = operations.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["h1", "b1", "s1", "b2"]);
        assert_eq!(first_out_of_order(&operations), None);
    }
}
