#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::diagnostics::DiagnosticKind;
    use crate::reports::{CostBasisService, CostBasisServiceTrait, RunRequest};
    use crate::settlement::CoverageStatus;
    use rust_decimal_macros::dec;

    fn request(json: &str) -> RunRequest {
        serde_json::from_str(json).expect("valid request")
    }

    const TWO_YEARS: &str = r#"{
        "owner": "jane",
        "taxYear": 2023,
        "reportingCurrency": "USD",
        "operations": [
            {"id": "b1", "kind": "BUY", "instrumentId": "ACME", "timestamp": "2022-03-01",
             "quantity": "100", "unitPrice": "10.00", "commission": "10.00", "currency": "USD"},
            {"id": "s0", "kind": "SELL", "instrumentId": "ACME", "timestamp": "2022-06-01",
             "quantity": 10, "unitPrice": 11, "commission": 0, "currency": "USD"},
            {"id": "b2", "kind": "buy", "instrumentId": "ACME", "timestamp": "2023-01-03T10:00:00Z",
             "quantity": "100", "unitPrice": "12.00", "commission": "10.00", "currency": "USD"},
            {"id": "s1", "kind": "sell", "instrumentId": "ACME", "timestamp": "2023-03-01",
             "quantity": "140", "unitPrice": "20.00", "commission": "15.00", "currency": "USD"}
        ]
    }"#;

    #[test]
    fn test_run_reports_only_sales_of_the_tax_year() {
        let service = CostBasisService::default();
        let report = service.run(request(TWO_YEARS)).unwrap();

        assert_eq!(report.owner, "jane");
        assert_eq!(report.reporting_currency, "USD");
        assert_eq!(report.sales.len(), 1);

        // 90 left of b1 at 10.10, then 50 of b2 at 12.10, plus 15 commission
        let sale = &report.sales[0];
        assert_eq!(sale.sale_id, "s1");
        assert_eq!(sale.realized_cost, dec!(1529.00));
        assert_eq!(sale.status, CoverageStatus::FullyCoveredByPast);

        assert_eq!(report.summary.proceeds, dec!(2800.00));
        assert_eq!(report.summary.cost, dec!(1529.00));
        assert_eq!(report.summary.profit, dec!(1271.00));
        assert_eq!(report.summary.unresolved_sales, 0);
        assert!(!report.had_error);

        assert_eq!(report.ledger.len(), 1);
        assert_eq!(report.ledger[0].quantity, dec!(50));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut shuffled = request(TWO_YEARS);
        shuffled.operations.reverse();

        let service = CostBasisService::default();
        let sorted = service.run(request(TWO_YEARS)).unwrap();
        let reversed = service.run(shuffled).unwrap();

        assert_eq!(sorted.sales, reversed.sales);
        assert_eq!(sorted.summary, reversed.summary);
    }

    #[test]
    fn test_malformed_records_are_reported_and_skipped() {
        let json = r#"{
            "owner": "jane",
            "taxYear": 2023,
            "operations": [
                {"id": "b1", "kind": "BUY", "instrumentId": "ACME", "timestamp": "2023-01-02",
                 "quantity": "10", "unitPrice": "abc", "commission": "1", "currency": "USD"},
                {"id": "b1", "kind": "BUY", "instrumentId": "ACME", "timestamp": "2023-01-02",
                 "quantity": "10", "unitPrice": "10", "commission": "1", "currency": "USD"},
                {"id": "x1", "kind": "DIVIDEND", "instrumentId": "ACME", "timestamp": "2023-01-02",
                 "quantity": "1", "currency": "USD"},
                {"id": "s1", "kind": "SELL", "instrumentId": "ACME", "timestamp": "2023-02-01",
                 "quantity": "10", "unitPrice": "5", "commission": "0", "currency": "USD"}
            ]
        }"#;

        let report = CostBasisService::default().run(request(json)).unwrap();

        assert!(report.had_error);
        assert_eq!(
            report.diagnostics.count_of(DiagnosticKind::MalformedOperation),
            3
        );
        // Only the first b1 survives, with price defaulted to zero.
        assert_eq!(report.sales[0].realized_cost, dec!(1));
        assert_eq!(report.summary.profit, dec!(49));
    }

    #[test]
    fn test_unresolved_sales_are_counted_not_summed() {
        let json = r#"{
            "owner": "jane",
            "taxYear": 2023,
            "operations": [
                {"id": "b1", "kind": "BUY", "instrumentId": "SAP", "timestamp": "2023-01-02",
                 "quantity": "10", "unitPrice": "100", "currency": "EUR"},
                {"id": "s1", "kind": "SELL", "instrumentId": "SAP", "timestamp": "2023-06-01",
                 "quantity": "5", "unitPrice": "120", "currency": "EUR"},
                {"id": "s2", "kind": "SELL", "instrumentId": "SAP", "timestamp": "2023-06-02",
                 "quantity": "5", "unitPrice": "130", "currency": "EUR", "exchangeRate": "1.2"}
            ],
            "exchangeRates": [
                {"currency": "EUR", "date": "2023-01-02", "rate": "1.1"},
                {"currency": "EUR", "date": "2023-06-02", "rate": "1.2"}
            ]
        }"#;

        let config = EngineConfig {
            alias_window_days: 0,
            ..EngineConfig::default()
        };
        let report = CostBasisService::new(config).run(request(json)).unwrap();

        // s1 falls back to the January rate; nothing is unresolved
        assert!(!report.had_error);
        assert_eq!(report.summary.unresolved_sales, 0);
        assert_eq!(report.sales[0].proceeds, Some(dec!(660.0)));
        assert_eq!(report.summary.proceeds, dec!(1440.00));
        assert_eq!(report.summary.cost, dec!(1100.00));
    }

    #[test]
    fn test_missing_rate_excludes_sale_from_totals() {
        let json = r#"{
            "owner": "jane",
            "taxYear": 2023,
            "operations": [
                {"id": "b1", "kind": "BUY", "instrumentId": "ACME", "timestamp": "2023-01-02",
                 "quantity": "10", "unitPrice": "100", "currency": "USD"},
                {"id": "s1", "kind": "SELL", "instrumentId": "ACME", "timestamp": "2023-06-01",
                 "quantity": "5", "unitPrice": "120", "currency": "GBP"},
                {"id": "s2", "kind": "SELL", "instrumentId": "ACME", "timestamp": "2023-06-02",
                 "quantity": "5", "unitPrice": "130", "currency": "USD"}
            ]
        }"#;

        let report = CostBasisService::default().run(request(json)).unwrap();

        assert!(report.had_error);
        assert_eq!(report.summary.unresolved_sales, 1);
        assert_eq!(report.summary.proceeds, dec!(650.00));
        assert_eq!(report.summary.cost, dec!(500.00));
        assert_eq!(report.summary.profit, dec!(150.00));
    }

    #[test]
    fn test_short_covered_without_rate_is_left_out_of_totals() {
        let json = r#"{
            "owner": "jane",
            "taxYear": 2023,
            "operations": [
                {"id": "s1", "kind": "SELL", "instrumentId": "ACME", "timestamp": "2023-06-01",
                 "quantity": "5", "unitPrice": "10", "commission": "1", "currency": "USD"},
                {"id": "b1", "kind": "BUY", "instrumentId": "ACME", "timestamp": "2023-06-05",
                 "quantity": "5", "unitPrice": "8", "currency": "CHF"}
            ]
        }"#;

        let report = CostBasisService::default().run(request(json)).unwrap();

        assert!(report.had_error);
        assert_eq!(report.summary.unresolved_sales, 1);
        assert_eq!(report.summary.open_shorts, 0);
        assert_eq!(report.summary.proceeds, dec!(0));
        assert_eq!(report.summary.cost, dec!(0));
    }

    #[test]
    fn test_open_shorts_are_summarized() {
        let json = r#"{
            "owner": "jane",
            "taxYear": 2023,
            "operations": [
                {"id": "s1", "kind": "SELL", "instrumentId": "ACME", "timestamp": "2023-06-01",
                 "quantity": "5", "unitPrice": "10", "commission": "1", "currency": "USD"}
            ]
        }"#;

        let report = CostBasisService::default().run(request(json)).unwrap();

        assert!(!report.had_error);
        assert_eq!(report.summary.open_shorts, 1);
        assert_eq!(report.shorts.len(), 1);
        assert_eq!(report.shorts[0].outstanding, dec!(5));
        assert_eq!(report.diagnostics.count_of(DiagnosticKind::OpenShort), 1);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = CostBasisService::default().run(request(TWO_YEARS)).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["taxYear"], 2023);
        assert_eq!(value["hadError"], false);
        assert_eq!(value["sales"][0]["status"], "FULLY_COVERED_BY_PAST");
        assert!(value["summary"]["unresolvedSales"].is_number());
        assert_eq!(value["summary"]["cost"], "1529.00");
    }
}
