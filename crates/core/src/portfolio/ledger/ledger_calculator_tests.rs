#[cfg(test)]
mod tests {
    use crate::activities::{EventKind, NormalizedEvent};
    use crate::errors::{IssueKind, Result};
    use crate::fx::{CurrencyService, FxRateSeries};
    use crate::market_data::{PriceHistoryFetcherTrait, PriceHistoryService, PriceSeries};
    use crate::portfolio::ledger::LedgerCalculator;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(
        day: NaiveDate,
        kind: EventKind,
        amount: Decimal,
        currency: &str,
        symbol: Option<&str>,
        quantity: Decimal,
        index: usize,
    ) -> NormalizedEvent {
        NormalizedEvent {
            effective_date: day,
            kind,
            amount,
            currency: currency.to_string(),
            symbol: symbol.map(|s| s.to_string()),
            quantity_delta: quantity,
            price: None,
            description: String::new(),
            source_index: index,
        }
    }

    // --- Mock price fetcher ---

    struct MockPriceFetcher {
        series: HashMap<String, PriceSeries>,
    }

    #[async_trait]
    impl PriceHistoryFetcherTrait for MockPriceFetcher {
        async fn fetch_price_series(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries> {
            Ok(self
                .series
                .get(symbol)
                .cloned()
                .unwrap_or_else(|| PriceSeries::new(symbol, "CAD")))
        }
    }

    async fn price_service(series: Vec<PriceSeries>) -> PriceHistoryService {
        let symbols: HashSet<String> = series.iter().map(|s| s.symbol.clone()).collect();
        let map = series
            .into_iter()
            .map(|s| (s.symbol.clone(), s))
            .collect::<HashMap<_, _>>();
        let service = PriceHistoryService::new(Arc::new(MockPriceFetcher { series: map }));
        service
            .prefetch(&symbols, date(2024, 12, 1), date(2025, 12, 31))
            .await;
        service
    }

    fn cad_only_currency() -> CurrencyService {
        CurrencyService::new(FxRateSeries::new())
    }

    #[tokio::test]
    async fn test_cash_only_history() {
        let events = vec![
            event(date(2025, 1, 2), EventKind::Funding, dec!(1000), "CAD", None, Decimal::ZERO, 0),
            event(date(2025, 1, 10), EventKind::Income, dec!(75), "CAD", None, Decimal::ZERO, 1),
            event(date(2025, 1, 15), EventKind::Funding, dec!(-25), "CAD", None, Decimal::ZERO, 2),
        ];
        let prices = price_service(vec![]).await;
        let currency = cad_only_currency();
        let calculator = LedgerCalculator::new(&currency, &prices);

        let result = calculator.replay(&events, date(2025, 1, 2), date(2025, 1, 16));

        assert_eq!(result.equity_by_day[&date(2025, 1, 2)], dec!(1000));
        assert_eq!(result.equity_by_day[&date(2025, 1, 9)], dec!(1000));
        assert_eq!(result.equity_by_day[&date(2025, 1, 10)], dec!(1075));
        assert_eq!(result.equity_by_day[&date(2025, 1, 16)], dec!(1050));
        assert!(result.issues.is_empty());
        assert!(result.missing_price_symbols.is_empty());
    }

    #[tokio::test]
    async fn test_trade_is_valued_at_daily_close() {
        let events = vec![
            event(date(2025, 1, 2), EventKind::Funding, dec!(3000), "CAD", None, Decimal::ZERO, 0),
            event(
                date(2025, 1, 3),
                EventKind::Trade,
                dec!(-3000),
                "CAD",
                Some("XEQT.TO"),
                dec!(100),
                1,
            ),
        ];
        let prices = price_service(vec![PriceSeries::from_closes(
            "XEQT.TO",
            "CAD",
            [
                (date(2025, 1, 3), dec!(30)),
                (date(2025, 1, 6), dec!(31)),
            ],
        )])
        .await;
        let currency = cad_only_currency();
        let calculator = LedgerCalculator::new(&currency, &prices);

        let result = calculator.replay(&events, date(2025, 1, 2), date(2025, 1, 7));

        // Buy day: cash is gone, shares worth the close.
        assert_eq!(result.equity_by_day[&date(2025, 1, 3)], dec!(3000));
        // Weekend forward-fills Friday's close.
        assert_eq!(result.equity_by_day[&date(2025, 1, 5)], dec!(3000));
        // Monday's close marks the position up.
        assert_eq!(result.equity_by_day[&date(2025, 1, 6)], dec!(3100));
        assert!(result.issues.is_empty());
    }

    #[tokio::test]
    async fn test_usd_position_and_cash_convert_at_daily_rate() {
        let events = vec![
            event(date(2025, 1, 2), EventKind::Funding, dec!(1400), "CAD", None, Decimal::ZERO, 0),
            // FX conversion pair: CAD out, USD in.
            event(date(2025, 1, 3), EventKind::Other, dec!(-1400), "CAD", None, Decimal::ZERO, 1),
            event(date(2025, 1, 3), EventKind::Other, dec!(1000), "USD", None, Decimal::ZERO, 2),
        ];
        let prices = price_service(vec![]).await;
        let currency = CurrencyService::new(FxRateSeries::from_rates([
            (date(2025, 1, 2), dec!(1.40)),
            (date(2025, 1, 6), dec!(1.42)),
        ]));
        let calculator = LedgerCalculator::new(&currency, &prices);

        let result = calculator.replay(&events, date(2025, 1, 2), date(2025, 1, 6));

        assert_eq!(result.equity_by_day[&date(2025, 1, 2)], dec!(1400));
        // USD cash at the 1.40 rate: no gain on conversion day.
        assert_eq!(result.equity_by_day[&date(2025, 1, 3)], dec!(1400.00));
        // Rate moves to 1.42: USD cash is worth more in base.
        assert_eq!(result.equity_by_day[&date(2025, 1, 6)], dec!(1420.00));
    }

    #[tokio::test]
    async fn test_missing_price_values_at_zero_and_flags() {
        let events = vec![
            event(date(2025, 1, 2), EventKind::Funding, dec!(500), "CAD", None, Decimal::ZERO, 0),
            event(
                date(2025, 1, 3),
                EventKind::Trade,
                dec!(-500),
                "CAD",
                Some("GHOST.TO"),
                dec!(50),
                1,
            ),
        ];
        let prices = price_service(vec![]).await;
        let currency = cad_only_currency();
        let calculator = LedgerCalculator::new(&currency, &prices);

        let result = calculator.replay(&events, date(2025, 1, 2), date(2025, 1, 5));

        // Position contributes zero, not NaN; cash effect still applies.
        assert_eq!(result.equity_by_day[&date(2025, 1, 3)], dec!(0));
        assert!(result.missing_price_symbols.contains("GHOST.TO"));
        // Flagged once, not once per day.
        let price_issues: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::MissingPriceData)
            .collect();
        assert_eq!(price_issues.len(), 1);
        assert_eq!(price_issues[0].symbol.as_deref(), Some("GHOST.TO"));
    }

    #[tokio::test]
    async fn test_journal_legs_move_shares_without_cash() {
        let events = vec![
            event(
                date(2025, 1, 2),
                EventKind::Trade,
                dec!(-1000),
                "CAD",
                Some("DLR.TO"),
                dec!(100),
                0,
            ),
            event(
                date(2025, 1, 8),
                EventKind::InternalJournal,
                Decimal::ZERO,
                "CAD",
                Some("DLR.TO"),
                dec!(-100),
                1,
            ),
            event(
                date(2025, 1, 8),
                EventKind::InternalJournal,
                Decimal::ZERO,
                "USD",
                Some("DLR.U.TO"),
                dec!(100),
                2,
            ),
        ];
        let prices = price_service(vec![
            PriceSeries::from_closes("DLR.TO", "CAD", [(date(2025, 1, 2), dec!(10))]),
            PriceSeries::from_closes("DLR.U.TO", "USD", [(date(2025, 1, 2), dec!(7.14))]),
        ])
        .await;
        let currency =
            CurrencyService::new(FxRateSeries::from_rates([(date(2025, 1, 2), dec!(1.40))]));
        let calculator = LedgerCalculator::new(&currency, &prices);

        let result = calculator.replay(&events, date(2025, 1, 2), date(2025, 1, 9));

        // Before the journal: 100 DLR.TO at 10 CAD, minus the 1000 CAD spent.
        assert_eq!(result.equity_by_day[&date(2025, 1, 7)], dec!(0));
        // After: 100 DLR.U.TO at 7.14 USD x 1.40 = 999.60 CAD. The small
        // drift is the cross-listing spread, not a cash movement.
        assert_eq!(result.equity_by_day[&date(2025, 1, 8)], dec!(-0.40));
    }

    #[tokio::test]
    async fn test_corporate_action_ratio_rescales_position() {
        let mut split = event(
            date(2025, 1, 6),
            EventKind::CorporateAction,
            Decimal::ZERO,
            "CAD",
            Some("XEQT.TO"),
            Decimal::ZERO,
            1,
        );
        split.description = "STOCK SPLIT 2 FOR 1".to_string();
        let events = vec![
            event(
                date(2025, 1, 2),
                EventKind::Trade,
                dec!(-3000),
                "CAD",
                Some("XEQT.TO"),
                dec!(100),
                0,
            ),
            split,
        ];
        let prices = price_service(vec![PriceSeries::from_closes(
            "XEQT.TO",
            "CAD",
            [(date(2025, 1, 2), dec!(30)), (date(2025, 1, 6), dec!(15))],
        )])
        .await;
        let currency = cad_only_currency();
        let calculator = LedgerCalculator::new(&currency, &prices);

        let result = calculator.replay(&events, date(2025, 1, 2), date(2025, 1, 6));

        // 200 shares at the post-split price: value unchanged.
        assert_eq!(result.equity_by_day[&date(2025, 1, 6)], dec!(0));
        assert!(result.issues.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_corporate_action_is_skipped_with_issue() {
        let mut action = event(
            date(2025, 1, 6),
            EventKind::CorporateAction,
            Decimal::ZERO,
            "CAD",
            Some("XEQT.TO"),
            Decimal::ZERO,
            1,
        );
        action.description = "PLAN OF ARRANGEMENT".to_string();
        let events = vec![
            event(
                date(2025, 1, 2),
                EventKind::Trade,
                dec!(-3000),
                "CAD",
                Some("XEQT.TO"),
                dec!(100),
                0,
            ),
            action,
        ];
        let prices = price_service(vec![PriceSeries::from_closes(
            "XEQT.TO",
            "CAD",
            [(date(2025, 1, 2), dec!(30))],
        )])
        .await;
        let currency = cad_only_currency();
        let calculator = LedgerCalculator::new(&currency, &prices);

        let result = calculator.replay(&events, date(2025, 1, 2), date(2025, 1, 6));

        // Holdings unchanged, issue recorded.
        assert_eq!(result.equity_by_day[&date(2025, 1, 6)], dec!(0));
        assert!(result
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::CorporateActionSkipped));
    }

    #[tokio::test]
    async fn test_unsupported_cash_currency_is_skipped_once() {
        let events = vec![
            event(date(2025, 1, 2), EventKind::Funding, dec!(100), "CAD", None, Decimal::ZERO, 0),
            event(date(2025, 1, 2), EventKind::Income, dec!(10), "EUR", None, Decimal::ZERO, 1),
        ];
        let prices = price_service(vec![]).await;
        let currency = cad_only_currency();
        let calculator = LedgerCalculator::new(&currency, &prices);

        let result = calculator.replay(&events, date(2025, 1, 2), date(2025, 1, 5));

        // EUR cash is excluded from every valuation, flagged once.
        assert_eq!(result.equity_by_day[&date(2025, 1, 5)], dec!(100));
        let unsupported: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::UnsupportedCurrency)
            .collect();
        assert_eq!(unsupported.len(), 1);
    }

    #[tokio::test]
    async fn test_events_before_period_start_fold_into_opening_state() {
        let events = vec![
            event(date(2024, 12, 15), EventKind::Funding, dec!(1000), "CAD", None, Decimal::ZERO, 0),
            event(date(2024, 12, 20), EventKind::Income, dec!(50), "CAD", None, Decimal::ZERO, 1),
        ];
        let prices = price_service(vec![]).await;
        let currency = cad_only_currency();
        let calculator = LedgerCalculator::new(&currency, &prices);

        let result = calculator.replay(&events, date(2025, 1, 1), date(2025, 1, 3));

        assert_eq!(result.equity_by_day[&date(2025, 1, 1)], dec!(1050));
    }
}
