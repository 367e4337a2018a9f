use super::fx_errors::FxError;
use super::fx_model::{PublishedRate, ResolvedRate};
use super::fx_traits::{RateResolverTrait, RateSourceTrait};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Resolves historical rates through a [`RateSourceTrait`], remembering every
/// answer so repeated lookups for the same day never reach the source again.
///
/// Aliased answers are cached under the requested date with `exact = false`,
/// next to the publication itself under its own date.
#[derive(Clone)]
pub struct HistoricalRateResolver {
    reporting_currency: String,
    source: Arc<dyn RateSourceTrait>,
    cache: Arc<RwLock<HashMap<String, BTreeMap<NaiveDate, ResolvedRate>>>>,
}

impl HistoricalRateResolver {
    pub fn new(reporting_currency: &str, source: Arc<dyn RateSourceTrait>) -> Self {
        Self {
            reporting_currency: reporting_currency.trim().to_uppercase(),
            source,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn cached(&self, currency: &str, date: NaiveDate) -> Result<Option<ResolvedRate>, FxError> {
        let cache = self
            .cache
            .read()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        Ok(cache
            .get(currency)
            .and_then(|history| history.get(&date))
            .copied())
    }

    fn latest_cached_on_or_before(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<ResolvedRate>, FxError> {
        let cache = self
            .cache
            .read()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        Ok(cache
            .get(currency)
            .and_then(|history| {
                history
                    .range(..=date)
                    .rev()
                    .find(|(cached_date, rate)| rate.rate_date == **cached_date)
            })
            .map(|(_, rate)| *rate))
    }

    fn remember(&self, currency: &str, date: NaiveDate, rate: ResolvedRate) -> Result<(), FxError> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        cache
            .entry(currency.to_string())
            .or_default()
            .insert(date, rate);
        Ok(())
    }

    /// Turns a publication into a resolved rate for `requested` and caches it.
    fn adopt(
        &self,
        currency: &str,
        requested: NaiveDate,
        published: &PublishedRate,
    ) -> Result<Option<ResolvedRate>, FxError> {
        let Some(unit_rate) = published.unit_rate() else {
            warn!(
                "Rate source returned unusable {} rate {} per {} for {}",
                currency, published.rate, published.amount, published.date
            );
            return Ok(None);
        };

        let at_publication = ResolvedRate {
            unit_rate,
            rate_date: published.date,
            exact: true,
        };
        self.remember(currency, published.date, at_publication)?;

        if published.date == requested {
            return Ok(Some(at_publication));
        }

        let aliased = ResolvedRate {
            exact: false,
            ..at_publication
        };
        self.remember(currency, requested, aliased)?;
        Ok(Some(aliased))
    }
}

impl RateResolverTrait for HistoricalRateResolver {
    fn reporting_currency(&self) -> &str {
        &self.reporting_currency
    }

    fn resolve_rate(&self, currency: &str, date: NaiveDate) -> Result<ResolvedRate, FxError> {
        let currency = currency.trim().to_uppercase();
        if currency == self.reporting_currency {
            return Ok(ResolvedRate::identity(date));
        }

        if let Some(hit) = self.cached(&currency, date)? {
            return Ok(hit);
        }

        match self.source.fetch_nearest(&currency, date) {
            Ok(Some(published)) => {
                if let Some(resolved) = self.adopt(&currency, date, &published)? {
                    debug!(
                        "Resolved {} for {} from publication dated {}",
                        currency, date, resolved.rate_date
                    );
                    return Ok(resolved);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(
                "Rate source failed for {} on {}: {}. Falling back to earlier rates.",
                currency, date, e
            ),
        }

        if let Some(previous) = self.latest_cached_on_or_before(&currency, date)? {
            let fallback = ResolvedRate {
                exact: false,
                ..previous
            };
            self.remember(&currency, date, fallback)?;
            return Ok(fallback);
        }

        match self.source.latest_on_or_before(&currency, date) {
            Ok(Some(published)) => {
                if let Some(resolved) = self.adopt(&currency, date, &published)? {
                    return Ok(resolved);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(
                "Rate source failed for latest {} rate before {}: {}",
                currency, date, e
            ),
        }

        Err(FxError::RateUnresolved { currency, date })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::InMemoryRateSource;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    struct CountingSource {
        inner: InMemoryRateSource,
        calls: AtomicUsize,
    }

    impl RateSourceTrait for CountingSource {
        fn fetch_nearest(
            &self,
            currency: &str,
            date: NaiveDate,
        ) -> Result<Option<PublishedRate>, FxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_nearest(currency, date)
        }

        fn latest_on_or_before(
            &self,
            currency: &str,
            date: NaiveDate,
        ) -> Result<Option<PublishedRate>, FxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.latest_on_or_before(currency, date)
        }
    }

    struct FailingSource;

    impl RateSourceTrait for FailingSource {
        fn fetch_nearest(&self, _: &str, _: NaiveDate) -> Result<Option<PublishedRate>, FxError> {
            Err(FxError::SourceUnavailable("offline".to_string()))
        }

        fn latest_on_or_before(
            &self,
            _: &str,
            _: NaiveDate,
        ) -> Result<Option<PublishedRate>, FxError> {
            Err(FxError::SourceUnavailable("offline".to_string()))
        }
    }

    fn resolver_with(rates: Vec<PublishedRate>) -> (HistoricalRateResolver, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            inner: InMemoryRateSource::new(rates, 3),
            calls: AtomicUsize::new(0),
        });
        (HistoricalRateResolver::new("CZK", source.clone()), source)
    }

    #[test]
    fn test_reporting_currency_is_identity() {
        let (resolver, source) = resolver_with(vec![]);
        let rate = resolver.resolve_rate("czk", d(2023, 1, 2)).unwrap();
        assert_eq!(rate.unit_rate, dec!(1));
        assert!(rate.exact);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_exact_hit_is_cached() {
        let (resolver, source) =
            resolver_with(vec![PublishedRate::new("USD", d(2023, 3, 1), dec!(22.1))]);

        let first = resolver.resolve_rate("USD", d(2023, 3, 1)).unwrap();
        let second = resolver.resolve_rate("USD", d(2023, 3, 1)).unwrap();

        assert_eq!(first, second);
        assert!(first.exact);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_weekend_is_aliased_to_nearest_publication() {
        // Friday publication, Saturday trade
        let (resolver, _) =
            resolver_with(vec![PublishedRate::new("USD", d(2023, 3, 3), dec!(22.0))]);

        let rate = resolver.resolve_rate("USD", d(2023, 3, 4)).unwrap();
        assert_eq!(rate.unit_rate, dec!(22.0));
        assert_eq!(rate.rate_date, d(2023, 3, 3));
        assert!(!rate.exact);

        let publication_day = resolver.resolve_rate("USD", d(2023, 3, 3)).unwrap();
        assert!(publication_day.exact);
    }

    #[test]
    fn test_falls_back_to_latest_rate_beyond_alias_window() {
        let (resolver, _) =
            resolver_with(vec![PublishedRate::new("EUR", d(2023, 1, 2), dec!(24.1))]);

        let rate = resolver.resolve_rate("EUR", d(2023, 2, 20)).unwrap();
        assert_eq!(rate.unit_rate, dec!(24.1));
        assert_eq!(rate.rate_date, d(2023, 1, 2));
        assert!(!rate.exact);
    }

    #[test]
    fn test_no_rate_before_date_is_unresolved() {
        let (resolver, _) =
            resolver_with(vec![PublishedRate::new("EUR", d(2023, 6, 1), dec!(24.1))]);

        let err = resolver.resolve_rate("EUR", d(2023, 1, 2)).unwrap_err();
        assert_eq!(
            err,
            FxError::RateUnresolved {
                currency: "EUR".to_string(),
                date: d(2023, 1, 2)
            }
        );
    }

    #[test]
    fn test_source_failure_is_unresolved_not_panic() {
        let resolver = HistoricalRateResolver::new("CZK", Arc::new(FailingSource));
        assert!(matches!(
            resolver.resolve_rate("USD", d(2023, 1, 2)),
            Err(FxError::RateUnresolved { .. })
        ));
    }
}
