use crate::fx::fx_errors::FxError;
use crate::fx::fx_model::PublishedRate;
use crate::fx::fx_traits::RateSourceTrait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Rate source backed by a fixed set of publications, one time-series per currency.
///
/// `fetch_nearest` is a bidirectional nearest-neighbour lookup limited to
/// `alias_window_days`; on equal distance the earlier publication wins.
pub struct InMemoryRateSource {
    /// Key: currency code. Value: publications by date.
    rates: HashMap<String, BTreeMap<NaiveDate, PublishedRate>>,
    alias_window_days: i64,
}

impl InMemoryRateSource {
    pub fn new(published: Vec<PublishedRate>, alias_window_days: i64) -> Self {
        let mut source = InMemoryRateSource {
            rates: HashMap::new(),
            alias_window_days,
        };
        source.add_published_rates(published);
        source
    }

    /// Adds publications. A later publication for the same currency and date replaces the earlier one.
    pub fn add_published_rates(&mut self, published: Vec<PublishedRate>) {
        for rate in published {
            if rate.unit_rate().is_none() {
                log::warn!(
                    "Ignoring unusable {} rate {} per {} on {}",
                    rate.currency,
                    rate.rate,
                    rate.amount,
                    rate.date
                );
                continue;
            }
            let currency = rate.currency.trim().to_uppercase();
            self.rates
                .entry(currency)
                .or_default()
                .insert(rate.date, rate);
        }
    }

    pub fn currencies(&self) -> impl Iterator<Item = &String> {
        self.rates.keys()
    }
}

impl RateSourceTrait for InMemoryRateSource {
    fn fetch_nearest(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<PublishedRate>, FxError> {
        let Some(history) = self.rates.get(currency) else {
            return Ok(None);
        };

        let prev = history.range(..=date).next_back();
        let next = history.range(date..).next();

        let nearest = match (prev, next) {
            (Some((d1, r1)), Some((d2, r2))) => {
                if d1 == d2 {
                    return Ok(Some(r1.clone()));
                }
                let dist_prev = (date - *d1).num_days().abs();
                let dist_next = (*d2 - date).num_days().abs();
                if dist_prev <= dist_next {
                    Some((dist_prev, r1))
                } else {
                    Some((dist_next, r2))
                }
            }
            (Some((d, r)), None) => Some(((date - *d).num_days().abs(), r)),
            (None, Some((d, r))) => Some(((*d - date).num_days().abs(), r)),
            (None, None) => None,
        };

        Ok(nearest
            .filter(|(distance, _)| *distance <= self.alias_window_days)
            .map(|(_, rate)| rate.clone()))
    }

    fn latest_on_or_before(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<PublishedRate>, FxError> {
        Ok(self
            .rates
            .get(currency)
            .and_then(|history| history.range(..=date).next_back())
            .map(|(_, rate)| rate.clone()))
    }
}
