use super::fx_errors::FxError;
use super::fx_model::{PublishedRate, ResolvedRate};
use chrono::NaiveDate;

/// Upstream publisher of daily exchange rates against the reporting currency.
pub trait RateSourceTrait: Send + Sync {
    /// Returns the publication nearest to `date`, within whatever window the
    /// source considers valid. A non-exact date means the caller may alias it.
    fn fetch_nearest(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<PublishedRate>, FxError>;

    /// Returns the latest publication dated on or before `date`, however old.
    fn latest_on_or_before(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<PublishedRate>, FxError>;
}

/// Resolves the reporting-currency value of one unit of `currency` on `date`.
pub trait RateResolverTrait: Send + Sync {
    fn reporting_currency(&self) -> &str;

    /// Fallback order: exact-date hit, nearest upstream publication aliased to
    /// `date`, latest known rate on or before `date`. Anything else is
    /// [`FxError::RateUnresolved`].
    fn resolve_rate(&self, currency: &str, date: NaiveDate) -> Result<ResolvedRate, FxError>;
}
