//! FX (Foreign Exchange) module - rate models, sources, and the historical resolver.

mod fx_errors;
mod fx_model;
mod fx_traits;
mod rate_resolver;
mod rate_source;

pub use fx_errors::FxError;
pub use fx_model::{PublishedRate, ResolvedRate};
pub use fx_traits::{RateResolverTrait, RateSourceTrait};
pub use rate_resolver::HistoricalRateResolver;
pub use rate_source::InMemoryRateSource;
