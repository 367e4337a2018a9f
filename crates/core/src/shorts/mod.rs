//! Shorts module - sales that exceeded known holdings, waiting for later purchases.

mod short_tracker;
mod shorts_model;

pub use short_tracker::ShortTracker;
pub use shorts_model::ShortEntry;
