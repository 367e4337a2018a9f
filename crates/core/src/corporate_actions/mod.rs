//! Corporate actions module - security conversions that move holdings between instruments.

mod action_resolver;
mod comment_parser;
mod corporate_actions_constants;
mod corporate_actions_model;


pub use action_resolver::{validate_conversion, CorporateActionResolver};
pub use comment_parser::{parse_action_date, ticker_refs, TickerRef};
pub use corporate_actions_constants::*;
pub use corporate_actions_model::{ActionNode, ConversionEvent, ConversionOutcome, SourceDataset};
