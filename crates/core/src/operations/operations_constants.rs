/// Operation kinds
///
/// The closed set of records the settlement engine accepts.

/// Holding carried into the run from before the first statement. Treated as an acquisition.
pub const OPERATION_KIND_INITIAL_HOLDING: &str = "INITIAL_HOLDING";

/// Purchase of an instrument. Covers open short entries first, the rest becomes a lot.
pub const OPERATION_KIND_BUY: &str = "BUY";

/// Disposal of an instrument. Consumes lots oldest first.
pub const OPERATION_KIND_SELL: &str = "SELL";
