/// Reporting currency used when neither the request nor the environment names one
pub const DEFAULT_REPORTING_CURRENCY: &str = "USD";

/// Upper bound on corporate-action applications attempted while settling one sale.
/// Guards against malformed conversion chains that would otherwise never converge.
pub const DEFAULT_MAX_CONVERSION_ATTEMPTS: u32 = 7;

/// Quantities at or below this magnitude are treated as zero
pub const QUANTITY_EPSILON: &str = "0.000001";

/// Maximum distance in days between a requested date and the upstream
/// publication an exchange rate may be aliased from
pub const DEFAULT_ALIAS_WINDOW_DAYS: i64 = 7;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;
