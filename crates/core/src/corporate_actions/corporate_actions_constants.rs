/// Action types that denote a security conversion (compared case-insensitively).
pub const CONVERSION_ACTION_TYPES: [&str; 3] = ["CONVERSION", "TC", "IC"];

/// Asset classes a conversion may move between.
pub const SECURITY_ASSET_CLASSES: [&str; 2] = ["STK", "SECURITY"];
