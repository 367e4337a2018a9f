use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `TICKER(ID)` as brokers print it in corporate action descriptions.
    static ref TICKER_ID_REGEX: Regex =
        Regex::new(r"([^\s()]+)\(([^\s()]+)\)").expect("Invalid regex pattern");
}

/// A `TICKER(ID)` reference found in an action comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRef {
    pub ticker: String,
    pub instrument_id: String,
}

/// Every `TICKER(ID)` pair in `comment`, in order of appearance.
pub fn ticker_refs(comment: &str) -> Vec<TickerRef> {
    TICKER_ID_REGEX
        .captures_iter(comment)
        .map(|caps| TickerRef {
            ticker: caps[1].to_string(),
            instrument_id: caps[2].to_string(),
        })
        .collect()
}

/// Parses `YYYY-MM-DD`, `YYYYMMDD`, and either followed by `;HHMMSS`.
pub fn parse_action_date(value: &str) -> Option<DateTime<Utc>> {
    let s = value.trim();

    for layout in ["%Y-%m-%d;%H%M%S", "%Y%m%d;%H%M%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for layout in ["%Y-%m-%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, layout) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}
