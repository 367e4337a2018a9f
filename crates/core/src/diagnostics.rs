//! Structured diagnostics collected while a run is settled.
//!
//! Nothing recorded here stops processing. A run is reported as having errors
//! when at least one [`Severity::Error`] diagnostic was pushed; warnings only
//! mark results a person should review.

use chrono::NaiveDate;
use log::{error, warn};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// No exchange rate could be resolved for a non-reporting-currency amount.
    RateUnresolved,
    /// A corporate action node failed validation (missing debit pair, bad date, bad quantity).
    ConversionParseError,
    /// An operation record had a non-numeric or out-of-range field.
    MalformedOperation,
    /// A sale stayed uncovered after the maximum number of conversion attempts.
    ConversionRetryBoundExceeded,
    /// A sale still has uncovered quantity at the end of the run.
    OpenShort,
    /// A conversion drained holdings without crediting any new quantity.
    ConversionRemovedHoldings,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::RateUnresolved => "RATE_UNRESOLVED",
            DiagnosticKind::ConversionParseError => "CONVERSION_PARSE_ERROR",
            DiagnosticKind::MalformedOperation => "MALFORMED_OPERATION",
            DiagnosticKind::ConversionRetryBoundExceeded => "CONVERSION_RETRY_BOUND_EXCEEDED",
            DiagnosticKind::OpenShort => "OPEN_SHORT",
            DiagnosticKind::ConversionRemovedHoldings => "CONVERSION_REMOVED_HOLDINGS",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    fn new(kind: DiagnosticKind, severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            severity,
            operation_id: None,
            instrument_id: None,
            date: None,
            message: message.into(),
        }
    }

    pub fn for_operation(mut self, operation_id: &str) -> Self {
        self.operation_id = Some(operation_id.to_string());
        self
    }

    pub fn for_instrument(mut self, instrument_id: &str) -> Self {
        self.instrument_id = Some(instrument_id.to_string());
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.kind.as_str())?;
        if let Some(operation_id) = &self.operation_id {
            write!(f, " operation {}", operation_id)?;
        }
        if let Some(instrument_id) = &self.instrument_id {
            write!(f, " instrument {}", instrument_id)?;
        }
        if let Some(date) = &self.date {
            write!(f, " on {}", date)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered collection of diagnostics for one run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic and logs it at the matching level.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => error!("{}", diagnostic),
            Severity::Warning => warn!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn had_error(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }
}
