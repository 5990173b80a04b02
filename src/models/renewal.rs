//! Loan renewal form and the renewal date rule
//!
//! A librarian may push the due date of a borrowed copy to any day between
//! today and four weeks from today, both inclusive. A fresh form proposes
//! three weeks from today.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::book_instance::BookInstance;

/// Longest allowed renewal, counted from today
pub const MAX_RENEWAL_WEEKS: i64 = 4;
/// Renewal proposed by an unbound form
pub const DEFAULT_RENEWAL_WEEKS: i64 = 3;

pub const RENEWAL_DATE_FIELD: &str = "renewal_date";
pub const RENEWAL_DATE_LABEL: &str = "renewal date";
pub const RENEWAL_DATE_HELP: &str = "Enter a date between now and 4 weeks (default 3).";

/// Why a proposed renewal date was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalDateError {
    Missing,
    Malformed,
    InPast,
    TooFarAhead,
}

impl RenewalDateError {
    pub fn message(&self) -> &'static str {
        match self {
            RenewalDateError::Missing => "This field is required.",
            RenewalDateError::Malformed => "Enter a valid date.",
            RenewalDateError::InPast => "Invalid date - renewal in past",
            RenewalDateError::TooFarAhead => "Invalid date - renewal more than 4 weeks ahead",
        }
    }
}

impl std::fmt::Display for RenewalDateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Date proposed by an unbound renewal form
pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(DEFAULT_RENEWAL_WEEKS)
}

/// Last acceptable renewal date
pub fn latest_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(MAX_RENEWAL_WEEKS)
}

/// Check a proposed due date against `today`
pub fn validate_renewal_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, RenewalDateError> {
    if date < today {
        return Err(RenewalDateError::InPast);
    }
    if date > latest_renewal_date(today) {
        return Err(RenewalDateError::TooFarAhead);
    }
    Ok(date)
}

/// Datetime layouts truncated to their date; the whole value must match
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_renewal_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|dt| dt.date())
    })
}

/// Parse then validate the raw form value
pub fn clean_renewal_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, RenewalDateError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or(RenewalDateError::Missing)?;
    let date = parse_renewal_date(raw).ok_or(RenewalDateError::Malformed)?;
    validate_renewal_date(date, today)
}

/// Submitted renewal form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RenewBookForm {
    /// Proposed due date, `YYYY-MM-DD`
    pub renewal_date: Option<String>,
}

/// Renewal form as presented to the librarian, either fresh or echoed back with errors
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RenewalFormView {
    pub book_instance: BookInstance,
    pub renewal_date: Option<String>,
    pub label: String,
    pub help_text: String,
    /// Field name to error messages, empty for an unbound form
    pub errors: BTreeMap<String, Vec<String>>,
}

impl RenewalFormView {
    /// Fresh form proposing the default renewal date
    pub fn unbound(book_instance: BookInstance, today: NaiveDate) -> Self {
        Self {
            book_instance,
            renewal_date: Some(default_renewal_date(today).format("%Y-%m-%d").to_string()),
            label: RENEWAL_DATE_LABEL.to_string(),
            help_text: RENEWAL_DATE_HELP.to_string(),
            errors: BTreeMap::new(),
        }
    }

    /// Submitted form echoed back with the error on the date field
    pub fn rejected(book_instance: BookInstance, form: RenewBookForm, error: RenewalDateError) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(RENEWAL_DATE_FIELD.to_string(), vec![error.message().to_string()]);
        Self {
            book_instance,
            renewal_date: form.renewal_date,
            label: RENEWAL_DATE_LABEL.to_string(),
            help_text: RENEWAL_DATE_HELP.to_string(),
            errors,
        }
    }
}

/// Result of submitting a renewal
#[derive(Debug, Clone, PartialEq)]
pub enum RenewalOutcome {
    /// Due date updated and persisted
    Renewed(BookInstance),
    /// Nothing persisted, form to present again
    Rejected(RenewalFormView),
}
