// src/dates.rs

//! Expansion of a date specification into the ordered list of EOD dates a
//! flow runs for.
//!
//! Two forms are accepted:
//! - `yyyy-MM-dd:yyyy-MM-dd`: inclusive range, one entry per calendar day;
//! - `a,b,c`: explicit list, returned verbatim without validation.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;

use crate::errors::{Result, RunnerError};

/// Date format used for parsing ranges and formatting expanded dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// chrono accepts `2022-1-1` and a leading sign under DATE_FORMAT.
static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date shape pattern is valid"));

pub fn expand(spec: &str) -> Result<Vec<String>> {
    if spec.contains(':') {
        expand_range(spec)
    } else {
        Ok(spec.split(',').map(str::to_string).collect())
    }
}

fn expand_range(spec: &str) -> Result<Vec<String>> {
    let parts: Vec<&str> = spec.split(':').collect();
    let [start, end] = parts.as_slice() else {
        return Err(RunnerError::ConfigError(format!(
            "improper range format '{spec}': should be yyyy-MM-dd:yyyy-MM-dd"
        )));
    };

    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if end < start {
        return Err(RunnerError::ConfigError(format!(
            "end date {end} cannot be before start date {start}"
        )));
    }

    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current.format(DATE_FORMAT).to_string());
        current = match current.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(dates)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    if !DATE_SHAPE.is_match(s) {
        return Err(RunnerError::ConfigError(format!(
            "invalid date '{s}': expected yyyy-MM-dd"
        )));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| RunnerError::ConfigError(format!("invalid date '{s}': {e}")))
}
