pub mod attendance;
pub mod employee;
pub mod leave_request;
pub mod role;

use chrono::NaiveDate;

use crate::error::{HrError, HrResult};

/// Longest accepted free-text value (reason, comments, notes).
pub const MAX_TEXT_LEN: usize = 500;

/// Inclusive calendar range. Construction rejects `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> HrResult<Self> {
        if start > end {
            return Err(HrError::validation(
                "start_date",
                "start date cannot be after end date",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `[start, end]` lies entirely inside this range.
    pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start >= self.start && end <= self.end
    }

    /// Number of calendar days, both ends included.
    pub fn days(&self) -> u32 {
        ((self.end - self.start).num_days() + 1) as u32
    }
}

pub(crate) fn check_text(field: &'static str, value: Option<&str>) -> HrResult<()> {
    match value {
        Some(v) if v.chars().count() > MAX_TEXT_LEN => Err(HrError::validation(
            field,
            format!("{field} must be at most {MAX_TEXT_LEN} characters"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}
