//! Calendar recurrence period.
//!
//! # Responsibility
//! - Represent "every N years/months/days" recurrence for recurring tasks.
//! - Parse and render the ISO-8601 period text form used by storage and CLI.
//!
//! # Invariants
//! - Components are non-negative by construction.
//! - Weeks are folded into days on parse; the period never stores weeks.
//! - Date arithmetic applies years/months before days.

use chrono::{Days, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static ISO_PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?$")
        .expect("valid period regex")
});

/// Calendar period between recurring task occurrences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecurrencePeriod {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl RecurrencePeriod {
    pub fn new(years: u32, months: u32, days: u32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    pub fn days(days: u32) -> Self {
        Self::new(0, 0, days)
    }

    /// Returns `None` when `weeks * 7` does not fit into the day component.
    pub fn weeks(weeks: u32) -> Option<Self> {
        weeks.checked_mul(7).map(Self::days)
    }

    pub fn months(months: u32) -> Self {
        Self::new(0, months, 0)
    }

    pub fn years(years: u32) -> Self {
        Self::new(years, 0, 0)
    }

    /// Returns whether every component is zero.
    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }

    /// Returns `date` shifted forward by this period.
    ///
    /// Month arithmetic clamps to the last valid day of the target month,
    /// so `2024-01-31 + P1M` yields `2024-02-29`.
    /// Returns `None` on calendar overflow.
    pub fn add_to(&self, date: NaiveDate) -> Option<NaiveDate> {
        let total_months = self.years.checked_mul(12)?.checked_add(self.months)?;
        date.checked_add_months(Months::new(total_months))?
            .checked_add_days(Days::new(u64::from(self.days)))
    }
}

impl Display for RecurrencePeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_zero() {
            return f.write_str("P0D");
        }
        f.write_str("P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        Ok(())
    }
}

/// Parse failure for ISO-8601 period text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodParseError {
    /// Input does not match `P[nY][nM][nW][nD]`.
    Malformed(String),
    /// A component does not fit into `u32` after week folding.
    Overflow(String),
}

impl Display for PeriodParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => write!(
                f,
                "invalid period `{value}`; expected ISO-8601 form like P1D, P2W, P1M or P1Y2M3D"
            ),
            Self::Overflow(value) => write!(f, "period `{value}` is out of range"),
        }
    }
}

impl Error for PeriodParseError {}

impl FromStr for RecurrencePeriod {
    type Err = PeriodParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let caps = ISO_PERIOD_RE
            .captures(trimmed)
            .ok_or_else(|| PeriodParseError::Malformed(trimmed.to_string()))?;

        // `P` alone matches the pattern but carries no component.
        if caps.iter().skip(1).all(|group| group.is_none()) {
            return Err(PeriodParseError::Malformed(trimmed.to_string()));
        }

        let component = |index: usize| -> Result<u32, PeriodParseError> {
            match caps.get(index) {
                Some(m) => m
                    .as_str()
                    .parse::<u32>()
                    .map_err(|_| PeriodParseError::Overflow(trimmed.to_string())),
                None => Ok(0),
            }
        };

        let years = component(1)?;
        let months = component(2)?;
        let weeks = component(3)?;
        let days = component(4)?;
        let days = weeks
            .checked_mul(7)
            .and_then(|week_days| week_days.checked_add(days))
            .ok_or_else(|| PeriodParseError::Overflow(trimmed.to_string()))?;

        Ok(Self::new(years, months, days))
    }
}

impl TryFrom<String> for RecurrencePeriod {
    type Error = PeriodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecurrencePeriod> for String {
    fn from(value: RecurrencePeriod) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{PeriodParseError, RecurrencePeriod};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn display_omits_zero_components() {
        assert_eq!(RecurrencePeriod::new(1, 2, 3).to_string(), "P1Y2M3D");
        assert_eq!(RecurrencePeriod::months(6).to_string(), "P6M");
        assert_eq!(RecurrencePeriod::default().to_string(), "P0D");
    }

    #[test]
    fn parse_folds_weeks_into_days() {
        let period: RecurrencePeriod = "P2W".parse().unwrap();
        assert_eq!(period, RecurrencePeriod::days(14));

        let mixed: RecurrencePeriod = " p1w3d ".parse().unwrap();
        assert_eq!(mixed, RecurrencePeriod::days(10));
    }

    #[test]
    fn parse_rejects_empty_and_garbage() {
        for input in ["", "P", "1D", "P1H", "PT1H", "P-1D", "every day"] {
            let err = input.parse::<RecurrencePeriod>().unwrap_err();
            assert!(
                matches!(err, PeriodParseError::Malformed(_)),
                "unexpected result for `{input}`: {err:?}"
            );
        }
    }

    #[test]
    fn parse_rejects_component_overflow() {
        let err = "P99999999999D".parse::<RecurrencePeriod>().unwrap_err();
        assert!(matches!(err, PeriodParseError::Overflow(_)));

        let err = "P700000000W".parse::<RecurrencePeriod>().unwrap_err();
        assert!(matches!(err, PeriodParseError::Overflow(_)));
    }

    #[test]
    fn add_to_clamps_month_end() {
        let period = RecurrencePeriod::months(1);
        assert_eq!(period.add_to(date(2024, 1, 31)), Some(date(2024, 2, 29)));
        assert_eq!(period.add_to(date(2023, 1, 31)), Some(date(2023, 2, 28)));
    }

    #[test]
    fn add_to_applies_months_before_days() {
        let period = RecurrencePeriod::new(0, 1, 1);
        assert_eq!(period.add_to(date(2024, 1, 31)), Some(date(2024, 3, 1)));
    }

    #[test]
    fn add_to_reports_overflow() {
        assert_eq!(RecurrencePeriod::years(1).add_to(NaiveDate::MAX), None);
    }

    #[test]
    fn weeks_constructor_detects_overflow() {
        assert_eq!(RecurrencePeriod::weeks(2), Some(RecurrencePeriod::days(14)));
        assert_eq!(RecurrencePeriod::weeks(u32::MAX), None);
    }
}
