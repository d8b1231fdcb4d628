//! Time buckets used as table columns and the inclusive ranges over them.
//!
//! A [`Period`] is either a calendar month (`YYYY-MM`) or a calendar quarter
//! (`YYYY-Qn`). Periods can only be built from validated parts, so every
//! value round-trips to a label that sorts lexicographically in the same
//! order as the value itself.

use crate::error::{DmVizError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of a period bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Calendar months, `YYYY-MM`.
    #[default]
    Monthly,
    /// Calendar quarters, `YYYY-Qn`.
    Quarterly,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Quarterly => write!(f, "quarterly"),
        }
    }
}

impl FromStr for Granularity {
    type Err = DmVizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" => Ok(Self::Monthly),
            "quarterly" | "quarter" => Ok(Self::Quarterly),
            other => Err(DmVizError::validation_field(
                format!("Unknown granularity '{other}'"),
                "granularity",
            )),
        }
    }
}

/// A month or quarter bucket.
///
/// Ordering compares granularity first, then year and index, which matches
/// the lexicographic order of labels of the same granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    granularity: Granularity,
    year: u16,
    index: u8,
}

impl Period {
    /// Build a month period, rejecting months outside `1..=12`.
    pub fn month(year: u16, month: u8) -> Result<Self> {
        Self::validate_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(DmVizError::validation_field(
                format!("Month {month:02} is outside 01..=12"),
                "period",
            ));
        }
        Ok(Self {
            granularity: Granularity::Monthly,
            year,
            index: month,
        })
    }

    /// Build a quarter period, rejecting quarters outside `1..=4`.
    pub fn quarter(year: u16, quarter: u8) -> Result<Self> {
        Self::validate_year(year)?;
        if !(1..=4).contains(&quarter) {
            return Err(DmVizError::validation_field(
                format!("Quarter Q{quarter} is outside Q1..=Q4"),
                "period",
            ));
        }
        Ok(Self {
            granularity: Granularity::Quarterly,
            year,
            index: quarter,
        })
    }

    fn validate_year(year: u16) -> Result<()> {
        if year > 9999 {
            return Err(DmVizError::validation_field(
                format!("Year {year} does not have four digits"),
                "period",
            ));
        }
        Ok(())
    }

    /// Granularity of this period.
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Calendar year.
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Month number for month periods.
    pub const fn month_number(&self) -> Option<u8> {
        match self.granularity {
            Granularity::Monthly => Some(self.index),
            Granularity::Quarterly => None,
        }
    }

    /// Quarter number; for months this is `ceil(month / 3)`.
    pub const fn quarter_number(&self) -> u8 {
        match self.granularity {
            Granularity::Monthly => self.index.div_ceil(3),
            Granularity::Quarterly => self.index,
        }
    }

    /// The quarter containing this period.
    pub const fn to_quarter(&self) -> Self {
        Self {
            granularity: Granularity::Quarterly,
            year: self.year,
            index: self.quarter_number(),
        }
    }

    /// First month covered by this period.
    pub const fn first_month(&self) -> Self {
        match self.granularity {
            Granularity::Monthly => *self,
            Granularity::Quarterly => Self {
                granularity: Granularity::Monthly,
                year: self.year,
                index: (self.index - 1) * 3 + 1,
            },
        }
    }

    /// Last month covered by this period.
    pub const fn last_month(&self) -> Self {
        match self.granularity {
            Granularity::Monthly => *self,
            Granularity::Quarterly => Self {
                granularity: Granularity::Monthly,
                year: self.year,
                index: self.index * 3,
            },
        }
    }

    /// Convert to the given granularity. Quarters become their first month.
    pub const fn to_granularity(&self, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Monthly => self.first_month(),
            Granularity::Quarterly => self.to_quarter(),
        }
    }

    /// First calendar day of the period.
    pub fn first_day(&self) -> NaiveDate {
        let first = self.first_month();
        NaiveDate::from_ymd_opt(i32::from(first.year), u32::from(first.index), 1)
            .unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            Granularity::Monthly => write!(f, "{:04}-{:02}", self.year, self.index),
            Granularity::Quarterly => write!(f, "{:04}-Q{}", self.year, self.index),
        }
    }
}

impl FromStr for Period {
    type Err = DmVizError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            DmVizError::validation_field(
                format!("'{s}' is not a YYYY-MM or YYYY-Qn period label"),
                "period",
            )
        };

        let (year, rest) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: u16 = year.parse().map_err(|_| invalid())?;

        if let Some(quarter) = rest.strip_prefix('Q') {
            if quarter.len() != 1 || !quarter.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let quarter: u8 = quarter.parse().map_err(|_| invalid())?;
            return Self::quarter(year, quarter);
        }

        if rest.len() != 2 || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let month: u8 = rest.parse().map_err(|_| invalid())?;
        Self::month(year, month)
    }
}

impl TryFrom<String> for Period {
    type Error = DmVizError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

/// Inclusive `[start, end]` range of periods of one granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: Period,
    end: Period,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: Period,
    end: Period,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = DmVizError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Create a range, rejecting `start > end` and mixed granularities.
    pub fn new(start: Period, end: Period) -> Result<Self> {
        if start.granularity() != end.granularity() {
            return Err(DmVizError::validation_field(
                format!("Range bounds {start} and {end} have different granularities"),
                "range",
            ));
        }
        if start > end {
            return Err(DmVizError::validation_field(
                format!("Range start {start} is after end {end}"),
                "range",
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from labels.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(start.parse()?, end.parse()?)
    }

    /// Inclusive lower bound.
    pub const fn start(&self) -> Period {
        self.start
    }

    /// Inclusive upper bound.
    pub const fn end(&self) -> Period {
        self.end
    }

    /// Granularity of both bounds.
    pub const fn granularity(&self) -> Granularity {
        self.start.granularity()
    }

    /// Whether `period` lies within the range. Periods of another granularity
    /// never match; convert the range first.
    pub fn contains(&self, period: &Period) -> bool {
        period.granularity() == self.granularity() && self.start <= *period && *period <= self.end
    }

    /// The periods of `periods` inside the range, in their original order.
    pub fn filter(&self, periods: &[Period]) -> Vec<Period> {
        periods.iter().copied().filter(|p| self.contains(p)).collect()
    }

    /// Express the range in another granularity.
    ///
    /// Month ranges become the quarters containing each bound; quarter ranges
    /// become the first month of the start quarter through the last month of
    /// the end quarter.
    pub const fn to_granularity(&self, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Quarterly => Self {
                start: self.start.to_quarter(),
                end: self.end.to_quarter(),
            },
            Granularity::Monthly => Self {
                start: self.start.first_month(),
                end: self.end.last_month(),
            },
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(label: &str) -> Period {
        label.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        assert_eq!(p("2020-01").to_string(), "2020-01");
        assert_eq!(p("2019-Q3").to_string(), "2019-Q3");
        assert_eq!(p("2020-12").month_number(), Some(12));
        assert_eq!(p("2020-Q4").month_number(), None);
    }

    #[test]
    fn test_rejects_malformed_labels() {
        for label in ["2020-00", "2020-13", "2020-Q0", "2020-Q5", "20-01", "2020/01", "2020-1", "2020-Q12", "abcd-01", ""] {
            assert!(label.parse::<Period>().is_err(), "{label} should be rejected");
        }
    }

    #[test]
    fn test_quarter_conversion_boundaries() {
        assert_eq!(p("2020-01").to_quarter(), p("2020-Q1"));
        assert_eq!(p("2020-03").to_quarter(), p("2020-Q1"));
        assert_eq!(p("2020-04").to_quarter(), p("2020-Q2"));
        assert_eq!(p("2020-09").to_quarter(), p("2020-Q3"));
        assert_eq!(p("2020-10").to_quarter(), p("2020-Q4"));
        assert_eq!(p("2020-12").to_quarter(), p("2020-Q4"));
    }

    #[test]
    fn test_quarter_months() {
        assert_eq!(p("2021-Q2").first_month(), p("2021-04"));
        assert_eq!(p("2021-Q2").last_month(), p("2021-06"));
        assert_eq!(p("2021-Q4").first_day(), NaiveDate::from_ymd_opt(2021, 10, 1).unwrap());
    }

    #[test]
    fn test_ordering_matches_labels() {
        let mut labels = vec!["2021-02", "2019-12", "2020-10", "2020-02"];
        let mut periods: Vec<Period> = labels.iter().map(|l| p(l)).collect();
        labels.sort_unstable();
        periods.sort();
        let rendered: Vec<String> = periods.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, labels);
    }

    #[test]
    fn test_range_validation() {
        assert!(DateRange::parse("2020-02", "2020-01").is_err());
        assert!(DateRange::parse("2020-01", "2020-Q1").is_err());
        assert!(DateRange::parse("2020-01", "2020-01").is_ok());
    }

    #[test]
    fn test_range_contains_and_filter() {
        let range = DateRange::parse("2020-02", "2020-04").unwrap();
        let periods = vec![p("2020-01"), p("2020-02"), p("2020-04"), p("2020-05")];
        assert_eq!(range.filter(&periods), vec![p("2020-02"), p("2020-04")]);
        assert!(!range.contains(&p("2020-Q1")));
    }

    #[test]
    fn test_range_to_granularity() {
        let months = DateRange::parse("2019-08", "2025-12").unwrap();
        let quarters = months.to_granularity(Granularity::Quarterly);
        assert_eq!(quarters.start(), p("2019-Q3"));
        assert_eq!(quarters.end(), p("2025-Q4"));

        let back = quarters.to_granularity(Granularity::Monthly);
        assert_eq!(back.start(), p("2019-07"));
        assert_eq!(back.end(), p("2025-12"));
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&p("2020-Q2")).unwrap();
        assert_eq!(json, "\"2020-Q2\"");
        let range: DateRange =
            serde_json::from_str(r#"{"start":"2020-01","end":"2020-06"}"#).unwrap();
        assert_eq!(range.end(), p("2020-06"));
        assert!(serde_json::from_str::<DateRange>(r#"{"start":"2020-06","end":"2020-01"}"#).is_err());
    }
}
