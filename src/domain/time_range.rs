// Time range domain model - Graph window, zoom history and scale presets
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoomBoundsError {
    #[error("zoom requires both a start and an end bound")]
    Missing,
    #[error("zoom start {from} must be before end {to}")]
    Inverted { from: i64, to: i64 },
}

/// A half-open graph window in epoch milliseconds. `from < to` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    from: i64,
    to: i64,
}

impl TimeRange {
    pub fn new(from: i64, to: i64) -> Result<Self, ZoomBoundsError> {
        if from >= to {
            return Err(ZoomBoundsError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    /// Build a range from bounds that may be absent, as sent by a selection or a form.
    pub fn from_bounds(from: Option<i64>, to: Option<i64>) -> Result<Self, ZoomBoundsError> {
        match (from, to) {
            (Some(from), Some(to)) => Self::new(from, to),
            _ => Err(ZoomBoundsError::Missing),
        }
    }

    pub fn from(&self) -> i64 {
        self.from
    }

    pub fn to(&self) -> i64 {
        self.to
    }
}

/// LIFO history of ranges left behind by zooming in.
#[derive(Debug, Clone, Default)]
pub struct ZoomStack {
    ranges: Vec<TimeRange>,
}

impl ZoomStack {
    pub fn push(&mut self, range: TimeRange) {
        self.ranges.push(range);
    }

    pub fn pop(&mut self) -> Option<TimeRange> {
        self.ranges.pop()
    }

    pub fn peek(&self) -> Option<TimeRange> {
        self.ranges.last().copied()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }
}

/// Scale buttons of the graph page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RangePreset {
    Day,
    Week,
    Month,
    Year,
}

impl RangePreset {
    /// Range ending at `now` and reaching back one preset unit.
    pub fn range_ending_at(self, now: DateTime<Utc>) -> Result<TimeRange, ZoomBoundsError> {
        let start = match self {
            RangePreset::Day => now.checked_sub_signed(Duration::days(1)),
            RangePreset::Week => now.checked_sub_signed(Duration::days(7)),
            RangePreset::Month => now.checked_sub_months(Months::new(1)),
            RangePreset::Year => now.checked_sub_months(Months::new(12)),
        };
        let start = start.ok_or(ZoomBoundsError::Missing)?;
        TimeRange::new(start.timestamp_millis(), now.timestamp_millis())
    }
}

/// Custom range picked on the page: the start is mandatory, the end defaults to `now`.
pub fn custom_range(
    from: Option<i64>,
    to: Option<i64>,
    now: DateTime<Utc>,
) -> Result<TimeRange, ZoomBoundsError> {
    let from = from.ok_or(ZoomBoundsError::Missing)?;
    TimeRange::new(from, to.unwrap_or_else(|| now.timestamp_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rejects_inverted_and_empty_ranges() {
        assert_eq!(
            TimeRange::new(5, 3),
            Err(ZoomBoundsError::Inverted { from: 5, to: 3 })
        );
        assert!(TimeRange::new(4, 4).is_err());
        assert_eq!(TimeRange::from_bounds(Some(1), None), Err(ZoomBoundsError::Missing));
        assert_eq!(TimeRange::from_bounds(Some(0), Some(10)).unwrap().to(), 10);
    }

    #[test]
    fn test_zoom_stack_is_lifo() {
        let mut stack = ZoomStack::default();
        stack.push(TimeRange::new(0, 10).unwrap());
        stack.push(TimeRange::new(2, 8).unwrap());
        assert_eq!(stack.pop(), Some(TimeRange::new(2, 8).unwrap()));
        assert_eq!(stack.pop(), Some(TimeRange::new(0, 10).unwrap()));
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_presets() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();

        let week = RangePreset::Week.range_ending_at(now).unwrap();
        assert_eq!(week.to() - week.from(), 7 * 24 * 3600 * 1000);

        let month = RangePreset::Month.range_ending_at(now).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        assert_eq!(month.from(), expected.timestamp_millis());

        let year = RangePreset::Year.range_ending_at(now).unwrap();
        let expected = Utc.with_ymd_and_hms(2023, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(year.from(), expected.timestamp_millis());
    }

    #[test]
    fn test_custom_range_defaults_end_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let range = custom_range(Some(1_000), None, now).unwrap();
        assert_eq!(range.to(), now.timestamp_millis());
        assert_eq!(custom_range(None, Some(5), now), Err(ZoomBoundsError::Missing));
    }
}
