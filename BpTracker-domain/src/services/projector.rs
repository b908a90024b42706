use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use bp_tracker_data::models::MeasurementRecord;
use crate::entities::conversions::convert_record_to_chart_point;
use crate::entities::measurement::ChartPoint;

/// Days the default chart window reaches back from its end date
pub const DEFAULT_WINDOW_DAYS: u64 = 30;

/// Inclusive calendar-day range, compared against the UTC date of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// From `days` days before `end` through `end`, so `days + 1` calendar
    /// days. `None` when the start would fall before the earliest date.
    pub fn days_before(end: NaiveDate, days: u64) -> Option<Self> {
        let start = end.checked_sub_days(Days::new(days))?;
        Some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Chart series for a range, keeping apart "nothing recorded yet" and
/// "nothing in this range"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "points", rename_all = "snake_case")]
pub enum ChartSeries {
    NoRecords,
    EmptyRange,
    Points(Vec<ChartPoint>),
}

impl ChartSeries {
    pub fn points(&self) -> &[ChartPoint] {
        match self {
            ChartSeries::Points(points) => points,
            _ => &[],
        }
    }
}

/// Records whose UTC date falls in `range`, oldest first
pub fn project(records: &[MeasurementRecord], range: DateRange) -> ChartSeries {
    if records.is_empty() {
        return ChartSeries::NoRecords;
    }

    let mut in_range: Vec<&MeasurementRecord> = records
        .iter()
        .filter(|record| range.contains(record.timestamp.date_naive()))
        .collect();

    if in_range.is_empty() {
        return ChartSeries::EmptyRange;
    }

    in_range.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    ChartSeries::Points(in_range.into_iter().map(convert_record_to_chart_point).collect())
}
