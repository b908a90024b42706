use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use bp_tracker_data::models::{Arm, MeasurementRecord};
use bp_tracker_domain::entities::{ChartPoint, MeasurementInput, MeasurementStats};
use bp_tracker_domain::services::{ChartSeries, DateRange, RecordSeverity, DEFAULT_WINDOW_DAYS};

/// Arm the cuff was on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArmDto {
    Left,
    Right,
    #[default]
    Unspecified,
}

impl From<Arm> for ArmDto {
    fn from(arm: Arm) -> Self {
        match arm {
            Arm::Left => ArmDto::Left,
            Arm::Right => ArmDto::Right,
            Arm::Unspecified => ArmDto::Unspecified,
        }
    }
}

impl From<ArmDto> for Arm {
    fn from(arm: ArmDto) -> Self {
        match arm {
            ArmDto::Left => Arm::Left,
            ArmDto::Right => Arm::Right,
            ArmDto::Unspecified => Arm::Unspecified,
        }
    }
}

/// Public representation of a measurement record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub systolic: u16,
    pub diastolic: u16,
    pub heart_rate: u16,
    pub arm: ArmDto,
    pub note: String,
    /// Severity band: normal, elevated, stage1, stage2 or crisis
    pub severity: String,
    /// Display label of the severity band
    pub severity_label: String,
}

impl From<MeasurementRecord> for RecordResponse {
    fn from(record: MeasurementRecord) -> Self {
        let severity = record.severity();
        Self {
            id: record.id,
            timestamp: record.timestamp,
            systolic: record.systolic,
            diastolic: record.diastolic,
            heart_rate: record.heart_rate,
            arm: record.arm.into(),
            note: record.note,
            severity: severity.to_string(),
            severity_label: severity.label().to_string(),
        }
    }
}

/// Manual entry payload for creating or replacing a record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRequest {
    /// When the measurement was taken. Defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Systolic pressure, 40-300 mmHg
    pub systolic: u16,
    /// Diastolic pressure, 40-250 mmHg
    pub diastolic: u16,
    /// Heart rate, 30-250 bpm
    pub heart_rate: u16,
    #[serde(default)]
    pub arm: ArmDto,
    #[serde(default)]
    pub note: String,
}

impl From<MeasurementRequest> for MeasurementInput {
    fn from(request: MeasurementRequest) -> Self {
        MeasurementInput {
            timestamp: request.timestamp.unwrap_or_else(Utc::now),
            systolic: request.systolic,
            diastolic: request.diastolic,
            heart_rate: request.heart_rate,
            arm: request.arm.into(),
            note: request.note,
        }
    }
}

/// Chart date range; defaults to the 30 days before today through today
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ChartQueryParams {
    /// First day, inclusive (YYYY-MM-DD)
    pub start: Option<NaiveDate>,
    /// Last day, inclusive (YYYY-MM-DD)
    pub end: Option<NaiveDate>,
}

impl ChartQueryParams {
    /// `None` when a defaulted start would fall before the earliest date
    pub fn resolve(&self, today: NaiveDate) -> Option<DateRange> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            (Some(start), None) => Some(DateRange::new(start, today)),
            (None, Some(end)) => DateRange::days_before(end, DEFAULT_WINDOW_DAYS),
            (None, None) => DateRange::days_before(today, DEFAULT_WINDOW_DAYS),
        }
    }
}

/// One point of the chart series
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartPointResponse {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub systolic: u16,
    pub diastolic: u16,
    pub heart_rate: u16,
    pub severity: String,
}

impl From<&ChartPoint> for ChartPointResponse {
    fn from(point: &ChartPoint) -> Self {
        Self {
            id: point.id.clone(),
            timestamp: point.timestamp,
            systolic: point.systolic,
            diastolic: point.diastolic,
            heart_rate: point.heart_rate,
            severity: point.severity.to_string(),
        }
    }
}

/// Chart series for a date range
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    /// no_records, empty_range or points
    pub state: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Oldest first
    pub points: Vec<ChartPointResponse>,
}

impl ChartResponse {
    pub fn new(series: &ChartSeries, range: DateRange) -> Self {
        let state = match series {
            ChartSeries::NoRecords => "no_records",
            ChartSeries::EmptyRange => "empty_range",
            ChartSeries::Points(_) => "points",
        };
        Self {
            state: state.to_string(),
            start: range.start,
            end: range.end,
            points: series.points().iter().map(ChartPointResponse::from).collect(),
        }
    }
}

/// Dashboard summary
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub avg_systolic: f64,
    pub avg_diastolic: f64,
    pub avg_heart_rate: f64,
    pub total_count: usize,
    pub latest: Option<RecordResponse>,
}

impl From<MeasurementStats> for StatsResponse {
    fn from(stats: MeasurementStats) -> Self {
        Self {
            avg_systolic: stats.avg_systolic,
            avg_diastolic: stats.avg_diastolic,
            avg_heart_rate: stats.avg_heart_rate,
            total_count: stats.total_count,
            latest: stats.latest.map(RecordResponse::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_chart_params_defaults() {
        let params = ChartQueryParams { start: None, end: None };
        let range = params.resolve(day(31));
        assert_eq!(range, Some(DateRange::new(day(1), day(31))));

        let params = ChartQueryParams { start: Some(day(10)), end: None };
        assert_eq!(params.resolve(day(31)), Some(DateRange::new(day(10), day(31))));
    }

    #[test]
    fn test_chart_params_extreme_end() {
        let raw = format!(r#"{{"end":"{}"}}"#, NaiveDate::MIN);
        let params: ChartQueryParams = serde_json::from_str(&raw).unwrap();
        assert_eq!(params.end, Some(NaiveDate::MIN));
        assert_eq!(params.resolve(day(31)), None);
    }

    #[test]
    fn test_request_defaults() {
        let request: MeasurementRequest =
            serde_json::from_str(r#"{"systolic":120,"diastolic":80,"heartRate":70}"#).unwrap();
        let input = MeasurementInput::from(request);

        assert_eq!(input.arm, Arm::Unspecified);
        assert!(input.note.is_empty());
    }
}
