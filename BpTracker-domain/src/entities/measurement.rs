use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use bp_tracker_data::models::{Arm, MeasurementRecord};

/// Severity band derived from a systolic/diastolic pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Elevated,
    Stage1,
    Stage2,
    Crisis,
}

impl Severity {
    /// Display label shown next to a reading
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Normal => "正常",
            Severity::Elevated => "高值",
            Severity::Stage1 => "1级高血压",
            Severity::Stage2 => "高血压",
            Severity::Crisis => "危机",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Normal => write!(f, "normal"),
            Severity::Elevated => write!(f, "elevated"),
            Severity::Stage1 => write!(f, "stage1"),
            Severity::Stage2 => write!(f, "stage2"),
            Severity::Crisis => write!(f, "crisis"),
        }
    }
}

/// Manual-entry payload for creating or replacing a measurement
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementInput {
    /// When the measurement was taken
    pub timestamp: DateTime<Utc>,

    /// Systolic pressure (mmHg)
    #[validate(range(min = 40, max = 300, message = "systolic must be between 40 and 300 mmHg"))]
    pub systolic: u16,

    /// Diastolic pressure (mmHg)
    #[validate(range(min = 40, max = 250, message = "diastolic must be between 40 and 250 mmHg"))]
    pub diastolic: u16,

    /// Heart rate (bpm)
    #[validate(range(min = 30, max = 250, message = "heartRate must be between 30 and 250 bpm"))]
    pub heart_rate: u16,

    /// Arm the cuff was on
    #[serde(default)]
    pub arm: Arm,

    /// Free-form note
    #[serde(default)]
    #[validate(length(max = 1000, message = "note must be at most 1000 characters"))]
    pub note: String,
}

/// Candidate measurement as produced by the extraction collaborator.
///
/// Numbers arrive as JSON numbers of any shape and the timestamp as text;
/// they are checked and narrowed in `conversions::convert_extracted_to_record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMeasurement {
    pub timestamp: String,
    pub systolic: f64,
    pub diastolic: f64,
    pub heart_rate: f64,
    #[serde(default)]
    pub arm: String,
    #[serde(default)]
    pub note: String,
}

/// One point of the chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub systolic: u16,
    pub diastolic: u16,
    pub heart_rate: u16,
    pub severity: Severity,
}

/// Dashboard summary of the stored records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementStats {
    pub avg_systolic: f64,
    pub avg_diastolic: f64,
    pub avg_heart_rate: f64,
    pub total_count: usize,
    pub latest: Option<MeasurementRecord>,
    pub latest_severity: Option<Severity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn input(systolic: u16, diastolic: u16, heart_rate: u16) -> MeasurementInput {
        MeasurementInput {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).unwrap(),
            systolic,
            diastolic,
            heart_rate,
            arm: Arm::Left,
            note: String::new(),
        }
    }

    #[test]
    fn test_input_within_ranges_is_valid() {
        assert!(input(120, 80, 70).validate().is_ok());
        assert!(input(40, 40, 30).validate().is_ok());
        assert!(input(300, 250, 250).validate().is_ok());
    }

    #[test]
    fn test_input_out_of_range_is_rejected() {
        let errors = input(301, 80, 70).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("systolic"));

        let errors = input(120, 39, 70).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("diastolic"));

        let errors = input(120, 80, 251).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("heart_rate"));
    }

    #[test]
    fn test_input_defaults_arm_and_note() {
        let json = r#"{"timestamp":"2024-05-01T07:30:00Z","systolic":118,"diastolic":76,"heartRate":64}"#;
        let parsed: MeasurementInput = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.arm, Arm::Unspecified);
        assert!(parsed.note.is_empty());
        assert_eq!(parsed.heart_rate, 64);
    }

    #[test]
    fn test_severity_orders_by_seriousness() {
        assert!(Severity::Normal < Severity::Elevated);
        assert!(Severity::Elevated < Severity::Stage1);
        assert!(Severity::Stage1 < Severity::Stage2);
        assert!(Severity::Stage2 < Severity::Crisis);
        assert_eq!(Severity::Crisis.label(), "危机");
    }
}
