use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use bp_tracker_data::models::{Arm, MeasurementRecord};
use crate::entities::measurement::{ChartPoint, ExtractedMeasurement, MeasurementInput};
use crate::services::classifier::classify;

/// Conversion functions between domain entities and data models.
/// They follow the pattern convert_[source]_to_[target].

/// Build a stored record from validated manual input
pub fn convert_input_to_record(id: String, input: MeasurementInput) -> MeasurementRecord {
    MeasurementRecord {
        id,
        timestamp: input.timestamp,
        systolic: input.systolic,
        diastolic: input.diastolic,
        heart_rate: input.heart_rate,
        arm: input.arm,
        note: input.note,
    }
}

/// Build a stored record from an extraction candidate.
///
/// Values outside the manual-entry ranges are kept as they are; only values
/// that cannot be represented at all are rejected.
pub fn convert_extracted_to_record(
    id: String,
    candidate: &ExtractedMeasurement,
) -> Result<MeasurementRecord, String> {
    Ok(MeasurementRecord {
        id,
        timestamp: parse_candidate_timestamp(&candidate.timestamp)?,
        systolic: number_to_u16("systolic", candidate.systolic)?,
        diastolic: number_to_u16("diastolic", candidate.diastolic)?,
        heart_rate: number_to_u16("heartRate", candidate.heart_rate)?,
        arm: Arm::from_tag(&candidate.arm),
        note: candidate.note.clone(),
    })
}

/// Project a record onto the chart series
pub fn convert_record_to_chart_point(record: &MeasurementRecord) -> ChartPoint {
    ChartPoint {
        id: record.id.clone(),
        timestamp: record.timestamp,
        systolic: record.systolic,
        diastolic: record.diastolic,
        heart_rate: record.heart_rate,
        severity: classify(record.systolic, record.diastolic),
    }
}

/// Accepts RFC 3339 plus the zone-less forms the extractor tends to emit.
/// Zone-less times are taken as UTC.
fn parse_candidate_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(format!("Unparseable timestamp: '{}'", raw))
}

fn number_to_u16(field: &str, value: f64) -> Result<u16, String> {
    if !value.is_finite() || value < 0.0 || value > u16::MAX as f64 {
        return Err(format!("{} is not a usable measurement: {}", field, value));
    }
    if value.fract() != 0.0 {
        return Err(format!("{} must be a whole number: {}", field, value));
    }
    Ok(value as u16)
}
