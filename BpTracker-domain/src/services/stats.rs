use bp_tracker_data::models::MeasurementRecord;
use crate::entities::measurement::MeasurementStats;
use crate::services::classifier::RecordSeverity;

/// Dashboard summary of a descending record list.
///
/// An empty list yields zero averages and no latest reading.
pub fn summarize(records: &[MeasurementRecord]) -> MeasurementStats {
    if records.is_empty() {
        return MeasurementStats {
            avg_systolic: 0.0,
            avg_diastolic: 0.0,
            avg_heart_rate: 0.0,
            total_count: 0,
            latest: None,
            latest_severity: None,
        };
    }

    let mut systolic_sum: f64 = 0.0;
    let mut diastolic_sum: f64 = 0.0;
    let mut heart_rate_sum: f64 = 0.0;

    for record in records {
        systolic_sum += f64::from(record.systolic);
        diastolic_sum += f64::from(record.diastolic);
        heart_rate_sum += f64::from(record.heart_rate);
    }

    let count = records.len() as f64;
    let latest = records.first().cloned();

    MeasurementStats {
        avg_systolic: round_one(systolic_sum / count),
        avg_diastolic: round_one(diastolic_sum / count),
        avg_heart_rate: round_one(heart_rate_sum / count),
        total_count: records.len(),
        latest_severity: latest.as_ref().map(|record| record.severity()),
        latest,
    }
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
