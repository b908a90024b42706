use bp_tracker_data::models::MeasurementRecord;
use crate::entities::measurement::Severity;

/// Classify a blood pressure pair into a severity band.
///
/// Either value alone is enough to reach a band; the first matching band,
/// from most to least severe, wins.
pub fn classify(systolic: u16, diastolic: u16) -> Severity {
    if systolic >= 180 || diastolic >= 120 {
        Severity::Crisis
    } else if systolic >= 140 || diastolic >= 90 {
        Severity::Stage2
    } else if systolic >= 120 || diastolic >= 80 {
        Severity::Elevated
    } else {
        Severity::Normal
    }
}

/// Severity of a stored record
pub trait RecordSeverity {
    fn severity(&self) -> Severity;
}

impl RecordSeverity for MeasurementRecord {
    fn severity(&self) -> Severity {
        classify(self.systolic, self.diastolic)
    }
}
