// Persisted models
pub mod measurement;
pub mod report;

pub use measurement::{Arm, MeasurementRecord};
pub use report::AnalysisReport;
