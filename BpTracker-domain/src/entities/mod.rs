// Domain entities and value objects
pub mod conversions;
pub mod measurement;

// Re-export common types for easier imports
pub use measurement::{ChartPoint, ExtractedMeasurement, MeasurementInput, MeasurementStats, Severity};
