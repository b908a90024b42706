pub mod classifier;
pub mod export;
pub mod import;
pub mod insights;
pub mod projector;
pub mod records;
pub mod stats;

// Domain services
// This module contains business logic implementations.

pub use classifier::{classify, RecordSeverity};
pub use import::{ImportError, ImportMerger};
pub use insights::{InsightError, InsightPipeline, InsightState};
pub use projector::{ChartSeries, DateRange, DEFAULT_WINDOW_DAYS};
pub use records::{RecordService, RecordServiceError};
