use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for a saved AI analysis narrative
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Unique identifier for the report
    pub id: String,

    /// When the report was saved
    pub timestamp: DateTime<Utc>,

    /// Narrative text as returned by the analysis service
    pub content: String,

    /// Size of the record set at the time the report was saved
    pub record_count: usize,
}
