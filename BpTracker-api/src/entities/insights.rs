use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use bp_tracker_data::models::{AnalysisReport, MeasurementRecord};
use bp_tracker_domain::services::InsightState;

use super::records::{ArmDto, RecordResponse};

/// Free text to extract measurements from
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportTextRequest {
    pub text: String,
}

/// A previewed record handed back for commit. Values are not range-checked.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecordRequest {
    /// Id from the preview; replaced when missing or already taken
    #[serde(default)]
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub systolic: u16,
    pub diastolic: u16,
    pub heart_rate: u16,
    #[serde(default)]
    pub arm: ArmDto,
    #[serde(default)]
    pub note: String,
}

impl From<ImportRecordRequest> for MeasurementRecord {
    fn from(request: ImportRecordRequest) -> Self {
        MeasurementRecord {
            id: request.id.unwrap_or_default(),
            timestamp: request.timestamp,
            systolic: request.systolic,
            diastolic: request.diastolic,
            heart_rate: request.heart_rate,
            arm: request.arm.into(),
            note: request.note,
        }
    }
}

/// Batch confirmed from a preview
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportCommitRequest {
    pub records: Vec<ImportRecordRequest>,
}

/// Records produced by a preview or stored by a commit
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    pub count: usize,
    pub records: Vec<RecordResponse>,
}

impl From<Vec<MeasurementRecord>> for ImportResponse {
    fn from(records: Vec<MeasurementRecord>) -> Self {
        Self {
            count: records.len(),
            records: records.into_iter().map(RecordResponse::from).collect(),
        }
    }
}

/// Current analysis state
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InsightStateResponse {
    /// idle, requesting, succeeded or failed
    pub state: String,
    /// Narrative, when succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Failure reason, when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<InsightState> for InsightStateResponse {
    fn from(state: InsightState) -> Self {
        let (name, text, reason) = match state {
            InsightState::Idle => ("idle", None, None),
            InsightState::Requesting => ("requesting", None, None),
            InsightState::Succeeded(text) => ("succeeded", Some(text), None),
            InsightState::Failed(reason) => ("failed", None, Some(reason)),
        };
        Self {
            state: name.to_string(),
            text,
            reason,
        }
    }
}

/// Saved analysis report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub record_count: usize,
}

impl From<AnalysisReport> for ReportResponse {
    fn from(report: AnalysisReport) -> Self {
        Self {
            id: report.id,
            timestamp: report.timestamp,
            content: report.content,
            record_count: report.record_count,
        }
    }
}
