//! External text-generation collaborators
//!
//! The domain only talks to the outside service through these two traits.
//! Requests and responses are typed values; the HTTP client converts them at
//! the edge.

pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bp_tracker_data::models::MeasurementRecord;
use crate::entities::measurement::ExtractedMeasurement;

pub use gemini::GeminiClient;

/// Collaborator call errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// No API key configured
    #[error("AI service is not configured: {0}")]
    NotConfigured(String),

    /// Transport-level failure
    #[error("AI service request failed: {0}")]
    Transport(String),

    /// Non-success status from the service
    #[error("AI service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response did not have the expected shape
    #[error("Unexpected AI service response: {0}")]
    InvalidResponse(String),

    /// The service returned no text
    #[error("AI service returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// Input for a trend analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Most recent records, newest first
    pub records: Vec<MeasurementRecord>,
    /// What the narrative should cover
    pub instruction: String,
}

/// Input for free-text extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub text: String,
    /// Year assumed for dates written without one
    pub current_year: i32,
}

/// Produces a narrative analysis of a set of readings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<String, ClientError>;
}

/// Extracts candidate readings from free text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    async fn extract(&self, request: ExtractionRequest) -> Result<Vec<ExtractedMeasurement>, ClientError>;
}

/// Default analysis instruction
pub const ANALYSIS_INSTRUCTION: &str = "作为一名专业的家庭医生助理，请分析以下血压测量记录并给出详细建议。\
请重点分析：\
1. 总体数值表现（正常、偏高、波动情况）。\
2. 左右手差异分析：如果记录中包含左右手对比，请指出差异是否在正常范围。\
3. 活动关联：根据备注分析血压的变化。\
4. 针对性建议：针对当前的数值趋势，在作息、情绪管理和用药记录方面给出回复。\
请使用亲切、专业的语气，Markdown 格式，中文回复。";
