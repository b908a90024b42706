use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use bp_tracker_data::repository::RepositoryError;
use bp_tracker_domain::services::{ImportError, InsightError, RecordServiceError};

/// Error response format for API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a not found error response
    pub fn not_found(resource: &str) -> Self {
        Self::new("not_found", format!("The requested {} could not be found", resource))
    }

    /// Create a validation error response
    pub fn validation_error(message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            details,
            ..Self::new("validation_error", message)
        }
    }

    /// Create a bad request error response
    pub fn bad_request(message: &str) -> Self {
        Self::new("bad_request", message)
    }

    /// The request clashes with the current state
    pub fn conflict(message: &str) -> Self {
        Self::new("conflict", message)
    }

    /// A destructive request arrived without `confirm=true`
    pub fn confirmation_required(resource: &str) -> Self {
        Self::new(
            "confirmation_required",
            format!("Deleting a {} requires confirm=true", resource),
        )
    }

    /// Free text could not be turned into measurements
    pub fn parse_failed(message: &str) -> Self {
        Self::new("parse_failed", message)
    }

    /// The text-generation service failed
    pub fn analysis_failed(message: &str) -> Self {
        Self::new("analysis_failed", message)
    }

    /// Create an internal error response
    pub fn internal_error() -> Self {
        Self::new("internal_error", "An unexpected error occurred")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" | "bad_request" => StatusCode::BAD_REQUEST,
            "conflict" | "confirmation_required" => StatusCode::CONFLICT,
            "parse_failed" => StatusCode::UNPROCESSABLE_ENTITY,
            "analysis_failed" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<RepositoryError> for ErrorResponse {
    fn from(err: RepositoryError) -> Self {
        error!("Record store failure: {}", err);
        ErrorResponse::internal_error()
    }
}

impl From<RecordServiceError> for ErrorResponse {
    fn from(err: RecordServiceError) -> Self {
        match err {
            RecordServiceError::Validation(msg) => {
                warn!("Rejected measurement: {}", msg);
                ErrorResponse::validation_error(&msg, None)
            }
            RecordServiceError::NotFound(_) => ErrorResponse::not_found("record"),
            RecordServiceError::InvalidRange(msg) => ErrorResponse::bad_request(&msg),
            RecordServiceError::Repository(e) => {
                error!("Record store failure: {}", e);
                ErrorResponse::internal_error()
            }
        }
    }
}

impl From<ImportError> for ErrorResponse {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::EmptyInput => ErrorResponse::bad_request("Import text is empty"),
            ImportError::ParseFailed(msg) => {
                warn!("Import parse failed: {}", msg);
                ErrorResponse::parse_failed(&msg)
            }
            ImportError::Repository(e) => {
                error!("Record store failure during import: {}", e);
                ErrorResponse::internal_error()
            }
        }
    }
}

impl From<InsightError> for ErrorResponse {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::NoRecords => ErrorResponse::bad_request("No records to analyze"),
            InsightError::AlreadyRequesting => {
                ErrorResponse::conflict("An analysis request is already in progress")
            }
            InsightError::Failed(reason) => ErrorResponse::analysis_failed(&reason),
            InsightError::NothingToSave => ErrorResponse::conflict("No completed analysis to save"),
            InsightError::Repository(e) => {
                error!("Record store failure in analysis: {}", e);
                ErrorResponse::internal_error()
            }
            InsightError::Lock(e) => {
                error!("Analysis state unavailable: {}", e);
                ErrorResponse::internal_error()
            }
        }
    }
}

/// Confirmation flag for destructive requests
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ConfirmParams {
    /// Must be `true` for the deletion to happen
    #[serde(default)]
    pub confirm: bool,
}
