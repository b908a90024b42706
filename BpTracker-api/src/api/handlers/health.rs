use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, instrument};
use utoipa::ToSchema;

use bp_tracker_domain::health::{self, ComponentStatus as DomainComponentStatus, HealthComponent, SystemStatus};

use crate::api::state::AppState;

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Current service status ("ok", "degraded", or "error")
    pub status: String,
    /// Current application version from Cargo manifest
    pub version: String,
    /// Timestamp of when the response was generated
    pub timestamp: u64,
    /// Uptime of the service in seconds
    pub uptime: u64,
    /// Details about the system components
    pub components: ComponentStatus,
}

/// Status of individual system components
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    /// Record store status
    pub storage: ComponentHealthStatus,
    /// Text-generation service status
    pub ai: ComponentHealthStatus,
}

/// Health status for an individual component
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ComponentHealthStatus {
    /// Status of the component ("ok", "degraded", or "error")
    pub status: String,
    /// Optional message with more details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Option<&HealthComponent>> for ComponentHealthStatus {
    fn from(component: Option<&HealthComponent>) -> Self {
        match component {
            Some(component) => Self {
                status: map_component_status(&component.status),
                message: component.details.clone(),
            },
            None => Self {
                status: "error".to_string(),
                message: Some("component not reported".to_string()),
            },
        }
    }
}

/// Health check endpoint to verify the API is running.
///
/// A degraded system (no AI key) still answers 200; only an unreadable
/// store is an error.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API is up", body = HealthResponse),
        (status = 500, description = "API is not healthy", body = HealthResponse),
    ),
    tag = "health"
)]
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    info!("Health check requested");

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let system_health = health::get_system_health(&state.store, &state.ai_config);

    let overall_status = match system_health.status {
        SystemStatus::Healthy => "ok",
        SystemStatus::Degraded => "degraded",
        SystemStatus::Unhealthy => "error",
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
        uptime: state.uptime().as_secs(),
        components: ComponentStatus {
            storage: system_health.components.get("storage").into(),
            ai: system_health.components.get("ai").into(),
        },
    };

    let status = match system_health.status {
        SystemStatus::Unhealthy => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };

    (status, Json(response))
}

/// Map domain component status to API status string
fn map_component_status(status: &DomainComponentStatus) -> String {
    match status {
        DomainComponentStatus::Healthy => "ok",
        DomainComponentStatus::Degraded => "degraded",
        DomainComponentStatus::Unhealthy => "error",
    }
    .to_string()
}
