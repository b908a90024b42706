use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, instrument};

use crate::api::state::AppState;
use crate::entities::common::{ConfirmParams, ErrorResponse};
use crate::entities::insights::{InsightStateResponse, ReportResponse};

/// Run a trend analysis over the most recent records
#[utoipa::path(
    post,
    path = "/api/v1/insights",
    responses(
        (status = 200, description = "Analysis finished", body = InsightStateResponse),
        (status = 400, description = "No records", body = ErrorResponse),
        (status = 409, description = "A request is already in progress", body = ErrorResponse),
        (status = 502, description = "Analysis service failed", body = ErrorResponse),
    ),
    tag = "insights"
)]
#[instrument(skip(state))]
pub async fn request_insight(State(state): State<AppState>) -> Result<impl IntoResponse, ErrorResponse> {
    state.insights.request(&state.store).await?;
    Ok(Json(InsightStateResponse::from(state.insights.state()?)))
}

/// Current analysis state
#[utoipa::path(
    get,
    path = "/api/v1/insights",
    responses(
        (status = 200, description = "Current state", body = InsightStateResponse),
    ),
    tag = "insights"
)]
#[instrument(skip(state))]
pub async fn get_insight(State(state): State<AppState>) -> Result<impl IntoResponse, ErrorResponse> {
    Ok(Json(InsightStateResponse::from(state.insights.state()?)))
}

/// Save the finished analysis as a report
#[utoipa::path(
    post,
    path = "/api/v1/insights/save",
    responses(
        (status = 201, description = "Report saved", body = ReportResponse),
        (status = 409, description = "No finished analysis", body = ErrorResponse),
    ),
    tag = "insights"
)]
#[instrument(skip(state))]
pub async fn save_insight(State(state): State<AppState>) -> Result<impl IntoResponse, ErrorResponse> {
    let report = state.insights.save_report(&state.store)?;
    info!("Saved report {}", report.id);
    Ok((StatusCode::CREATED, Json(ReportResponse::from(report))))
}

/// Discard a finished analysis
#[utoipa::path(
    delete,
    path = "/api/v1/insights",
    responses(
        (status = 200, description = "Back to idle", body = InsightStateResponse),
        (status = 409, description = "A request is in progress", body = ErrorResponse),
    ),
    tag = "insights"
)]
#[instrument(skip(state))]
pub async fn dismiss_insight(State(state): State<AppState>) -> Result<impl IntoResponse, ErrorResponse> {
    if !state.insights.dismiss()? {
        return Err(ErrorResponse::conflict("An analysis request is in progress"));
    }
    Ok(Json(InsightStateResponse::from(state.insights.state()?)))
}

/// Saved reports, newest first
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    responses(
        (status = 200, description = "Saved reports", body = [ReportResponse]),
    ),
    tag = "insights"
)]
#[instrument(skip(state))]
pub async fn list_reports(State(state): State<AppState>) -> Result<impl IntoResponse, ErrorResponse> {
    let reports = state.store.list_reports()?;
    let body: Vec<ReportResponse> = reports.into_iter().map(ReportResponse::from).collect();
    Ok(Json(body))
}

/// Delete a saved report; requires `confirm=true`
#[utoipa::path(
    delete,
    path = "/api/v1/reports/{id}",
    params(("id" = String, Path, description = "Report id"), ConfirmParams),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 404, description = "Report not found", body = ErrorResponse),
        (status = 409, description = "Confirmation missing", body = ErrorResponse),
    ),
    tag = "insights"
)]
#[instrument(skip(state))]
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if !params.confirm {
        return Err(ErrorResponse::confirmation_required("report"));
    }

    if state.store.delete_report(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ErrorResponse::not_found("report"))
    }
}
