use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::{Local, Utc};
use tracing::{info, instrument};

use bp_tracker_domain::services::export;

use crate::api::state::AppState;
use crate::entities::common::{ConfirmParams, ErrorResponse};
use crate::entities::records::{
    ChartQueryParams, ChartResponse, MeasurementRequest, RecordResponse, StatsResponse,
};

/// List all records, newest first
#[utoipa::path(
    get,
    path = "/api/v1/records",
    responses(
        (status = 200, description = "All records, newest first", body = [RecordResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "records"
)]
#[instrument(skip(state))]
pub async fn list_records(State(state): State<AppState>) -> Result<impl IntoResponse, ErrorResponse> {
    let records = state.records.list()?;
    let body: Vec<RecordResponse> = records.into_iter().map(RecordResponse::from).collect();
    Ok(Json(body))
}

/// Get a single record by id
#[utoipa::path(
    get,
    path = "/api/v1/records/{id}",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record found", body = RecordResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
    ),
    tag = "records"
)]
#[instrument(skip(state))]
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let record = state.records.get(&id)?;
    Ok(Json(RecordResponse::from(record)))
}

/// Create a record from manual entry
#[utoipa::path(
    post,
    path = "/api/v1/records",
    request_body = MeasurementRequest,
    responses(
        (status = 201, description = "Record created", body = RecordResponse),
        (status = 400, description = "Values out of range", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "records"
)]
#[instrument(skip(state, request))]
pub async fn create_record(
    State(state): State<AppState>,
    Json(request): Json<MeasurementRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    info!("Creating new record");
    let record = state.records.create(request.into())?;
    Ok((StatusCode::CREATED, Json(RecordResponse::from(record))))
}

/// Replace an existing record
#[utoipa::path(
    put,
    path = "/api/v1/records/{id}",
    params(("id" = String, Path, description = "Record id")),
    request_body = MeasurementRequest,
    responses(
        (status = 200, description = "Record replaced", body = RecordResponse),
        (status = 400, description = "Values out of range", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
    ),
    tag = "records"
)]
#[instrument(skip(state, request))]
pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MeasurementRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let record = state.records.update(&id, request.into())?;
    Ok(Json(RecordResponse::from(record)))
}

/// Delete a record; requires `confirm=true`
#[utoipa::path(
    delete,
    path = "/api/v1/records/{id}",
    params(("id" = String, Path, description = "Record id"), ConfirmParams),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 409, description = "Confirmation missing", body = ErrorResponse),
    ),
    tag = "records"
)]
#[instrument(skip(state))]
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if !params.confirm {
        return Err(ErrorResponse::confirmation_required("record"));
    }

    state.records.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Chart series for a date range, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/records/chart",
    params(ChartQueryParams),
    responses(
        (status = 200, description = "Chart series", body = ChartResponse),
        (status = 400, description = "Invalid date", body = ErrorResponse),
    ),
    tag = "records"
)]
#[instrument(skip(state))]
pub async fn get_chart(
    State(state): State<AppState>,
    Query(params): Query<ChartQueryParams>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let range = params
        .resolve(Utc::now().date_naive())
        .ok_or_else(|| ErrorResponse::bad_request("Chart range starts before the earliest supported date"))?;
    let series = state.records.chart(range)?;
    Ok(Json(ChartResponse::new(&series, range)))
}

/// Dashboard averages and latest reading
#[utoipa::path(
    get,
    path = "/api/v1/records/stats",
    responses(
        (status = 200, description = "Summary", body = StatsResponse),
    ),
    tag = "records"
)]
#[instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ErrorResponse> {
    let stats = state.records.stats()?;
    Ok(Json(StatsResponse::from(stats)))
}

/// Export all records as CSV
#[utoipa::path(
    get,
    path = "/api/v1/records/export",
    responses(
        (status = 200, description = "CSV document", body = String, content_type = "text/csv"),
        (status = 404, description = "No records to export", body = ErrorResponse),
    ),
    tag = "records"
)]
#[instrument(skip(state))]
pub async fn export_records(State(state): State<AppState>) -> Result<impl IntoResponse, ErrorResponse> {
    let records = state.records.list()?;
    if records.is_empty() {
        return Err(ErrorResponse::not_found("records to export"));
    }

    let csv = export::export_csv(&records);
    let filename = format!(
        "attachment; filename*=UTF-8''%E8%A1%80%E5%8E%8B%E8%AE%B0%E5%BD%95_{}.csv",
        Local::now().format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    ))
}
