use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, instrument};

use bp_tracker_data::models::MeasurementRecord;

use crate::api::state::AppState;
use crate::entities::common::ErrorResponse;
use crate::entities::insights::{ImportCommitRequest, ImportResponse, ImportTextRequest};

/// Extract records from free text without storing them
#[utoipa::path(
    post,
    path = "/api/v1/import/preview",
    request_body = ImportTextRequest,
    responses(
        (status = 200, description = "Extracted records, not yet stored", body = ImportResponse),
        (status = 400, description = "Empty text", body = ErrorResponse),
        (status = 422, description = "Text could not be parsed", body = ErrorResponse),
    ),
    tag = "import"
)]
#[instrument(skip(state, request))]
pub async fn preview_import(
    State(state): State<AppState>,
    Json(request): Json<ImportTextRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    info!("Previewing import of {} chars", request.text.chars().count());
    let records = state.importer.preview(&state.store, &request.text).await?;
    Ok(Json(ImportResponse::from(records)))
}

/// Store a previewed batch
#[utoipa::path(
    post,
    path = "/api/v1/import/commit",
    request_body = ImportCommitRequest,
    responses(
        (status = 201, description = "Records stored", body = ImportResponse),
        (status = 422, description = "Empty batch", body = ErrorResponse),
    ),
    tag = "import"
)]
#[instrument(skip(state, request))]
pub async fn commit_import(
    State(state): State<AppState>,
    Json(request): Json<ImportCommitRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let records: Vec<MeasurementRecord> = request.records.into_iter().map(Into::into).collect();
    let stored = state.importer.commit(&state.store, records)?;
    Ok((StatusCode::CREATED, Json(ImportResponse::from(stored))))
}

/// Extract and store in one step
#[utoipa::path(
    post,
    path = "/api/v1/import",
    request_body = ImportTextRequest,
    responses(
        (status = 201, description = "Records stored", body = ImportResponse),
        (status = 400, description = "Empty text", body = ErrorResponse),
        (status = 422, description = "Text could not be parsed", body = ErrorResponse),
    ),
    tag = "import"
)]
#[instrument(skip(state, request))]
pub async fn import_text(
    State(state): State<AppState>,
    Json(request): Json<ImportTextRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let stored = state.importer.import(&state.store, &request.text).await?;
    Ok((StatusCode::CREATED, Json(ImportResponse::from(stored))))
}
