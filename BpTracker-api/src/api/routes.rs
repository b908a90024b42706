use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

use crate::api::handlers::{health, import, insights, records};
use crate::api::state::AppState;
use crate::openapi::configure_swagger_routes;

/// Create the application router. Cross-origin access is granted only to
/// `allowed_origins`; with none, browsers keep other sites out.
pub fn create_app(state: AppState, allowed_origins: &[HeaderValue]) -> Router {
    debug!("Creating application router");

    let api_routes = Router::new()
        // Define specific routes before parametrized routes to avoid conflicts
        .route("/records/chart", get(records::get_chart))
        .route("/records/stats", get(records::get_stats))
        .route("/records/export", get(records::export_records))
        .route(
            "/records",
            get(records::list_records).post(records::create_record),
        )
        .route(
            "/records/:id",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route("/import/preview", post(import::preview_import))
        .route("/import/commit", post(import::commit_import))
        .route("/import", post(import::import_text))
        .route("/insights/save", post(insights::save_insight))
        .route(
            "/insights",
            get(insights::get_insight)
                .post(insights::request_insight)
                .delete(insights::dismiss_insight),
        )
        .route("/reports", get(insights::list_reports))
        .route("/reports/:id", delete(insights::delete_report));

    debug!("API routes configured");

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes)
        .with_state(state);

    let app = add_swagger_ui(app);
    debug!("Swagger UI merged");

    let app = app.layer(TraceLayer::new_for_http());

    if allowed_origins.is_empty() {
        return app;
    }

    debug!("CORS enabled for {} origins", allowed_origins.len());
    app.layer(
        CorsLayer::new()
            .allow_origin(allowed_origins.to_vec())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    app.merge(configure_swagger_routes())
}
