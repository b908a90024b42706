use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Record endpoints
        crate::api::handlers::records::list_records,
        crate::api::handlers::records::get_record,
        crate::api::handlers::records::create_record,
        crate::api::handlers::records::update_record,
        crate::api::handlers::records::delete_record,
        crate::api::handlers::records::get_chart,
        crate::api::handlers::records::get_stats,
        crate::api::handlers::records::export_records,

        // Import endpoints
        crate::api::handlers::import::preview_import,
        crate::api::handlers::import::commit_import,
        crate::api::handlers::import::import_text,

        // Analysis endpoints
        crate::api::handlers::insights::request_insight,
        crate::api::handlers::insights::get_insight,
        crate::api::handlers::insights::save_insight,
        crate::api::handlers::insights::dismiss_insight,
        crate::api::handlers::insights::list_reports,
        crate::api::handlers::insights::delete_report
    ),
    components(
        schemas(
            // Records
            crate::entities::records::ArmDto,
            crate::entities::records::RecordResponse,
            crate::entities::records::MeasurementRequest,
            crate::entities::records::ChartPointResponse,
            crate::entities::records::ChartResponse,
            crate::entities::records::StatsResponse,

            // Import and analysis
            crate::entities::insights::ImportTextRequest,
            crate::entities::insights::ImportRecordRequest,
            crate::entities::insights::ImportCommitRequest,
            crate::entities::insights::ImportResponse,
            crate::entities::insights::InsightStateResponse,
            crate::entities::insights::ReportResponse,

            // Common
            crate::entities::common::ErrorResponse,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "records", description = "Blood pressure record management"),
        (name = "import", description = "Free-text import of measurements"),
        (name = "insights", description = "Trend analysis and saved reports")
    ),
    info(
        title = "BpTracker API",
        version = "0.1.0",
        description = "Local API for recording blood pressure and reviewing trends",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local server")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "BpTracker API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().expect("tags are declared");
        for name in ["health", "records", "import", "insights"] {
            assert!(tags.iter().any(|tag| tag.name == name), "missing tag {}", name);
        }

        for path in [
            "/health",
            "/api/v1/records",
            "/api/v1/records/{id}",
            "/api/v1/records/chart",
            "/api/v1/records/stats",
            "/api/v1/records/export",
            "/api/v1/import",
            "/api/v1/import/preview",
            "/api/v1/import/commit",
            "/api/v1/insights",
            "/api/v1/insights/save",
            "/api/v1/reports",
            "/api/v1/reports/{id}",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing path {}", path);
        }
    }

    #[test]
    fn test_schema_serializes() {
        let json = ApiDoc::openapi().to_json().expect("schema serializes");
        assert!(json.contains("RecordResponse"));
        assert!(json.contains("ErrorResponse"));
    }
}
