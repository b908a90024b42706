pub mod health;
pub mod import;
pub mod insights;
pub mod records;

// Re-export handlers for easier imports
pub use health::health_check;
pub use import::{commit_import, import_text, preview_import};
pub use insights::{
    delete_report, dismiss_insight, get_insight, list_reports, request_insight, save_insight,
};
pub use records::{
    create_record, delete_record, export_records, get_chart, get_record, get_stats, list_records,
    update_record,
};
