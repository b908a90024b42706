// Public entities for the BpTracker API
// This module contains data structures that cross the HTTP boundary

// Measurement records, chart and stats
pub mod records;

// Import, analysis and saved reports
pub mod insights;

// Common entities for error handling and confirmation
pub mod common;

pub use common::{ConfirmParams, ErrorResponse};
