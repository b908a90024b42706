use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use bp_tracker_data::models::MeasurementRecord;
use bp_tracker_data::repository::{RecordStore, RepositoryError};
use crate::entities::conversions;
use crate::entities::measurement::{MeasurementInput, MeasurementStats};
use crate::services::export;
use crate::services::projector::{self, ChartSeries, DateRange, DEFAULT_WINDOW_DAYS};
use crate::services::stats;

/// Record service errors
#[derive(Debug, Error)]
pub enum RecordServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found error
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Chart window falls outside the supported calendar
    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    /// Repository error
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Manual entry, editing and the read-side views over the record store
#[derive(Debug, Clone)]
pub struct RecordService {
    store: Arc<RecordStore>,
}

impl RecordService {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Check a manual-entry payload against the measurement ranges
    pub fn validate_input(&self, input: &MeasurementInput) -> Result<(), RecordServiceError> {
        if let Err(validation_errors) = input.validate() {
            let mut fields: Vec<String> = validation_errors
                .field_errors()
                .iter()
                .map(|(field, errors)| {
                    let error_msgs: Vec<String> = errors
                        .iter()
                        .map(|err| match &err.message {
                            Some(msg) => msg.to_string(),
                            None => format!("Invalid {}", field),
                        })
                        .collect();
                    format!("{}: {}", field, error_msgs.join(", "))
                })
                .collect();
            fields.sort();

            return Err(RecordServiceError::Validation(fields.join("; ")));
        }

        Ok(())
    }

    /// Create a record from manual input
    pub fn create(&self, input: MeasurementInput) -> Result<MeasurementRecord, RecordServiceError> {
        self.validate_input(&input)?;

        let mut record = conversions::convert_input_to_record(Uuid::new_v4().to_string(), input);
        while !self.store.insert(record.clone())? {
            debug!("Regenerating colliding id {}", record.id);
            record.id = Uuid::new_v4().to_string();
        }

        info!("Created record {} ({}/{})", record.id, record.systolic, record.diastolic);
        Ok(record)
    }

    /// Replace an existing record in full
    pub fn update(&self, id: &str, input: MeasurementInput) -> Result<MeasurementRecord, RecordServiceError> {
        self.validate_input(&input)?;

        let record = conversions::convert_input_to_record(id.to_string(), input);
        if !self.store.replace(record.clone())? {
            return Err(RecordServiceError::NotFound(id.to_string()));
        }

        info!("Updated record {}", record.id);
        Ok(record)
    }

    /// Delete a record. Returns `NotFound` when nothing was removed.
    pub fn delete(&self, id: &str) -> Result<(), RecordServiceError> {
        if self.store.delete(id)? {
            info!("Deleted record {}", id);
            Ok(())
        } else {
            Err(RecordServiceError::NotFound(id.to_string()))
        }
    }

    pub fn list(&self) -> Result<Vec<MeasurementRecord>, RecordServiceError> {
        Ok(self.store.list()?)
    }

    pub fn get(&self, id: &str) -> Result<MeasurementRecord, RecordServiceError> {
        self.store
            .get(id)?
            .ok_or_else(|| RecordServiceError::NotFound(id.to_string()))
    }

    /// Chart series for `range`
    pub fn chart(&self, range: DateRange) -> Result<ChartSeries, RecordServiceError> {
        debug!("Projecting chart for {} to {}", range.start, range.end);
        Ok(projector::project(&self.store.list()?, range))
    }

    /// Chart series for the default window ending `today`
    pub fn recent_chart(&self, today: NaiveDate) -> Result<ChartSeries, RecordServiceError> {
        let range = DateRange::days_before(today, DEFAULT_WINDOW_DAYS).ok_or_else(|| {
            RecordServiceError::InvalidRange(format!("no {}-day window ends on {}", DEFAULT_WINDOW_DAYS, today))
        })?;
        self.chart(range)
    }

    pub fn stats(&self) -> Result<MeasurementStats, RecordServiceError> {
        Ok(stats::summarize(&self.store.list()?))
    }

    /// CSV of all records, newest first, in local time
    pub fn export_csv(&self) -> Result<String, RecordServiceError> {
        Ok(export::export_csv(&self.store.list()?))
    }
}

/// A UUID v4 string not present in `taken`
pub(crate) fn fresh_id(taken: &HashSet<String>) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !taken.contains(&id) {
            return id;
        }
        debug!("Regenerating colliding id {}", id);
    }
}
