use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, Local};
use thiserror::Error;
use tracing::{info, warn};

use bp_tracker_data::models::MeasurementRecord;
use bp_tracker_data::repository::{RecordStore, RepositoryError};
use crate::clients::{ExtractionClient, ExtractionRequest};
use crate::entities::conversions::convert_extracted_to_record;
use crate::services::records::fresh_id;

/// Bulk import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// Nothing to parse
    #[error("Import text is empty")]
    EmptyInput,

    /// Extraction failed or produced nothing usable
    #[error("Could not parse measurements from the text: {0}")]
    ParseFailed(String),

    /// Repository error
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Turns free text into records through the extraction collaborator and
/// merges them into the store
#[derive(Clone)]
pub struct ImportMerger {
    client: Arc<dyn ExtractionClient>,
}

impl std::fmt::Debug for ImportMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportMerger").finish_non_exhaustive()
    }
}

impl ImportMerger {
    pub fn new(client: Arc<dyn ExtractionClient>) -> Self {
        Self { client }
    }

    /// Extract records from `text` without touching the store.
    ///
    /// Every returned record has a fresh id that collides neither with the
    /// store nor with the rest of the batch.
    pub async fn preview(&self, store: &RecordStore, text: &str) -> Result<Vec<MeasurementRecord>, ImportError> {
        self.preview_for_year(store, text, Local::now().year()).await
    }

    /// `preview` with an explicit year for dates written without one
    pub async fn preview_for_year(
        &self,
        store: &RecordStore,
        text: &str,
        current_year: i32,
    ) -> Result<Vec<MeasurementRecord>, ImportError> {
        if text.trim().is_empty() {
            return Err(ImportError::EmptyInput);
        }

        let candidates = self
            .client
            .extract(ExtractionRequest {
                text: text.to_string(),
                current_year,
            })
            .await
            .map_err(|e| {
                warn!("Extraction failed: {}", e);
                ImportError::ParseFailed(e.to_string())
            })?;

        if candidates.is_empty() {
            return Err(ImportError::ParseFailed("no measurements found in the text".to_string()));
        }

        let mut taken = store.ids()?;
        let mut records = Vec::with_capacity(candidates.len());

        for (index, candidate) in candidates.iter().enumerate() {
            let id = fresh_id(&taken);
            taken.insert(id.clone());

            let record = convert_extracted_to_record(id, candidate)
                .map_err(|reason| ImportError::ParseFailed(format!("entry {}: {}", index + 1, reason)))?;
            records.push(record);
        }

        info!("Extracted {} records for preview", records.len());
        Ok(records)
    }

    /// Insert a previewed batch in one store update.
    ///
    /// Ids already present in the store, repeated within the batch, or blank
    /// are replaced, so a commit can never overwrite an existing record.
    pub fn commit(&self, store: &RecordStore, records: Vec<MeasurementRecord>) -> Result<Vec<MeasurementRecord>, ImportError> {
        if records.is_empty() {
            return Err(ImportError::ParseFailed("no records to import".to_string()));
        }

        let mut taken: HashSet<String> = store.ids()?;
        let mut batch = Vec::with_capacity(records.len());

        for mut record in records {
            if record.id.trim().is_empty() || taken.contains(&record.id) {
                record.id = fresh_id(&taken);
            }
            taken.insert(record.id.clone());
            batch.push(record);
        }

        store.bulk_insert(batch.clone())?;
        info!("Imported {} records", batch.len());
        Ok(batch)
    }

    /// Preview and commit in one step
    pub async fn import(&self, store: &RecordStore, text: &str) -> Result<Vec<MeasurementRecord>, ImportError> {
        let records = self.preview(store, text).await?;
        self.commit(store, records)
    }
}
