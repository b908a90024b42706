use std::collections::HashSet;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::{AnalysisReport, MeasurementRecord};
use super::errors::RepositoryError;
use super::storage::{KeyValueStorage, RECORDS_KEY, REPORTS_KEY};

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<MeasurementRecord>,
    reports: Vec<AnalysisReport>,
}

/// Owner of all measurement records and saved reports.
///
/// Records are always kept sorted by timestamp, newest first. Every mutation
/// writes the full affected collection through the storage port while the
/// state lock is held, and only then replaces the in-memory copy, so a failed
/// write leaves both sides at the previous state.
pub struct RecordStore {
    storage: Box<dyn KeyValueStorage>,
    state: Mutex<StoreState>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("backend", &self.storage.backend_name())
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Load both collections from storage. Missing entries start empty.
    pub fn open(storage: Box<dyn KeyValueStorage>) -> Result<Self, RepositoryError> {
        let mut records: Vec<MeasurementRecord> = load_entry(storage.as_ref(), RECORDS_KEY)?;
        let reports: Vec<AnalysisReport> = load_entry(storage.as_ref(), REPORTS_KEY)?;

        sort_newest_first(&mut records);

        info!(
            "Record store opened on {} backend: {} records, {} reports",
            storage.backend_name(),
            records.len(),
            reports.len()
        );

        Ok(Self {
            storage,
            state: Mutex::new(StoreState { records, reports }),
        })
    }

    /// Name of the storage backend in use
    pub fn backend_name(&self) -> &'static str {
        self.storage.backend_name()
    }

    /// Insert a record whose id is not yet stored. Returns `false`, without
    /// writing, when the id is taken.
    pub fn insert(&self, record: MeasurementRecord) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock()?;

        if state.records.iter().any(|existing| existing.id == record.id) {
            debug!("Insert of existing id {} refused", record.id);
            return Ok(false);
        }

        let mut next = state.records.clone();
        next.push(record);
        sort_newest_first(&mut next);

        self.persist(RECORDS_KEY, &next)?;
        state.records = next;

        Ok(true)
    }

    /// Replace the stored record with the same id. Returns `false`, without
    /// writing, when no such record exists.
    pub fn replace(&self, record: MeasurementRecord) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock()?;

        let mut next = state.records.clone();
        match next.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => {
                debug!("Replace of unknown record {} ignored", record.id);
                return Ok(false);
            }
        }
        sort_newest_first(&mut next);

        self.persist(RECORDS_KEY, &next)?;
        state.records = next;

        Ok(true)
    }

    /// Insert a record, or replace the record with the same id
    pub fn upsert(&self, record: MeasurementRecord) -> Result<MeasurementRecord, RepositoryError> {
        let mut state = self.state.lock()?;

        let mut next = state.records.clone();
        match next.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => {
                debug!("Replacing record {}", record.id);
                *existing = record.clone();
            }
            None => {
                debug!("Inserting record {}", record.id);
                next.push(record.clone());
            }
        }
        sort_newest_first(&mut next);

        self.persist(RECORDS_KEY, &next)?;
        state.records = next;

        Ok(record)
    }

    /// Insert a batch of new records in one write. Ids are not checked
    /// against existing records; callers hand in fresh ids.
    pub fn bulk_insert(&self, records: Vec<MeasurementRecord>) -> Result<usize, RepositoryError> {
        let inserted = records.len();
        if inserted == 0 {
            return Ok(0);
        }

        let mut state = self.state.lock()?;

        let mut next = state.records.clone();
        next.extend(records);
        sort_newest_first(&mut next);

        self.persist(RECORDS_KEY, &next)?;
        state.records = next;

        info!("Bulk inserted {} records", inserted);
        Ok(inserted)
    }

    /// Remove the record with `id`. Returns `false`, without writing, when
    /// no such record exists.
    pub fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock()?;

        if !state.records.iter().any(|record| record.id == id) {
            debug!("Delete of unknown record {} ignored", id);
            return Ok(false);
        }

        let next: Vec<MeasurementRecord> = state
            .records
            .iter()
            .filter(|record| record.id != id)
            .cloned()
            .collect();

        self.persist(RECORDS_KEY, &next)?;
        state.records = next;

        Ok(true)
    }

    /// Snapshot of all records, newest first
    pub fn list(&self) -> Result<Vec<MeasurementRecord>, RepositoryError> {
        Ok(self.state.lock()?.records.clone())
    }

    /// Look up a single record
    pub fn get(&self, id: &str) -> Result<Option<MeasurementRecord>, RepositoryError> {
        let state = self.state.lock()?;
        Ok(state.records.iter().find(|record| record.id == id).cloned())
    }

    /// Most recent record, if any
    pub fn latest(&self) -> Result<Option<MeasurementRecord>, RepositoryError> {
        Ok(self.state.lock()?.records.first().cloned())
    }

    /// Read the records entry through the storage port, so a missing or
    /// unreadable backend shows up even though reads are served from memory
    pub fn check_storage(&self) -> Result<(), RepositoryError> {
        self.storage.get(RECORDS_KEY)?;
        Ok(())
    }

    /// Number of stored records
    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.state.lock()?.records.len())
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }

    /// Ids of all stored records
    pub fn ids(&self) -> Result<HashSet<String>, RepositoryError> {
        let state = self.state.lock()?;
        Ok(state.records.iter().map(|record| record.id.clone()).collect())
    }

    /// Save a report; it becomes the first entry of `list_reports`
    pub fn save_report(&self, report: AnalysisReport) -> Result<AnalysisReport, RepositoryError> {
        let mut state = self.state.lock()?;

        let mut next = Vec::with_capacity(state.reports.len() + 1);
        next.push(report.clone());
        next.extend(state.reports.iter().cloned());

        self.persist(REPORTS_KEY, &next)?;
        state.reports = next;

        info!("Saved analysis report {} ({} records)", report.id, report.record_count);
        Ok(report)
    }

    /// Remove a saved report. Returns `false` when it does not exist.
    pub fn delete_report(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock()?;

        if !state.reports.iter().any(|report| report.id == id) {
            return Ok(false);
        }

        let next: Vec<AnalysisReport> = state
            .reports
            .iter()
            .filter(|report| report.id != id)
            .cloned()
            .collect();

        self.persist(REPORTS_KEY, &next)?;
        state.reports = next;

        Ok(true)
    }

    /// Snapshot of saved reports, newest first
    pub fn list_reports(&self) -> Result<Vec<AnalysisReport>, RepositoryError> {
        Ok(self.state.lock()?.reports.clone())
    }

    fn persist<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(items)?;
        self.storage.put(key, &payload).map_err(|e| {
            warn!("Persisting '{}' failed, mutation discarded: {}", key, e);
            RepositoryError::Storage(e)
        })
    }
}

fn load_entry<T: DeserializeOwned>(
    storage: &dyn KeyValueStorage,
    key: &str,
) -> Result<Vec<T>, RepositoryError> {
    match storage.get(key)? {
        Some(raw) if !raw.trim().is_empty() => {
            serde_json::from_str(&raw).map_err(|e| RepositoryError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
        }
        _ => Ok(Vec::new()),
    }
}

fn sort_newest_first(records: &mut [MeasurementRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
