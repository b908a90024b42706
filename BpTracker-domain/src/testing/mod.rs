// Testing utilities and mock collaborators for the domain layer
// Available to this crate's tests and, with the "mock" feature, to dependent crates

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use bp_tracker_data::models::{Arm, MeasurementRecord};
use bp_tracker_data::repository::{InMemoryStorage, RecordStore, RepositoryError};
use crate::clients::{AnalysisClient, AnalysisRequest, ClientError, ExtractionClient, ExtractionRequest};
use crate::entities::measurement::ExtractedMeasurement;

/// Open a store over a fresh in-memory backend, returning the backend too
pub fn memory_store() -> Result<(RecordStore, InMemoryStorage), RepositoryError> {
    let storage = InMemoryStorage::new();
    let store = RecordStore::open(Box::new(storage.clone()))?;
    Ok((store, storage))
}

/// A record with fixed heart rate and arm
pub fn record_at(id: &str, timestamp: DateTime<Utc>, systolic: u16, diastolic: u16) -> MeasurementRecord {
    MeasurementRecord {
        id: id.to_string(),
        timestamp,
        systolic,
        diastolic,
        heart_rate: 72,
        arm: Arm::Left,
        note: String::new(),
    }
}

/// An extraction candidate as the service would return it
pub fn candidate(timestamp: &str, systolic: f64, diastolic: f64) -> ExtractedMeasurement {
    ExtractedMeasurement {
        timestamp: timestamp.to_string(),
        systolic,
        diastolic,
        heart_rate: 70.0,
        arm: "右手".to_string(),
        note: String::new(),
    }
}

/// Analysis client answering every call with the same outcome
#[derive(Debug)]
pub struct StaticAnalysisClient {
    outcome: Result<String, String>,
    calls: AtomicUsize,
    last_request: Mutex<Option<AnalysisRequest>>,
}

impl StaticAnalysisClient {
    /// Succeed with `text`
    pub fn replying(text: &str) -> Self {
        Self {
            outcome: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Fail with a transport error carrying `reason`
    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<AnalysisRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl AnalysisClient for StaticAnalysisClient {
    async fn analyze(&self, request: AnalysisRequest) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request);
        }
        self.outcome.clone().map_err(ClientError::Transport)
    }
}

/// Analysis client that parks every call until released
#[derive(Debug, Default)]
pub struct GatedAnalysisClient {
    entered: Notify,
    release: Notify,
}

impl GatedAnalysisClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait until a call is parked inside the client
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let one parked call finish
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl AnalysisClient for GatedAnalysisClient {
    async fn analyze(&self, request: AnalysisRequest) -> Result<String, ClientError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(format!("analysis of {} records", request.records.len()))
    }
}

/// Analysis client that never answers
#[derive(Debug, Default)]
pub struct HangingAnalysisClient;

#[async_trait]
impl AnalysisClient for HangingAnalysisClient {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<String, ClientError> {
        std::future::pending::<()>().await;
        Err(ClientError::EmptyResponse)
    }
}

/// Extraction client answering every call with the same outcome
#[derive(Debug)]
pub struct StaticExtractionClient {
    outcome: Result<Vec<ExtractedMeasurement>, String>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ExtractionRequest>>,
}

impl StaticExtractionClient {
    pub fn returning(candidates: Vec<ExtractedMeasurement>) -> Self {
        Self {
            outcome: Ok(candidates),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ExtractionRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl ExtractionClient for StaticExtractionClient {
    async fn extract(&self, request: ExtractionRequest) -> Result<Vec<ExtractedMeasurement>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request);
        }
        self.outcome.clone().map_err(ClientError::InvalidResponse)
    }
}
