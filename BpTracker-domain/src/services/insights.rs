use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use bp_tracker_data::models::AnalysisReport;
use bp_tracker_data::repository::{RecordStore, RepositoryError};
use crate::clients::{AnalysisClient, AnalysisRequest, ANALYSIS_INSTRUCTION};
use crate::config::DEFAULT_AI_TIMEOUT_SECONDS;

/// Number of most recent records sent for analysis
pub const ANALYSIS_WINDOW: usize = 15;

/// Insight pipeline errors
#[derive(Debug, Error)]
pub enum InsightError {
    /// There is nothing to analyze
    #[error("No records to analyze")]
    NoRecords,

    /// A request is already in flight
    #[error("An analysis request is already in progress")]
    AlreadyRequesting,

    /// The collaborator failed or timed out
    #[error("Analysis failed: {0}")]
    Failed(String),

    /// Save was asked for without a finished analysis
    #[error("No completed analysis to save")]
    NothingToSave,

    /// Repository error
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Poisoned state lock
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Where the pipeline currently is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum InsightState {
    Idle,
    Requesting,
    Succeeded(String),
    Failed(String),
}

/// Single-flight analysis of the most recent records.
///
/// The state lock is only taken between awaits; the collaborator call runs
/// without it.
pub struct InsightPipeline {
    client: Arc<dyn AnalysisClient>,
    timeout: Duration,
    instruction: String,
    state: Mutex<InsightState>,
}

impl std::fmt::Debug for InsightPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightPipeline")
            .field("timeout", &self.timeout)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Puts the pipeline back to `Idle` if a request is abandoned mid-flight
struct RequestGuard<'a> {
    state: &'a Mutex<InsightState>,
    armed: bool,
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            if *state == InsightState::Requesting {
                warn!("Analysis request abandoned, returning to idle");
                *state = InsightState::Idle;
            }
        }
    }
}

impl InsightPipeline {
    pub fn new(client: Arc<dyn AnalysisClient>) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECONDS),
            instruction: ANALYSIS_INSTRUCTION.to_string(),
            state: Mutex::new(InsightState::Idle),
        }
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Snapshot of the current state
    pub fn state(&self) -> Result<InsightState, InsightError> {
        Ok(self.lock_state()?.clone())
    }

    /// Run one analysis over the newest records in `store`.
    ///
    /// On success the narrative is held until `save_report` or `dismiss`.
    pub async fn request(&self, store: &RecordStore) -> Result<String, InsightError> {
        let records = store.list()?;
        if records.is_empty() {
            return Err(InsightError::NoRecords);
        }

        {
            let mut state = self.lock_state()?;
            if *state == InsightState::Requesting {
                debug!("Rejecting analysis request, one is already in flight");
                return Err(InsightError::AlreadyRequesting);
            }
            *state = InsightState::Requesting;
        }

        let mut guard = RequestGuard {
            state: &self.state,
            armed: true,
        };

        let window: Vec<_> = records.into_iter().take(ANALYSIS_WINDOW).collect();
        info!("Requesting analysis of {} records", window.len());

        let request = AnalysisRequest {
            records: window,
            instruction: self.instruction.clone(),
        };

        let outcome = match tokio::time::timeout(self.timeout, self.client.analyze(request)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("no response within {} seconds", self.timeout.as_secs_f32())),
        };

        let mut state = self.lock_state()?;
        guard.armed = false;

        match outcome {
            Ok(text) => {
                info!("Analysis succeeded ({} chars)", text.chars().count());
                *state = InsightState::Succeeded(text.clone());
                Ok(text)
            }
            Err(reason) => {
                error!("Analysis failed: {}", reason);
                *state = InsightState::Failed(reason.clone());
                Err(InsightError::Failed(reason))
            }
        }
    }

    /// Persist the held narrative as a report and return to `Idle`
    pub fn save_report(&self, store: &RecordStore) -> Result<AnalysisReport, InsightError> {
        let mut state = self.lock_state()?;

        let InsightState::Succeeded(content) = &*state else {
            return Err(InsightError::NothingToSave);
        };

        let report = AnalysisReport {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            content: content.clone(),
            record_count: store.len()?,
        };

        let saved = store.save_report(report)?;
        *state = InsightState::Idle;

        Ok(saved)
    }

    /// Drop a finished result. Returns `false` while a request is in flight.
    pub fn dismiss(&self) -> Result<bool, InsightError> {
        let mut state = self.lock_state()?;
        if *state == InsightState::Requesting {
            return Ok(false);
        }
        *state = InsightState::Idle;
        Ok(true)
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, InsightState>, InsightError> {
        self.state.lock().map_err(|e| InsightError::Lock(e.to_string()))
    }
}
