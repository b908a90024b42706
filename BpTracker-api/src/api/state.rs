use std::sync::Arc;
use std::time::{Duration, Instant};

use bp_tracker_data::repository::RecordStore;
use bp_tracker_domain::clients::{AnalysisClient, ExtractionClient};
use bp_tracker_domain::config::AiConfig;
use bp_tracker_domain::services::{ImportMerger, InsightPipeline, RecordService};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub records: RecordService,
    pub importer: ImportMerger,
    pub insights: Arc<InsightPipeline>,
    pub ai_config: Arc<AiConfig>,
    pub started_at: Instant,
}

impl AppState {
    /// Wire services around one store and the two collaborators
    pub fn new(
        store: Arc<RecordStore>,
        analysis: Arc<dyn AnalysisClient>,
        extraction: Arc<dyn ExtractionClient>,
        ai_config: AiConfig,
    ) -> Self {
        let insights = InsightPipeline::new(analysis).with_timeout(ai_config.timeout);

        Self {
            records: RecordService::new(store.clone()),
            importer: ImportMerger::new(extraction),
            insights: Arc::new(insights),
            ai_config: Arc::new(ai_config),
            started_at: Instant::now(),
            store,
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
