//! Domain layer health check functionality
//! Reports on the record store and the text-generation collaborator

use std::collections::HashMap;

use tracing::warn;

use bp_tracker_data::repository::RecordStore;
use crate::config::AiConfig;

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    pub components: HashMap<String, HealthComponent>,
}

/// Check that the storage backend answers a read of the records entry
pub fn check_storage_status(store: &RecordStore) -> HealthComponent {
    let checked = store.check_storage().and_then(|_| store.len());
    match checked {
        Ok(count) => HealthComponent {
            status: ComponentStatus::Healthy,
            details: Some(format!("{} backend, {} records", store.backend_name(), count)),
        },
        Err(e) => {
            warn!("Storage health check failed: {}", e);
            HealthComponent {
                status: ComponentStatus::Unhealthy,
                details: Some(e.to_string()),
            }
        }
    }
}

/// Analysis and import are unavailable without an API key; the rest works
pub fn check_ai_status(config: &AiConfig) -> HealthComponent {
    if config.is_configured() {
        HealthComponent {
            status: ComponentStatus::Healthy,
            details: Some(format!("model {}", config.model)),
        }
    } else {
        HealthComponent {
            status: ComponentStatus::Degraded,
            details: Some("API key not set; analysis and import are disabled".to_string()),
        }
    }
}

/// Get overall system health
pub fn get_system_health(store: &RecordStore, ai: &AiConfig) -> SystemHealth {
    let storage = check_storage_status(store);
    let ai = check_ai_status(ai);

    let overall_status = if storage.status == ComponentStatus::Unhealthy {
        SystemStatus::Unhealthy
    } else if storage.status == ComponentStatus::Degraded || ai.status != ComponentStatus::Healthy {
        SystemStatus::Degraded
    } else {
        SystemStatus::Healthy
    };

    SystemHealth {
        status: overall_status,
        components: vec![("storage".to_string(), storage), ("ai".to_string(), ai)]
            .into_iter()
            .collect(),
    }
}
