use crate::core::errors::SplitError;
use crate::core::models::ActivityEntry;
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryLogging {
    logs: Arc<RwLock<Vec<ActivityEntry>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        action: &str,
        group_id: Option<&str>,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SplitError> {
        let details = serde_json::from_value(details)
            .map_err(|e| SplitError::LoggingError(format!("Failed to serialize log details: {}", e)))?;
        let mut logs = self.logs.write().await;
        logs.push(ActivityEntry {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            group_id: group_id.map(String::from),
            user_id: user_id.map(String::from),
            details,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<ActivityEntry>, SplitError> {
        let logs = self.logs.read().await;
        Ok(logs.clone())
    }

    async fn get_group_logs(&self, group_id: &str) -> Result<Vec<ActivityEntry>, SplitError> {
        let logs = self.logs.read().await;
        Ok(logs
            .iter()
            .rev()
            .filter(|entry| entry.group_id.as_deref() == Some(group_id))
            .cloned()
            .collect())
    }
}
