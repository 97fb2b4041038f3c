pub mod in_memory;

use crate::core::errors::SplitError;
use crate::core::models::ActivityEntry;
use async_trait::async_trait;

#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        action: &str,
        group_id: Option<&str>,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SplitError>;
    async fn get_logs(&self) -> Result<Vec<ActivityEntry>, SplitError>;
    /// Entries recorded against one group, newest first.
    async fn get_group_logs(&self, group_id: &str) -> Result<Vec<ActivityEntry>, SplitError>;
}
