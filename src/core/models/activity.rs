use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub action: String,
    pub group_id: Option<String>,
    pub user_id: Option<String>,
    #[schema(value_type = Object)]
    pub details: HashMap<String, serde_json::Value>,
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = i64, example = 1717245296)]
    pub timestamp: DateTime<Utc>,
}
