use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Member id to signed balance: positive is owed to the member, negative
/// means the member owes.
pub type Balances = BTreeMap<String, Decimal>;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub group_total: Decimal,
    #[schema(value_type = BTreeMap<String, String>)]
    pub balances: Balances,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserTotals {
    pub total_owed: Decimal,
    pub total_owe: Decimal,
    pub net_balance: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_expenses: Decimal,
    pub total_owed: Decimal,
    pub total_owe: Decimal,
    pub settled_balance: Decimal,
    pub groups_count: usize,
    /// Carried on the wire by the user record it is reported with.
    #[serde(skip)]
    pub last_activity: DateTime<Utc>,
}
