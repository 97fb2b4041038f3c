use super::user::MemberSummary;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One member's portion of an expense.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Split {
    pub user: String,
    pub share: Decimal,
}

impl Split {
    pub fn new(user: impl Into<String>, share: Decimal) -> Self {
        Split {
            user: user.into(),
            share,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: String,
    pub group: String,
    pub description: String,
    pub amount: Decimal,
    pub paid_by: String,
    pub split_between: Vec<Split>,
    pub date: DateTime<Utc>,
    pub category: Option<String>,
}

impl Expense {
    pub fn share_of(&self, user_id: &str) -> Option<Decimal> {
        self.split_between
            .iter()
            .find(|s| s.user == user_id)
            .map(|s| s.share)
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.paid_by == user_id || self.split_between.iter().any(|s| s.user == user_id)
    }
}

/// Body of an expense creation request. The payer is always the caller.
#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub split_between: Vec<Split>,
    #[schema(value_type = Option<String>)]
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

/// Expense fields the payer may edit after creation.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub split_between: Option<Vec<Split>>,
    pub category: Option<String>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.split_between.is_none()
            && self.category.is_none()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SplitView {
    pub user: MemberSummary,
    pub share: Decimal,
}

/// An expense with payer and split users resolved for API responses.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    pub id: String,
    pub group: String,
    pub description: String,
    pub amount: Decimal,
    pub paid_by: MemberSummary,
    pub split_between: Vec<SplitView>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub date: DateTime<Utc>,
    pub category: Option<String>,
}
