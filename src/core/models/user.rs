use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never sent over the wire
    #[serde(skip_serializing, default)]
    pub password: String,
    pub username: Option<String>,
    pub mobile: Option<String>,
    pub currency: Currency,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub last_activity: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

/// The public projection of a user embedded in groups and expenses.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MemberSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
}

impl User {
    pub fn summary(&self) -> MemberSummary {
        MemberSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
        }
    }
}

impl MemberSummary {
    /// Placeholder for a referenced user that no longer resolves.
    pub fn unknown(id: &str) -> Self {
        MemberSummary {
            id: id.to_string(),
            name: String::from("Unknown user"),
            email: String::new(),
            username: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub mobile: Option<String>,
}

/// Fields a user may change on their own profile. Anything else is rejected
/// at deserialization.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
    pub mobile: Option<String>,
    pub currency: Option<Currency>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.username.is_none()
            && self.mobile.is_none()
            && self.currency.is_none()
    }
}
