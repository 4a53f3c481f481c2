use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Identity claims carried inside the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

/// A patent record as the backend returns it.
///
/// The backend exposes Mongo-style `_id` keys and camelCase timestamps;
/// everything beyond `_id` and `name` is tolerated as missing so that
/// older records still render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, rename = "createdBy")]
    pub created_by: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PatentSummary {
    /// Registration date formatted for display, or a dash when absent.
    pub fn created_at_display(&self) -> String {
        match self.created_at {
            Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d").to_string(),
            None => "-".to_string(),
        }
    }
}

/// Request body for creating or replacing a patent record.
#[derive(Debug, Clone, Serialize)]
pub struct NewPatent {
    pub name: String,
    pub description: String,
    pub category: String,
}
