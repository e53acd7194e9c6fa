use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Role;

/// Registered user. `password_hash` never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub role: Role,
    pub name: String,
    pub surname: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new account. The store assigns id and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub role: Role,
    pub name: String,
    pub surname: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub username: String,
    pub password_hash: String,
}
