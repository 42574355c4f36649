// src/models/principal.rs
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Portal role. Only ever taken from the backend's answer, never from user input.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Developer,
    Client,
}

impl Role {
    #[cfg(test)]
    pub const ALL: [Role; 3] = [Role::Admin, Role::Developer, Role::Client];

    /// Default route a principal of this role is sent to.
    pub fn landing(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Developer => "/dev",
            Role::Client => "/client",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Developer => "developer",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Active,
    Suspended,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
        })
    }
}

/// The authenticated user as resolved from the backend.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Principal {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    #[serde(rename = "avatarUrl", default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Principal {
    /// Registered client that an admin has not admitted yet.
    pub fn awaiting_approval(&self) -> bool {
        self.role == Role::Client && self.status == AccountStatus::Pending
    }
}

// Backends hand out ids as strings or integers; both are kept as opaque text.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Client-held session record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub principal: Option<Principal>,
    /// Whether the initial resync has completed.
    pub resolved: bool,
}
