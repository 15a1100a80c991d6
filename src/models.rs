use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A tracked developer. `id` always equals the identity provider's stable
/// user id; the session resolution routine repairs rows where it does not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Developer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Developer,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Developer => "developer",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "developer" => Ok(Self::Developer),
            "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// A bounded time period that bugs and penalties are grouped under.
/// Dates are YYYY-MM-DD strings; "active" is derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub penalty_url: Option<String>,
    pub created_at: String,
}

/// Payment lifecycle of a bug's penalty.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyStatus {
    Pending,
    Paid,
    Waived,
}

impl Default for PenaltyStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl PenaltyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Waived => "waived",
        }
    }
}

impl std::fmt::Display for PenaltyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PenaltyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "waived" => Ok(Self::Waived),
            _ => Err(format!("Invalid penalty status: {}", s)),
        }
    }
}

/// A recorded defect. Both references are nullable: deleting the developer
/// or sprint detaches the bug rather than cascading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bug {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub sprint_id: Option<String>,
    pub developer_id: Option<String>,
    pub penalty_amount: f64,
    pub penalty_status: PenaltyStatus,
    pub image_url: Option<String>,
    pub created_at: String,
}

/// A bug joined with its developer and sprint rows, the shape every read
/// path returns so views never re-fetch the referenced entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugDetails {
    #[serde(flatten)]
    pub bug: Bug,
    pub developer: Option<Developer>,
    pub sprint: Option<Sprint>,
}

/// The opaque authenticated identity the provider hands back: a stable id
/// and the email it was registered with. Everything else about the
/// provider is hidden behind the auth module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

// ── Tests ────────────────────────────────────────────────────────────
