//! Bug-list filter state: three optional fields, conjunctive exact match.
//!
//! The same struct is the axum `Query` payload for `GET /api/bugs` and
//! `GET /api/stats`, so filter state lives in the page's query parameters
//! and survives reloads.

use serde::{Deserialize, Serialize};

use crate::models::{Bug, PenaltyStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BugFilter {
    pub developer: Option<String>,
    pub sprint: Option<String>,
    pub status: Option<PenaltyStatus>,
}

impl BugFilter {
    /// A bug passes iff every non-null field matches the corresponding
    /// attribute exactly. An empty filter passes everything.
    pub fn matches(&self, bug: &Bug) -> bool {
        if let Some(dev) = &self.developer {
            if bug.developer_id.as_deref() != Some(dev.as_str()) {
                return false;
            }
        }
        if let Some(sprint) = &self.sprint {
            if bug.sprint_id.as_deref() != Some(sprint.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if bug.penalty_status != status {
                return false;
            }
        }
        true
    }

    /// Clears all three fields at once.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.developer.is_none() && self.sprint.is_none() && self.status.is_none()
    }
}
