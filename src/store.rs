//! Repository traits over the entity collections.
//!
//! Handlers and the session-resolution routine program against these
//! traits rather than the SQLite type directly, so the logic on top of
//! the store is testable with an in-memory fake. [`LedgerDb`] is the
//! only production implementation; every method is a pass-through to
//! the corresponding query with no retry or extra validation.

use chrono::NaiveDate;

use crate::db::LedgerDb;
use crate::db::developers::DeveloperPatch;
use crate::errors::StoreError;
use crate::models::{Bug, BugDetails, Developer, PenaltyStatus, Sprint};

pub trait DeveloperStore {
    fn list_developers(&self) -> Result<Vec<Developer>, StoreError>;
    fn get_developer(&self, id: &str) -> Result<Option<Developer>, StoreError>;
    fn get_developer_by_email(&self, email: &str) -> Result<Option<Developer>, StoreError>;
    fn create_developer(&self, developer: &Developer) -> Result<Developer, StoreError>;
    fn update_developer(&self, id: &str, patch: &DeveloperPatch)
    -> Result<Developer, StoreError>;
    fn delete_developer(&self, id: &str) -> Result<bool, StoreError>;
    fn rekey_developer(&self, old_id: &str, new_id: &str) -> Result<bool, StoreError>;
}

pub trait SprintStore {
    fn list_sprints(&self) -> Result<Vec<Sprint>, StoreError>;
    fn get_sprint(&self, id: &str) -> Result<Option<Sprint>, StoreError>;
    fn active_sprint(&self, today: NaiveDate) -> Result<Option<Sprint>, StoreError>;
    fn create_sprint(&self, sprint: &Sprint) -> Result<Sprint, StoreError>;
    fn update_sprint(
        &self,
        id: &str,
        name: &str,
        start_date: &str,
        end_date: &str,
        penalty_url: Option<&str>,
    ) -> Result<Sprint, StoreError>;
    fn delete_sprint(&self, id: &str) -> Result<bool, StoreError>;
}

pub trait BugStore {
    fn list_bugs(&self) -> Result<Vec<BugDetails>, StoreError>;
    fn get_bug(&self, id: &str) -> Result<Option<BugDetails>, StoreError>;
    fn create_bug(&self, bug: &Bug) -> Result<BugDetails, StoreError>;
    #[allow(clippy::too_many_arguments)]
    fn update_bug(
        &self,
        id: &str,
        title: &str,
        description: Option<&str>,
        sprint_id: Option<&str>,
        developer_id: Option<&str>,
        penalty_amount: f64,
        penalty_status: PenaltyStatus,
        image_url: Option<&str>,
    ) -> Result<BugDetails, StoreError>;
    fn set_bug_status(&self, id: &str, status: PenaltyStatus) -> Result<BugDetails, StoreError>;
    fn delete_bug(&self, id: &str) -> Result<bool, StoreError>;
}

impl DeveloperStore for LedgerDb {
    fn list_developers(&self) -> Result<Vec<Developer>, StoreError> {
        LedgerDb::list_developers(self)
    }
    fn get_developer(&self, id: &str) -> Result<Option<Developer>, StoreError> {
        LedgerDb::get_developer(self, id)
    }
    fn get_developer_by_email(&self, email: &str) -> Result<Option<Developer>, StoreError> {
        LedgerDb::get_developer_by_email(self, email)
    }
    fn create_developer(&self, developer: &Developer) -> Result<Developer, StoreError> {
        LedgerDb::create_developer(self, developer)
    }
    fn update_developer(
        &self,
        id: &str,
        patch: &DeveloperPatch,
    ) -> Result<Developer, StoreError> {
        LedgerDb::update_developer(self, id, patch)
    }
    fn delete_developer(&self, id: &str) -> Result<bool, StoreError> {
        LedgerDb::delete_developer(self, id)
    }
    fn rekey_developer(&self, old_id: &str, new_id: &str) -> Result<bool, StoreError> {
        LedgerDb::rekey_developer(self, old_id, new_id)
    }
}

impl SprintStore for LedgerDb {
    fn list_sprints(&self) -> Result<Vec<Sprint>, StoreError> {
        LedgerDb::list_sprints(self)
    }
    fn get_sprint(&self, id: &str) -> Result<Option<Sprint>, StoreError> {
        LedgerDb::get_sprint(self, id)
    }
    fn active_sprint(&self, today: NaiveDate) -> Result<Option<Sprint>, StoreError> {
        LedgerDb::active_sprint(self, today)
    }
    fn create_sprint(&self, sprint: &Sprint) -> Result<Sprint, StoreError> {
        LedgerDb::create_sprint(self, sprint)
    }
    fn update_sprint(
        &self,
        id: &str,
        name: &str,
        start_date: &str,
        end_date: &str,
        penalty_url: Option<&str>,
    ) -> Result<Sprint, StoreError> {
        LedgerDb::update_sprint(self, id, name, start_date, end_date, penalty_url)
    }
    fn delete_sprint(&self, id: &str) -> Result<bool, StoreError> {
        LedgerDb::delete_sprint(self, id)
    }
}

impl BugStore for LedgerDb {
    fn list_bugs(&self) -> Result<Vec<BugDetails>, StoreError> {
        LedgerDb::list_bugs(self)
    }
    fn get_bug(&self, id: &str) -> Result<Option<BugDetails>, StoreError> {
        LedgerDb::get_bug(self, id)
    }
    fn create_bug(&self, bug: &Bug) -> Result<BugDetails, StoreError> {
        LedgerDb::create_bug(self, bug)
    }
    fn update_bug(
        &self,
        id: &str,
        title: &str,
        description: Option<&str>,
        sprint_id: Option<&str>,
        developer_id: Option<&str>,
        penalty_amount: f64,
        penalty_status: PenaltyStatus,
        image_url: Option<&str>,
    ) -> Result<BugDetails, StoreError> {
        LedgerDb::update_bug(
            self,
            id,
            title,
            description,
            sprint_id,
            developer_id,
            penalty_amount,
            penalty_status,
            image_url,
        )
    }
    fn set_bug_status(&self, id: &str, status: PenaltyStatus) -> Result<BugDetails, StoreError> {
        LedgerDb::set_bug_status(self, id, status)
    }
    fn delete_bug(&self, id: &str) -> Result<bool, StoreError> {
        LedgerDb::delete_bug(self, id)
    }
}

// ── In-memory fake ────────────────────────────────────────────────────


// ── Tests ─────────────────────────────────────────────────────────────
