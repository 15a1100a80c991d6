use std::str::FromStr;

use rusqlite::params;

use super::LedgerDb;
use crate::errors::StoreError;
use crate::models::{Bug, BugDetails, Developer, PenaltyStatus, Role, Sprint};

const BUG_JOIN_COLUMNS: &str = "\
    b.id, b.title, b.description, b.sprint_id, b.developer_id, \
    b.penalty_amount, b.penalty_status, b.image_url, b.created_at, \
    d.id, d.name, d.email, d.avatar_url, d.role, d.created_at, \
    s.id, s.name, s.start_date, s.end_date, s.penalty_url, s.created_at";

/// Intermediate row struct for the bug LEFT JOIN before converting the
/// status/role strings into typed values. Joined columns are all
/// nullable; `d.id`/`s.id` being NULL means the reference is detached.
struct BugJoinRow {
    id: String,
    title: String,
    description: Option<String>,
    sprint_id: Option<String>,
    developer_id: Option<String>,
    penalty_amount: f64,
    penalty_status: String,
    image_url: Option<String>,
    created_at: String,
    dev_id: Option<String>,
    dev_name: Option<String>,
    dev_email: Option<String>,
    dev_avatar_url: Option<String>,
    dev_role: Option<String>,
    dev_created_at: Option<String>,
    spr_id: Option<String>,
    spr_name: Option<String>,
    spr_start_date: Option<String>,
    spr_end_date: Option<String>,
    spr_penalty_url: Option<String>,
    spr_created_at: Option<String>,
}

impl BugJoinRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            sprint_id: row.get(3)?,
            developer_id: row.get(4)?,
            penalty_amount: row.get(5)?,
            penalty_status: row.get(6)?,
            image_url: row.get(7)?,
            created_at: row.get(8)?,
            dev_id: row.get(9)?,
            dev_name: row.get(10)?,
            dev_email: row.get(11)?,
            dev_avatar_url: row.get(12)?,
            dev_role: row.get(13)?,
            dev_created_at: row.get(14)?,
            spr_id: row.get(15)?,
            spr_name: row.get(16)?,
            spr_start_date: row.get(17)?,
            spr_end_date: row.get(18)?,
            spr_penalty_url: row.get(19)?,
            spr_created_at: row.get(20)?,
        })
    }

    fn into_details(self) -> Result<BugDetails, StoreError> {
        let penalty_status =
            PenaltyStatus::from_str(&self.penalty_status).map_err(StoreError::Decode)?;

        let developer = match (self.dev_id, self.dev_name, self.dev_email) {
            (Some(id), Some(name), Some(email)) => {
                let role_str = self.dev_role.unwrap_or_default();
                let role = Role::from_str(&role_str).map_err(StoreError::Decode)?;
                Some(Developer {
                    id,
                    name,
                    email,
                    avatar_url: self.dev_avatar_url,
                    role,
                    created_at: self.dev_created_at.unwrap_or_default(),
                })
            }
            _ => None,
        };

        let sprint = match (self.spr_id, self.spr_name) {
            (Some(id), Some(name)) => Some(Sprint {
                id,
                name,
                start_date: self.spr_start_date.unwrap_or_default(),
                end_date: self.spr_end_date.unwrap_or_default(),
                penalty_url: self.spr_penalty_url,
                created_at: self.spr_created_at.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(BugDetails {
            bug: Bug {
                id: self.id,
                title: self.title,
                description: self.description,
                sprint_id: self.sprint_id,
                developer_id: self.developer_id,
                penalty_amount: self.penalty_amount,
                penalty_status,
                image_url: self.image_url,
                created_at: self.created_at,
            },
            developer,
            sprint,
        })
    }
}

impl LedgerDb {
    // ── Bug CRUD ──────────────────────────────────────────────────────

    pub fn create_bug(&self, bug: &Bug) -> Result<BugDetails, StoreError> {
        self.conn.execute(
            "INSERT INTO bugs (id, title, description, sprint_id, developer_id,
                               penalty_amount, penalty_status, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                bug.id,
                bug.title,
                bug.description,
                bug.sprint_id,
                bug.developer_id,
                bug.penalty_amount,
                bug.penalty_status.as_str(),
                bug.image_url,
                bug.created_at,
            ],
        )?;
        self.get_bug(&bug.id)?
            .ok_or_else(|| StoreError::not_found("bug", &bug.id))
    }

    /// All bugs with their developer and sprint rows joined in, newest
    /// first. Detached references come back as `None`.
    pub fn list_bugs(&self) -> Result<Vec<BugDetails>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BUG_JOIN_COLUMNS}
             FROM bugs b
             LEFT JOIN developers d ON d.id = b.developer_id
             LEFT JOIN sprints s ON s.id = b.sprint_id
             ORDER BY b.created_at DESC"
        ))?;
        let rows = stmt.query_map([], BugJoinRow::from_row)?;
        let mut bugs = Vec::new();
        for row in rows {
            bugs.push(row?.into_details()?);
        }
        Ok(bugs)
    }

    pub fn get_bug(&self, id: &str) -> Result<Option<BugDetails>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BUG_JOIN_COLUMNS}
             FROM bugs b
             LEFT JOIN developers d ON d.id = b.developer_id
             LEFT JOIN sprints s ON s.id = b.sprint_id
             WHERE b.id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], BugJoinRow::from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?.into_details()?)),
            None => Ok(None),
        }
    }

    /// Full replace of the editable fields. The edit dialog submits the
    /// whole form; `created_at` and `id` never change.
    #[allow(clippy::too_many_arguments)]
    pub fn update_bug(
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
        let count = self.conn.execute(
            "UPDATE bugs SET title = ?1, description = ?2, sprint_id = ?3, developer_id = ?4,
                             penalty_amount = ?5, penalty_status = ?6, image_url = ?7
             WHERE id = ?8",
            params![
                title,
                description,
                sprint_id,
                developer_id,
                penalty_amount,
                penalty_status.as_str(),
                image_url,
                id
            ],
        )?;
        if count == 0 {
            return Err(StoreError::not_found("bug", id));
        }
        self.get_bug(id)?
            .ok_or_else(|| StoreError::not_found("bug", id))
    }

    /// Change only the penalty status, leaving every other field alone.
    pub fn set_bug_status(
        &self,
        id: &str,
        status: PenaltyStatus,
    ) -> Result<BugDetails, StoreError> {
        let count = self.conn.execute(
            "UPDATE bugs SET penalty_status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if count == 0 {
            return Err(StoreError::not_found("bug", id));
        }
        self.get_bug(id)?
            .ok_or_else(|| StoreError::not_found("bug", id))
    }

    pub fn delete_bug(&self, id: &str) -> Result<bool, StoreError> {
        let count = self
            .conn
            .execute("DELETE FROM bugs WHERE id = ?1", params![id])?;
        Ok(count > 0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
