use std::str::FromStr;

use rusqlite::params;

use super::{LedgerDb, now_rfc3339};
use crate::errors::StoreError;
use crate::models::{Developer, Role};

/// Partial update for a developer row. `None` fields are left unchanged,
/// since the account form and the admin dialog edit different subsets.
#[derive(Debug, Default, Clone)]
pub struct DeveloperPatch {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
}

const DEVELOPER_COLUMNS: &str = "id, name, email, avatar_url, role, created_at";

/// Intermediate row struct for reading developers from SQLite before
/// converting the role string into a typed value.
struct DeveloperRow {
    id: String,
    name: String,
    email: String,
    avatar_url: Option<String>,
    role: String,
    created_at: String,
}

impl DeveloperRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            avatar_url: row.get(3)?,
            role: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_developer(self) -> Result<Developer, StoreError> {
        let role = Role::from_str(&self.role).map_err(StoreError::Decode)?;
        Ok(Developer {
            id: self.id,
            name: self.name,
            email: self.email,
            avatar_url: self.avatar_url,
            role,
            created_at: self.created_at,
        })
    }
}

impl LedgerDb {
    // ── Developer CRUD ────────────────────────────────────────────────

    pub fn create_developer(&self, developer: &Developer) -> Result<Developer, StoreError> {
        self.conn.execute(
            "INSERT INTO developers (id, name, email, avatar_url, role, created_at)
             VALUES (?1, ?2, LOWER(?3), ?4, ?5, ?6)",
            params![
                developer.id,
                developer.name,
                developer.email,
                developer.avatar_url,
                developer.role.as_str(),
                developer.created_at,
            ],
        )?;
        self.get_developer(&developer.id)?
            .ok_or_else(|| StoreError::not_found("developer", &developer.id))
    }

    pub fn list_developers(&self) -> Result<Vec<Developer>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEVELOPER_COLUMNS} FROM developers ORDER BY name ASC"
        ))?;
        let rows = stmt.query_map([], DeveloperRow::from_row)?;
        let mut developers = Vec::new();
        for row in rows {
            developers.push(row?.into_developer()?);
        }
        Ok(developers)
    }

    pub fn get_developer(&self, id: &str) -> Result<Option<Developer>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEVELOPER_COLUMNS} FROM developers WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], DeveloperRow::from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?.into_developer()?)),
            None => Ok(None),
        }
    }

    /// Look up a developer by email (case-insensitive).
    pub fn get_developer_by_email(&self, email: &str) -> Result<Option<Developer>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEVELOPER_COLUMNS} FROM developers WHERE email = LOWER(?1)"
        ))?;
        let mut rows = stmt.query_map(params![email], DeveloperRow::from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?.into_developer()?)),
            None => Ok(None),
        }
    }

    pub fn update_developer(
        &self,
        id: &str,
        patch: &DeveloperPatch,
    ) -> Result<Developer, StoreError> {
        let existing = self
            .get_developer(id)?
            .ok_or_else(|| StoreError::not_found("developer", id))?;

        let name = patch.name.as_deref().unwrap_or(&existing.name);
        let avatar_url = patch
            .avatar_url
            .as_deref()
            .or(existing.avatar_url.as_deref());
        let role = patch.role.unwrap_or(existing.role);

        self.conn.execute(
            "UPDATE developers SET name = ?1, avatar_url = ?2, role = ?3 WHERE id = ?4",
            params![name, avatar_url, role.as_str(), id],
        )?;
        self.get_developer(id)?
            .ok_or_else(|| StoreError::not_found("developer", id))
    }

    pub fn delete_developer(&self, id: &str) -> Result<bool, StoreError> {
        let count = self
            .conn
            .execute("DELETE FROM developers WHERE id = ?1", params![id])?;
        Ok(count > 0)
    }

    /// Move a developer row to a new primary key. Bug references follow
    /// via ON UPDATE CASCADE, so the row keeps its history.
    pub fn rekey_developer(&self, old_id: &str, new_id: &str) -> Result<bool, StoreError> {
        let count = self.conn.execute(
            "UPDATE developers SET id = ?1 WHERE id = ?2",
            params![new_id, old_id],
        )?;
        Ok(count > 0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
