use chrono::NaiveDate;
use rusqlite::params;

use super::LedgerDb;
use crate::errors::StoreError;
use crate::models::Sprint;

const SPRINT_COLUMNS: &str = "id, name, start_date, end_date, penalty_url, created_at";

fn map_sprint_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sprint> {
    Ok(Sprint {
        id: row.get(0)?,
        name: row.get(1)?,
        start_date: row.get(2)?,
        end_date: row.get(3)?,
        penalty_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl LedgerDb {
    // ── Sprint CRUD ───────────────────────────────────────────────────

    pub fn create_sprint(&self, sprint: &Sprint) -> Result<Sprint, StoreError> {
        self.conn.execute(
            "INSERT INTO sprints (id, name, start_date, end_date, penalty_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                sprint.id,
                sprint.name,
                sprint.start_date,
                sprint.end_date,
                sprint.penalty_url,
                sprint.created_at,
            ],
        )?;
        self.get_sprint(&sprint.id)?
            .ok_or_else(|| StoreError::not_found("sprint", &sprint.id))
    }

    /// Newest sprint first, by start date.
    pub fn list_sprints(&self) -> Result<Vec<Sprint>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints ORDER BY start_date DESC"
        ))?;
        let rows = stmt.query_map([], map_sprint_row)?;
        let mut sprints = Vec::new();
        for row in rows {
            sprints.push(row?);
        }
        Ok(sprints)
    }

    pub fn get_sprint(&self, id: &str) -> Result<Option<Sprint>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], map_sprint_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// The sprint whose date window contains `today`, provided exactly one
    /// matches. Zero matches or an overlap both yield `None`; callers that
    /// need "the" active sprint cannot pick one arbitrarily.
    pub fn active_sprint(&self, today: NaiveDate) -> Result<Option<Sprint>, StoreError> {
        let day = today.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints
             WHERE start_date <= ?1 AND end_date >= ?1"
        ))?;
        let rows = stmt.query_map(params![day], map_sprint_row)?;
        let mut matches = Vec::new();
        for row in rows {
            matches.push(row?);
        }
        if matches.len() == 1 {
            Ok(matches.pop())
        } else {
            Ok(None)
        }
    }

    /// Full replace of the editable fields. The edit dialog submits the
    /// whole form, so absent optionals clear to NULL.
    pub fn update_sprint(
        &self,
        id: &str,
        name: &str,
        start_date: &str,
        end_date: &str,
        penalty_url: Option<&str>,
    ) -> Result<Sprint, StoreError> {
        let count = self.conn.execute(
            "UPDATE sprints SET name = ?1, start_date = ?2, end_date = ?3, penalty_url = ?4
             WHERE id = ?5",
            params![name, start_date, end_date, penalty_url, id],
        )?;
        if count == 0 {
            return Err(StoreError::not_found("sprint", id));
        }
        self.get_sprint(id)?
            .ok_or_else(|| StoreError::not_found("sprint", id))
    }

    pub fn delete_sprint(&self, id: &str) -> Result<bool, StoreError> {
        let count = self
            .conn
            .execute("DELETE FROM sprints WHERE id = ?1", params![id])?;
        Ok(count > 0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
