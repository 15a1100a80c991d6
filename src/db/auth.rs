use rusqlite::params;

use super::LedgerDb;
use crate::errors::StoreError;

/// Credential record for the in-process identity provider. Never leaves
/// the auth layer; API responses only carry [`crate::models::Identity`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub created_at: String,
}

/// One bearer session. `expires_at` is compared lexicographically,
/// which is sound for same-format RFC 3339 UTC strings.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: String,
    pub created_at: String,
    pub expires_at: String,
}

fn map_auth_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuthUser> {
    Ok(AuthUser {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        password_salt: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl LedgerDb {
    // ── Auth users ────────────────────────────────────────────────────

    pub fn create_auth_user(&self, user: &AuthUser) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO auth_users (id, email, password_hash, password_salt, created_at)
             VALUES (?1, LOWER(?2), ?3, ?4, ?5)",
            params![
                user.id,
                user.email,
                user.password_hash,
                user.password_salt,
                user.created_at
            ],
        )?;
        Ok(())
    }

    pub fn get_auth_user(&self, id: &str) -> Result<Option<AuthUser>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, password_hash, password_salt, created_at
             FROM auth_users WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], map_auth_user)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn get_auth_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, password_hash, password_salt, created_at
             FROM auth_users WHERE email = LOWER(?1)",
        )?;
        let mut rows = stmt.query_map(params![email], map_auth_user)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn update_auth_password(
        &self,
        id: &str,
        password_hash: &str,
        password_salt: &str,
    ) -> Result<bool, StoreError> {
        let count = self.conn.execute(
            "UPDATE auth_users SET password_hash = ?1, password_salt = ?2 WHERE id = ?3",
            params![password_hash, password_salt, id],
        )?;
        Ok(count > 0)
    }

    // ── Sessions ──────────────────────────────────────────────────────

    pub fn create_session(&self, session: &SessionRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO auth_sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.user_id,
                session.created_at,
                session.expires_at
            ],
        )?;
        Ok(())
    }

    pub fn get_session(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT token, user_id, created_at, expires_at
             FROM auth_sessions WHERE token = ?1",
        )?;
        let mut rows = stmt.query_map(params![token], |row| {
            Ok(SessionRecord {
                token: row.get(0)?,
                user_id: row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
            })
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn delete_session(&self, token: &str) -> Result<bool, StoreError> {
        let count = self
            .conn
            .execute("DELETE FROM auth_sessions WHERE token = ?1", params![token])?;
        Ok(count > 0)
    }

    /// Opportunistic cleanup, run on each successful login.
    pub fn delete_expired_sessions(&self, now: &str) -> Result<usize, StoreError> {
        let count = self.conn.execute(
            "DELETE FROM auth_sessions WHERE expires_at <= ?1",
            params![now],
        )?;
        Ok(count)
    }

    // ── Magic links ───────────────────────────────────────────────────

    pub fn create_magic_link(
        &self,
        token: &str,
        email: &str,
        created_at: &str,
        expires_at: &str,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO magic_links (token, email, created_at, expires_at)
             VALUES (?1, LOWER(?2), ?3, ?4)",
            params![token, email, created_at, expires_at],
        )?;
        Ok(())
    }

    /// Redeem a magic link, returning its email. A link can be consumed
    /// once; expired, unknown, or already-consumed tokens yield `None`.
    /// Select and mark run in one transaction so two concurrent redeems
    /// cannot both succeed.
    pub fn consume_magic_link(
        &self,
        token: &str,
        now: &str,
    ) -> Result<Option<String>, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let email: Option<String> = {
            let mut stmt = tx.prepare(
                "SELECT email FROM magic_links
                 WHERE token = ?1 AND consumed_at IS NULL AND expires_at > ?2",
            )?;
            let mut rows = stmt.query_map(params![token, now], |row| row.get(0))?;
            match rows.next() {
                Some(row) => Some(row?),
                None => None,
            }
        };
        if email.is_some() {
            tx.execute(
                "UPDATE magic_links SET consumed_at = ?1 WHERE token = ?2",
                params![now, token],
            )?;
        }
        tx.commit()?;
        Ok(email)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
