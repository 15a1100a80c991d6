//! In-process identity provider: email/password accounts, bearer
//! sessions, and single-use magic links.
//!
//! Identity records (`auth_users`) and developer rows are deliberately
//! written by two independent calls, so a crash between them leaves an
//! orphaned identity that [`crate::session::resolve`] repairs at the
//! next login. Validation failures are caught before any store write.

use std::sync::LazyLock;

use chrono::{Duration, SecondsFormat, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::db::auth::{AuthUser, SessionRecord};
use crate::db::{self, LedgerDb};
use crate::errors::AuthError;
use crate::models::{Developer, Identity, Role};
use crate::session;

pub const SESSION_TTL_DAYS: i64 = 7;
pub const MAGIC_LINK_TTL_MINUTES: i64 = 60;
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(AuthError::Validation(format!("Invalid email: {}", email)))
    }
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

fn timestamp_in(duration: Duration) -> String {
    (Utc::now() + duration).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn issue_session(db: &LedgerDb, user_id: &str) -> Result<SessionRecord, AuthError> {
    db.delete_expired_sessions(&db::now_rfc3339())?;
    let session = SessionRecord {
        token: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        created_at: db::now_rfc3339(),
        expires_at: timestamp_in(Duration::days(SESSION_TTL_DAYS)),
    };
    db.create_session(&session)?;
    Ok(session)
}

/// Self-service signup. Creates the identity record, then attempts the
/// developer row as a second independent write: if that write fails the
/// signup still succeeds and resolution repairs the gap at next login.
pub fn signup(
    db: &LedgerDb,
    email: &str,
    password: &str,
    confirm_password: &str,
    bootstrap_admin_email: &str,
) -> Result<Identity, AuthError> {
    validate_email(email)?;
    if password != confirm_password {
        return Err(AuthError::Validation("Passwords do not match".to_string()));
    }
    validate_password(password)?;

    if db.get_auth_user_by_email(email)?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let salt = new_salt();
    let user = AuthUser {
        id: Uuid::new_v4().to_string(),
        email: email.to_lowercase(),
        password_hash: hash_password(&salt, password),
        password_salt: salt,
        created_at: db::now_rfc3339(),
    };
    db.create_auth_user(&user)?;

    let identity = Identity {
        id: user.id,
        email: user.email,
    };
    if let Err(e) = session::resolve(db, &identity, bootstrap_admin_email) {
        warn!(error = %e, email = %identity.email, "developer row missing after signup, repair deferred to next login");
    }
    Ok(identity)
}

/// Administrator-initiated account creation: identity plus a developer
/// row with the given display name and role, as two independent writes.
pub fn create_developer_account(
    db: &LedgerDb,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> Result<Developer, AuthError> {
    validate_email(email)?;
    validate_password(password)?;
    if name.trim().is_empty() {
        return Err(AuthError::Validation("Name must not be empty".to_string()));
    }
    if db.get_auth_user_by_email(email)?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let salt = new_salt();
    let user = AuthUser {
        id: Uuid::new_v4().to_string(),
        email: email.to_lowercase(),
        password_hash: hash_password(&salt, password),
        password_salt: salt,
        created_at: db::now_rfc3339(),
    };
    db.create_auth_user(&user)?;

    let developer = Developer {
        id: user.id,
        name: name.trim().to_string(),
        email: user.email,
        avatar_url: None,
        role,
        created_at: db::now_rfc3339(),
    };
    Ok(db.create_developer(&developer)?)
}

/// Verify credentials and issue a bearer session. Unknown email and
/// wrong password return the same error.
pub fn login(db: &LedgerDb, email: &str, password: &str) -> Result<(SessionRecord, Identity), AuthError> {
    let user = db
        .get_auth_user_by_email(email)?
        .ok_or(AuthError::InvalidCredentials)?;
    if hash_password(&user.password_salt, password) != user.password_hash {
        return Err(AuthError::InvalidCredentials);
    }
    let session = issue_session(db, &user.id)?;
    Ok((
        session,
        Identity {
            id: user.id,
            email: user.email,
        },
    ))
}

/// Resolve a bearer token to its identity. Expired sessions are removed
/// on sight.
pub fn authenticate(db: &LedgerDb, token: &str) -> Result<Identity, AuthError> {
    let session = db.get_session(token)?.ok_or(AuthError::SessionInvalid)?;
    if session.expires_at.as_str() <= db::now_rfc3339().as_str() {
        db.delete_session(token)?;
        return Err(AuthError::SessionInvalid);
    }
    let user = db
        .get_auth_user(&session.user_id)?
        .ok_or(AuthError::SessionInvalid)?;
    Ok(Identity {
        id: user.id,
        email: user.email,
    })
}

pub fn logout(db: &LedgerDb, token: &str) -> Result<bool, AuthError> {
    Ok(db.delete_session(token)?)
}

/// Change a password after re-verifying the current one. The salt is
/// rotated along with the hash.
pub fn update_password(
    db: &LedgerDb,
    user_id: &str,
    current_password: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let user = db.get_auth_user(user_id)?.ok_or(AuthError::SessionInvalid)?;
    if hash_password(&user.password_salt, current_password) != user.password_hash {
        return Err(AuthError::InvalidCredentials);
    }
    validate_password(new_password)?;
    let salt = new_salt();
    let hash = hash_password(&salt, new_password);
    if !db.update_auth_password(user_id, &hash, &salt)? {
        return Err(AuthError::SessionInvalid);
    }
    Ok(())
}

/// Create a single-use login link token for an existing account.
/// Returns `None` for unknown emails so the HTTP layer can answer
/// identically either way.
pub fn request_magic_link(db: &LedgerDb, email: &str) -> Result<Option<String>, AuthError> {
    validate_email(email)?;
    if db.get_auth_user_by_email(email)?.is_none() {
        return Ok(None);
    }
    let token = Uuid::new_v4().to_string();
    db.create_magic_link(
        &token,
        email,
        &db::now_rfc3339(),
        &timestamp_in(Duration::minutes(MAGIC_LINK_TTL_MINUTES)),
    )?;
    Ok(Some(token))
}

/// Redeem a magic link and issue a session for its account.
pub fn login_with_magic_link(
    db: &LedgerDb,
    token: &str,
) -> Result<(SessionRecord, Identity), AuthError> {
    let email = db
        .consume_magic_link(token, &db::now_rfc3339())?
        .ok_or(AuthError::MagicLinkInvalid)?;
    let user = db
        .get_auth_user_by_email(&email)?
        .ok_or(AuthError::MagicLinkInvalid)?;
    let session = issue_session(db, &user.id)?;
    Ok((
        session,
        Identity {
            id: user.id,
            email: user.email,
        },
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────
