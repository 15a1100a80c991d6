//! Developer resolution for an authenticated identity.
//!
//! Identity records and developer rows are created by two independent
//! calls, so they can drift apart: a developer row may exist under a
//! stale identifier, or not at all (signup crashed between the two
//! inserts). Resolution reconciles the two on every session fetch,
//! modeled as an explicit three-state machine with one repair action
//! per state instead of nested fallbacks.

use tracing::info;

use crate::db;
use crate::errors::StoreError;
use crate::models::{Developer, Identity, Role};
use crate::store::DeveloperStore;

/// Outcome of matching an identity against the developer collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A row already exists under the identity's identifier.
    Found(Developer),
    /// A row exists under the identity's email but a stale identifier;
    /// it must be re-keyed, keeping its name and role.
    FoundByEmailNeedsRekey(Developer),
    /// No row matches by identifier or email; one must be created.
    NotFound,
}

/// Classify without repairing. Read-only, so callers can inspect the
/// state machine's input independently of the repair step.
pub fn classify(
    store: &dyn DeveloperStore,
    identity: &Identity,
) -> Result<Resolution, StoreError> {
    if let Some(developer) = store.get_developer(&identity.id)? {
        return Ok(Resolution::Found(developer));
    }
    if let Some(developer) = store.get_developer_by_email(&identity.email)? {
        return Ok(Resolution::FoundByEmailNeedsRekey(developer));
    }
    Ok(Resolution::NotFound)
}

/// Locate or construct the developer row for `identity`, applying one
/// repair action per resolution state.
///
/// Not transactional: two concurrent resolutions for the same identity
/// can race. The unique email constraint keeps the worst case to a
/// redundant update rather than duplicate rows.
pub fn resolve(
    store: &dyn DeveloperStore,
    identity: &Identity,
    bootstrap_admin_email: &str,
) -> Result<Developer, StoreError> {
    match classify(store, identity)? {
        Resolution::Found(developer) => Ok(developer),
        Resolution::FoundByEmailNeedsRekey(stale) => {
            store.rekey_developer(&stale.id, &identity.id)?;
            info!(
                old_id = %stale.id,
                new_id = %identity.id,
                "re-keyed developer row to match identity"
            );
            store
                .get_developer(&identity.id)?
                .ok_or_else(|| StoreError::not_found("developer", &identity.id))
        }
        Resolution::NotFound => {
            let role = if identity.email.eq_ignore_ascii_case(bootstrap_admin_email) {
                Role::SuperAdmin
            } else {
                Role::Developer
            };
            let developer = Developer {
                id: identity.id.clone(),
                name: display_name_from_email(&identity.email),
                email: identity.email.to_lowercase(),
                avatar_url: None,
                role,
                created_at: db::now_rfc3339(),
            };
            let created = store.create_developer(&developer)?;
            info!(developer_id = %created.id, role = %created.role, "created missing developer row");
            Ok(created)
        }
    }
}

/// Default display name for a freshly created row: the local part of
/// the email address.
fn display_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────
