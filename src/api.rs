use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth;
use crate::db::{self, DbHandle, LedgerDb};
use crate::errors::{AuthError, StoreError};
use crate::filter::BugFilter;
use crate::models::{Bug, BugDetails, Developer, Identity, PenaltyStatus, Role, Sprint};
use crate::session;
use crate::stats::{self, GroupBy, GroupStat, LeaderboardEntry, SortPolicy, Summary};
use crate::store::{BugStore, SprintStore};
use crate::ws::{WsMessage, broadcast_message};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub ws_tx: broadcast::Sender<String>,
    pub bootstrap_admin_email: String,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct MagicLinkRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct CreateDeveloperRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct UpdateDeveloperRequest {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct SprintPayload {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub penalty_url: Option<String>,
}

/// Whole-form bug payload, shared by create and update. Update replaces
/// every column, so omitted optional fields clear to their defaults.
#[derive(Deserialize)]
pub struct BugPayload {
    pub title: String,
    pub description: Option<String>,
    pub sprint_id: Option<String>,
    pub developer_id: Option<String>,
    pub penalty_amount: Option<f64>,
    pub penalty_status: Option<PenaltyStatus>,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    pub sprint: Option<String>,
}

// ── Response payload types ────────────────────────────────────────────

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: String,
    pub identity: Identity,
}

/// `GET /api/auth/session` body. `developer` is null when resolution
/// failed; the session itself stays valid.
#[derive(Serialize)]
pub struct CurrentSession {
    pub identity: Identity,
    pub developer: Option<Developer>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub summary: Summary,
    pub active_sprints: usize,
    pub by_developer: Vec<GroupStat>,
    pub by_sprint: Vec<GroupStat>,
    pub by_status: Vec<GroupStat>,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub sprint: Option<Sprint>,
    pub entries: Vec<LeaderboardEntry>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(_) | AuthError::EmailTaken => ApiError::BadRequest(e.to_string()),
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::MagicLinkInvalid => ApiError::Unauthorized(e.to_string()),
            AuthError::Store(inner) => inner.into(),
        }
    }
}

/// Unknown sprint or developer references in a bug payload are caller
/// mistakes, not missing resources.
fn map_reference_errors(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound {
            entity: entity @ ("sprint" | "developer"),
            id,
        } => ApiError::BadRequest(format!("Unknown {} reference: {}", entity, id)),
        other => other.into(),
    }
}

// ── Authentication extractor ──────────────────────────────────────────

/// Resolved bearer session. Keeps the raw token so logout can revoke it.
pub struct Authed {
    pub identity: Identity,
    pub token: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

impl FromRequestParts<SharedState> for Authed {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
        let lookup = token.clone();
        let identity = state
            .db
            .call(move |db| auth::authenticate(db, &lookup))
            .await?;
        Ok(Authed { identity, token })
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/signup", post(auth_signup))
        .route("/api/auth/login", post(auth_login))
        .route("/api/auth/logout", post(auth_logout))
        .route("/api/auth/session", get(auth_session))
        .route("/api/auth/password", post(auth_update_password))
        .route("/api/auth/magic-link", post(auth_request_magic_link))
        .route("/api/auth/magic/{token}", get(auth_magic_login))
        .route("/api/developers", get(list_developers).post(create_developer))
        .route(
            "/api/developers/{id}",
            get(get_developer).patch(update_developer).delete(delete_developer),
        )
        .route("/api/sprints", get(list_sprints).post(create_sprint))
        .route("/api/sprints/active", get(get_active_sprint))
        .route(
            "/api/sprints/{id}",
            get(get_sprint).patch(update_sprint).delete(delete_sprint),
        )
        .route("/api/bugs", get(list_bugs).post(create_bug))
        .route(
            "/api/bugs/{id}",
            get(get_bug).patch(update_bug).delete(delete_bug),
        )
        .route("/api/bugs/{id}/pay", post(mark_bug_paid))
        .route("/api/stats", get(get_stats))
        .route("/api/stats/leaderboard", get(get_leaderboard))
}

// ── Helpers ───────────────────────────────────────────────────────────

async fn require_super_admin(state: &SharedState, identity: &Identity) -> Result<(), ApiError> {
    let id = identity.id.clone();
    let developer = state.db.call(move |db| db.get_developer(&id)).await?;
    match developer {
        Some(d) if d.role == Role::SuperAdmin => Ok(()),
        _ => Err(ApiError::Forbidden(
            "This action requires a super admin".to_string(),
        )),
    }
}

fn validate_sprint_payload(req: &SprintPayload) -> Result<(), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Sprint name must not be empty".to_string(),
        ));
    }
    let start = NaiveDate::parse_from_str(&req.start_date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid start date: {}", req.start_date)))?;
    let end = NaiveDate::parse_from_str(&req.end_date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid end date: {}", req.end_date)))?;
    if end < start {
        return Err(ApiError::BadRequest(
            "Sprint must end on or after its start date".to_string(),
        ));
    }
    Ok(())
}

fn validate_bug_payload(title: &str, penalty_amount: f64) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Bug title must not be empty".to_string(),
        ));
    }
    if penalty_amount.is_nan() || penalty_amount < 0.0 {
        return Err(ApiError::BadRequest(
            "Penalty amount must be zero or positive".to_string(),
        ));
    }
    Ok(())
}

fn check_bug_references(
    db: &LedgerDb,
    sprint_id: Option<&str>,
    developer_id: Option<&str>,
) -> Result<(), StoreError> {
    if let Some(id) = sprint_id {
        if db.get_sprint(id)?.is_none() {
            return Err(StoreError::not_found("sprint", id));
        }
    }
    if let Some(id) = developer_id {
        if db.get_developer(id)?.is_none() {
            return Err(StoreError::not_found("developer", id));
        }
    }
    Ok(())
}

/// One pass over the filtered collection feeds the summary cards and all
/// three grouped breakdowns. The active-sprint count ignores the filter:
/// it is a property of the calendar, not of the visible bugs.
fn build_stats(
    bugs: &[BugDetails],
    sprints: &[Sprint],
    filter: &BugFilter,
    today: NaiveDate,
) -> StatsResponse {
    let kept: Vec<BugDetails> = bugs
        .iter()
        .filter(|b| filter.matches(&b.bug))
        .cloned()
        .collect();
    StatsResponse {
        summary: stats::summarize(&kept),
        active_sprints: stats::count_active(sprints, today),
        by_developer: stats::aggregate(&kept, GroupBy::Developer, SortPolicy::PenaltyThenCount),
        by_sprint: stats::aggregate(&kept, GroupBy::Sprint, SortPolicy::PenaltyThenCount),
        by_status: stats::aggregate(&kept, GroupBy::Status, SortPolicy::Unsorted),
    }
}

/// Leaderboard for the requested sprint, or the active one when no id is
/// given. No resolvable sprint means an empty board, not an error.
fn assemble_leaderboard(
    sprints: &dyn SprintStore,
    bugs: &dyn BugStore,
    requested: Option<&str>,
    today: NaiveDate,
) -> Result<LeaderboardResponse, StoreError> {
    let sprint = match requested {
        Some(id) => sprints.get_sprint(id)?,
        None => sprints.active_sprint(today)?,
    };
    let entries = match &sprint {
        Some(sprint) => {
            let in_sprint: Vec<BugDetails> = bugs
                .list_bugs()?
                .into_iter()
                .filter(|b| b.bug.sprint_id.as_deref() == Some(sprint.id.as_str()))
                .collect();
            stats::leaderboard(&in_sprint, SortPolicy::PenaltyThenCount)
        }
        None => Vec::new(),
    };
    Ok(LeaderboardResponse { sprint, entries })
}

// ── Auth handlers ─────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn auth_signup(
    State(state): State<SharedState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let bootstrap = state.bootstrap_admin_email.clone();
    let identity = state
        .db
        .call(move |db| {
            auth::signup(db, &req.email, &req.password, &req.confirm_password, &bootstrap)
        })
        .await?;
    info!(email = %identity.email, "account created");
    Ok((StatusCode::CREATED, Json(identity)))
}

async fn auth_login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, identity) = state
        .db
        .call(move |db| auth::login(db, &req.email, &req.password))
        .await?;
    Ok(Json(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        identity,
    }))
}

async fn auth_logout(
    State(state): State<SharedState>,
    authed: Authed,
) -> Result<impl IntoResponse, ApiError> {
    let token = authed.token;
    state.db.call(move |db| auth::logout(db, &token)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current-session endpoint: the one place developer resolution runs.
/// A resolution failure degrades to a null developer so the client can
/// still render the authenticated shell.
async fn auth_session(
    State(state): State<SharedState>,
    authed: Authed,
) -> Result<impl IntoResponse, ApiError> {
    let identity = authed.identity.clone();
    let bootstrap = state.bootstrap_admin_email.clone();
    let developer = state
        .db
        .call(move |db| match session::resolve(db, &identity, &bootstrap) {
            Ok(developer) => Ok::<_, StoreError>(Some(developer)),
            Err(e) => {
                error!(error = %e, user_id = %identity.id, "developer resolution failed, session continues without a row");
                Ok(None)
            }
        })
        .await?;
    Ok(Json(CurrentSession {
        identity: authed.identity,
        developer,
    }))
}

async fn auth_update_password(
    State(state): State<SharedState>,
    authed: Authed,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authed.identity.id;
    state
        .db
        .call(move |db| {
            auth::update_password(db, &user_id, &req.current_password, &req.new_password)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mints a one-hour login token and logs its URL. The response never
/// says whether the account exists.
async fn auth_request_magic_link(
    State(state): State<SharedState>,
    Json(req): Json<MagicLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .db
        .call(move |db| auth::request_magic_link(db, &req.email))
        .await?;
    if let Some(token) = token {
        info!(path = %format!("/api/auth/magic/{}", token), "magic sign-in link issued");
    }
    Ok(Json(serde_json::json!({"status": "ok"})))
}

async fn auth_magic_login(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, identity) = state
        .db
        .call(move |db| auth::login_with_magic_link(db, &token))
        .await?;
    Ok(Json(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        identity,
    }))
}

// ── Developer handlers ────────────────────────────────────────────────

async fn list_developers(
    State(state): State<SharedState>,
    _authed: Authed,
) -> Result<impl IntoResponse, ApiError> {
    let developers = state.db.call(move |db| db.list_developers()).await?;
    Ok(Json(developers))
}

async fn create_developer(
    State(state): State<SharedState>,
    authed: Authed,
    Json(req): Json<CreateDeveloperRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_super_admin(&state, &authed.identity).await?;
    let role = req.role.unwrap_or(Role::Developer);
    let developer = state
        .db
        .call(move |db| auth::create_developer_account(db, &req.email, &req.password, &req.name, role))
        .await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::DeveloperCreated {
            developer: developer.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(developer)))
}

async fn get_developer(
    State(state): State<SharedState>,
    _authed: Authed,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lookup = id.clone();
    let developer = state
        .db
        .call(move |db| db.get_developer(&lookup))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Developer {} not found", id)))?;
    Ok(Json(developer))
}

async fn update_developer(
    State(state): State<SharedState>,
    authed: Authed,
    Path(id): Path<String>,
    Json(req): Json<UpdateDeveloperRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.role.is_some() {
        require_super_admin(&state, &authed.identity).await?;
    }
    let patch = crate::db::developers::DeveloperPatch {
        name: req.name,
        avatar_url: req.avatar_url,
        role: req.role,
    };
    let developer = state
        .db
        .call(move |db| db.update_developer(&id, &patch))
        .await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::DeveloperUpdated {
            developer: developer.clone(),
        },
    );
    Ok(Json(developer))
}

async fn delete_developer(
    State(state): State<SharedState>,
    authed: Authed,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_super_admin(&state, &authed.identity).await?;
    let target = id.clone();
    let removed = state.db.call(move |db| db.delete_developer(&target)).await?;
    if !removed {
        return Err(ApiError::NotFound(format!("Developer {} not found", id)));
    }
    broadcast_message(&state.ws_tx, &WsMessage::DeveloperDeleted { developer_id: id });
    Ok(StatusCode::NO_CONTENT)
}

// ── Sprint handlers ───────────────────────────────────────────────────

async fn list_sprints(
    State(state): State<SharedState>,
    _authed: Authed,
) -> Result<impl IntoResponse, ApiError> {
    let sprints = state.db.call(move |db| db.list_sprints()).await?;
    Ok(Json(sprints))
}

async fn create_sprint(
    State(state): State<SharedState>,
    _authed: Authed,
    Json(req): Json<SprintPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_sprint_payload(&req)?;
    let sprint = Sprint {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        start_date: req.start_date,
        end_date: req.end_date,
        penalty_url: req.penalty_url,
        created_at: db::now_rfc3339(),
    };
    let sprint = state.db.call(move |db| db.create_sprint(&sprint)).await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::SprintCreated {
            sprint: sprint.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(sprint)))
}

/// Returns the single sprint covering today, or null when none or
/// several do.
async fn get_active_sprint(
    State(state): State<SharedState>,
    _authed: Authed,
) -> Result<impl IntoResponse, ApiError> {
    let today = Utc::now().date_naive();
    let sprint = state.db.call(move |db| db.active_sprint(today)).await?;
    Ok(Json(sprint))
}

async fn get_sprint(
    State(state): State<SharedState>,
    _authed: Authed,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lookup = id.clone();
    let sprint = state
        .db
        .call(move |db| db.get_sprint(&lookup))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Sprint {} not found", id)))?;
    Ok(Json(sprint))
}

async fn update_sprint(
    State(state): State<SharedState>,
    _authed: Authed,
    Path(id): Path<String>,
    Json(req): Json<SprintPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_sprint_payload(&req)?;
    let sprint = state
        .db
        .call(move |db| {
            db.update_sprint(
                &id,
                req.name.trim(),
                &req.start_date,
                &req.end_date,
                req.penalty_url.as_deref(),
            )
        })
        .await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::SprintUpdated {
            sprint: sprint.clone(),
        },
    );
    Ok(Json(sprint))
}

async fn delete_sprint(
    State(state): State<SharedState>,
    _authed: Authed,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let target = id.clone();
    let removed = state.db.call(move |db| db.delete_sprint(&target)).await?;
    if !removed {
        return Err(ApiError::NotFound(format!("Sprint {} not found", id)));
    }
    broadcast_message(&state.ws_tx, &WsMessage::SprintDeleted { sprint_id: id });
    Ok(StatusCode::NO_CONTENT)
}

// ── Bug handlers ──────────────────────────────────────────────────────

async fn list_bugs(
    State(state): State<SharedState>,
    _authed: Authed,
    Query(filter): Query<BugFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let bugs = state.db.call(move |db| db.list_bugs()).await?;
    let bugs: Vec<BugDetails> = bugs
        .into_iter()
        .filter(|b| filter.matches(&b.bug))
        .collect();
    Ok(Json(bugs))
}

async fn create_bug(
    State(state): State<SharedState>,
    _authed: Authed,
    Json(req): Json<BugPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let penalty_amount = req.penalty_amount.unwrap_or(0.0);
    validate_bug_payload(&req.title, penalty_amount)?;
    let bug = Bug {
        id: Uuid::new_v4().to_string(),
        title: req.title.trim().to_string(),
        description: req.description,
        sprint_id: req.sprint_id,
        developer_id: req.developer_id,
        penalty_amount,
        penalty_status: req.penalty_status.unwrap_or_default(),
        image_url: req.image_url,
        created_at: db::now_rfc3339(),
    };
    let details = state
        .db
        .call(move |db| {
            check_bug_references(db, bug.sprint_id.as_deref(), bug.developer_id.as_deref())?;
            db.create_bug(&bug)
        })
        .await
        .map_err(map_reference_errors)?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::BugCreated {
            bug: details.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(details)))
}

async fn get_bug(
    State(state): State<SharedState>,
    _authed: Authed,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lookup = id.clone();
    let details = state
        .db
        .call(move |db| db.get_bug(&lookup))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Bug {} not found", id)))?;
    Ok(Json(details))
}

async fn update_bug(
    State(state): State<SharedState>,
    _authed: Authed,
    Path(id): Path<String>,
    Json(req): Json<BugPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let penalty_amount = req.penalty_amount.unwrap_or(0.0);
    validate_bug_payload(&req.title, penalty_amount)?;
    let details = state
        .db
        .call(move |db| {
            check_bug_references(db, req.sprint_id.as_deref(), req.developer_id.as_deref())?;
            db.update_bug(
                &id,
                req.title.trim(),
                req.description.as_deref(),
                req.sprint_id.as_deref(),
                req.developer_id.as_deref(),
                penalty_amount,
                req.penalty_status.unwrap_or_default(),
                req.image_url.as_deref(),
            )
        })
        .await
        .map_err(map_reference_errors)?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::BugUpdated {
            bug: details.clone(),
        },
    );
    Ok(Json(details))
}

/// Flips `penalty_status` to paid and touches nothing else.
async fn mark_bug_paid(
    State(state): State<SharedState>,
    _authed: Authed,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state
        .db
        .call(move |db| db.set_bug_status(&id, PenaltyStatus::Paid))
        .await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::BugUpdated {
            bug: details.clone(),
        },
    );
    Ok(Json(details))
}

async fn delete_bug(
    State(state): State<SharedState>,
    _authed: Authed,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let target = id.clone();
    let removed = state.db.call(move |db| db.delete_bug(&target)).await?;
    if !removed {
        return Err(ApiError::NotFound(format!("Bug {} not found", id)));
    }
    broadcast_message(&state.ws_tx, &WsMessage::BugDeleted { bug_id: id });
    Ok(StatusCode::NO_CONTENT)
}

// ── Stats handlers ────────────────────────────────────────────────────

async fn get_stats(
    State(state): State<SharedState>,
    _authed: Authed,
    Query(filter): Query<BugFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (bugs, sprints) = state
        .db
        .call(move |db| Ok::<_, StoreError>((db.list_bugs()?, db.list_sprints()?)))
        .await?;
    let today = Utc::now().date_naive();
    Ok(Json(build_stats(&bugs, &sprints, &filter, today)))
}

async fn get_leaderboard(
    State(state): State<SharedState>,
    _authed: Authed,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let today = Utc::now().date_naive();
    let response = state
        .db
        .call(move |db| assemble_leaderboard(db, db, query.sprint.as_deref(), today))
        .await?;
    Ok(Json(response))
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::store::test_utils::MemoryStore;

    const ADMIN_EMAIL: &str = "admin@bugledger.local";

    fn test_state() -> (SharedState, broadcast::Sender<String>) {
        let db = LedgerDb::new_in_memory().unwrap();
        let (ws_tx, _) = broadcast::channel(16);
        let state = Arc::new(AppState {
            db: DbHandle::new(db),
            ws_tx: ws_tx.clone(),
            bootstrap_admin_email: ADMIN_EMAIL.to_string(),
        });
        (state, ws_tx)
    }

    fn test_app() -> Router {
        let (state, _) = test_state();
        api_router().with_state(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request(
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    /// Signs up (201 expected) and logs in, returning the bearer token.
    async fn register(app: &Router, email: &str) -> String {
        let signup = request(
            "POST",
            "/api/auth/signup",
            None,
            Some(serde_json::json!({
                "email": email,
                "password": "secret1",
                "confirm_password": "secret1",
            })),
        );
        let response = app.clone().oneshot(signup).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let login = request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({"email": email, "password": "secret1"})),
        );
        let response = app.clone().oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session: serde_json::Value = body_json(response.into_body()).await;
        session["token"].as_str().unwrap().to_string()
    }

    async fn create_sprint_via_api(app: &Router, token: &str, name: &str, start: &str, end: &str) -> String {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/sprints",
                Some(token),
                Some(serde_json::json!({"name": name, "start_date": start, "end_date": end})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let sprint: serde_json::Value = body_json(response.into_body()).await;
        sprint["id"].as_str().unwrap().to_string()
    }

    async fn create_bug_via_api(app: &Router, token: &str, payload: serde_json::Value) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(request("POST", "/api/bugs", Some(token), Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response.into_body()).await
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();
        let response = app
            .oneshot(request("GET", "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_requests_without_token_are_rejected() {
        let app = test_app();
        for uri in ["/api/bugs", "/api/sprints", "/api/developers", "/api/stats"] {
            let response = app
                .clone()
                .oneshot(request("GET", uri, None, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
            let body: serde_json::Value = body_json(response.into_body()).await;
            assert!(body["error"].is_string(), "error envelope for {}", uri);
        }
    }

    #[tokio::test]
    async fn test_session_returns_identity_and_developer() {
        let app = test_app();
        let token = register(&app, "an.nguyen@example.com").await;

        let response = app
            .oneshot(request("GET", "/api/auth/session", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(session["identity"]["email"], "an.nguyen@example.com");
        assert_eq!(session["developer"]["name"], "an.nguyen");
        assert_eq!(session["developer"]["id"], session["identity"]["id"]);
    }

    #[tokio::test]
    async fn test_logout_revokes_the_session() {
        let app = test_app();
        let token = register(&app, "an@example.com").await;

        let response = app
            .clone()
            .oneshot(request("POST", "/api/auth/logout", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request("GET", "/api/auth/session", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signup_validation_errors_are_bad_requests() {
        let app = test_app();
        let response = app
            .oneshot(request(
                "POST",
                "/api/auth/signup",
                None,
                Some(serde_json::json!({
                    "email": "an@example.com",
                    "password": "secret1",
                    "confirm_password": "different",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "Passwords do not match");
    }

    #[tokio::test]
    async fn test_magic_link_request_never_reveals_account_existence() {
        let app = test_app();
        register(&app, "an@example.com").await;

        for email in ["an@example.com", "nobody@example.com"] {
            let response = app
                .clone()
                .oneshot(request(
                    "POST",
                    "/api/auth/magic-link",
                    None,
                    Some(serde_json::json!({"email": email})),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body: serde_json::Value = body_json(response.into_body()).await;
            assert_eq!(body["status"], "ok");
        }
    }

    #[tokio::test]
    async fn test_sprint_crud_and_date_validation() {
        let app = test_app();
        let token = register(&app, "an@example.com").await;

        // End before start is rejected
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/sprints",
                Some(&token),
                Some(serde_json::json!({
                    "name": "Backwards",
                    "start_date": "2024-06-14",
                    "end_date": "2024-06-03",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Unparseable date is rejected
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/sprints",
                Some(&token),
                Some(serde_json::json!({
                    "name": "Garbled",
                    "start_date": "June 3rd",
                    "end_date": "2024-06-14",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let sprint_id = create_sprint_via_api(&app, &token, "Sprint 12", "2024-06-03", "2024-06-14").await;

        let response = app
            .clone()
            .oneshot(request(
                "PATCH",
                &format!("/api/sprints/{}", sprint_id),
                Some(&token),
                Some(serde_json::json!({
                    "name": "Sprint 12 extended",
                    "start_date": "2024-06-03",
                    "end_date": "2024-06-21",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let sprint: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(sprint["name"], "Sprint 12 extended");
        assert_eq!(sprint["end_date"], "2024-06-21");

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("/api/sprints/{}", sprint_id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/sprints/{}", sprint_id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_active_sprint_endpoint_returns_null_when_ambiguous() {
        let app = test_app();
        let token = register(&app, "an@example.com").await;

        let today = Utc::now().date_naive();
        let start = (today - chrono::Duration::days(3)).format("%Y-%m-%d").to_string();
        let end = (today + chrono::Duration::days(3)).format("%Y-%m-%d").to_string();

        create_sprint_via_api(&app, &token, "Current A", &start, &end).await;
        let response = app
            .clone()
            .oneshot(request("GET", "/api/sprints/active", Some(&token), None))
            .await
            .unwrap();
        let active: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(active["name"], "Current A");

        // A second overlapping sprint makes "active" ambiguous
        create_sprint_via_api(&app, &token, "Current B", &start, &end).await;
        let response = app
            .oneshot(request("GET", "/api/sprints/active", Some(&token), None))
            .await
            .unwrap();
        let active: serde_json::Value = body_json(response.into_body()).await;
        assert!(active.is_null());
    }

    #[tokio::test]
    async fn test_bug_defaults_and_mark_paid() {
        let app = test_app();
        let token = register(&app, "an@example.com").await;

        let bug = create_bug_via_api(
            &app,
            &token,
            serde_json::json!({"title": "Login button unresponsive"}),
        )
        .await;
        assert_eq!(bug["penalty_status"], "pending");
        assert_eq!(bug["penalty_amount"], 0.0);
        assert!(bug["developer"].is_null());
        assert!(bug["sprint"].is_null());

        let id = bug["id"].as_str().unwrap();
        let response = app
            .oneshot(request(
                "POST",
                &format!("/api/bugs/{}/pay", id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let paid: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(paid["penalty_status"], "paid");
        assert_eq!(paid["title"], "Login button unresponsive");
        assert_eq!(paid["created_at"], bug["created_at"]);
    }

    #[tokio::test]
    async fn test_bug_with_unknown_reference_is_rejected() {
        let app = test_app();
        let token = register(&app, "an@example.com").await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/bugs",
                Some(&token),
                Some(serde_json::json!({
                    "title": "Dangling sprint",
                    "sprint_id": "no-such-sprint",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert!(body["error"].as_str().unwrap().contains("no-such-sprint"));

        let response = app
            .oneshot(request(
                "POST",
                "/api/bugs",
                Some(&token),
                Some(serde_json::json!({
                    "title": "Negative penalty",
                    "penalty_amount": -5.0,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bug_list_filter_narrows_and_empty_filter_is_identity() {
        let app = test_app();
        let admin_token = register(&app, ADMIN_EMAIL).await;

        // Admin creates two developer accounts, bugs split between them
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/developers",
                Some(&admin_token),
                Some(serde_json::json!({
                    "email": "binh@example.com",
                    "password": "secret1",
                    "name": "Binh Tran",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let binh: serde_json::Value = body_json(response.into_body()).await;
        let binh_id = binh["id"].as_str().unwrap();

        create_bug_via_api(
            &app,
            &admin_token,
            serde_json::json!({"title": "One", "developer_id": binh_id, "penalty_status": "paid"}),
        )
        .await;
        create_bug_via_api(&app, &admin_token, serde_json::json!({"title": "Two"})).await;

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                &format!("/api/bugs?developer={}", binh_id),
                Some(&admin_token),
                None,
            ))
            .await
            .unwrap();
        let filtered: Vec<serde_json::Value> = body_json(response.into_body()).await;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["title"], "One");

        let response = app
            .clone()
            .oneshot(request("GET", "/api/bugs?status=paid", Some(&admin_token), None))
            .await
            .unwrap();
        let filtered: Vec<serde_json::Value> = body_json(response.into_body()).await;
        assert_eq!(filtered.len(), 1);

        let response = app
            .oneshot(request("GET", "/api/bugs", Some(&admin_token), None))
            .await
            .unwrap();
        let all: Vec<serde_json::Value> = body_json(response.into_body()).await;
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_manage_developers() {
        let app = test_app();
        let token = register(&app, "an@example.com").await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/developers",
                Some(&token),
                Some(serde_json::json!({
                    "email": "chi@example.com",
                    "password": "secret1",
                    "name": "Chi Le",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request("DELETE", "/api/developers/some-id", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_deleting_developer_detaches_their_bugs() {
        let app = test_app();
        let admin_token = register(&app, ADMIN_EMAIL).await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/developers",
                Some(&admin_token),
                Some(serde_json::json!({
                    "email": "binh@example.com",
                    "password": "secret1",
                    "name": "Binh Tran",
                })),
            ))
            .await
            .unwrap();
        let binh: serde_json::Value = body_json(response.into_body()).await;
        let binh_id = binh["id"].as_str().unwrap().to_string();

        let bug = create_bug_via_api(
            &app,
            &admin_token,
            serde_json::json!({"title": "Assigned", "developer_id": binh_id, "penalty_amount": 10.0}),
        )
        .await;
        let bug_id = bug["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("/api/developers/{}", binh_id),
                Some(&admin_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/bugs/{}", bug_id),
                Some(&admin_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let orphaned: serde_json::Value = body_json(response.into_body()).await;
        assert!(orphaned["developer_id"].is_null());
        assert!(orphaned["developer"].is_null());
        assert_eq!(orphaned["penalty_amount"], 10.0);
    }

    #[tokio::test]
    async fn test_stats_endpoint_sums_match_the_collection() {
        let app = test_app();
        let token = register(&app, "an@example.com").await;

        create_bug_via_api(
            &app,
            &token,
            serde_json::json!({"title": "A", "penalty_amount": 50.0}),
        )
        .await;
        create_bug_via_api(
            &app,
            &token,
            serde_json::json!({"title": "B", "penalty_amount": 20.0, "penalty_status": "paid"}),
        )
        .await;

        let response = app
            .oneshot(request("GET", "/api/stats", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["summary"]["total_bugs"], 2);
        assert_eq!(body["summary"]["total_penalty"], 70.0);
        assert_eq!(body["summary"]["pending_count"], 1);
        assert_eq!(body["summary"]["paid_count"], 1);
        assert_eq!(body["summary"]["pending_penalty"], 50.0);
        // Both bugs are unassigned, so one developer group under the fallback label
        assert_eq!(body["by_developer"].as_array().unwrap().len(), 1);
        assert_eq!(body["by_developer"][0]["name"], "Unassigned");
    }

    #[tokio::test]
    async fn test_leaderboard_defaults_to_the_active_sprint() {
        let app = test_app();
        let token = register(&app, "an@example.com").await;

        let today = Utc::now().date_naive();
        let start = (today - chrono::Duration::days(1)).format("%Y-%m-%d").to_string();
        let end = (today + chrono::Duration::days(1)).format("%Y-%m-%d").to_string();
        let sprint_id = create_sprint_via_api(&app, &token, "Current", &start, &end).await;

        create_bug_via_api(
            &app,
            &token,
            serde_json::json!({"title": "In sprint", "sprint_id": sprint_id, "penalty_amount": 30.0}),
        )
        .await;
        create_bug_via_api(
            &app,
            &token,
            serde_json::json!({"title": "Outside", "penalty_amount": 99.0}),
        )
        .await;

        let response = app
            .oneshot(request("GET", "/api/stats/leaderboard", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["sprint"]["id"].as_str().unwrap(), sprint_id);
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["penalty_sum"], 30.0);
    }

    #[tokio::test]
    async fn test_create_bug_broadcasts_ws_event() {
        let (state, ws_tx) = test_state();
        let app = api_router().with_state(state);
        let token = register(&app, "an@example.com").await;

        let mut rx = ws_tx.subscribe();
        create_bug_via_api(
            &app,
            &token,
            serde_json::json!({"title": "Broadcast me"}),
        )
        .await;

        let msg = rx.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(parsed["type"], "BugCreated");
        assert_eq!(parsed["data"]["bug"]["title"], "Broadcast me");
    }

    #[tokio::test]
    async fn test_mark_paid_on_unknown_bug_is_404() {
        let app = test_app();
        let token = register(&app, "an@example.com").await;

        let response = app
            .oneshot(request("POST", "/api/bugs/no-such-bug/pay", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, "Bearer abc-123".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc-123"));

        headers.insert(header::AUTHORIZATION, "Basic abc-123".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_reference_error_mapping_keeps_bug_404s() {
        let mapped = map_reference_errors(StoreError::not_found("sprint", "s1"));
        assert!(matches!(mapped, ApiError::BadRequest(_)));

        let mapped = map_reference_errors(StoreError::not_found("bug", "b1"));
        assert!(matches!(mapped, ApiError::NotFound(_)));
    }

    #[test]
    fn test_assemble_leaderboard_with_fake_stores() {
        use crate::db::now_rfc3339;

        let store = MemoryStore::new();
        let sprint = Sprint {
            id: "s-current".to_string(),
            name: "Current".to_string(),
            start_date: "2024-06-03".to_string(),
            end_date: "2024-06-14".to_string(),
            penalty_url: None,
            created_at: now_rfc3339(),
        };
        SprintStore::create_sprint(&store, &sprint).unwrap();
        let developer = Developer {
            id: "d1".to_string(),
            name: "An Nguyen".to_string(),
            email: "an@example.com".to_string(),
            avatar_url: None,
            role: Role::Developer,
            created_at: now_rfc3339(),
        };
        crate::store::DeveloperStore::create_developer(&store, &developer).unwrap();
        let bug = Bug {
            id: "b1".to_string(),
            title: "In sprint".to_string(),
            description: None,
            sprint_id: Some("s-current".to_string()),
            developer_id: Some("d1".to_string()),
            penalty_amount: 40.0,
            penalty_status: PenaltyStatus::Pending,
            image_url: None,
            created_at: now_rfc3339(),
        };
        BugStore::create_bug(&store, &bug).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let board = assemble_leaderboard(&store, &store, None, today).unwrap();
        assert_eq!(board.sprint.as_ref().map(|s| s.id.as_str()), Some("s-current"));
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].developer_name, "An Nguyen");
        assert_eq!(board.entries[0].penalty_sum, 40.0);

        // Unknown requested sprint falls back to an empty board
        let board = assemble_leaderboard(&store, &store, Some("missing"), today).unwrap();
        assert!(board.sprint.is_none());
        assert!(board.entries.is_empty());
    }

    #[test]
    fn test_build_stats_applies_the_filter() {
        let bugs = vec![
            BugDetails {
                bug: Bug {
                    id: "b1".to_string(),
                    title: "Kept".to_string(),
                    description: None,
                    sprint_id: None,
                    developer_id: Some("d1".to_string()),
                    penalty_amount: 10.0,
                    penalty_status: PenaltyStatus::Pending,
                    image_url: None,
                    created_at: "2024-06-05T00:00:00Z".to_string(),
                },
                developer: None,
                sprint: None,
            },
            BugDetails {
                bug: Bug {
                    id: "b2".to_string(),
                    title: "Dropped".to_string(),
                    description: None,
                    sprint_id: None,
                    developer_id: Some("d2".to_string()),
                    penalty_amount: 99.0,
                    penalty_status: PenaltyStatus::Pending,
                    image_url: None,
                    created_at: "2024-06-05T00:00:00Z".to_string(),
                },
                developer: None,
                sprint: None,
            },
        ];

        let sprints = vec![
            Sprint {
                id: "s1".to_string(),
                name: "Running".to_string(),
                start_date: "2024-06-01".to_string(),
                end_date: "2024-06-14".to_string(),
                penalty_url: None,
                created_at: "2024-05-30T00:00:00Z".to_string(),
            },
            Sprint {
                id: "s2".to_string(),
                name: "Finished".to_string(),
                start_date: "2024-05-01".to_string(),
                end_date: "2024-05-14".to_string(),
                penalty_url: None,
                created_at: "2024-04-30T00:00:00Z".to_string(),
            },
        ];
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        let filter = BugFilter {
            developer: Some("d1".to_string()),
            ..Default::default()
        };
        let response = build_stats(&bugs, &sprints, &filter, today);
        assert_eq!(response.summary.total_bugs, 1);
        assert_eq!(response.summary.total_penalty, 10.0);
        // Sprint count is untouched by the bug filter
        assert_eq!(response.active_sprints, 1);

        let response = build_stats(&bugs, &sprints, &BugFilter::default(), today);
        assert_eq!(response.summary.total_bugs, 2);
        assert_eq!(response.summary.total_penalty, 109.0);
        assert_eq!(response.active_sprints, 1);
    }
}
