//! HTTP API for the chat UI and the admin dashboards
//!
//! Chat sessions live in an in-process registry; each registry slot owns one
//! [`ChatSession`]. Admin routes require `Authorization: Bearer <token>`.
//!
//! Ledger writes are not serialized. Two requests writing the same document
//! at the same moment race and the last writer wins.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::agent::{ChatOrchestrator, ChatReply, ChatSession, ConversationSummary, SessionStatus};
use crate::error::CareerError;
use crate::storage::{FeedbackLedger, MetricsLedger};
use crate::types::{DailyStatRow, FeedbackRecord, NewFeedback, PerformanceMetrics, RecentActivity};

/// Default number of days in the daily series
pub const DEFAULT_DAILY_DAYS: u32 = 7;

pub use crate::storage::MAX_DAILY_DAYS;

/// Default recent-activity window
pub const DEFAULT_ACTIVITY_HOURS: i64 = 24;

/// Default page size for feedback listings
pub const DEFAULT_FEEDBACK_LIMIT: usize = 10;

/// Live chat sessions keyed by opaque id
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<ChatSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session and return its status
    pub fn create(&self) -> SessionStatus {
        let session = ChatSession::new();
        let status = session.status();
        self.sessions
            .insert(session.id().to_string(), Arc::new(Mutex::new(session)));
        status
    }

    pub fn get(&self, id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Discard a session
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub feedback: Arc<FeedbackLedger>,
    pub metrics: Arc<MetricsLedger>,
    pub sessions: Arc<SessionRegistry>,
    admin_token_hash: Option<Vec<u8>>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<ChatOrchestrator>,
        feedback: Arc<FeedbackLedger>,
        metrics: Arc<MetricsLedger>,
        admin_token: Option<&str>,
    ) -> Self {
        Self {
            orchestrator,
            feedback,
            metrics,
            sessions: Arc::new(SessionRegistry::new()),
            admin_token_hash: admin_token
                .filter(|t| !t.trim().is_empty())
                .map(|t| Sha256::digest(t.trim().as_bytes()).to_vec()),
        }
    }

    fn authorize_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let expected = self
            .admin_token_hash
            .as_ref()
            .ok_or_else(|| CareerError::Unauthorized("admin access is disabled".to_string()))?;

        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| CareerError::Unauthorized("missing bearer token".to_string()))?;

        if Sha256::digest(presented.trim().as_bytes()).as_slice() != expected.as_slice() {
            tracing::warn!(
                "Rejected admin token with digest prefix {}",
                &hex::encode(Sha256::digest(presented.as_bytes()))[..8]
            );
            return Err(CareerError::Unauthorized("invalid admin token".to_string()).into());
        }
        Ok(())
    }
}

/// Error response wrapper
#[derive(Debug)]
pub struct ApiError(pub CareerError);

impl From<CareerError> for ApiError {
    fn from(e: CareerError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub status: SessionStatus,
    pub summary: ConversationSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackQuery {
    pub limit: Option<usize>,
    #[serde(rename = "type")]
    pub feedback_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DailyQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub hours: Option<i64>,
}

/// HTTP server
pub struct ApiServer {
    state: AppState,
    addr: SocketAddr,
}

impl ApiServer {
    pub fn new(state: AppState, addr: SocketAddr) -> Self {
        Self { state, addr }
    }

    /// Build the router
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/sessions", post(create_session))
            .route(
                "/api/sessions/:id",
                get(get_session).delete(delete_session),
            )
            .route("/api/sessions/:id/messages", post(post_message))
            .route("/api/feedback", post(submit_feedback))
            .route("/api/admin/feedback", get(list_feedback))
            .route("/api/admin/feedback/stats", get(feedback_stats))
            .route("/api/admin/metrics", get(performance_metrics))
            .route("/api/admin/metrics/daily", get(daily_stats))
            .route("/api/admin/metrics/activity", get(recent_activity))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Start the server
    pub async fn start(self) -> std::io::Result<()> {
        let app = Self::router(self.state);

        tracing::info!("API server listening on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Health check endpoint
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.len(),
    }))
}

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(state.sessions.create()))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    let session = lookup_session(&state, &id)?;
    let session = session.lock().await;
    Ok(Json(SessionView {
        status: session.status(),
        summary: session.summary(),
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CareerError::NotFound(format!("session {}", id)).into())
    }
}

async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MessageBody>,
) -> ApiResult<Json<ChatReply>> {
    let session = lookup_session(&state, &id)?;
    let mut session = session.lock().await;
    let reply = state.orchestrator.respond(&mut session, &body.content).await?;
    Ok(Json(reply))
}

async fn submit_feedback(
    State(state): State<AppState>,
    Json(body): Json<NewFeedback>,
) -> ApiResult<impl IntoResponse> {
    let id = state.feedback.submit(body)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FeedbackQuery>,
) -> ApiResult<Json<Vec<FeedbackRecord>>> {
    state.authorize_admin(&headers)?;
    let limit = query.limit.unwrap_or(DEFAULT_FEEDBACK_LIMIT);
    let records = match query.feedback_type.as_deref() {
        Some(t) => {
            let mut records = state.feedback.by_type(t);
            records.truncate(limit);
            records
        }
        None => state.feedback.recent(limit),
    };
    Ok(Json(records))
}

async fn feedback_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    state.authorize_admin(&headers)?;
    Ok(Json(json!({
        "summary": state.feedback.stats(),
        "rating_distribution": state.feedback.rating_distribution(),
        "document": state.feedback.info(),
    })))
}

async fn performance_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<PerformanceMetrics>> {
    state.authorize_admin(&headers)?;
    Ok(Json(state.metrics.performance_metrics()))
}

async fn daily_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DailyQuery>,
) -> ApiResult<Json<Vec<DailyStatRow>>> {
    state.authorize_admin(&headers)?;
    let days = query.days.unwrap_or(DEFAULT_DAILY_DAYS).min(MAX_DAILY_DAYS);
    Ok(Json(state.metrics.daily_stats(days)))
}

async fn recent_activity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<RecentActivity>> {
    state.authorize_admin(&headers)?;
    let hours = query.hours.unwrap_or(DEFAULT_ACTIVITY_HOURS).max(0);
    Ok(Json(state.metrics.recent_activity(hours)))
}

fn lookup_session(state: &AppState, id: &str) -> ApiResult<Arc<Mutex<ChatSession>>> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| CareerError::NotFound(format!("session {}", id)).into())
}
