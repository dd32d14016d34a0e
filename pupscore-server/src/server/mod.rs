mod config;
pub mod notify;

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{Method, StatusCode, header},
    routing::{get, post},
};
pub use config::{AppConfig, ConfigError, MAX_NOTIFY_SECS};
use pupscore_shared::api;
use pupscore_shared::domain::{Achievement, AchievementDefinition, Challenge, ChallengeDefinition};
use pupscore_shared::gamification::{AchievementNotification, SystemClock};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Span, info_span, trace};
use uuid::Uuid;

use crate::profile;
use crate::storage::StorageError;
use notify::{TokioExpiryScheduler, UserNotifier};

type NotifierMap = Arc<Mutex<HashMap<String, UserNotifier>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: crate::storage::Store,
    // One dedup set per user, kept only while it has pending cooldowns
    notifiers: NotifierMap,
    scheduler: TokioExpiryScheduler,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, store: crate::storage::Store) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            config,
            store,
            notifiers: Default::default(),
            scheduler: TokioExpiryScheduler::new(shutdown.child_token()),
            shutdown,
        }
    }

    /// Cancelled on shutdown. Also drops pending notification expiry timers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the dedup check for one user. Notifiers exist only while a
    /// cooldown is pending; idle ones are dropped after every check.
    pub async fn check_notifications(
        &self,
        user_id: &str,
        achievements: &[Achievement],
    ) -> (bool, Vec<AchievementNotification>) {
        let mut map = self.notifiers.lock().await;
        let notifier = map.entry(user_id.to_string()).or_insert_with(|| {
            UserNotifier::with_settings(
                SystemClock,
                self.scheduler.clone(),
                self.config.notifications,
            )
        });
        let mut notifications: Vec<AchievementNotification> = Vec::new();
        let has_new = notifier.notify_new_achievements(achievements, &mut notifications);
        let before = map.len();
        map.retain(|_, n| !n.is_idle());
        trace!(
            tracked = map.len(),
            evicted = before - map.len(),
            "notify: pruned idle notifiers"
        );
        (has_new, notifications)
    }

    /// Number of users with a notifier currently held in memory.
    pub async fn tracked_notifiers(&self) -> usize {
        self.notifiers.lock().await.len()
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    let users = Router::new()
        .route(
            "/api/v1/users/{user_id}/achievements",
            get(api_user_achievements),
        )
        .route(
            "/api/v1/users/{user_id}/achievements/{achievement_id}/progress",
            post(api_achievement_progress),
        )
        .route("/api/v1/users/{user_id}/challenges", get(api_user_challenges))
        .route(
            "/api/v1/users/{user_id}/challenges/{challenge_id}/progress",
            post(api_challenge_progress),
        )
        .route("/api/v1/users/{user_id}/stats", get(api_user_stats))
        .route(
            "/api/v1/users/{user_id}/notifications/check",
            post(api_notifications_check),
        )
        .with_state(state.clone())
        .layer(middleware::from_fn(set_user_span_field));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            user_id = tracing::field::Empty
        )
    });

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/api/v1/version", get(api_version))
        .route("/api/v1/achievements", get(api_achievement_catalog))
        .route("/api/v1/challenges", get(api_challenge_catalog))
        .merge(users)
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    // Optionally add CORS for dev if configured
    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = header::HeaderValue::from_str(origin)
            .unwrap_or(header::HeaderValue::from_static("http://localhost:5173"));
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn api_version() -> Json<api::VersionInfoDto> {
    Json(api::VersionInfoDto {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );

    // Progress changes on every write; never serve stale stats
    if path == "/healthz" || path.starts_with("/api/") {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
    }

    Ok(resp)
}

async fn set_user_span_field(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    if let Some(uid) = pupscore_shared::path::user_id_from_path(req.uri().path()) {
        Span::current().record("user_id", tracing::field::display(&uid));
    }
    Ok(next.run(req).await)
}

async fn api_achievement_catalog(
    State(state): State<AppState>,
) -> Result<Json<Vec<AchievementDefinition>>, AppError> {
    let rows = state.store.list_achievement_catalog().await?;
    Ok(Json(rows))
}

async fn api_challenge_catalog(
    State(state): State<AppState>,
) -> Result<Json<Vec<ChallengeDefinition>>, AppError> {
    let rows = state.store.list_challenge_catalog().await?;
    Ok(Json(rows))
}

async fn api_user_achievements(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Achievement>>, AppError> {
    let items = profile::load_achievements(&state.store, &user_id).await?;
    Ok(Json(items))
}

async fn api_user_challenges(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(filter): Query<api::ChallengeFilter>,
) -> Result<Json<Vec<Challenge>>, AppError> {
    let mut items = profile::load_challenges(&state.store, &user_id).await?;
    if filter.active {
        let now = pupscore_shared::domain::now_utc();
        items.retain(|c| c.is_active(now));
    }
    Ok(Json(items))
}

async fn api_user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<api::PlayerStatsDto>, AppError> {
    let profile = profile::load_profile(&state.store, &user_id).await?;
    Ok(Json(profile.stats_dto()))
}

#[derive(Deserialize)]
struct AchievementPath {
    user_id: String,
    achievement_id: String,
}

#[derive(Deserialize)]
struct ChallengePath {
    user_id: String,
    challenge_id: String,
}

async fn api_achievement_progress(
    State(state): State<AppState>,
    Path(p): Path<AchievementPath>,
    Json(body): Json<api::ProgressReq>,
) -> Result<Json<Achievement>, AppError> {
    state
        .store
        .record_achievement_progress(&p.user_id, &p.achievement_id, body.progress)
        .await?;
    let achievements = profile::load_achievements(&state.store, &p.user_id).await?;
    achievements
        .into_iter()
        .find(|a| a.id.0 == p.achievement_id)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("achievement {}", p.achievement_id)))
}

async fn api_challenge_progress(
    State(state): State<AppState>,
    Path(p): Path<ChallengePath>,
    Json(body): Json<api::ProgressReq>,
) -> Result<Json<Challenge>, AppError> {
    state
        .store
        .record_challenge_progress(&p.user_id, &p.challenge_id, body.progress)
        .await?;
    let challenges = profile::load_challenges(&state.store, &p.user_id).await?;
    challenges
        .into_iter()
        .find(|c| c.id.0 == p.challenge_id)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("challenge {}", p.challenge_id)))
}

async fn api_notifications_check(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<api::NotificationCheckResp>, AppError> {
    let achievements = profile::load_achievements(&state.store, &user_id).await?;
    let (has_new, notifications) = state.check_notifications(&user_id, &achievements).await;
    for n in &notifications {
        tracing::info!(
            user_id = %user_id,
            achievement_id = %n.achievement_id,
            polarity = ?n.polarity,
            count = n.count,
            headline = %n.headline,
            "notification raised"
        );
    }
    Ok(Json(api::NotificationCheckResp {
        has_new,
        notifications,
    }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    /// The data store could not serve the request.
    Upstream(String),
}

impl AppError {
    fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::InvalidInput(m) => AppError::BadRequest(m),
            StorageError::NotFound(m) => AppError::NotFound(m),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, kind, detail) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, "bad_request", None),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m, "not_found", None),
            // Do not leak storage details to clients, but log them
            AppError::Upstream(m) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "data fetch failed".into(),
                "upstream",
                Some(m),
            ),
        };
        if let Some(detail) = detail {
            tracing::error!(
                status = %status,
                kind = kind,
                message = %msg,
                detail = %detail,
                "request failed"
            );
        } else {
            tracing::warn!(status = %status, kind = kind, message = %msg, "request failed");
        }
        let body = axum::Json(ErrorBody { error: msg });
        (status, body).into_response()
    }
}
