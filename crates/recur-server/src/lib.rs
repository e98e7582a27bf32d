//! Recur Web Server
//!
//! Axum-based REST API over the recurring-charge detector.
//!
//! - Stateless detection over posted transactions
//! - Per-user transaction storage and pattern refresh
//! - Monthly and upcoming projections over persisted patterns
//!
//! Authentication is left to a fronting proxy. The caller's user comes from
//! the `x-recur-user` header.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info};

use recur_core::{Database, DetectionPolicy, RecurringDetector};

mod handlers;

/// Maximum request body size (5 MB)
pub const MAX_BODY_SIZE: usize = 5 * 1024 * 1024;

/// Largest accepted upcoming window
pub const MAX_UPCOMING_DAYS: u32 = 366;

/// Header naming the caller's user
pub const USER_HEADER: &str = "x-recur-user";

/// User assumed when the header is absent
pub const DEFAULT_USER: &str = "default";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub detector: RecurringDetector,
}

/// Extract the caller's user from request headers
pub fn get_user(headers: &HeaderMap) -> String {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_USER)
        .to_string()
}

/// Health response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /api/health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create the application router
pub fn create_router(db: Database, policy: DetectionPolicy, config: ServerConfig) -> Router {
    let cors = build_cors(&config);
    let state = Arc::new(AppState {
        db,
        detector: RecurringDetector::with_policy(policy),
    });

    let api_routes = Router::new()
        .route("/health", get(health_check))
        // Detection
        .route("/detect", post(handlers::run_detection))
        // Transactions
        .route("/transactions", post(handlers::add_transactions))
        // Patterns
        .route("/patterns", get(handlers::list_patterns))
        .route("/patterns/refresh", post(handlers::refresh))
        .route("/patterns/upcoming", get(handlers::upcoming_patterns))
        .route("/patterns/monthly", get(handlers::monthly_patterns))
        .route("/patterns/:merchant_key", get(handlers::get_pattern));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

fn build_cors(config: &ServerConfig) -> CorsLayer {
    let user_header = header::HeaderName::from_static(USER_HEADER);
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, user_header]);

    if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        return cors;
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    cors.allow_origin(origins)
}

/// Start the server
pub async fn serve(
    db: Database,
    policy: DetectionPolicy,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    info!(
        db = db.path(),
        cluster_strategy = %policy.cluster_strategy,
        cors_origins = config.allowed_origins.len(),
        "Loaded detection policy"
    );

    let app = create_router(db, policy, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err.into()),
        }
    }
}
