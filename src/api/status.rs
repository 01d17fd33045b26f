//! Status routes.
//!
//! Health checks, status endpoints, and relay counters.
//!
//! Routes:
//! - GET /health - Basic health check
//! - GET /health/ready - Readiness check (upstream APIs reachable)
//! - GET /health/live - Liveness check (server responding)
//! - GET /status - Detailed gateway status

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{config, AppState};

// Global relay counters (simple atomics)
static BIDS_RELAYED: AtomicU64 = AtomicU64::new(0);
static NOTIFICATIONS_PUSHED: AtomicU64 = AtomicU64::new(0);
static MESSAGES_RELAYED: AtomicU64 = AtomicU64::new(0);
static STARTUP_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize startup time. Call this once at server start.
pub fn init_startup_time() {
    let _ = STARTUP_TIME.get_or_init(Instant::now);
}

/// Get uptime in seconds since server start.
fn get_uptime_seconds() -> u64 {
    STARTUP_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Increment the successful-bid broadcast counter.
pub fn inc_bids_relayed() {
    BIDS_RELAYED.fetch_add(1, Ordering::Relaxed);
}

/// Increment the notification push counter.
pub fn inc_notifications_pushed() {
    NOTIFICATIONS_PUSHED.fetch_add(1, Ordering::Relaxed);
}

/// Increment the chat message relay counter.
pub fn inc_messages_relayed() {
    MESSAGES_RELAYED.fetch_add(1, Ordering::Relaxed);
}

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/health/live", get(liveness_check))
        .route("/status", get(gateway_status))
}

// ============================================================================
// Response Types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<DependencyCheck>,
}

#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: Option<u64>,
    pub message: Option<String>,
}

/// Gateway status response.
#[derive(Debug, Serialize)]
pub struct GatewayStatusResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub connections: ConnectionCounts,
    pub stores: StoreSizes,
    pub relays: RelayCounters,
}

#[derive(Debug, Serialize)]
pub struct ConnectionCounts {
    pub bidding: usize,
    pub notifications: usize,
    pub chat: usize,
}

#[derive(Debug, Serialize)]
pub struct StoreSizes {
    pub notifications: usize,
    pub chat_messages: usize,
    pub online_users: usize,
}

#[derive(Debug, Serialize)]
pub struct RelayCounters {
    pub bids_relayed: u64,
    pub notifications_pushed: u64,
    pub messages_relayed: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Basic health check.
///
/// GET /health
///
/// Returns 200 if the server is running. Used by load balancers
/// for basic availability checking.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").into(),
        timestamp: Utc::now(),
    })
}

/// Liveness check.
///
/// GET /health/live
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Readiness check.
///
/// GET /health/ready
///
/// Probes the external auction and chat APIs. Any HTTP response,
/// including 404, counts as reachable; only connect errors and
/// timeouts mark a dependency unhealthy. Returns 503 if either
/// upstream is down.
async fn readiness_check() -> impl IntoResponse {
    let config = config::config();
    let mut checks = Vec::new();
    let mut all_healthy = true;

    for (name, base_url) in [
        ("auction_api", config.auction_api.base_url.as_str()),
        ("chat_api", config.chat_api.base_url.as_str()),
    ] {
        let check = probe_upstream(name, base_url).await;
        if check.status != HealthStatus::Healthy {
            all_healthy = false;
        }
        checks.push(check);
    }

    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadinessResponse {
            ready: all_healthy,
            checks,
        }),
    )
}

async fn probe_upstream(name: &str, base_url: &str) -> DependencyCheck {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .expect("Failed to create HTTP client");

    let start = Instant::now();
    match client.get(base_url).send().await {
        Ok(_) => DependencyCheck {
            name: name.to_string(),
            status: HealthStatus::Healthy,
            latency_ms: Some(start.elapsed().as_millis() as u64),
            message: None,
        },
        Err(e) => DependencyCheck {
            name: name.to_string(),
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(e.to_string()),
        },
    }
}

/// Detailed gateway status.
///
/// GET /status
async fn gateway_status(State(state): State<AppState>) -> Json<GatewayStatusResponse> {
    Json(GatewayStatusResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: get_uptime_seconds(),
        connections: ConnectionCounts {
            bidding: state.bidding_rooms.connection_count().await,
            notifications: state.notifier.rooms.connection_count().await,
            chat: state.chat_rooms.connection_count().await,
        },
        stores: StoreSizes {
            notifications: state.notifier.store.len().await,
            chat_messages: state.chat.message_count().await,
            online_users: state.chat.online_count().await,
        },
        relays: RelayCounters {
            bids_relayed: BIDS_RELAYED.load(Ordering::Relaxed),
            notifications_pushed: NOTIFICATIONS_PUSHED.load(Ordering::Relaxed),
            messages_relayed: MESSAGES_RELAYED.load(Ordering::Relaxed),
        },
    })
}
