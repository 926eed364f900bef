// src/health.rs
//! Liveness responder. Shares only a health record with the monitor, never pipeline state.
//!
//! `GET /` answers 200 "OK" while the monitor is alive and finishing cycles, 503 otherwise,
//! so a probe can tell "process up, monitoring dead" apart from healthy.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::monitor::CycleReport;

// Slack on top of two poll intervals before a silent monitor counts as stale.
const STALE_GRACE_SECS: i64 = 600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MonitorState {
    Starting,
    Running,
    Stopped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    #[serde(flatten)]
    pub state: MonitorState,
    pub started_at: DateTime<Utc>,
    pub cycles: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_report: Option<CycleReport>,
}

#[derive(Clone)]
pub struct HealthHandle {
    inner: Arc<RwLock<HealthSnapshot>>,
    stale_after: chrono::Duration,
}

impl HealthHandle {
    pub fn new(poll_interval: Duration) -> Self {
        Self::starting_at(poll_interval, Utc::now())
    }

    pub fn starting_at(poll_interval: Duration, started_at: DateTime<Utc>) -> Self {
        let interval = i64::try_from(poll_interval.as_secs()).unwrap_or(i64::MAX);
        // Saturates to "never stale" when the interval is beyond chrono's range.
        let stale_after =
            chrono::Duration::try_seconds(interval.saturating_mul(2).saturating_add(STALE_GRACE_SECS))
                .unwrap_or(chrono::Duration::MAX);
        Self {
            inner: Arc::new(RwLock::new(HealthSnapshot {
                state: MonitorState::Starting,
                started_at,
                cycles: 0,
                last_cycle_at: None,
                last_report: None,
            })),
            stale_after,
        }
    }

    pub fn mark_running(&self) {
        let mut g = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if g.state == MonitorState::Starting {
            g.state = MonitorState::Running;
        }
    }

    pub fn cycle_finished(&self, report: &CycleReport, at: DateTime<Utc>) {
        let mut g = self.inner.write().unwrap_or_else(|e| e.into_inner());
        g.cycles += 1;
        g.last_cycle_at = Some(at);
        g.last_report = Some(report.clone());
    }

    pub fn mark_stopped(&self, reason: impl Into<String>) {
        let mut g = self.inner.write().unwrap_or_else(|e| e.into_inner());
        g.state = MonitorState::Stopped {
            reason: reason.into(),
        };
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Alive and has shown activity (start or last cycle) within the stale window.
    pub fn is_healthy(&self, now: DateTime<Utc>) -> bool {
        let s = self.snapshot();
        if matches!(s.state, MonitorState::Stopped { .. }) {
            return false;
        }
        let last_activity = s.last_cycle_at.unwrap_or(s.started_at);
        now.signed_duration_since(last_activity) <= self.stale_after
    }
}

pub fn router(health: HealthHandle) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(health)
}

async fn liveness(State(health): State<HealthHandle>) -> (StatusCode, &'static str) {
    if health.is_healthy(Utc::now()) {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "MONITOR DOWN")
    }
}

#[derive(Serialize)]
struct HealthOut {
    healthy: bool,
    #[serde(flatten)]
    snapshot: HealthSnapshot,
}

async fn health_detail(State(health): State<HealthHandle>) -> (StatusCode, Json<HealthOut>) {
    let healthy = health.is_healthy(Utc::now());
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthOut {
            healthy,
            snapshot: health.snapshot(),
        }),
    )
}
