use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static UPLOAD_COUNT: AtomicU64 = AtomicU64::new(0);
static DELETE_COUNT: AtomicU64 = AtomicU64::new(0);
static AI_CALL_COUNT: AtomicU64 = AtomicU64::new(0);
static AI_FAILURE_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_upload_count() {
    UPLOAD_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_delete_count() {
    DELETE_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_ai_call_count() {
    AI_CALL_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_ai_failure_count() {
    AI_FAILURE_COUNT.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
    pub uploads_total: u64,
    pub deletions_total: u64,
    pub ai_calls_total: u64,
    pub ai_failures_total: u64,
}

fn snapshot() -> MetricsResponse {
    MetricsResponse {
        http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
        http_errors_total: ERROR_COUNT.load(Ordering::Relaxed),
        uploads_total: UPLOAD_COUNT.load(Ordering::Relaxed),
        deletions_total: DELETE_COUNT.load(Ordering::Relaxed),
        ai_calls_total: AI_CALL_COUNT.load(Ordering::Relaxed),
        ai_failures_total: AI_FAILURE_COUNT.load(Ordering::Relaxed),
    }
}

fn render(metrics: &MetricsResponse) -> String {
    let counters = [
        ("http_requests_total", "Total number of HTTP requests", metrics.http_requests_total),
        ("http_errors_total", "Total number of HTTP server errors", metrics.http_errors_total),
        ("uploads_total", "Files stored on disk", metrics.uploads_total),
        ("deletions_total", "Files and documents deleted", metrics.deletions_total),
        ("ai_calls_total", "Requests sent to the generative AI API", metrics.ai_calls_total),
        ("ai_failures_total", "AI requests answered with the fallback message", metrics.ai_failures_total),
    ];

    counters
        .iter()
        .map(|(name, help, value)| {
            format!("# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus counters", body = String)
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(render(&snapshot()))
}
