//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_present: bool,
    labels_count: usize,
    nutrients_loaded: bool,
    input_scale: &'static str,
    version: &'static str,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_present = state.classifier.is_some();
    let ready = model_present && state.reference.is_ready();

    Json(HealthResponse {
        status: if ready { "ok" } else { "degraded" },
        model_present,
        labels_count: state.reference.labels_count(),
        nutrients_loaded: state.reference.nutrients_loaded(),
        input_scale: state.config.input_scale.as_str(),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
