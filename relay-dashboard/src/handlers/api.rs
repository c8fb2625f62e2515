//! JSON API (v1)
//!
//! Stateless: API predictions never touch a browser session.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use relay_core::logic::features::{schema_for, LayoutInfo};
use relay_core::logic::model::ModelStatus;
use relay_core::{InputRecord, PredictionLabel, SchemaKey, Section};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, AppState};

/// Layout of all five schemas
pub async fn schemas() -> Json<Vec<LayoutInfo>> {
    Json(SchemaKey::ALL.iter().map(|key| schema_for(*key).layout_info()).collect())
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Feature name -> value; missing features default to zero
    #[serde(default)]
    pub values: HashMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub section: &'static str,
    pub label: PredictionLabel,
    pub raw: i64,
    pub message: String,
    pub inference_time_us: u64,
}

/// Predict one row for a section
pub async fn predict(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    let section = Section::from_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("Unknown section '{}'", slug)))?;
    let record = InputRecord::from_named(section.schema(), &request.values)?;

    let models = state.models.clone();
    let outcome = tokio::task::spawn_blocking(move || models.predict(section.title(), &record)).await??;

    Ok(Json(PredictResponse {
        section: section.slug(),
        label: outcome.label,
        raw: outcome.raw,
        message: outcome.message(),
        inference_time_us: outcome.inference_time_us,
    }))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub environment: String,
    pub models: Vec<ModelStatus>,
    pub analytics_path: String,
    pub analytics_present: bool,
    pub active_sessions: usize,
}

/// Loaded classifiers and analytics file presence
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: relay_core::constants::APP_VERSION,
        environment: state.config.environment.clone(),
        models: state.models.status(),
        analytics_path: state.analytics.path().display().to_string(),
        analytics_present: state.analytics.exists(),
        active_sessions: state.sessions.len(),
    })
}
