use axum::{
    extract::{Path, State},
    response::Json,
};
use common::errors::AppError;
use common::models::{CampaignReport, DispatchStats, Forecast};
use std::sync::Arc;
use tracing::info;

use crate::cache::ForecastCache;
use crate::campaign::CampaignRunner;
use crate::dispatch::DispatchExecutor;

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<CampaignRunner>,
    pub cache: Arc<ForecastCache>,
    pub dispatch: Arc<DispatchExecutor>,
    pub api_key: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check")
    )
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "notifier-service" }))
}

#[utoipa::path(
    post,
    path = "/api/campaign/send",
    responses(
        (status = 200, description = "Campaign summary; deliveries settle asynchronously", body = CampaignReport),
        (status = 500, description = "Subscriber store unavailable")
    ),
    tag = "campaign"
)]
pub async fn send_campaign(
    State(state): State<AppState>,
) -> Result<Json<CampaignReport>, AppError> {
    info!("Campaign trigger received");

    let report = state.runner.run_all().await?;

    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/campaign/stats",
    responses(
        (status = 200, description = "Dispatch counters", body = DispatchStats)
    ),
    tag = "campaign"
)]
pub async fn campaign_stats(State(state): State<AppState>) -> Json<DispatchStats> {
    Json(state.dispatch.stats())
}

#[utoipa::path(
    get,
    path = "/api/forecast/{state}/{city}",
    params(
        ("state" = String, Path, description = "2-letter state code"),
        ("city" = String, Path, description = "City display name")
    ),
    responses(
        (status = 200, description = "Current conditions for the city", body = Forecast),
        (status = 500, description = "Invalid request"),
        (status = 502, description = "Weather provider unavailable")
    ),
    tag = "forecast"
)]
pub async fn get_forecast(
    State(app): State<AppState>,
    Path((state, city)): Path<(String, String)>,
) -> Result<Json<Forecast>, AppError> {
    info!(state = %state, city = %city, "Forecast request received");

    let forecast = app.cache.get(&app.api_key, &state, &city).await?;

    Ok(Json(forecast))
}
