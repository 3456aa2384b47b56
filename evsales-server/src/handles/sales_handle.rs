use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::errors::{ApiError, SalesError};
use crate::services::SalesContext;

#[derive(Clone)]
pub struct SalesState {
    pub context: Arc<SalesContext>,
}

pub async fn get_metrics(State(state): State<SalesState>) -> impl IntoResponse {
    Json(state.context.metrics.clone())
}

pub async fn get_insights(State(state): State<SalesState>) -> Result<impl IntoResponse, ApiError> {
    let insights = state.context.insights()?;

    Ok(Json(insights))
}

pub async fn get_brand(
    Path(manufacturer): Path<String>,
    State(state): State<SalesState>,
) -> Result<impl IntoResponse, ApiError> {
    let series = state
        .context
        .brand(&manufacturer)
        .ok_or(SalesError::BrandNotFound)?;

    Ok(Json(series))
}
