use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::Settings;
use crate::handles::*;
use crate::services::SalesContext;

pub async fn create_app(settings: &Arc<Settings>) -> anyhow::Result<Router> {
    let settings = settings.clone();
    let context = tokio::task::spawn_blocking(move || SalesContext::build(&settings)).await??;

    Ok(create_router(Arc::new(context)))
}

pub fn create_router(context: Arc<SalesContext>) -> Router {
    let state = SalesState { context };

    let api = Router::new()
        .route("/metrics", get(get_metrics))
        .route("/insights", get(get_insights))
        .route("/brand/:manufacturer", get(get_brand))
        .with_state(state.clone());

    Router::new()
        .route("/", get(index))
        .with_state(state)
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
