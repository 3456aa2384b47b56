pub mod api;
pub mod sales;

pub use api::ApiError;
pub use sales::SalesError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_id) = match self {
            ApiError::SalesError(e) => (e.status_code(), e.to_string(), None),
            ApiError::InsightError(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Insight error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), Some(error_id))
            }
        };

        let mut body = json!({ "error": error_message });
        if let Some(error_id) = error_id {
            body["error_id"] = json!(error_id.to_string());
        }

        (status, Json(body)).into_response()
    }
}
