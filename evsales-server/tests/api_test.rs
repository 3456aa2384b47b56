use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use evsales_server::services::SalesContext;

use crate::common::mock_app::{FIXTURE, MockApp, test_settings};

mod common;

async fn get(app: MockApp, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app.router
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let res_body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, content_type, String::from_utf8(res_body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_metrics_one_row_per_manufacturer() {
    let app = MockApp::new();
    let manufacturers = app.context.records
        .iter()
        .map(|r| r.manufacturer.clone())
        .collect::<BTreeSet<_>>();

    let (status, _, body) = get(app, "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let metrics: Vec<Value> = serde_json::from_str(&body).unwrap();
    let names = metrics
        .iter()
        .map(|m| m["Manufacturer"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, manufacturers.into_iter().collect::<Vec<_>>());

    for metric in &metrics {
        for field in ["Avg_2015_25", "Predicted_2026", "Change", "Change_pct"] {
            assert!(metric[field].as_f64().unwrap().is_finite(), "{field} of {metric}");
        }
    }
}

#[tokio::test]
async fn test_metrics_keep_manufacturer_without_history() {
    let app = MockApp::new();

    let (status, _, body) = get(app, "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let metrics: Vec<Value> = serde_json::from_str(&body).unwrap();
    let volkswagen = metrics
        .iter()
        .find(|m| m["Manufacturer"] == "Volkswagen")
        .unwrap();

    assert_eq!(volkswagen["Avg_2015_25"].as_f64(), Some(0.0));
    assert_eq!(volkswagen["Change_pct"].as_f64(), Some(0.0));
    assert_eq!(volkswagen["Change"], volkswagen["Predicted_2026"]);
}

#[tokio::test]
async fn test_brand_not_found() {
    let app = MockApp::new();

    let (status, _, body) = get(app, "/api/brand/Rivian").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "error": "Brand not found" }));
}

#[tokio::test]
async fn test_brand_series() {
    let app = MockApp::new();

    let (status, _, body) = get(app, "/api/brand/Tesla").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    let years = json["years"].as_array().unwrap();
    let units = json["units"].as_array().unwrap();

    assert_eq!(years.len(), units.len());
    assert!(!years.is_empty());
    assert!(years.windows(2).all(|w| w[0].as_i64() < w[1].as_i64()));
}

#[tokio::test]
async fn test_insights_shape() {
    let app = MockApp::new();

    let (status, _, body) = get(app, "/api/insights").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    for key in ["yearly_sales", "top_manufacturers", "charging_type", "country_sales", "charging_time"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }

    let values = json["top_manufacturers"]["values"].as_array().unwrap();
    assert!(values.len() <= 10);
    assert!(values.windows(2).all(|w| w[0].as_i64() >= w[1].as_i64()));
    assert_eq!(json["top_manufacturers"]["labels"].as_array().unwrap().len(), values.len());

    let years = json["yearly_sales"]["years"].as_array().unwrap();
    assert!(years.windows(2).all(|w| w[0].as_i64() < w[1].as_i64()));
}

#[tokio::test]
async fn test_insights_without_records_is_internal_error() {
    let app = MockApp::with_context(Arc::new(SalesContext {
        source: None,
        records: vec![],
        metrics: vec![],
    }));

    let (status, _, body) = get(app, "/api/insights").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "No records to aggregate");
    assert!(json["error_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_index_lists_manufacturers() {
    let app = MockApp::new();
    let manufacturers = app.context.manufacturers().map(String::from).collect::<Vec<_>>();

    let (status, content_type, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));

    for manufacturer in &manufacturers {
        assert!(body.contains(&format!(r#"<option value="{manufacturer}""#)));
    }
    assert!(!body.contains("<table"));
}

#[tokio::test]
async fn test_index_with_selected_manufacturer() {
    let app = MockApp::new();

    let (status, _, body) = get(app, "/?manufacturer=Tesla").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"<option value="Tesla" selected>"#));
    assert!(body.contains("Predicted units sold 2026"));

    let app = MockApp::new();
    let (status, _, body) = get(app, "/?manufacturer=Rivian").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No data for Rivian"));
}

#[tokio::test]
async fn test_context_uses_first_existing_dataset() {
    let settings = test_settings("missing/ev.csv", &[FIXTURE]);

    let context = tokio::task::spawn_blocking(move || SalesContext::build(&settings))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(context.source, Some(PathBuf::from(FIXTURE)));
    assert!(!context.metrics.is_empty());
}

#[tokio::test]
async fn test_context_reports_every_missing_dataset() {
    let settings = test_settings("missing/ev.csv", &["also/missing.csv"]);

    let error = SalesContext::build(&settings).unwrap_err().to_string();

    assert!(error.contains("missing/ev.csv"));
    assert!(error.contains("also/missing.csv"));
}
