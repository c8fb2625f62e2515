//! Router tests with stub classifiers and no analytics file

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use ndarray::Array2;
use relay_core::logic::model::InferenceError;
use relay_core::{AnalyticsSource, Classifier, ModelRegistry};
use tower::ServiceExt;

use crate::config::Config;
use crate::session::SessionStore;
use crate::{create_router, AppState};

/// Always returns the same raw label
struct Fixed(i64);

impl Classifier for Fixed {
    fn predict_one(&self, _row: &Array2<f32>) -> Result<i64, InferenceError> {
        Ok(self.0)
    }

    fn describe(&self) -> String {
        format!("fixed-{}", self.0)
    }
}

struct Broken;

impl Classifier for Broken {
    fn predict_one(&self, _row: &Array2<f32>) -> Result<i64, InferenceError> {
        Err(InferenceError("feature count mismatch".to_string()))
    }

    fn describe(&self) -> String {
        "broken".to_string()
    }
}

fn fixed(raw: i64) -> Arc<dyn Classifier> {
    Arc::new(Fixed(raw))
}

/// Registry where every classifier answers `raw`
pub(crate) fn stub_registry(raw: i64) -> ModelRegistry {
    ModelRegistry::from_classifiers([fixed(raw), fixed(raw), fixed(raw), fixed(raw)], fixed(raw))
}

fn app_with_sessions(models: ModelRegistry) -> (tempfile::TempDir, Router, Arc<SessionStore>) {
    let dir = tempfile::tempdir().unwrap();
    let sessions = Arc::new(SessionStore::new(Duration::from_secs(60)));
    let state = AppState {
        models: Arc::new(models),
        analytics: Arc::new(AnalyticsSource::new(dir.path().join("analytics.csv"))),
        sessions: sessions.clone(),
        config: Config::default(),
    };
    (dir, create_router(state), sessions)
}

fn app_with(models: ModelRegistry) -> (tempfile::TempDir, Router) {
    let (dir, app, _) = app_with_sessions(models);
    (dir, app)
}

fn app(raw: i64) -> (tempfile::TempDir, Router) {
    app_with(stub_registry(raw))
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn session_cookie(response: &Response) -> String {
    let value = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    value.split(';').next().unwrap().to_string()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

fn post_json(uri: &str, json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = app(0);
    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("healthy"));
}

#[tokio::test]
async fn test_index_defaults_to_overall() {
    let (_dir, app) = app(0);
    let response = app.oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).starts_with("relay_session="));

    let html = body_string(response).await;
    assert!(html.contains("<h2>Overall Relay Prediction</h2>"));
    assert!(html.contains("analytics.csv not found. Provide the file to view the histogram."));
}

#[tokio::test]
async fn test_index_section_choice() {
    let (_dir, app) = app(0);

    let response = app.clone().oneshot(get("/?section=Relay2%20Prediction", None)).await.unwrap();
    assert!(body_string(response).await.contains("<h2>Relay 2</h2>"));

    let response = app.oneshot(get("/?section=nonsense", None)).await.unwrap();
    assert!(body_string(response).await.contains("<h2>Overall Relay Prediction</h2>"));
}

#[tokio::test]
async fn test_missing_analytics_warns_per_chart() {
    let (_dir, app) = app(0);
    for (slug, warnings) in [("relay1", 1), ("relay2", 1), ("relay3", 1), ("relay4", 1), ("overall", 4)] {
        let response = app.clone().oneshot(get(&format!("/?section={}", slug), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert!(html.contains(&format!(r#"action="/predict/{}""#, slug)));
        assert_eq!(html.matches(r#"class="warning""#).count(), warnings, "section {}", slug);
    }
}

#[tokio::test]
async fn test_relay_prediction_page() {
    let (_dir, app) = app(1);
    let response = app
        .oneshot(post_form("/predict/relay1", None, "r1_R1%3AF=60.0&r1_R1%3AS=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Relay 1 Prediction: <strong>Attack</strong>"));
    assert!(html.contains(r#"name="r1_R1:F" value="60.0""#));
    assert!(html.contains("Provide the file to view the bar chart."));
}

#[tokio::test]
async fn test_prediction_rejects_non_numeric() {
    let (_dir, app) = app(0);
    let response = app
        .oneshot(post_form("/predict/relay3", None, "r3_R3%3AF=sixty"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("r3_R3:F"));
}

#[tokio::test]
async fn test_prediction_unknown_section() {
    let (_dir, app) = app(0);
    let response = app.oneshot(post_form("/predict/relay9", None, "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_classifier_failure_is_500() {
    let models = ModelRegistry::from_classifiers([fixed(0), fixed(0), fixed(0), fixed(0)], Arc::new(Broken));
    let (_dir, app) = app_with(models);
    let response = app.oneshot(post_form("/predict/overall", None, "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_string(response).await;
    assert!(body.contains("Prediction failed"));
    assert!(!body.contains("feature count mismatch"));
}

#[tokio::test]
async fn test_failed_submission_leaves_no_session() {
    let models = ModelRegistry::from_classifiers([fixed(0), fixed(0), fixed(0), fixed(0)], Arc::new(Broken));
    let (_dir, app, sessions) = app_with_sessions(models);

    let response = app.clone().oneshot(post_form("/predict/overall", None, "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(sessions.len(), 0);

    // An established session survives its own failed submission
    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    let cookie = session_cookie(&response);
    let response = app.oneshot(post_form("/predict/overall", Some(&cookie), "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn test_overall_rows_accumulate_per_session() {
    let (_dir, app) = app(0);

    let response = app.clone().oneshot(post_form("/predict/overall", None, "overall_R1%3AF=59.9")).await.unwrap();
    let cookie = session_cookie(&response);
    let html = body_string(response).await;
    assert!(html.contains("Overall Prediction: <strong>Natural</strong>"));
    assert!(html.contains("Predicted overall rows this session: 1"));

    let response = app
        .clone()
        .oneshot(post_form("/predict/overall", Some(&cookie), "overall_R1%3AF=60.1"))
        .await
        .unwrap();
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_string(response).await.contains("Predicted overall rows this session: 2"));

    let response = app.clone().oneshot(get("/session/overall.csv", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    let csv = body_string(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("R1-PA1:VH,"));

    // A different browser starts empty
    let response = app.oneshot(get("/session/overall.csv", None)).await.unwrap();
    assert_eq!(body_string(response).await.lines().count(), 1);
}

#[tokio::test]
async fn test_api_schemas() {
    let (_dir, app) = app(0);
    let response = app.oneshot(get("/api/v1/schemas", None)).await.unwrap();
    let schemas: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let schemas = schemas.as_array().unwrap();
    assert_eq!(schemas.len(), 5);
    assert_eq!(schemas[0]["key"], "relay1");
    assert_eq!(schemas[0]["feature_count"], 29);
    assert_eq!(schemas[4]["key"], "overall");
    assert_eq!(schemas[4]["feature_count"], 119);
}

#[tokio::test]
async fn test_api_predict() {
    let (_dir, app) = app(2);
    let request = post_json(
        "/api/v1/predict/relay4",
        serde_json::json!({ "values": { "R4:F": 60.0, "R4:S": 1 } }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["section"], "relay4");
    assert_eq!(body["label"], "Attack");
    assert_eq!(body["raw"], 2);
    assert_eq!(body["message"], "Relay 4 Prediction: Attack");
}

#[tokio::test]
async fn test_api_predict_unknown_feature() {
    let (_dir, app) = app(0);
    let request = post_json(
        "/api/v1/predict/relay1",
        serde_json::json!({ "values": { "R2:F": 60.0 } }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_status() {
    let (_dir, app) = app(0);
    let response = app.oneshot(get("/api/v1/status", None)).await.unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["models"].as_array().unwrap().len(), 5);
    assert_eq!(body["models"][0]["source"], "fixed-0");
    assert_eq!(body["analytics_present"], false);
}
