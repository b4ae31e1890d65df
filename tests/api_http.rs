// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET  /health
// - GET  /equations (with and without a registry file)
// - POST /signals, POST /score
// - GET  /drafts, GET /drafts/{name}, POST /drafts/{name}/score

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use std::fs;
use std::path::Path;
use tower::ServiceExt as _; // for `oneshot`

use ripplewriter_studio::{api, AppState, DraftRecord, StudioConfig};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

const EQUATIONS: &str = r#"
equations:
  - name: Peace Vector
    desc: sourced and calm
    weights: { coherence: 1.0, evidence: 2.0 }
  - id: evidence-only
    weights: { evidence: 1.0 }
"#;

/// Router over a scratch dir: `<tmp>/equations.yaml` + `<tmp>/articles/`.
fn test_router(root: &Path, with_equations: bool) -> Router {
    if with_equations {
        fs::write(root.join("equations.yaml"), EQUATIONS).unwrap();
    }
    let mut cfg = StudioConfig::default();
    cfg.paths.equations = root.join("equations.yaml");
    cfg.paths.drafts = root.join("articles");
    api::router(AppState::new(cfg))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

fn post_json(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

#[tokio::test]
async fn health_returns_ok() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_router(tmp.path(), false);

    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap().trim(), "OK");
}

#[tokio::test]
async fn equations_listed_and_missing_file_warns() {
    let tmp = tempfile::tempdir().unwrap();

    let app = test_router(tmp.path(), true);
    let (st, v) = send(&app, get("/equations")).await;
    assert_eq!(st, StatusCode::OK);
    let eqs = v["equations"].as_array().expect("equations array");
    assert_eq!(eqs.len(), 2);
    assert_eq!(eqs[0]["id"], "peace-vector");
    assert_eq!(eqs[0]["name"], "Peace Vector");
    assert!(v.get("warning").is_none());

    let empty = tempfile::tempdir().unwrap();
    let app = test_router(empty.path(), false);
    let (st, v) = send(&app, get("/equations")).await;
    assert_eq!(st, StatusCode::OK);
    assert!(v["equations"].as_array().unwrap().is_empty());
    assert!(v["warning"].as_str().unwrap().contains("RW-YAML-001"));
}

#[tokio::test]
async fn signals_for_draft_json() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_router(tmp.path(), false);

    let draft = json!({
        "outline": ["- point one", "- point two"],
        "generated_sections": {
            "lede": "Evidence shows http://example.com and doi:10.1/xyz. ",
            "body": "", "counterpoints": "", "conclusion": ""
        }
    });
    let (st, v) = send(&app, post_json("/signals", draft)).await;
    assert_eq!(st, StatusCode::OK);
    assert!((v["evidence"].as_f64().unwrap() - 2.0 / 6.0).abs() < 1e-9);
    assert!((v["clarity"].as_f64().unwrap() - 0.25).abs() < 1e-9);
    assert!((v["sentiment"].as_f64().unwrap() - 0.7).abs() < 1e-9);
}

#[tokio::test]
async fn score_returns_report_and_updated_draft() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_router(tmp.path(), true);

    // Tolerates junk shapes in the draft body.
    let payload = json!({
        "draft": {
            "title": "Junk tolerant",
            "outline": "not a list",
            "generated_sections": { "lede": ["http://a.org", "http://b.org"], "body": 7 },
            "meta": { "reviewer": "ana" }
        },
        "equation": "evidence-only"
    });
    let (st, v) = send(&app, post_json("/score", payload)).await;
    assert_eq!(st, StatusCode::OK, "{v}");

    assert_eq!(v["report"]["equation"], "evidence-only");
    let expected = 2.0 / 6.0;
    assert!((v["report"]["ripple_score"].as_f64().unwrap() - expected).abs() < 1e-9);
    assert_eq!(v["percent"], 33);

    let meta = &v["draft"]["meta"];
    assert_eq!(meta["reviewer"], "ana");
    assert_eq!(meta["equation"], "evidence-only");
    assert_eq!(meta["signals"]["evidence"].as_f64().unwrap(), 0.3333);
}

#[tokio::test]
async fn score_without_equation_uses_equal_weights() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_router(tmp.path(), true);

    let (st, v) = send(&app, post_json("/score", json!({}))).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["report"]["equation"], "none");
    assert!((v["report"]["ripple_score"].as_f64().unwrap() - 0.14).abs() < 1e-9);
    assert_eq!(v["report"]["weights"].as_object().unwrap().len(), 5);
}

#[tokio::test]
async fn stored_draft_is_scored_and_saved() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_router(tmp.path(), true);

    let articles = tmp.path().join("articles");
    fs::create_dir_all(&articles).unwrap();
    fs::write(
        articles.join("peace.yaml"),
        r#"
title: Peace
slug: peace
intention_equation: Peace Vector
outline: ["- a", "- b", "- c", "- d"]
generated_sections:
  lede: "See https://example.org for sources."
meta:
  reviewer: ana
"#,
    )
    .unwrap();

    let (st, v) = send(&app, get("/drafts")).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v, json!(["peace.yaml"]));

    let (st, v) = send(&app, get("/drafts/peace")).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(v["title"], "Peace");

    let req = Request::builder()
        .method("POST")
        .uri("/drafts/peace.yaml/score")
        .body(Body::empty())
        .unwrap();
    let (st, v) = send(&app, req).await;
    assert_eq!(st, StatusCode::OK, "{v}");
    assert_eq!(v["report"]["equation"], "peace-vector");

    // meta persisted, unrelated keys kept
    let saved = fs::read_to_string(articles.join("peace.yaml")).unwrap();
    let draft = DraftRecord::from_yaml_str(&saved).unwrap();
    assert_eq!(
        draft.meta.get("equation").and_then(|v| v.as_str()),
        Some("peace-vector")
    );
    assert_eq!(draft.meta.get("reviewer").and_then(|v| v.as_str()), Some("ana"));
    assert!(draft.meta.get("ripple_score").is_some());
    assert_eq!(draft.slug(), "peace");
}

#[tokio::test]
async fn stored_draft_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_router(tmp.path(), false);

    let (st, _) = send(&app, get("/drafts/missing")).await;
    assert_eq!(st, StatusCode::NOT_FOUND);

    let (st, _) = send(&app, get("/drafts/..secret")).await;
    assert_eq!(st, StatusCode::BAD_REQUEST);

    let articles = tmp.path().join("articles");
    fs::create_dir_all(&articles).unwrap();
    fs::write(articles.join("broken.yaml"), "title: [unclosed").unwrap();
    let (st, v) = send(&app, get("/drafts/broken")).await;
    assert_eq!(st, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(v["error"].as_str().unwrap().contains("RW-YAML-002"));
}
