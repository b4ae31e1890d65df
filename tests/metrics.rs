// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tower::ServiceExt;

// Build the full in-process app (API + /metrics) against a scratch dir.
async fn build_app(root: &Path) -> Router {
    let cfg = root.join("studio.toml");
    fs::write(&cfg, "[storage]\nround_decimals = 4\n").unwrap();
    fs::write(
        root.join("equations.yaml"),
        "equations:\n  calm:\n    weights: { sentiment: 1.0 }\n",
    )
    .unwrap();

    std::env::set_var("RIPPLE_CONFIG_PATH", &cfg);
    std::env::set_var("RIPPLE_EQUATIONS_PATH", root.join("equations.yaml"));
    std::env::set_var("RIPPLE_DRAFTS_DIR", root.join("articles"));
    std::env::remove_var("RIPPLE_SENTIMENT_MODE");

    ripplewriter_studio::app()
        .await
        .expect("app() should build Router in tests")
}

async fn scrape(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
#[serial]
async fn scoring_shows_up_in_metrics() {
    let tmp = tempfile::tempdir().unwrap();
    let app = build_app(tmp.path()).await;

    let r = app
        .clone()
        .oneshot(
            Request::post("/score")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"draft":{"title":"t"},"equation":"calm"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::OK);

    let text = scrape(&app).await;
    for needle in ["ripple_scores_computed_total", "ripple_score_value"] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
    assert!(text.contains("equation=\"calm\""), "no equation label\n{text}");
}

#[tokio::test]
#[serial]
async fn preview_endpoints_do_not_count_scores() {
    let tmp = tempfile::tempdir().unwrap();
    let app = build_app(tmp.path()).await;

    let r = app
        .clone()
        .oneshot(
            Request::post("/signals")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title":"preview-only"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::OK);

    // /equations refreshes the registry gauge
    let r = app
        .clone()
        .oneshot(Request::get("/equations").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::OK);

    let text = scrape(&app).await;
    assert!(!text.contains("preview-only"));
    assert!(text.contains("ripple_equations_loaded"), "no gauge\n{text}");
}
