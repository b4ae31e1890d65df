// src/api.rs
//! HTTP surface for the studio UI.
//!
//! - `GET  /health`
//! - `GET  /equations`                    registry + load warning
//! - `POST /signals`                      draft JSON → signal vector
//! - `POST /score`                        `{draft, equation?}` → report + updated draft
//! - `GET  /drafts`                       YAML drafts on disk
//! - `GET  /drafts/{name}`                one parsed draft
//! - `POST /drafts/{name}/score?equation=` score a draft on disk and save `meta` back

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::analyze::{
    extract_signals, score_draft, Equation, HotReloadEquations, ScoreReport, SignalVector,
};
use crate::config::StudioConfig;
use crate::draft::{DraftRecord, DraftStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StudioConfig>,
    pub equations: Arc<HotReloadEquations>,
    pub drafts: DraftStore,
}

impl AppState {
    pub fn new(config: StudioConfig) -> Self {
        let equations = HotReloadEquations::new(Some(&config.paths.equations));
        let drafts = DraftStore::new(config.paths.drafts.clone());
        Self {
            config: Arc::new(config),
            equations: Arc::new(equations),
            drafts,
        }
    }

    /// Config from `config/studio.toml` + env overrides.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(StudioConfig::load()?))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/equations", get(list_equations))
        .route("/signals", post(signals))
        .route("/score", post(score))
        .route("/drafts", get(list_drafts))
        .route("/drafts/{name}", get(get_draft))
        .route("/drafts/{name}/score", post(score_stored_draft))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/* ----------------------------
Errors
---------------------------- */

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unprocessable(String),
    Internal(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m),
            ApiError::Internal(e) => {
                error!(error = ?e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(ErrorBody { error: msg })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

/* ----------------------------
Handlers
---------------------------- */

#[derive(Serialize)]
struct EquationsOut {
    equations: Vec<Equation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

async fn list_equations(State(state): State<AppState>) -> Json<EquationsOut> {
    let snap = state.equations.current();
    Json(EquationsOut {
        equations: snap.registry.iter().cloned().collect(),
        warning: snap.warning,
    })
}

async fn signals(State(state): State<AppState>, Json(draft): Json<DraftRecord>) -> Json<SignalVector> {
    Json(extract_signals(&draft, &state.config.signals))
}

#[derive(Deserialize)]
struct ScoreReq {
    #[serde(default)]
    draft: DraftRecord,
    #[serde(default)]
    equation: Option<String>,
}

#[derive(Serialize)]
struct ScoreOut {
    report: ScoreReport,
    percent: u32,
    draft: DraftRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

async fn score(State(state): State<AppState>, Json(req): Json<ScoreReq>) -> Json<ScoreOut> {
    let snap = state.equations.current();
    let mut draft = req.draft;
    let report = score_draft(
        &mut draft,
        req.equation.as_deref(),
        &snap.registry,
        &state.config,
    );
    Json(ScoreOut {
        percent: report.percent(),
        report,
        draft,
        warning: snap.warning,
    })
}

async fn list_drafts(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.drafts.list()?))
}

// Name → existing path, or the matching 400/404.
fn locate(store: &DraftStore, name: &str) -> Result<(), ApiError> {
    let path = store
        .resolve(name)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid draft name `{name}`")))?;
    if !path.exists() {
        return Err(ApiError::NotFound(format!("draft `{name}` not found")));
    }
    Ok(())
}

async fn get_draft(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DraftRecord>, ApiError> {
    locate(&state.drafts, &name)?;
    let draft = state
        .drafts
        .load(&name)
        .map_err(|e| ApiError::Unprocessable(e.to_string()))?;
    Ok(Json(draft))
}

#[derive(Deserialize)]
struct EquationQuery {
    equation: Option<String>,
}

#[derive(Serialize)]
struct DraftScoreOut {
    name: String,
    report: ScoreReport,
    percent: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

async fn score_stored_draft(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<EquationQuery>,
) -> Result<Json<DraftScoreOut>, ApiError> {
    locate(&state.drafts, &name)?;
    let mut draft = state
        .drafts
        .load(&name)
        .map_err(|e| ApiError::Unprocessable(e.to_string()))?;

    let snap = state.equations.current();
    let report = score_draft(&mut draft, q.equation.as_deref(), &snap.registry, &state.config);
    let path = state.drafts.save(&name, &draft)?;
    info!(path = %path.display(), equation = %report.equation, "draft meta updated");

    Ok(Json(DraftScoreOut {
        name,
        percent: report.percent(),
        report,
        warning: snap.warning,
    }))
}
