use std::sync::Arc;

use anyhow::Result;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::dashboard::Dashboard;
use crate::fetch_stats::FetchSnapshot;
use crate::filter::Selection;
use crate::view::ViewSpec;

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ChainsResponse {
    chains: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn chains(
    State(state): State<AppState>,
) -> Result<Json<ChainsResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.dashboard.chains().await {
        Ok(chains) => Ok(Json(ChainsResponse { chains })),
        Err(unavailable) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: unavailable.notice(),
            }),
        )),
    }
}

/// One `chains` parameter per chain. Absent means every chain; `chains=` alone means none.
async fn view(State(state): State<AppState>, RawQuery(query): RawQuery) -> Json<ViewSpec> {
    let selection = query.as_deref().and_then(Selection::from_query);
    Json(state.dashboard.view(selection).await)
}

async fn fetch_stats(State(state): State<AppState>) -> Json<FetchSnapshot> {
    Json(state.dashboard.fetch_stats())
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/chains", get(chains))
        .route("/api/view", get(view))
        .route("/stats/fetch", get(fetch_stats))
        .with_state(state)
}

pub async fn run_http_server(addr: &str, dashboard: Dashboard) -> Result<()> {
    let app = app_router(AppState {
        dashboard: Arc::new(dashboard),
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
