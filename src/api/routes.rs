//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::Agent;
use crate::config::Config;
use crate::dataset::{Dataset, Host, HostOverview};

use super::types::*;

const DATASET_SUMMARY_QUESTION: &str = "Please generate a detailed summary of the entire host scan dataset. Include statistical analysis, patterns, feature relationships, and key insights.";

/// Shared application state.
pub struct AppState {
    pub dataset: Arc<Dataset>,
    /// The agent answering questions; stateless between requests
    pub agent: Agent,
}

type ApiError = (StatusCode, String);

/// Build the router with all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/hosts", get(list_hosts))
        .route("/hosts/:ip", get(get_host))
        .route("/qa-global", post(qa_global))
        .route("/summarize-dataset", get(summarize_dataset))
        .route("/summarize-host/:ip", get(summarize_host))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config, dataset: Arc<Dataset>) -> anyhow::Result<()> {
    let agent = Agent::new(&config, Arc::clone(&dataset));
    let state = Arc::new(AppState { dataset, agent });

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for SIGINT/SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.agent.model().to_string(),
        hosts: state.dataset.len(),
        max_rounds: state.agent.max_rounds(),
    })
}

/// GET /hosts - Overview of every host.
async fn list_hosts(State(state): State<Arc<AppState>>) -> Json<Vec<HostOverview>> {
    Json(state.dataset.overview())
}

/// GET /hosts/:ip - Full host record.
async fn get_host(
    State(state): State<Arc<AppState>>,
    Path(ip): Path<String>,
) -> Result<Json<Host>, ApiError> {
    state
        .dataset
        .lookup(&ip)
        .cloned()
        .map(Json)
        .ok_or_else(host_not_found)
}

/// POST /qa-global - Answer a question with the agent.
async fn qa_global(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QaRequest>,
) -> Result<Json<QaResponse>, ApiError> {
    let question = req
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Question is required".to_string()))?;

    let answer = ask_agent(&state, &question).await?;
    Ok(Json(QaResponse { question, answer }))
}

/// GET /summarize-dataset - Agent summary of the whole dataset.
async fn summarize_dataset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DatasetSummaryResponse>, ApiError> {
    let summary = ask_agent(&state, DATASET_SUMMARY_QUESTION).await?;
    Ok(Json(DatasetSummaryResponse { summary }))
}

/// GET /summarize-host/:ip - Agent summary of one host.
async fn summarize_host(
    State(state): State<Arc<AppState>>,
    Path(ip): Path<String>,
) -> Result<Json<HostSummaryResponse>, ApiError> {
    if !state.dataset.contains(&ip) {
        return Err(host_not_found());
    }

    let question = format!(
        "Please generate a detailed, professional summary of the host with IP {}. Include risk, services, vulnerabilities, malware, and any notable patterns.",
        ip
    );
    let summary = ask_agent(&state, &question).await?;
    Ok(Json(HostSummaryResponse { ip, summary }))
}

/// Run the agent and strip the reply down to its final answer.
async fn ask_agent(state: &AppState, question: &str) -> Result<String, ApiError> {
    match state.agent.run(question).await {
        Ok(run) => Ok(run.final_answer()),
        Err(e) => {
            tracing::error!("Agent run failed: {:#}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Agent failed: {:#}", e),
            ))
        }
    }
}

fn host_not_found() -> ApiError {
    (StatusCode::NOT_FOUND, "Host not found".to_string())
}
