//! HTTP pull endpoints and the `/ws` push surface.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use radix_types::{DatasetFormat, TrackSummary};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::error::ApiError;
use crate::orchestrator::SharedOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: SharedOrchestrator,
    /// Broadcasts one pre-rendered, rounded JSON frame per tick — rendered
    /// once in the tick loop rather than per subscriber.
    pub updates: Arc<broadcast::Sender<Arc<str>>>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(get_status))
        .route("/api/sensors", get(list_sensors))
        .route("/api/tracks", get(list_tracks))
        .route("/api/detections", get(recent_detections))
        .route("/api/datasets", get(list_datasets).post(create_dataset))
        .route("/api/datasets/:id/export", get(export_dataset))
        .route("/ws", get(ws_handler))
        .with_state(state)
        .layer(cors)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.orchestrator.read().await.status();
    Json(status)
}

async fn list_sensors(State(state): State<AppState>) -> impl IntoResponse {
    let orchestrator = state.orchestrator.read().await;
    Json(orchestrator.sensor_info().to_vec())
}

async fn list_tracks(State(state): State<AppState>) -> impl IntoResponse {
    let tracks = state.orchestrator.read().await.active_tracks();
    let summaries: Vec<TrackSummary> = tracks.iter().map(TrackSummary::from).collect();
    Json(summaries)
}

#[derive(Debug, Deserialize)]
struct DetectionsQuery {
    limit: Option<usize>,
}

async fn recent_detections(
    State(state): State<AppState>,
    Query(query): Query<DetectionsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(100);
    let detections = state.orchestrator.read().await.recent_detections(limit);
    Json(detections)
}

async fn list_datasets(State(state): State<AppState>) -> impl IntoResponse {
    let datasets = state.orchestrator.read().await.extractor().list_datasets();
    Json(datasets)
}

#[derive(Debug, Deserialize)]
struct CreateDatasetRequest {
    name: String,
    #[serde(default)]
    description: String,
    format: DatasetFormat,
}

async fn create_dataset(
    State(state): State<AppState>,
    Json(req): Json<CreateDatasetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut orchestrator = state.orchestrator.write().await;
    let detections = orchestrator.all_detections();
    let tracks = orchestrator.all_tracks();
    let descriptor = orchestrator.extractor_mut().create_dataset(
        &req.name,
        &req.description,
        req.format,
        &detections,
        &tracks,
    )?;
    Ok(Json(descriptor))
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

async fn export_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orchestrator = state.orchestrator.read().await;
    let payload = orchestrator
        .extractor()
        .export_dataset(&id, query.format.as_deref())?;
    Ok(Json(payload))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_ws(socket, state.updates))
}

async fn handle_ws(mut socket: WebSocket, updates: Arc<broadcast::Sender<Arc<str>>>) {
    let mut rx = updates.subscribe();
    loop {
        match rx.recv().await {
            Ok(payload) => {
                if socket.send(Message::Text(payload.to_string())).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "ws subscriber fell behind, dropping missed frames");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
