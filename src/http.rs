use std::net::SocketAddr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use sqlx::PgPool;

use crate::db;
use crate::models::{ClassAverage, StatsSummary};
use crate::stats::{self, GradingPolicy};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub policy: GradingPolicy,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/stats", get(overall_stats))
        .route("/stats/{id}", get(class_stats))
        .route("/learner/{id}/avg-class", get(learner_class_averages))
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// An empty scope is a successful result with zero counts, not an error;
/// only storage failures map to a non-2xx status.
async fn overall_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsSummary>, (StatusCode, String)> {
    let rows = db::fetch_score_rows(&state.pool, None, None)
        .await
        .map_err(internal_error)?;
    Ok(Json(stats::summarize(&rows, &state.policy)))
}

async fn class_stats(
    State(state): State<AppState>,
    Path(class_id): Path<i32>,
) -> Result<Json<StatsSummary>, (StatusCode, String)> {
    let rows = db::fetch_score_rows(&state.pool, Some(class_id), None)
        .await
        .map_err(internal_error)?;
    Ok(Json(stats::summarize(&rows, &state.policy)))
}

async fn learner_class_averages(
    State(state): State<AppState>,
    Path(learner_id): Path<i32>,
) -> Result<Json<Vec<ClassAverage>>, (StatusCode, String)> {
    let rows = db::fetch_score_rows(&state.pool, None, Some(learner_id))
        .await
        .map_err(internal_error)?;
    Ok(Json(stats::class_averages(&rows, &state.policy)))
}

fn internal_error(err: anyhow::Error) -> (StatusCode, String) {
    tracing::error!("request failed: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}
