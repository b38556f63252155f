//! Session lifecycle: state view, reset, export, import.
//!
//! Export/import move the raw JSON document the user owns; import
//! normalizes at the boundary (missing trait dimensions, absent affinity
//! matrix, stale stage) before the session ever reaches the engine.

use super::ApiError;
use crate::AppState;
use anima_core::{EvolutionStage, SessionMemory, TraitVector};
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub companion: String,
    pub traits: TraitVector,
    pub stage: EvolutionStage,
    pub soul_level: f64,
    pub interaction_count: u64,
    pub chat_entries: usize,
    pub reflections: usize,
    pub affinity_seed: u64,
    pub last_updated: DateTime<Utc>,
}

fn view(session_id: &str, memory: &SessionMemory) -> SessionView {
    SessionView {
        session_id: session_id.to_string(),
        companion: memory.identity.name.clone(),
        traits: memory.traits.clone(),
        stage: memory.stage,
        soul_level: memory.traits.soul_level(),
        interaction_count: memory.interaction_count,
        chat_entries: memory.chats.len(),
        reflections: memory.reflections.len(),
        affinity_seed: memory.resonance_field.seed,
        last_updated: memory.last_updated,
    }
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    // Prefer the live handle; fall back to the store without resurrecting.
    // Clone out of the map before locking so no shard guard is held
    // across the await.
    let live = state.sessions.get(&id).map(|h| h.clone());
    if let Some(handle) = live {
        let memory = handle.lock().await;
        return Ok(Json(view(&id, &memory)));
    }
    match state.store.load(&id)? {
        Some(memory) => Ok(Json(view(&id, &memory))),
        None => Err(ApiError::NotFound(id)),
    }
}

/// Full reset: re-runs the session initializer. Fresh default traits,
/// empty history, fresh affinity seed — nothing of the old record survives.
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.session_handle(&id)?;
    let mut memory = handle.lock().await;
    *memory = SessionMemory::fresh();
    state.store.save(&id, &memory)?;
    tracing::info!(target: "anima::gateway", session = %id, "session reset");
    Ok(Json(view(&id, &memory)))
}

pub async fn export_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    // Clone the live handle out first: the fallback path takes a shard
    // write lock, which must never run under the read guard.
    let live = state.sessions.get(&id).map(|h| h.clone());
    let handle = match live {
        Some(handle) => handle,
        None => match state.store.load(&id)? {
            Some(_) => state.session_handle(&id)?,
            None => return Err(ApiError::NotFound(id)),
        },
    };
    let memory = handle.lock().await;
    let document = memory.to_json()?;
    Ok((
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        document,
    ))
}

#[derive(Debug, serde::Deserialize)]
pub struct RememberRequest {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub important_date: Option<anima_core::ImportantDate>,
}

/// Tool-call landing point: collaborators append identity facts to the
/// session record outside the engine's control.
pub async fn remember(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RememberRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.session_handle(&id)?;
    let mut memory = handle.lock().await;
    if let Some(name) = req.user_name {
        memory.register_user_name(name);
    }
    if let Some(date) = req.important_date {
        memory.register_important_date(date.label, date.date);
    }
    state.store.save(&id, &memory)?;
    Ok(Json(view(&id, &memory)))
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub session_id: String,
    pub stage: EvolutionStage,
}

/// Accepts a previously exported document, normalizes it, and registers it
/// under a fresh session id.
pub async fn import_session(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ImportResponse>, ApiError> {
    let fallback_seed = Utc::now().timestamp_millis() as u64;
    let memory = SessionMemory::from_json(&body, fallback_seed)?;
    let session_id = Uuid::new_v4().to_string();
    state.store.save(&session_id, &memory)?;
    let stage = memory.stage;
    state
        .sessions
        .insert(session_id.clone(), Arc::new(tokio::sync::Mutex::new(memory)));
    tracing::info!(target: "anima::gateway", session = %session_id, "session imported");
    Ok(Json(ImportResponse { session_id, stage }))
}
