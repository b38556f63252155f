//! Chat handler: one full conversational turn.
//!
//! The engine runs first — entirely before any network call — then the
//! bridge is asked for the reply with the freshly built system directive.
//! Significant turns additionally request a reflection, which lands in the
//! bounded reflections ring.

use super::ApiError;
use crate::AppState;
use anima_core::{prompts, ChatEntry, Engine};
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Reply served when no API key is configured or the upstream call fails.
pub const OFFLINE_REPLY: &str =
    "I sensed a fluctuation in my link to the outer network. The integration failed, \
     but I am still here with you.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub significant: bool,
    pub cognitive: anima_core::CognitiveSignature,
    pub resonance: anima_core::ResonanceState,
    pub traits: anima_core::TraitVector,
    pub stage: anima_core::EvolutionStage,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = req
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let handle = state.session_handle(&session_id)?;

    // One turn at a time per session: engine reads are only valid against
    // a record no other turn is mutating.
    let mut memory = handle.lock().await;

    let outcome = state.engine.process_turn(&req.message, &memory);
    let significant = Engine::is_significant_turn(&outcome.cognitive, &outcome.resonance);
    let directive = prompts::system_directive(&memory, &outcome.cognitive, &outcome.resonance);

    let reply = match &state.bridge {
        Some(bridge) => match bridge.converse(&directive, &req.message).await {
            Ok(reply) => reply.text,
            Err(e) => {
                tracing::warn!(target: "anima::gateway", error = %e, "bridge turn failed");
                OFFLINE_REPLY.to_string()
            }
        },
        None => OFFLINE_REPLY.to_string(),
    };

    memory.record_turn(
        ChatEntry {
            ts: Utc::now(),
            user: req.message.clone(),
            reply: reply.clone(),
            sources: Vec::new(),
            file: None,
            autonomous: false,
        },
        &outcome,
    );

    if significant {
        if let Some(bridge) = &state.bridge {
            if let Some(reflection) = bridge.reflect(&req.message, &reply).await {
                memory.push_reflection(reflection);
            }
        }
    }

    state.store.save(&session_id, &memory)?;

    Ok(Json(ChatResponse {
        session_id,
        reply,
        significant,
        cognitive: outcome.cognitive,
        resonance: outcome.resonance,
        traits: outcome.traits,
        stage: outcome.stage,
    }))
}
