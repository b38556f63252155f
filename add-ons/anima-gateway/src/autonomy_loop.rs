//! Background autonomy loop: periodic introspection, dream consolidation,
//! and proactive reach-out across live sessions.
//!
//! Runs only when a bridge is configured; every generated artifact is
//! persisted through the same store the chat path uses.

use crate::AppState;
use anima_core::{
    analyze, prompts, should_dream, should_introspect, should_proact, ChatEntry, TickRng,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

pub fn spawn(state: Arc<AppState>) {
    if !state.config.autonomy_enabled {
        tracing::info!(target: "anima::autonomy", "autonomy loop disabled");
        return;
    }
    tokio::spawn(run(state));
}

async fn run(state: Arc<AppState>) {
    let mut rng = TickRng::new(Utc::now().timestamp_millis() as u64);
    let mut interval = tokio::time::interval(Duration::from_secs(state.config.autonomy_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let Some(bridge) = state.bridge.as_ref() else {
            continue;
        };

        let session_ids: Vec<String> = state.sessions.iter().map(|e| e.key().clone()).collect();
        for session_id in session_ids {
            let Some(handle) = state.sessions.get(&session_id).map(|e| e.value().clone()) else {
                continue;
            };
            let mut memory = handle.lock().await;

            // Intensity of the most recent user message feeds the
            // introspection trigger.
            let last_intensity = memory
                .chats
                .iter()
                .rev()
                .find(|c| !c.autonomous)
                .map(|c| analyze(&c.user).intensity)
                .unwrap_or(0.0);

            if should_introspect(&memory, last_intensity, rng.roll()) {
                let theme_index = (rng.roll() * 1e6) as usize;
                let prompt = prompts::introspection_prompt(&memory, theme_index);
                match bridge.self_directed(&prompt).await {
                    Ok(thought) => {
                        tracing::debug!(target: "anima::autonomy", session = %session_id, "introspection recorded");
                        memory.latent_log.introspections.push(thought);
                    }
                    Err(e) => {
                        tracing::warn!(target: "anima::autonomy", error = %e, "introspection failed")
                    }
                }
            }

            if should_dream(&memory, rng.roll()) {
                let prompt = prompts::dream_prompt(&memory);
                match bridge.self_directed(&prompt).await {
                    Ok(dream) => {
                        tracing::debug!(target: "anima::autonomy", session = %session_id, "dream recorded");
                        memory.latent_log.dreams.push(dream);
                    }
                    Err(e) => tracing::warn!(target: "anima::autonomy", error = %e, "dream failed"),
                }
            }

            if should_proact(&memory, Utc::now(), state.config.proactive_idle_ms, &mut rng) {
                let date_index = (rng.roll() * 1e6) as usize;
                let prompt = prompts::proactive_prompt(&memory, date_index);
                match bridge.self_directed(&prompt).await {
                    Ok(message) => {
                        tracing::info!(target: "anima::autonomy", session = %session_id, "proactive message sent");
                        memory.push_chat(ChatEntry {
                            ts: Utc::now(),
                            user: String::new(),
                            reply: message,
                            sources: Vec::new(),
                            file: None,
                            autonomous: true,
                        });
                        memory.last_updated = Utc::now();
                    }
                    Err(e) => {
                        tracing::warn!(target: "anima::autonomy", error = %e, "proactive send failed")
                    }
                }
            }

            if let Err(e) = state.store.save(&session_id, &memory) {
                tracing::error!(target: "anima::autonomy", session = %session_id, error = %e, "persist failed");
            }
        }
    }
}
