//! anima-core: companion core library.
//!
//! The heart is the affective state engine — a pure, deterministic per-turn
//! pipeline from raw user text to an updated personality state. Around it:
//! session memory with its sled-backed store, prompt construction, autonomy
//! triggers, and the OpenRouter bridge. The gateway add-on wires these to
//! HTTP; nothing in this crate performs I/O except `memory::SessionStore`
//! and `bridge::CompanionBridge`.

mod autonomy;
mod bridge;
mod config;
pub mod engine;
mod memory;
pub mod prompts;
mod state;

// Engine: the per-turn pipeline and its artifacts.
pub use engine::{
    affinity_deltas, analyze, apply, propagate, rule_table_deltas, AffinityMatrix, Attractor,
    CognitiveSignature, Emotion, Engine, EvolutionPolicy, ResonanceState, Stimulus,
    SymbolicResonance, Theme, TurnOutcome, VulnerabilityAssessment, VulnerabilityLevel,
};

// Persistent state types.
pub use state::{EvolutionStage, TraitDeltas, TraitName, TraitVector};

// Session memory and its store.
pub use memory::{
    ChatEntry, FileMeta, Identity, ImportantDate, LatentLog, MemoryError, ResonanceField,
    SemanticMemory, SessionMemory, SessionStore, SourceRef, StoreError, CHAT_HISTORY_CAP,
    REFLECTIONS_CAP,
};

// Autonomy triggers (introspection / dream / proactive reach-out).
pub use autonomy::{should_dream, should_introspect, should_proact, TickRng};

// Configuration.
pub use config::{AnimaConfig, UserConfig};

// LLM bridge (the only network boundary).
pub use bridge::{BridgeError, BridgeReply, CompanionBridge};
