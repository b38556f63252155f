//! The affective state engine: a pure, deterministic per-turn pipeline.
//!
//! text → cognitive signature → symbolic resonance → trait deltas → new
//! trait vector → evolution stage. The engine holds no session state;
//! every call reads the session memory it is given and returns a fresh
//! outcome for the host to record.

pub mod affinity;
pub mod analyzer;
pub mod evolution;
pub mod resonance;

pub use affinity::{AffinityMatrix, Stimulus};
pub use analyzer::{
    analyze, CognitiveSignature, Emotion, Theme, VulnerabilityAssessment, VulnerabilityLevel,
};
pub use evolution::{affinity_deltas, apply, rule_table_deltas};
pub use resonance::{propagate, Attractor, ResonanceState, SymbolicResonance};

use crate::memory::SessionMemory;
use crate::state::{EvolutionStage, TraitVector};
use serde::{Deserialize, Serialize};

/// Which delta policy a session runs. One policy per session; never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionPolicy {
    /// Fixed additive rule table (default).
    #[default]
    RuleTable,
    /// Continuous deltas modulated by the session's seeded affinity matrix.
    AffinityWeighted,
}

impl EvolutionPolicy {
    pub fn from_str(s: &str) -> Self {
        match s.trim() {
            s if s.eq_ignore_ascii_case("affinity") => EvolutionPolicy::AffinityWeighted,
            s if s.eq_ignore_ascii_case("affinity_weighted") => EvolutionPolicy::AffinityWeighted,
            _ => EvolutionPolicy::RuleTable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvolutionPolicy::RuleTable => "rule_table",
            EvolutionPolicy::AffinityWeighted => "affinity_weighted",
        }
    }
}

/// Everything one turn produces: the analysis artifacts for display and
/// prompt construction, plus the replacement trait vector and stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub cognitive: CognitiveSignature,
    pub resonance: ResonanceState,
    pub traits: TraitVector,
    pub stage: EvolutionStage,
}

/// Per-turn pipeline orchestrator. Stateless apart from the chosen policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    policy: EvolutionPolicy,
}

impl Engine {
    pub fn new(policy: EvolutionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> EvolutionPolicy {
        self.policy
    }

    /// Runs one full turn against the given session memory. Pure: the
    /// memory is only read; the caller decides what to record.
    pub fn process_turn(&self, text: &str, memory: &SessionMemory) -> TurnOutcome {
        let cognitive = analyze(text);
        let resonance = propagate(cognitive.primary_emotion, cognitive.intensity);

        let deltas = match self.policy {
            EvolutionPolicy::RuleTable => rule_table_deltas(&cognitive, &resonance),
            EvolutionPolicy::AffinityWeighted => affinity_deltas(
                &cognitive,
                &memory.traits,
                &memory.resonance_field.affinity_matrix,
            ),
        };
        let traits = apply(&memory.traits, &deltas);
        let stage = EvolutionStage::classify(&traits);

        tracing::debug!(
            target: "anima::engine",
            emotion = ?cognitive.primary_emotion,
            intensity = cognitive.intensity,
            attractor = resonance.attractor.as_str(),
            stage = stage.as_str(),
            deltas = deltas.len(),
            "turn processed"
        );

        TurnOutcome {
            cognitive,
            resonance,
            traits,
            stage,
        }
    }

    /// Whether this turn warrants supplementary reflective processing
    /// (the host requests an extra reflection generation when true).
    pub fn is_significant_turn(cognitive: &CognitiveSignature, resonance: &ResonanceState) -> bool {
        let high_intensity = cognitive.intensity > 0.35;
        let deep_themes = cognitive.has_theme(Theme::Reflection)
            || cognitive.has_theme(Theme::Growth)
            || cognitive.has_theme(Theme::Struggle);
        let vulnerable = cognitive.vulnerability.detected;
        let high_force = resonance.force > 0.5;

        high_intensity || deep_themes || vulnerable || high_force
    }
}
