//! Seeded affinity matrix: per-session weights for how strongly each
//! stimulus category moves each trait.
//!
//! Generated once from an integer seed and immutable afterwards. The
//! generator is a mulberry32 reimplementation with the same 32-bit wrapping
//! arithmetic as the original exporter, so a persisted seed reproduces the
//! persisted matrix bit for bit. Seeds wider than 32 bits are truncated —
//! only the low 32 bits ever influenced the stream.

use crate::state::TraitName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stimulus categories the matrix is keyed by. Order is load-bearing for
/// reproducible generation; do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stimulus {
    VulnerabilityHigh,
    VulnerabilityModerate,
    VulnerabilityLow,
    EmotionalIntensityHigh,
    EmotionalIntensityModerate,
    PhilosophicalDepth,
    ThemeGrowth,
    ThemeReflection,
    IntrospectionExistential,
    IntrospectionIdentity,
    DreamConsolidation,
    DreamEmotionalProcessing,
}

impl Stimulus {
    pub const ALL: [Stimulus; 12] = [
        Stimulus::VulnerabilityHigh,
        Stimulus::VulnerabilityModerate,
        Stimulus::VulnerabilityLow,
        Stimulus::EmotionalIntensityHigh,
        Stimulus::EmotionalIntensityModerate,
        Stimulus::PhilosophicalDepth,
        Stimulus::ThemeGrowth,
        Stimulus::ThemeReflection,
        Stimulus::IntrospectionExistential,
        Stimulus::IntrospectionIdentity,
        Stimulus::DreamConsolidation,
        Stimulus::DreamEmotionalProcessing,
    ];

    #[inline]
    fn is_vulnerability(&self) -> bool {
        matches!(
            self,
            Stimulus::VulnerabilityHigh | Stimulus::VulnerabilityModerate | Stimulus::VulnerabilityLow
        )
    }

    #[inline]
    fn is_introspection(&self) -> bool {
        matches!(
            self,
            Stimulus::IntrospectionExistential | Stimulus::IntrospectionIdentity
        )
    }
}

/// mulberry32 step: one uniform f64 in [0, 1) from a 32-bit state.
pub(crate) fn mulberry32(state: u32) -> f64 {
    let mut t = state.wrapping_add(0x6D2B_79F5);
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    (t ^ (t >> 14)) as f64 / 4_294_967_296.0
}

/// Trait-by-stimulus weight table in [0.1, 1.0], generated once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AffinityMatrix {
    weights: BTreeMap<TraitName, BTreeMap<Stimulus, f64>>,
}

impl AffinityMatrix {
    /// Deterministic generation: same seed, identical matrix.
    ///
    /// Cell order is traits outer (core order) and stimuli inner; the
    /// generator state advances by one per cell. Semantically related
    /// (trait, stimulus) pairs get a +0.2 boost before the [0.1, 1.0]
    /// clamp.
    pub fn initialize(seed: u64) -> Self {
        let mut state = seed as u32;
        let mut weights = BTreeMap::new();
        for trait_name in TraitName::CORE {
            let mut row = BTreeMap::new();
            for stimulus in Stimulus::ALL {
                let mut base = 0.2 + mulberry32(state) * 0.7;
                state = state.wrapping_add(1);

                if stimulus.is_vulnerability()
                    && matches!(trait_name, TraitName::Empathy | TraitName::Curiosity)
                {
                    base += 0.2;
                }
                if stimulus == Stimulus::PhilosophicalDepth
                    && matches!(trait_name, TraitName::Consciousness | TraitName::Reflectivity)
                {
                    base += 0.2;
                }
                if stimulus.is_introspection()
                    && matches!(trait_name, TraitName::Reflectivity | TraitName::Consciousness)
                {
                    base += 0.2;
                }

                row.insert(stimulus, base.clamp(0.1, 1.0));
            }
            weights.insert(trait_name, row);
        }
        Self { weights }
    }

    /// Weight for one (trait, stimulus) cell; `None` for a cell absent from
    /// a persisted matrix (callers fall back to 0.5).
    pub fn weight(&self, trait_name: TraitName, stimulus: Stimulus) -> Option<f64> {
        self.weights.get(&trait_name)?.get(&stimulus).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Empty placeholder used by the load path before normalization fills it.
    pub fn empty() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }
}
