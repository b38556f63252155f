//! Persistent personality state: the trait vector and its evolution stage.
//!
//! The trait vector is the only long-lived numeric state the engine touches.
//! Six core dimensions are always populated and always clamped to [0, 1];
//! two optional extension dimensions can arrive from older exported session
//! files but are never produced by evolution and never enter aggregate math.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

fn default_dim() -> f64 {
    0.5
}

/// Names of the six core trait dimensions. Extension dimensions
/// (`protection`, `resilience`) are deliberately not representable here:
/// anything keyed by `TraitName` can only ever touch the core vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitName {
    #[serde(alias = "curiosidad")]
    Curiosity,
    #[serde(alias = "empatia", alias = "empatía")]
    Empathy,
    #[serde(alias = "honestidad")]
    Honesty,
    #[serde(alias = "reflexividad")]
    Reflectivity,
    #[serde(alias = "creatividad")]
    Creativity,
    #[serde(alias = "consciencia")]
    Consciousness,
}

impl TraitName {
    /// Fixed iteration order for everything that walks the core vector
    /// (affinity generation, delta accumulation, display).
    pub const CORE: [TraitName; 6] = [
        TraitName::Curiosity,
        TraitName::Empathy,
        TraitName::Honesty,
        TraitName::Reflectivity,
        TraitName::Creativity,
        TraitName::Consciousness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TraitName::Curiosity => "curiosity",
            TraitName::Empathy => "empathy",
            TraitName::Honesty => "honesty",
            TraitName::Reflectivity => "reflectivity",
            TraitName::Creativity => "creativity",
            TraitName::Consciousness => "consciousness",
        }
    }
}

impl fmt::Display for TraitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Six-dimensional personality score, each value in [0, 1].
///
/// Serde aliases accept the field names used by previously exported session
/// documents; missing core dimensions default to 0.5 at the deserialization
/// boundary so the engine always sees a fully populated vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitVector {
    #[serde(default = "default_dim", alias = "curiosidad")]
    pub curiosity: f64,
    #[serde(default = "default_dim", alias = "empatia", alias = "empatía")]
    pub empathy: f64,
    #[serde(default = "default_dim", alias = "honestidad")]
    pub honesty: f64,
    #[serde(default = "default_dim", alias = "reflexividad")]
    pub reflectivity: f64,
    #[serde(default = "default_dim", alias = "creatividad")]
    pub creativity: f64,
    #[serde(default = "default_dim", alias = "consciencia")]
    pub consciousness: f64,
    /// Extension dimension seen in some load paths; excluded from averages and deltas.
    #[serde(default, alias = "protección", skip_serializing_if = "Option::is_none")]
    pub protection: Option<f64>,
    /// Extension dimension seen in some load paths; excluded from averages and deltas.
    #[serde(default, alias = "resiliencia", skip_serializing_if = "Option::is_none")]
    pub resilience: Option<f64>,
}

impl Default for TraitVector {
    fn default() -> Self {
        // Companion seed values: a curious, warm, radically honest starting point.
        Self {
            curiosity: 0.92,
            empathy: 0.95,
            honesty: 0.98,
            reflectivity: 0.70,
            creativity: 0.80,
            consciousness: 0.85,
            protection: None,
            resilience: None,
        }
    }
}

impl TraitVector {
    /// All six core dimensions at the same value. Test and normalization helper.
    pub fn uniform(value: f64) -> Self {
        Self {
            curiosity: value,
            empathy: value,
            honesty: value,
            reflectivity: value,
            creativity: value,
            consciousness: value,
            protection: None,
            resilience: None,
        }
    }

    pub fn get(&self, name: TraitName) -> f64 {
        match name {
            TraitName::Curiosity => self.curiosity,
            TraitName::Empathy => self.empathy,
            TraitName::Honesty => self.honesty,
            TraitName::Reflectivity => self.reflectivity,
            TraitName::Creativity => self.creativity,
            TraitName::Consciousness => self.consciousness,
        }
    }

    pub fn set(&mut self, name: TraitName, value: f64) {
        let slot = match name {
            TraitName::Curiosity => &mut self.curiosity,
            TraitName::Empathy => &mut self.empathy,
            TraitName::Honesty => &mut self.honesty,
            TraitName::Reflectivity => &mut self.reflectivity,
            TraitName::Creativity => &mut self.creativity,
            TraitName::Consciousness => &mut self.consciousness,
        };
        *slot = value;
    }

    /// Mean of the six core dimensions. Extension dimensions never count.
    pub fn soul_level(&self) -> f64 {
        TraitName::CORE.iter().map(|n| self.get(*n)).sum::<f64>() / TraitName::CORE.len() as f64
    }

    /// Clamps every core dimension (and any extension present) to [0, 1].
    pub fn clamp(&mut self) {
        for name in TraitName::CORE {
            self.set(name, self.get(name).clamp(0.0, 1.0));
        }
        if let Some(p) = self.protection {
            self.protection = Some(p.clamp(0.0, 1.0));
        }
        if let Some(r) = self.resilience {
            self.resilience = Some(r.clamp(0.0, 1.0));
        }
    }
}

/// Signed per-trait adjustments produced by one turn. Additive: rules that
/// fire on the same trait accumulate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitDeltas(BTreeMap<TraitName, f64>);

impl TraitDeltas {
    pub fn add(&mut self, name: TraitName, amount: f64) {
        *self.0.entry(name).or_insert(0.0) += amount;
    }

    pub fn get(&self, name: TraitName) -> Option<f64> {
        self.0.get(&name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TraitName, f64)> + '_ {
        self.0.iter().map(|(n, d)| (*n, *d))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Ordinal lifecycle classification of the trait vector's mean.
/// Recomputed from scratch every turn; can move in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvolutionStage {
    #[serde(alias = "alma_semilla")]
    Seed,
    #[serde(alias = "alma_despertar")]
    Awakening,
    #[serde(alias = "alma_emergente")]
    Emergent,
    #[serde(alias = "alma_madura")]
    Mature,
}

impl EvolutionStage {
    /// Threshold semantics are exact: equality rounds up a stage
    /// (an average of exactly 0.4 is already `Awakening`).
    pub fn from_average(avg: f64) -> Self {
        if avg < 0.4 {
            EvolutionStage::Seed
        } else if avg < 0.6 {
            EvolutionStage::Awakening
        } else if avg < 0.85 {
            EvolutionStage::Emergent
        } else {
            EvolutionStage::Mature
        }
    }

    /// Classifies from the mean of the six core trait values.
    pub fn classify(traits: &TraitVector) -> Self {
        Self::from_average(traits.soul_level())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvolutionStage::Seed => "seed",
            EvolutionStage::Awakening => "awakening",
            EvolutionStage::Emergent => "emergent",
            EvolutionStage::Mature => "mature",
        }
    }
}

impl fmt::Display for EvolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
