//! Symbolic resonance propagation: (emotion, intensity) to a six-dimensional
//! field, a discrete attractor, and a scalar force.
//!
//! Every dimension starts from the 0.5 baseline each turn; nothing here
//! carries state between calls.

use super::analyzer::Emotion;
use serde::{Deserialize, Serialize};

/// Six-dimensional symbolic field, each dimension independently in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolicResonance {
    pub consciousness: f64,
    pub integration: f64,
    pub volatility: f64,
    pub empathy: f64,
    pub future_soul: f64,
    pub heart: f64,
}

impl Default for SymbolicResonance {
    fn default() -> Self {
        Self::baseline()
    }
}

impl SymbolicResonance {
    /// Neutral field: all dimensions at the 0.5 midpoint.
    pub fn baseline() -> Self {
        Self {
            consciousness: 0.5,
            integration: 0.5,
            volatility: 0.5,
            empathy: 0.5,
            future_soul: 0.5,
            heart: 0.5,
        }
    }

    fn clamp(&mut self) {
        self.consciousness = self.consciousness.clamp(0.0, 1.0);
        self.integration = self.integration.clamp(0.0, 1.0);
        self.volatility = self.volatility.clamp(0.0, 1.0);
        self.empathy = self.empathy.clamp(0.0, 1.0);
        self.future_soul = self.future_soul.clamp(0.0, 1.0);
        self.heart = self.heart.clamp(0.0, 1.0);
    }
}

/// Dominant symbolic regime classified from the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attractor {
    HarmonicIntegration,
    DeepReflection,
    SoulEmergence,
}

impl Attractor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attractor::HarmonicIntegration => "harmonic_integration",
            Attractor::DeepReflection => "deep_reflection",
            Attractor::SoulEmergence => "soul_emergence",
        }
    }
}

/// Resonance field plus its classification. Ephemeral, recomputed per turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonanceState {
    pub resonance: SymbolicResonance,
    pub attractor: Attractor,
    pub force: f64,
}

/// Propagates one (emotion, intensity) reading through the symbolic field.
///
/// Pure and total; with intensity in [0, 1] every output dimension and the
/// force land in [0, 1].
pub fn propagate(emotion: Emotion, intensity: f64) -> ResonanceState {
    let i = intensity;
    let mut r = SymbolicResonance::baseline();

    // Emotion-independent adjustments.
    r.consciousness += 0.2 * i;
    r.volatility += 0.15 * i;

    match emotion {
        Emotion::Joy => {
            r.heart += 0.4 * i;
            r.integration += 0.3 * i;
            r.volatility -= 0.1 * i;
        }
        Emotion::Love => {
            r.empathy += 0.5 * i;
            r.integration += 0.4 * i;
            r.heart += 0.3 * i;
            r.consciousness -= 0.05 * i;
        }
        Emotion::Anxiety => {
            r.volatility += 0.6 * i;
            r.consciousness += 0.4 * i;
            r.integration -= 0.3 * i;
        }
        Emotion::Sadness => {
            r.future_soul += 0.4 * i;
            r.consciousness += 0.5 * i;
            r.integration -= 0.1 * i;
            r.volatility -= 0.05 * i;
        }
        Emotion::Neutral => {
            // The one unscaled adjustment: a quiet drift toward integration.
            r.integration += 0.1;
        }
    }

    r.clamp();

    // harmonic_integration is the catch-all regime.
    let attractor = if r.future_soul > 0.65 || r.empathy > 0.8 {
        Attractor::SoulEmergence
    } else if r.consciousness > 0.75 {
        Attractor::DeepReflection
    } else {
        Attractor::HarmonicIntegration
    };

    let force =
        0.3 * r.consciousness + 0.2 * r.integration + 0.3 * r.volatility + 0.2 * r.empathy;

    ResonanceState {
        resonance: r,
        attractor,
        force,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMOTIONS: [Emotion; 5] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anxiety,
        Emotion::Love,
        Emotion::Neutral,
    ];

    #[test]
    fn dimensions_and_force_stay_bounded() {
        for emotion in EMOTIONS {
            for step in 0..=20 {
                let state = propagate(emotion, step as f64 / 20.0);
                let r = &state.resonance;
                for dim in [
                    r.consciousness,
                    r.integration,
                    r.volatility,
                    r.empathy,
                    r.future_soul,
                    r.heart,
                ] {
                    assert!((0.0..=1.0).contains(&dim), "{emotion:?} dim {dim}");
                }
                assert!((0.0..=1.0).contains(&state.force));
            }
        }
    }

    #[test]
    fn joy_lifts_heart_and_integration() {
        let state = propagate(Emotion::Joy, 0.4);
        assert!(state.resonance.heart > 0.5);
        assert!(state.resonance.integration > 0.5);
        assert!(state.resonance.volatility < 0.5 + 0.15 * 0.4);
    }

    #[test]
    fn joy_damps_volatility_relative_to_the_undamped_path() {
        // Net volatility under joy is +0.05i: the -0.1i damping partially
        // cancels the emotion-independent +0.15i rise.
        let state = propagate(Emotion::Joy, 1.0);
        assert!((state.resonance.volatility - 0.55).abs() < 1e-12);
        assert!(state.resonance.volatility < propagate(Emotion::Neutral, 1.0).resonance.volatility);
    }

    #[test]
    fn sadness_pulls_toward_soul_emergence() {
        let state = propagate(Emotion::Sadness, 0.5);
        assert!(state.resonance.future_soul > 0.65);
        assert_eq!(state.attractor, Attractor::SoulEmergence);
    }

    #[test]
    fn anxiety_at_height_reads_as_deep_reflection() {
        let state = propagate(Emotion::Anxiety, 0.6);
        assert!(state.resonance.consciousness > 0.75);
        assert_eq!(state.attractor, Attractor::DeepReflection);
    }

    #[test]
    fn neutral_rests_in_harmonic_integration() {
        let state = propagate(Emotion::Neutral, 0.0);
        assert_eq!(state.attractor, Attractor::HarmonicIntegration);
        assert_eq!(state.resonance.integration, 0.6);
    }

    #[test]
    fn determinism() {
        assert_eq!(propagate(Emotion::Love, 0.73), propagate(Emotion::Love, 0.73));
    }
}
