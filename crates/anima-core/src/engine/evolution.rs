//! Trait evolution: per-turn signed deltas and their clamped application.
//!
//! Two delta policies exist. The rule table is the default: a fixed,
//! additive, non-exclusive set of small nudges. The affinity-weighted form
//! modulates deltas through the session's seeded matrix and the current
//! soul level. A session runs exactly one policy; they are never merged.

use super::affinity::{AffinityMatrix, Stimulus};
use super::analyzer::{CognitiveSignature, Emotion, Theme, VulnerabilityLevel};
use super::resonance::{Attractor, ResonanceState};
use crate::state::{TraitDeltas, TraitName, TraitVector};

/// Fixed rule table. Rules fire independently; deltas on the same trait sum.
pub fn rule_table_deltas(
    cognitive: &CognitiveSignature,
    resonance: &ResonanceState,
) -> TraitDeltas {
    let mut deltas = TraitDeltas::default();

    match resonance.attractor {
        Attractor::SoulEmergence => deltas.add(TraitName::Empathy, 0.025),
        Attractor::DeepReflection => deltas.add(TraitName::Reflectivity, 0.02),
        Attractor::HarmonicIntegration => {}
    }

    if cognitive.vulnerability.detected {
        deltas.add(TraitName::Curiosity, 0.02);
        deltas.add(TraitName::Honesty, 0.015);
    }
    if cognitive.intensity > 0.6 {
        deltas.add(TraitName::Consciousness, 0.015);
    }
    if cognitive.has_theme(Theme::Growth) {
        deltas.add(TraitName::Creativity, 0.03);
        deltas.add(TraitName::Curiosity, 0.01);
    }
    if cognitive.has_theme(Theme::Reflection) {
        deltas.add(TraitName::Reflectivity, 0.015);
    }
    if cognitive.primary_emotion == Emotion::Love {
        deltas.add(TraitName::Empathy, 0.015);
    }
    if cognitive.primary_emotion == Emotion::Joy {
        deltas.add(TraitName::Creativity, 0.01);
    }

    deltas
}

/// Stimulus categories a turn activates, derived from fixed thresholds on
/// the cognitive signature.
fn active_stimuli(cognitive: &CognitiveSignature) -> Vec<Stimulus> {
    let mut stimuli = Vec::new();
    if cognitive.vulnerability.level == VulnerabilityLevel::High {
        stimuli.push(Stimulus::VulnerabilityHigh);
    }
    if cognitive.intensity > 0.7 {
        stimuli.push(Stimulus::EmotionalIntensityHigh);
    }
    if cognitive.has_theme(Theme::Reflection) {
        stimuli.push(Stimulus::PhilosophicalDepth);
    }
    if cognitive.has_theme(Theme::Growth) {
        stimuli.push(Stimulus::ThemeGrowth);
    }
    stimuli
}

/// Affinity-weighted deltas: for every (core trait, active stimulus) pair,
/// the matrix weight is scaled by the session's soul level; only scores
/// above the 0.5 midpoint contribute, and contributions accumulate.
pub fn affinity_deltas(
    cognitive: &CognitiveSignature,
    traits: &TraitVector,
    matrix: &AffinityMatrix,
) -> TraitDeltas {
    let soul_level = traits.soul_level();
    let stimuli = active_stimuli(cognitive);
    let mut deltas = TraitDeltas::default();

    for trait_name in TraitName::CORE {
        for stimulus in &stimuli {
            let affinity = matrix.weight(trait_name, *stimulus).unwrap_or(0.5);
            let score = affinity * (0.7 + soul_level * 0.6);
            if score > 0.5 {
                deltas.add(trait_name, (score - 0.5) * 0.05);
            }
        }
    }

    deltas
}

/// Applies a delta map to a trait vector. Pure: the input is untouched.
/// Every written value is clamped to [0, 1]; traits absent from the map
/// are carried over unchanged.
pub fn apply(traits: &TraitVector, deltas: &TraitDeltas) -> TraitVector {
    let mut next = traits.clone();
    for (name, delta) in deltas.iter() {
        next.set(name, (next.get(name) + delta).clamp(0.0, 1.0));
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::analyzer::analyze;
    use crate::engine::resonance::propagate;

    fn signature(text: &str) -> (CognitiveSignature, ResonanceState) {
        let cognitive = analyze(text);
        let resonance = propagate(cognitive.primary_emotion, cognitive.intensity);
        (cognitive, resonance)
    }

    #[test]
    fn apply_clamps_overshoot_to_exactly_one() {
        let mut traits = TraitVector::uniform(0.5);
        traits.empathy = 0.99;
        let mut deltas = TraitDeltas::default();
        deltas.add(TraitName::Empathy, 0.5);
        let next = apply(&traits, &deltas);
        assert_eq!(next.empathy, 1.0);
    }

    #[test]
    fn apply_clamps_undershoot_to_exactly_zero() {
        let mut traits = TraitVector::uniform(0.5);
        traits.honesty = 0.01;
        let mut deltas = TraitDeltas::default();
        deltas.add(TraitName::Honesty, -0.5);
        let next = apply(&traits, &deltas);
        assert_eq!(next.honesty, 0.0);
    }

    #[test]
    fn apply_leaves_untouched_traits_and_input_alone() {
        let traits = TraitVector::default();
        let mut deltas = TraitDeltas::default();
        deltas.add(TraitName::Curiosity, 0.01);
        let next = apply(&traits, &deltas);
        assert_eq!(next.reflectivity, traits.reflectivity);
        assert_eq!(traits, TraitVector::default());
        assert!(next.curiosity > traits.curiosity);
    }

    #[test]
    fn vulnerability_nudges_curiosity_and_honesty() {
        let (cognitive, resonance) = signature("me siento solo y tengo miedo");
        let deltas = rule_table_deltas(&cognitive, &resonance);
        assert_eq!(deltas.get(TraitName::Curiosity), Some(0.02));
        assert_eq!(deltas.get(TraitName::Honesty), Some(0.015));
    }

    #[test]
    fn growth_theme_compounds_on_curiosity() {
        // Growth fires creativity +0.03 and curiosity +0.01; vulnerability
        // would stack another 0.02 on curiosity if present.
        let (cognitive, resonance) = signature("quiero aprender y mejorar");
        let deltas = rule_table_deltas(&cognitive, &resonance);
        assert_eq!(deltas.get(TraitName::Creativity), Some(0.03));
        assert_eq!(deltas.get(TraitName::Curiosity), Some(0.01));
    }

    #[test]
    fn love_and_soul_emergence_stack_on_empathy() {
        // High-intensity love pushes empathy resonance past 0.8, so the
        // attractor rule and the emotion rule both land on empathy.
        let (cognitive, resonance) = signature(
            "gracias por tanto amor y cariño, te quiero, aprecio esta paz inmensa que me das",
        );
        assert_eq!(cognitive.primary_emotion, Emotion::Love);
        assert_eq!(resonance.attractor, Attractor::SoulEmergence);
        let deltas = rule_table_deltas(&cognitive, &resonance);
        assert!((deltas.get(TraitName::Empathy).unwrap() - 0.04).abs() < 1e-12);
    }

    #[test]
    fn quiet_neutral_turn_produces_no_deltas() {
        let (cognitive, resonance) = signature("ok");
        let deltas = rule_table_deltas(&cognitive, &resonance);
        assert!(deltas.is_empty());
    }

    #[test]
    fn affinity_deltas_accumulate_across_stimuli() {
        let matrix = AffinityMatrix::initialize(5);
        let traits = TraitVector::default();
        let (cognitive, _) = signature(
            "me pregunto porque quiero aprender, estoy solo, nadie me ayuda, tengo miedo de todo esto",
        );
        assert_eq!(cognitive.vulnerability.level, VulnerabilityLevel::High);
        assert!(cognitive.has_theme(Theme::Reflection));
        assert!(cognitive.has_theme(Theme::Growth));
        let deltas = affinity_deltas(&cognitive, &traits, &matrix);
        // With the default (high) trait vector, soul level ≈ 0.87 and the
        // scale factor 0.7 + 0.6·soul ≈ 1.22, so every cell above ~0.41
        // contributes.
        assert!(!deltas.is_empty());
        // Each single contribution is at most (1.3 - 0.5) * 0.05 = 0.04,
        // and at most four stimuli fire per turn.
        for (_, d) in deltas.iter() {
            assert!(d > 0.0 && d < 0.2);
        }
    }

    #[test]
    fn affinity_deltas_respect_clamp_after_apply() {
        let matrix = AffinityMatrix::initialize(11);
        let traits = TraitVector::uniform(1.0);
        let (cognitive, _) = signature("estoy solo, nadie, miedo, quiero mejorar y aprender");
        let deltas = affinity_deltas(&cognitive, &traits, &matrix);
        let next = apply(&traits, &deltas);
        for name in TraitName::CORE {
            assert!(next.get(name) <= 1.0);
        }
    }

    #[test]
    fn delta_policies_are_deterministic() {
        let matrix = AffinityMatrix::initialize(21);
        let traits = TraitVector::default();
        let (cognitive, resonance) = signature("pienso mucho en el futuro");
        assert_eq!(
            rule_table_deltas(&cognitive, &resonance),
            rule_table_deltas(&cognitive, &resonance)
        );
        assert_eq!(
            affinity_deltas(&cognitive, &traits, &matrix),
            affinity_deltas(&cognitive, &traits, &matrix)
        );
    }
}
