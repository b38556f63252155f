//! Cognitive analysis: raw user text to a structured signature.
//!
//! Pure keyword scan over fixed tables — no model call, no state. The
//! vocabularies are the Spanish tables the companion has always shipped
//! with; they are data, not UI strings, and exported sessions depend on
//! their exact match behavior.

use serde::{Deserialize, Serialize};

/// Primary emotional register detected in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Sadness,
    Anxiety,
    Love,
    Neutral,
}

/// Conversational theme tag. `General` is the sentinel when nothing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[serde(alias = "relaciones")]
    Relationships,
    #[serde(alias = "crecimiento")]
    Growth,
    #[serde(alias = "lucha")]
    Struggle,
    #[serde(alias = "reflexion")]
    Reflection,
    General,
}

/// Three-level vulnerability severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VulnerabilityLevel {
    Low,
    Moderate,
    High,
}

/// Emotional-risk assessment: which trigger terms matched and how many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityAssessment {
    pub detected: bool,
    pub level: VulnerabilityLevel,
    pub signals: Vec<String>,
}

/// Structured cognitive signature of one user message. Ephemeral:
/// recomputed every turn, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveSignature {
    pub primary_emotion: Emotion,
    pub intensity: f64,
    pub themes: Vec<Theme>,
    pub vulnerability: VulnerabilityAssessment,
}

impl CognitiveSignature {
    #[inline]
    pub fn has_theme(&self, theme: Theme) -> bool {
        self.themes.contains(&theme)
    }
}

/// Emotion keyword table. Evaluation order is fixed: on a tie the earlier
/// category keeps the win. Neutral carries no keywords and only wins when
/// nothing matches at all.
const EMOTION_KEYWORDS: [(Emotion, &[&str]); 4] = [
    (Emotion::Joy, &["feliz", "alegre", "contento", "bien", "genial", "disfruto"]),
    (Emotion::Sadness, &["triste", "mal", "solo", "vacio", "dolor", "pena"]),
    (Emotion::Anxiety, &["ansioso", "miedo", "nervioso", "preocupado", "tengo miedo"]),
    (Emotion::Love, &["amor", "te quiero", "cariño", "gracias", "aprecio", "paz"]),
];

/// Theme indicator table: any keyword substring activates the theme; a
/// message can carry several themes at once.
const THEME_KEYWORDS: [(Theme, &[&str]); 4] = [
    (Theme::Relationships, &["familia", "amigo", "pareja", "gente", "personas"]),
    (Theme::Growth, &["aprender", "mejorar", "cambiar", "futuro", "evolución"]),
    (Theme::Struggle, &["difícil", "problema", "no puedo", "ayuda", "cansado"]),
    (Theme::Reflection, &["creo", "pienso", "me pregunto", "porque", "razón"]),
];

/// Terms signalling the user may be emotionally at risk.
const VULNERABILITY_SIGNALS: [&str; 6] = ["solo", "nadie", "fin", "miedo", "incapaz", "no sirvo"];

/// Length above which a message contributes a flat +0.2 to intensity.
const LONG_MESSAGE_CHARS: usize = 50;

/// Analyzes raw input text into a cognitive signature.
///
/// Total over any string, including the empty one; deterministic; no side
/// effects.
pub fn analyze(text: &str) -> CognitiveSignature {
    let folded = text.to_lowercase();

    let mut primary_emotion = Emotion::Neutral;
    let mut max_matches = 0usize;
    for (emotion, keywords) in EMOTION_KEYWORDS {
        let matches = keywords.iter().filter(|k| folded.contains(*k)).count();
        if matches > max_matches {
            max_matches = matches;
            primary_emotion = emotion;
        }
    }

    let mut themes: Vec<Theme> = THEME_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| folded.contains(k)))
        .map(|(theme, _)| *theme)
        .collect();
    if themes.is_empty() {
        themes.push(Theme::General);
    }

    let signals: Vec<String> = VULNERABILITY_SIGNALS
        .iter()
        .filter(|s| folded.contains(**s))
        .map(|s| s.to_string())
        .collect();
    let level = match signals.len() {
        0 => VulnerabilityLevel::Low,
        1 | 2 => VulnerabilityLevel::Moderate,
        _ => VulnerabilityLevel::High,
    };

    let length_boost = if text.chars().count() > LONG_MESSAGE_CHARS { 0.2 } else { 0.0 };
    let intensity = (max_matches as f64 * 0.2 + length_boost + signals.len() as f64 * 0.15)
        .clamp(0.0, 1.0);

    CognitiveSignature {
        primary_emotion,
        intensity,
        themes,
        vulnerability: VulnerabilityAssessment {
            detected: !signals.is_empty(),
            level,
            signals,
        },
    }
}
