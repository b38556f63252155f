//! Runtime configuration loaded from `.env`, plus the user-owned
//! `anima.toml` holding the API key.
//!
//! | Env | Default | Description |
//! |-----|---------|--------------|
//! | ANIMA_EVOLUTION_POLICY | rule_table | "rule_table" \| "affinity" — which delta policy sessions run. |
//! | ANIMA_LISTEN_ADDR | 127.0.0.1:8040 | Gateway bind address. |
//! | ANIMA_DATA_DIR | ./data/anima_sessions | Session store location. |
//! | ANIMA_STATIC_DIR | (unset) | Optional static UI directory served at `/`. |
//! | ANIMA_AUTONOMY_ENABLED | true | Background introspection/dream/proactive loop. |
//! | ANIMA_AUTONOMY_INTERVAL_SECS | 45 | Tick interval of the autonomy loop. |
//! | ANIMA_PROACTIVE_IDLE_MS | 120000 | Silence before the companion may reach out. |
//! | ANIMA_COMPANION_NAME | Anima | Display name injected into prompts. |
//! | ANIMA_MODEL | (bridge default) | LLM model override for the bridge. |

use crate::engine::EvolutionPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8040";
const DEFAULT_DATA_DIR: &str = "./data/anima_sessions";
const DEFAULT_AUTONOMY_INTERVAL_SECS: u64 = 45;
const DEFAULT_PROACTIVE_IDLE_MS: i64 = 120_000;

/// Gateway + engine runtime configuration. Unset or invalid values fall
/// back to the defaults documented above.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimaConfig {
    pub evolution_policy: EvolutionPolicy,
    pub listen_addr: String,
    pub data_dir: String,
    #[serde(default)]
    pub static_dir: Option<String>,
    pub autonomy_enabled: bool,
    pub autonomy_interval_secs: u64,
    pub proactive_idle_ms: i64,
    #[serde(default)]
    pub companion_name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for AnimaConfig {
    fn default() -> Self {
        Self {
            evolution_policy: EvolutionPolicy::RuleTable,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            data_dir: DEFAULT_DATA_DIR.to_string(),
            static_dir: None,
            autonomy_enabled: true,
            autonomy_interval_secs: DEFAULT_AUTONOMY_INTERVAL_SECS,
            proactive_idle_ms: DEFAULT_PROACTIVE_IDLE_MS,
            companion_name: None,
            model: None,
        }
    }
}

impl AnimaConfig {
    /// Load from environment. The gateway calls `dotenvy::dotenv()` first.
    pub fn from_env() -> Self {
        Self {
            evolution_policy: std::env::var("ANIMA_EVOLUTION_POLICY")
                .map(|v| EvolutionPolicy::from_str(&v))
                .unwrap_or_default(),
            listen_addr: env_string("ANIMA_LISTEN_ADDR", DEFAULT_LISTEN_ADDR),
            data_dir: env_string("ANIMA_DATA_DIR", DEFAULT_DATA_DIR),
            static_dir: env_opt_string("ANIMA_STATIC_DIR"),
            autonomy_enabled: env_bool("ANIMA_AUTONOMY_ENABLED", true),
            autonomy_interval_secs: env_u64(
                "ANIMA_AUTONOMY_INTERVAL_SECS",
                DEFAULT_AUTONOMY_INTERVAL_SECS,
            ),
            proactive_idle_ms: env_i64("ANIMA_PROACTIVE_IDLE_MS", DEFAULT_PROACTIVE_IDLE_MS),
            companion_name: env_opt_string("ANIMA_COMPANION_NAME"),
            model: env_opt_string("ANIMA_MODEL"),
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => v.trim().eq_ignore_ascii_case("true") || (v.trim().is_empty() && default),
        Err(_) => default,
    }
}

fn env_string(name: &str, default: &str) -> String {
    env_opt_string(name).unwrap_or_else(|| default.to_string())
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// User-owned configuration stored in `anima.toml`: the API key and model
/// preference live here so users never edit the codebase or environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// OpenRouter (or compatible) API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Preferred model identifier.
    #[serde(default)]
    pub model: Option<String>,
    /// Display name the companion should use for the user.
    #[serde(default)]
    pub user_name: Option<String>,
}

impl UserConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from("anima.toml")
    }

    /// Loads the user config; a missing file is simply an empty config.
    pub fn load() -> Self {
        Self::load_from_path(&Self::default_path())
    }

    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(target: "anima::config", error = %e, "unreadable anima.toml; ignoring");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_hold_without_env() {
        let config = AnimaConfig::default();
        assert_eq!(config.evolution_policy, EvolutionPolicy::RuleTable);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert!(config.autonomy_enabled);
    }

    #[test]
    fn user_config_parses_toml() {
        let config: UserConfig =
            toml::from_str("api_key = \"sk-or-test\"\nmodel = \"meta-llama/llama-3.3-70b-instruct\"")
                .unwrap();
        assert_eq!(config.get_api_key().as_deref(), Some("sk-or-test"));
        assert!(config.model.is_some());
    }

    #[test]
    fn blank_api_key_reads_as_absent() {
        let config: UserConfig = toml::from_str("api_key = \"  \"").unwrap();
        assert!(config.get_api_key().is_none());
    }
}
