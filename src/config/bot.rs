//! Bot profile loaded from a TOML file
//!
//! Identifies which bot, alias, and locale the relay addresses at the dialog
//! runtime, and how to reach it. The identity tuple is static configuration;
//! nothing about it crosses the client boundary.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotProfile {
    /// Bot identifier at the dialog runtime.
    pub bot_id: String,

    /// Published alias to address.
    pub bot_alias_id: String,

    /// Locale the bot resolves intents in.
    #[serde(default = "default_locale")]
    pub locale_id: String,

    /// Base URL of the runtime's REST endpoint.
    pub endpoint: String,

    /// Environment variable holding the API key, if the runtime wants one.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Upstream request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl BotProfile {
    /// Load a profile from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let profile: BotProfile = toml::from_str(&content)?;
        Ok(profile)
    }

    /// Load a profile from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let profile: BotProfile = toml::from_str(content)?;
        Ok(profile)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PROFILE: &str = r#"
bot_id = "2RYOBPLM3Z"
bot_alias_id = "31MKW4FKL6"
locale_id = "en_US"
endpoint = "https://runtime.example.com"
api_key_env = "DIALOG_RUNTIME_KEY"
timeout_secs = 20
"#;

    #[test]
    fn test_parse_profile() {
        let profile = BotProfile::from_str(SAMPLE_PROFILE).unwrap();

        assert_eq!(profile.bot_id, "2RYOBPLM3Z");
        assert_eq!(profile.bot_alias_id, "31MKW4FKL6");
        assert_eq!(profile.locale_id, "en_US");
        assert_eq!(profile.endpoint, "https://runtime.example.com");
        assert_eq!(profile.api_key_env, Some("DIALOG_RUNTIME_KEY".to_string()));
        assert_eq!(profile.timeout_secs, 20);
    }

    #[test]
    fn test_minimal_profile() {
        let minimal = r#"
bot_id = "B1"
bot_alias_id = "A1"
endpoint = "http://localhost:8087"
"#;

        let profile = BotProfile::from_str(minimal).unwrap();
        assert_eq!(profile.locale_id, "en_US"); // Default
        assert_eq!(profile.timeout_secs, 30); // Default
        assert!(profile.api_key_env.is_none());
    }
}
