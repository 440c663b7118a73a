use crate::i18n::{Language, MissingKeyPolicy, SettleSchedule};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Bundles
    pub locales_base: String,
    pub fetch_timeout: Duration,

    // Languages
    pub default_language: Language,
    pub fallback_languages: Vec<String>,
    /// Overrides the locale environment variables when set
    pub preferred_languages: Option<Vec<String>>,

    // Storage
    pub preferences_file: PathBuf,

    // Rendering
    pub missing_key_policy: MissingKeyPolicy,
    pub settle_schedule: SettleSchedule,
    pub typewriter_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locales_base: "./locales".to_string(),
            fetch_timeout: Duration::from_secs(10),
            default_language: Language::default_language(),
            fallback_languages: vec!["en".to_string(), "fr".to_string()],
            preferred_languages: None,
            preferences_file: PathBuf::from("data/preferences.json"),
            missing_key_policy: MissingKeyPolicy::default(),
            settle_schedule: SettleSchedule::default(),
            typewriter_interval: Duration::from_millis(100),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            // Bundles
            locales_base: std::env::var("LOCALES_BASE").unwrap_or(defaults.locales_base),
            fetch_timeout: std::env::var("FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),

            // Languages
            default_language: match std::env::var("DEFAULT_LANGUAGE") {
                Ok(code) => Language::from_code(code.trim())
                    .context("DEFAULT_LANGUAGE is not a supported language")?,
                Err(_) => defaults.default_language,
            },
            fallback_languages: std::env::var("FALLBACK_LANGUAGES")
                .map(|v| parse_list(&v))
                .unwrap_or(defaults.fallback_languages),
            preferred_languages: std::env::var("PREFERRED_LANGUAGES")
                .ok()
                .map(|v| parse_list(&v))
                .filter(|list| !list.is_empty()),

            // Storage
            preferences_file: std::env::var("PREFERENCES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.preferences_file),

            // Rendering
            missing_key_policy: match std::env::var("MISSING_KEY_POLICY") {
                Ok(v) => v.parse().context("MISSING_KEY_POLICY is invalid")?,
                Err(_) => defaults.missing_key_policy,
            },
            settle_schedule: match std::env::var("SETTLE_DELAYS_MS") {
                Ok(v) => v.parse().context("SETTLE_DELAYS_MS is invalid")?,
                Err(_) => defaults.settle_schedule,
            },
            typewriter_interval: std::env::var("TYPEWRITER_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.typewriter_interval),
        })
    }

    /// Fallback list used for language detection.
    ///
    /// The configured default language is always the last resort.
    pub fn fallback_chain(&self) -> Vec<String> {
        let mut chain = self.fallback_languages.clone();
        if !chain.iter().any(|c| c == self.default_language.code()) {
            chain.push(self.default_language.code().to_string());
        }
        chain
    }
}

/// Split a comma separated list, dropping empty entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
