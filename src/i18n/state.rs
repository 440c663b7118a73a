//! Active language state: the page's current language.
//!
//! `LanguageState` is an owned context object. It is initialized from the
//! stored preference, then environment-detected languages, then the fallback
//! list, and it persists every change and notifies subscribers through a
//! `watch` channel.

use crate::i18n::Language;
use crate::preferences::{PreferenceStore, LANGUAGE_KEY};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Where the initial language came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageSource {
    /// Previously chosen language from durable storage
    Stored,
    /// Locale reported by the environment
    Environment,
    /// First supported entry of the configured fallback list
    Fallback,
    /// Registry default (nothing else matched)
    Default,
}

/// Pick the initial language.
///
/// Each candidate list is scanned in order and the first supported entry
/// wins; locale tags are normalized (`fr_FR.UTF-8` → `fr`).
pub fn detect_language(
    stored: Option<&str>,
    environment: &[String],
    fallback: &[String],
) -> (Language, LanguageSource) {
    if let Some(language) = stored.and_then(Language::resolve) {
        return (language, LanguageSource::Stored);
    }
    if let Some(language) = environment.iter().find_map(|tag| Language::resolve(tag)) {
        return (language, LanguageSource::Environment);
    }
    if let Some(language) = fallback.iter().find_map(|tag| Language::resolve(tag)) {
        return (language, LanguageSource::Fallback);
    }
    (Language::default_language(), LanguageSource::Default)
}

/// Preferred languages reported by the process environment.
///
/// Follows gettext precedence: `LANGUAGE` (colon separated list), then
/// `LC_ALL`, `LC_MESSAGES` and `LANG`. Empty values are skipped.
pub fn environment_languages() -> Vec<String> {
    let mut languages = Vec::new();

    if let Ok(list) = std::env::var("LANGUAGE") {
        languages.extend(
            list.split(':')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        );
    }
    for var in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        if let Ok(value) = std::env::var(var) {
            if !value.trim().is_empty() {
                languages.push(value.trim().to_string());
            }
        }
    }

    languages
}

/// The page's current language.
pub struct LanguageState {
    current: watch::Sender<Language>,
    store: Arc<dyn PreferenceStore>,
}

impl LanguageState {
    /// Create the state with a known language, without consulting storage.
    pub fn new(language: Language, store: Arc<dyn PreferenceStore>) -> Self {
        let (current, _) = watch::channel(language);
        Self { current, store }
    }

    /// Initialize from storage, environment and fallback list, in that order.
    pub fn initialize(
        store: Arc<dyn PreferenceStore>,
        environment: &[String],
        fallback: &[String],
    ) -> Self {
        let stored = store.get(LANGUAGE_KEY);
        let (language, source) = detect_language(stored.as_deref(), environment, fallback);
        info!("Initial language: {} ({:?})", language, source);

        let state = Self::new(language, store);
        if source != LanguageSource::Stored {
            state.persist(language);
        }
        state
    }

    pub fn get(&self) -> Language {
        *self.current.borrow()
    }

    /// Change the active language.
    ///
    /// The value is always persisted. Subscribers are only notified when the
    /// language actually changes; the return value says whether it did.
    pub fn set(&self, language: Language) -> bool {
        let changed = self.current.send_if_modified(|current| {
            if *current == language {
                false
            } else {
                *current = language;
                true
            }
        });

        self.persist(language);
        if changed {
            info!("Active language changed to {}", language);
        } else {
            debug!("Active language unchanged ({})", language);
        }
        changed
    }

    /// Receive a notification carrying the new language on every change.
    pub fn subscribe(&self) -> watch::Receiver<Language> {
        self.current.subscribe()
    }

    fn persist(&self, language: Language) {
        if let Err(e) = self.store.set(LANGUAGE_KEY, language.code()) {
            warn!("Failed to persist language preference: {:#}", e);
        }
    }
}
