//! Language registry: Single source of truth for all supported languages.
//!
//! The registry lists every language the page can be displayed in, together
//! with the per-language assets the page swaps on a language change (flag
//! image for the language button, localized CV document). It uses a
//! singleton pattern with `OnceLock` because the table is immutable.

use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "fr")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "French")
    pub name: &'static str,

    /// Native name of the language (e.g., "English", "Français")
    pub native_name: &'static str,

    /// Flag image shown on the current-language button
    pub flag_url: &'static str,

    /// Relative path of the CV offered for download in this language
    pub cv_path: &'static str,

    /// Whether this is the default language (only one should be true)
    pub is_default: bool,

    /// Whether this language is enabled for use
    pub enabled: bool,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    ///
    /// The registry is built on first call; later calls return the same
    /// instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// # Arguments
    /// * `code` - The ISO 639-1 language code (e.g., "en", "fr"), matched exactly
    ///
    /// # Returns
    /// * `Some(&LanguageConfig)` if the language exists
    /// * `None` if the language is not found
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get all enabled languages.
    ///
    /// # Returns
    /// The configurations where `enabled` is true, in registry order. This is
    /// the order the language flags appear in.
    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// Get all languages (including disabled ones).
    ///
    /// # Returns
    /// A vector of references to every language configuration.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Get the default language configuration.
    ///
    /// # Returns
    /// The entry flagged `is_default`, or the first registered language if
    /// no entry is flagged.
    pub fn default_language(&self) -> &LanguageConfig {
        self.languages
            .iter()
            .find(|lang| lang.is_default)
            .unwrap_or(&self.languages[0])
    }

    /// Check if a language code is supported and enabled.
    ///
    /// # Arguments
    /// * `code` - The ISO 639-1 language code to check
    ///
    /// # Returns
    /// `true` if the language exists and is enabled, `false` otherwise.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|lang| lang.enabled)
            .unwrap_or(false)
    }
}

/// Default language configurations: English (default) and French.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            flag_url: "https://flagcdn.com/w20/gb.png",
            cv_path: "./assets/images/Anna Batoochirova_web_en.pdf",
            is_default: true,
            enabled: true,
        },
        LanguageConfig {
            code: "fr",
            name: "French",
            native_name: "Français",
            flag_url: "https://flagcdn.com/w20/fr.png",
            cv_path: "./assets/images/Anna Batoochirova_web_fr.pdf",
            is_default: false,
            enabled: true,
        },
    ]
}
