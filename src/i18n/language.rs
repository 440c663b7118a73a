//! Language type: validated language representation.
//!
//! A `Language` can only be constructed for codes present and enabled in the
//! registry, so holding one means its bundle path and page assets exist.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};
use std::fmt;

/// A validated language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "fr")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };

    pub const FRENCH: Language = Language { code: "fr" };

    /// Create a Language from a language code string.
    ///
    /// The code must match a registry entry exactly; use [`Language::resolve`]
    /// for locale tags such as `fr-FR` or `fr_FR.UTF-8`.
    ///
    /// # Arguments
    /// * `code` - The ISO 639-1 language code (e.g., "en", "fr")
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is valid and the language is enabled
    /// * `Err` if the code is not found or the language is disabled
    pub fn from_code(code: &str) -> Result<Language> {
        let registry = LanguageRegistry::get();

        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Language { code: config.code }),
            Some(_) => bail!("Language '{}' is not enabled", code),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// Resolve a locale tag to a supported language, if any.
    ///
    /// The tag is normalized first, so `"FR"`, `"fr-CA"` and
    /// `"fr_FR.UTF-8"` all resolve to French.
    ///
    /// # Arguments
    /// * `tag` - A BCP 47 or POSIX locale tag
    ///
    /// # Returns
    /// * `Some(Language)` if the tag's primary subtag is an enabled language
    /// * `None` otherwise
    ///
    /// # Example
    /// ```ignore
    /// assert_eq!(Language::resolve("fr_FR.UTF-8"), Some(Language::FRENCH));
    /// ```
    pub fn resolve(tag: &str) -> Option<Language> {
        Language::from_code(&normalize_tag(tag)).ok()
    }

    /// Get the default language of the page.
    ///
    /// # Returns
    /// The registry's default language (English). It is the last entry of
    /// every start-up fallback chain and the reference for bundle validation.
    pub fn default_language() -> Language {
        Language {
            code: LanguageRegistry::get().default_language().code,
        }
    }

    /// Get the ISO 639-1 language code.
    ///
    /// # Returns
    /// The language code as a static string (e.g., "en", "fr"). This is the
    /// value stored as the visitor's preference and the bundle file stem.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Returns
    /// A reference to the `LanguageConfig` for this language, which carries
    /// the flag image and CV path used by the page updaters.
    pub fn config(&self) -> &'static LanguageConfig {
        // Constructors only hand out codes taken from the registry.
        LanguageRegistry::get()
            .get_by_code(self.code)
            .unwrap_or_else(|| LanguageRegistry::get().default_language())
    }

    /// English name of the language (e.g., "French").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Name of the language in itself (e.g., "Français").
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Check if this is the default language.
    ///
    /// # Returns
    /// `true` only for the registry's default language.
    pub fn is_default(&self) -> bool {
        self.config().is_default
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::default_language()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

/// Reduce a locale tag to its lower-cased primary subtag.
///
/// Strips encodings (`.UTF-8`), modifiers (`@euro`) and region/script
/// subtags separated by `-` or `_`.
///
/// # Arguments
/// * `tag` - A locale tag such as `"fr-CA"` or `"en_US.UTF-8@euro"`
///
/// # Returns
/// The primary subtag, lower-cased (`"fr"`, `"en"`). An empty or blank tag
/// yields an empty string, which resolves to no language.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim()
        .split(['.', '@'])
        .next()
        .unwrap_or("")
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}
