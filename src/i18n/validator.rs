//! Bundle validation.
//!
//! Compares a translated bundle against the reference (default language)
//! bundle to catch keys that would fall back to their literal name on the
//! page, and translations that dropped markup or interpolation variables.

use crate::i18n::Bundle;
use regex::Regex;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that will show up on the page (missing or empty text)
    pub errors: Vec<String>,

    /// Suspicious differences that may be intentional
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for translated bundles.
pub struct BundleValidator;

// Regex patterns for extraction (cached for performance)
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static VARIABLE_REGEX: OnceLock<Regex> = OnceLock::new();

impl BundleValidator {
    /// Validate `candidate` against `reference`.
    ///
    /// Errors:
    /// - keys present in the reference but missing from the candidate
    /// - keys whose candidate text is empty or whitespace
    ///
    /// Warnings:
    /// - keys only present in the candidate
    /// - values whose markup tags differ from the reference value
    /// - values whose `{{variable}}` placeholders differ from the reference
    ///
    /// Messages are sorted by key so reports are stable.
    pub fn validate(reference: &Bundle, candidate: &Bundle) -> ValidationReport {
        let mut report = ValidationReport::new();

        let mut reference_keys: Vec<&str> = reference.keys().collect();
        reference_keys.sort_unstable();

        for key in reference_keys {
            let Some(translated) = candidate.get(key) else {
                report.errors.push(format!("Missing key '{}'", key));
                continue;
            };

            if translated.trim().is_empty() {
                report.errors.push(format!("Empty translation for '{}'", key));
                continue;
            }

            let original = reference.get(key).unwrap_or_default();

            let orig_tags = Self::extract_tags(original);
            let trans_tags = Self::extract_tags(translated);
            if orig_tags != trans_tags {
                report.warnings.push(format!(
                    "Markup mismatch for '{}': reference has {:?}, translation has {:?}",
                    key, orig_tags, trans_tags
                ));
            }

            let orig_vars = Self::extract_variables(original);
            let trans_vars = Self::extract_variables(translated);
            if orig_vars != trans_vars {
                report.warnings.push(format!(
                    "Variable mismatch for '{}': reference has {:?}, translation has {:?}",
                    key, orig_vars, trans_vars
                ));
            }
        }

        let mut extra: Vec<&str> = candidate
            .keys()
            .filter(|key| !reference.contains_key(key))
            .collect();
        extra.sort_unstable();
        for key in extra {
            report
                .warnings
                .push(format!("Key '{}' is not in the reference bundle", key));
        }

        report
    }

    /// Extract markup tag names (opening and closing), sorted.
    fn extract_tags(text: &str) -> Vec<String> {
        let regex = TAG_REGEX.get_or_init(|| {
            Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)").expect("tag pattern is valid")
        });

        let mut tags: Vec<String> = regex
            .captures_iter(text)
            .map(|cap| format!("{}{}", &cap[1], cap[2].to_ascii_lowercase()))
            .collect();
        tags.sort();
        tags
    }

    /// Extract `{{variable}}` interpolation names, sorted.
    fn extract_variables(text: &str) -> Vec<String> {
        let regex = VARIABLE_REGEX.get_or_init(|| {
            Regex::new(r"\{\{\s*([\w.-]+)\s*\}\}").expect("variable pattern is valid")
        });

        let mut vars: Vec<String> = regex
            .captures_iter(text)
            .map(|cap| cap[1].to_string())
            .collect();
        vars.sort();
        vars
    }
}
