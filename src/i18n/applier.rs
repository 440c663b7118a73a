//! Translation applier: writes bundle text into the document's targets.

use crate::document::{Document, ElementKind, NodeId};
use crate::i18n::{Bundle, I18nMetrics, Language};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a target shows when its key is missing from the bundle.
///
/// Whichever policy is configured is applied to every target; content is
/// never blanked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKeyPolicy {
    /// Display the key itself
    #[default]
    UseKey,
    /// Leave the element's current text untouched
    KeepExisting,
}

impl FromStr for MissingKeyPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "key" | "use-key" => Ok(MissingKeyPolicy::UseKey),
            "keep" | "keep-existing" => Ok(MissingKeyPolicy::KeepExisting),
            other => anyhow::bail!(
                "Invalid missing key policy '{}'. Expected 'key' or 'keep'",
                other
            ),
        }
    }
}

/// Outcome of one applier pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Targets visited
    pub targets: usize,
    /// Content or placeholder writes that changed the document
    pub writes: usize,
    /// Keys absent from the bundle, in document order
    pub missing: Vec<String>,
}

/// Applies a bundle to every translation target of a document.
#[derive(Debug, Clone)]
pub struct TranslationApplier {
    policy: MissingKeyPolicy,
    metrics: Arc<I18nMetrics>,
}

impl TranslationApplier {
    pub fn new(policy: MissingKeyPolicy, metrics: Arc<I18nMetrics>) -> Self {
        Self { policy, metrics }
    }

    pub fn policy(&self) -> MissingKeyPolicy {
        self.policy
    }

    /// Write the bundle's text into every target.
    ///
    /// - `data-i18n` on text inputs and text areas sets the placeholder,
    ///   anywhere else it sets the rendered content (markup, unescaped).
    /// - `data-i18n-placeholder` only ever sets the placeholder.
    ///
    /// Writes whose value is already displayed are skipped, so a second pass
    /// with the same bundle changes nothing.
    pub fn apply<D: Document + ?Sized>(
        &self,
        document: &mut D,
        bundle: &Bundle,
        language: Language,
    ) -> ApplyReport {
        self.metrics.record_apply_pass();
        let mut report = ApplyReport::default();

        for target in document.targets() {
            report.targets += 1;

            if let Some(key) = target.content_key.as_deref() {
                if let Some(text) = self.resolve(bundle, key, language, &mut report) {
                    let wrote = match target.kind {
                        ElementKind::TextInput => write_placeholder(document, target.node, &text),
                        ElementKind::Rich => write_content(document, target.node, &text),
                    };
                    report.writes += usize::from(wrote);
                }
            }

            if let Some(key) = target.placeholder_key.as_deref() {
                if let Some(text) = self.resolve(bundle, key, language, &mut report) {
                    report.writes += usize::from(write_placeholder(document, target.node, &text));
                }
            }
        }

        debug!(
            "Applied {} bundle: {} targets, {} writes, {} missing",
            language,
            report.targets,
            report.writes,
            report.missing.len()
        );
        report
    }

    /// Resolve a key, recording a diagnostic when it is missing.
    ///
    /// Returns `None` when nothing should be written.
    fn resolve(
        &self,
        bundle: &Bundle,
        key: &str,
        language: Language,
        report: &mut ApplyReport,
    ) -> Option<String> {
        if let Some(text) = bundle.get(key) {
            return Some(text.to_string());
        }

        warn!("Missing translation key '{}' for {}", key, language);
        self.metrics.record_missing_key();
        report.missing.push(key.to_string());

        match self.policy {
            MissingKeyPolicy::UseKey => Some(key.to_string()),
            MissingKeyPolicy::KeepExisting => None,
        }
    }
}

/// One translation key on one target, next to what the page shows for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub node: NodeId,
    pub key: String,
    /// The key came from `data-i18n-placeholder`
    pub placeholder_only: bool,
    /// Bundle text, `None` when the key is missing
    pub translation: Option<String>,
    /// What the slot the key writes to currently displays
    pub current: Option<String>,
}

/// List every key of every target with its translation and the value
/// currently displayed, in document order. Nothing is written.
pub fn describe_targets<D: Document + ?Sized>(document: &D, bundle: &Bundle) -> Vec<TargetEntry> {
    let mut entries = Vec::new();

    for target in document.targets() {
        if let Some(key) = target.content_key {
            let current = match target.kind {
                ElementKind::TextInput => document.placeholder(target.node),
                ElementKind::Rich => document.content(target.node),
            };
            entries.push(TargetEntry {
                node: target.node,
                translation: bundle.get(&key).map(String::from),
                current: current.map(String::from),
                key,
                placeholder_only: false,
            });
        }

        if let Some(key) = target.placeholder_key {
            entries.push(TargetEntry {
                node: target.node,
                translation: bundle.get(&key).map(String::from),
                current: document.placeholder(target.node).map(String::from),
                key,
                placeholder_only: true,
            });
        }
    }

    entries
}

fn write_content<D: Document + ?Sized>(document: &mut D, node: NodeId, text: &str) -> bool {
    if document.content(node) == Some(text) {
        return false;
    }
    document.set_content(node, text);
    true
}

fn write_placeholder<D: Document + ?Sized>(document: &mut D, node: NodeId, text: &str) -> bool {
    if document.placeholder(node) == Some(text) {
        return false;
    }
    document.set_placeholder(node, text);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementSpec, MemoryDocument, PageQuery};

    fn applier(policy: MissingKeyPolicy) -> TranslationApplier {
        TranslationApplier::new(policy, Arc::new(I18nMetrics::new()))
    }

    fn french() -> Bundle {
        [
            ("hero-title", "Bonjour"),
            ("about", "Je <strong>crée</strong> des sites"),
            ("name", "Votre nom"),
            ("message", "Votre message"),
            ("send", "Envoyer"),
            ("email", "Votre e-mail"),
        ]
        .into_iter()
        .collect()
    }

    fn page() -> MemoryDocument {
        MemoryDocument::from_spec(
            &ElementSpec::new("body")
                .with_child(
                    ElementSpec::new("h1")
                        .with_id("title")
                        .with_key("hero-title")
                        .with_content("Hello"),
                )
                .with_child(ElementSpec::new("p").with_id("about").with_key("about"))
                .with_child(ElementSpec::new("input").with_id("name").with_type("text").with_key("name"))
                .with_child(ElementSpec::new("textarea").with_id("message").with_key("message"))
                .with_child(
                    ElementSpec::new("input")
                        .with_id("send")
                        .with_type("submit")
                        .with_key("send"),
                )
                .with_child(
                    ElementSpec::new("div")
                        .with_id("email")
                        .with_placeholder_key("email")
                        .with_content("untouched"),
                ),
        )
    }

    fn node(doc: &MemoryDocument, id: &str) -> usize {
        doc.element_by_id(id).unwrap()
    }

    #[test]
    fn test_rich_elements_get_content() {
        let mut doc = page();
        applier(MissingKeyPolicy::UseKey).apply(&mut doc, &french(), Language::FRENCH);

        assert_eq!(doc.content(node(&doc, "title")), Some("Bonjour"));
        assert_eq!(
            doc.content(node(&doc, "about")),
            Some("Je <strong>crée</strong> des sites")
        );
    }

    #[test]
    fn test_text_inputs_get_placeholder() {
        let mut doc = page();
        applier(MissingKeyPolicy::UseKey).apply(&mut doc, &french(), Language::FRENCH);

        let name = node(&doc, "name");
        assert_eq!(doc.placeholder(name), Some("Votre nom"));
        assert_eq!(doc.content(name), Some(""));
        assert_eq!(doc.placeholder(node(&doc, "message")), Some("Votre message"));
    }

    #[test]
    fn test_submit_input_gets_content() {
        let mut doc = page();
        applier(MissingKeyPolicy::UseKey).apply(&mut doc, &french(), Language::FRENCH);

        let send = node(&doc, "send");
        assert_eq!(doc.content(send), Some("Envoyer"));
        assert_eq!(doc.placeholder(send), None);
    }

    #[test]
    fn test_placeholder_only_target() {
        let mut doc = page();
        applier(MissingKeyPolicy::UseKey).apply(&mut doc, &french(), Language::FRENCH);

        let email = node(&doc, "email");
        assert_eq!(doc.placeholder(email), Some("Votre e-mail"));
        assert_eq!(doc.content(email), Some("untouched"));
    }

    #[test]
    fn test_missing_key_uses_key_literal() {
        let mut doc = page();
        let applier = applier(MissingKeyPolicy::UseKey);
        let bundle: Bundle = [("about", "À propos")].into_iter().collect();

        let report = applier.apply(&mut doc, &bundle, Language::FRENCH);

        assert_eq!(doc.content(node(&doc, "title")), Some("hero-title"));
        assert_eq!(doc.placeholder(node(&doc, "name")), Some("name"));
        assert_eq!(
            report.missing,
            vec!["hero-title", "name", "message", "send", "email"]
        );
        assert_eq!(applier.metrics.missing_keys(), 5);
    }

    #[test]
    fn test_missing_key_keep_existing() {
        let mut doc = page();
        let bundle = Bundle::new();

        let report = applier(MissingKeyPolicy::KeepExisting).apply(&mut doc, &bundle, Language::FRENCH);

        assert_eq!(doc.content(node(&doc, "title")), Some("Hello"));
        assert_eq!(doc.placeholder(node(&doc, "name")), None);
        assert_eq!(report.writes, 0);
        assert_eq!(report.missing.len(), 6);
    }

    // ==================== Target Listing Tests ====================

    #[test]
    fn test_describe_targets_before_and_after_apply() {
        let mut doc = page();
        let bundle: Bundle = [("hero-title", "Bonjour"), ("name", "Votre nom"), ("email", "Votre e-mail")]
            .into_iter()
            .collect();

        let before = describe_targets(&doc, &bundle);
        assert_eq!(before.len(), 6);
        assert_eq!(before[0].key, "hero-title");
        assert_eq!(before[0].translation.as_deref(), Some("Bonjour"));
        assert_eq!(before[0].current.as_deref(), Some("Hello"));
        assert_eq!(before[1].translation, None);
        assert_eq!(before[2].current, None);
        assert!(before[5].placeholder_only);
        assert_eq!(before[5].current, None);

        applier(MissingKeyPolicy::KeepExisting).apply(&mut doc, &bundle, Language::FRENCH);

        for entry in describe_targets(&doc, &bundle) {
            if let Some(translation) = &entry.translation {
                assert_eq!(entry.current.as_ref(), Some(translation), "{}", entry.key);
            }
        }
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let mut doc = page();
        let applier = applier(MissingKeyPolicy::UseKey);

        let first = applier.apply(&mut doc, &french(), Language::FRENCH);
        let snapshot = doc.to_spec();
        let second = applier.apply(&mut doc, &french(), Language::FRENCH);

        assert_eq!(first.writes, 6);
        assert_eq!(second.writes, 0);
        assert_eq!(doc.to_spec(), snapshot);
        assert_eq!(applier.metrics.apply_passes(), 2);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("key".parse::<MissingKeyPolicy>().unwrap(), MissingKeyPolicy::UseKey);
        assert_eq!(" KEEP ".parse::<MissingKeyPolicy>().unwrap(), MissingKeyPolicy::KeepExisting);
        assert!("blank".parse::<MissingKeyPolicy>().is_err());
        assert_eq!(MissingKeyPolicy::default(), MissingKeyPolicy::UseKey);
    }
}
