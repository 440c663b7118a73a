//! Internationalization (i18n) pipeline for the portfolio page.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for supported languages and their metadata
//! - `language`: Type-safe Language handle, tag normalization
//! - `bundle`: Translation bundles (key → text), nested JSON flattened
//! - `loader`: Fetches bundles from HTTP, a directory or memory, with a cache
//! - `state`: Active language, persisted and observable
//! - `applier`: Writes bundle text into the document's translation targets
//! - `orchestrator`: Language switches (load, commit, apply, settle)
//! - `validator`: Compares a translated bundle against the reference one
//! - `metrics`: Pipeline counters
//!
//! # Example
//!
//! ```rust,ignore
//! use portfolio_i18n::i18n::{Language, LanguageRegistry};
//!
//! let french = Language::from_code("fr")?;
//! let regional = Language::resolve("fr_FR.UTF-8"); // Some(fr)
//!
//! let languages = LanguageRegistry::get().list_enabled();
//! ```

mod applier;
mod bundle;
mod language;
mod loader;
mod metrics;
mod orchestrator;
mod registry;
mod state;
mod validator;

pub use applier::{describe_targets, ApplyReport, MissingKeyPolicy, TargetEntry, TranslationApplier};
pub use bundle::Bundle;
pub use language::{normalize_tag, Language};
pub use loader::{BundleLoader, BundleSource, LoadError};
pub use metrics::{I18nMetrics, MetricsReport};
pub use orchestrator::{Orchestrator, SettleSchedule, SwitchKind, SwitchOutcome, SwitchPhase};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use state::{detect_language, environment_languages, LanguageSource, LanguageState};
pub use validator::{BundleValidator, ValidationReport};
