//! Page bootstrap and the user-facing actions.
//!
//! `Site` owns one page: its document, the language switch orchestrator,
//! the typewriter and the preference store. Start-up runs each initializer
//! on its own so a missing anchor element or an unreachable bundle only
//! disables that one feature.

use crate::config::Config;
use crate::document::PageQuery;
use crate::i18n::{
    Bundle, BundleLoader, BundleSource, I18nMetrics, Language, LanguageState, Orchestrator,
    SwitchOutcome, TranslationApplier,
};
use crate::page;
use crate::preferences::PreferenceStore;
use crate::theme::{self, Theme};
use crate::typewriter::{typewriter_text, Typewriter};
use anyhow::Result;
use chrono::Datelike;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub struct Site<D> {
    orchestrator: Orchestrator<D>,
    preferences: Arc<dyn PreferenceStore>,
    typewriter: Typewriter,
    metrics: Arc<I18nMetrics>,
}

impl<D: PageQuery + Send + 'static> Site<D> {
    /// Bring the page up.
    ///
    /// 1. Apply the saved theme
    /// 2. Pick the initial language (stored, then `environment`, then the
    ///    configured fallbacks)
    /// 3. Load its bundle; a failure leaves the page on an empty bundle
    /// 4. Apply translations and the language-dependent page details
    /// 5. Start the typewriter
    pub async fn start(
        config: &Config,
        document: D,
        preferences: Arc<dyn PreferenceStore>,
        source: BundleSource,
        environment: &[String],
    ) -> Self {
        let document = Arc::new(Mutex::new(document));
        let metrics = Arc::new(I18nMetrics::new());

        with_document(&document, |doc| {
            theme::load_saved_theme(doc, preferences.as_ref());
        });

        let state = LanguageState::initialize(
            Arc::clone(&preferences),
            environment,
            &config.fallback_chain(),
        );
        let language = state.get();

        let loader = Arc::new(BundleLoader::new(source, Arc::clone(&metrics)));
        let bundle = match loader.load(language).await {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("Starting without translations for {}: {}", language, e);
                Arc::new(Bundle::new())
            }
        };

        let applier = TranslationApplier::new(config.missing_key_policy, Arc::clone(&metrics));
        with_document(&document, |doc| {
            applier.apply(doc, &bundle, language);
            page::update_language_ui(doc, language);
            page::update_copyright_year(doc, chrono::Local::now().year());
        });

        let orchestrator = Orchestrator::new(
            document,
            loader,
            state,
            applier,
            config.settle_schedule.clone(),
        );

        let site = Self {
            orchestrator,
            preferences,
            typewriter: Typewriter::new(config.typewriter_interval),
            metrics,
        };
        site.restart_typewriter();

        info!("Page started in {}", language);
        site
    }

    /// Switch the page to `language` and wait until it has settled.
    ///
    /// Once the request committed, the language-dependent page details
    /// are brought in line with whatever language is active by then, and
    /// the typewriter restarts with the new text.
    pub async fn switch_language(&self, language: Language) -> SwitchOutcome {
        let outcome = self.orchestrator.switch(language).await;

        if outcome.committed() {
            let active = self.orchestrator.active_language();
            with_document(self.orchestrator.document(), |doc| {
                page::update_language_ui(doc, active);
            });
            self.restart_typewriter();
        }

        outcome
    }

    /// Flip between the light and dark theme.
    pub fn toggle_theme(&self) -> Result<Theme> {
        let mut doc = self
            .orchestrator
            .document()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        theme::toggle_theme(&mut *doc, self.preferences.as_ref())
    }

    pub fn language(&self) -> Language {
        self.orchestrator.active_language()
    }

    pub fn orchestrator(&self) -> &Orchestrator<D> {
        &self.orchestrator
    }

    pub fn document(&self) -> &Arc<Mutex<D>> {
        self.orchestrator.document()
    }

    pub fn typewriter(&self) -> &Typewriter {
        &self.typewriter
    }

    pub fn metrics(&self) -> &Arc<I18nMetrics> {
        &self.metrics
    }

    fn restart_typewriter(&self) {
        let language = self.orchestrator.active_language();
        let bundle = self.orchestrator.loader().cached(language).unwrap_or_default();
        self.typewriter
            .restart(self.orchestrator.document(), typewriter_text(&bundle));
    }
}

fn with_document<D, R>(document: &Arc<Mutex<D>>, f: impl FnOnce(&mut D) -> R) -> R {
    let mut doc = document
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut *doc)
}
