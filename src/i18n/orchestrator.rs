//! Language switch orchestrator.
//!
//! A switch runs `Idle → Loading → Applying → Idle`: force-reload the target
//! bundle, commit the language, apply it, then run the settle schedule. The
//! returned future resolves only once the switch has settled, which is the
//! completion signal callers wait on.
//!
//! Requests may overlap. Each request takes a ticket when it is made; a
//! request overtaken by a newer one before its commit gives up without
//! committing, so the latest request always decides the final language.
//! Settle passes apply whatever language is active when they fire.

use crate::document::Document;
use crate::i18n::{
    ApplyReport, Bundle, BundleLoader, Language, LanguageState, TranslationApplier,
};
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Orchestrator state, observable through [`Orchestrator::phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPhase {
    Idle,
    Loading,
    Applying,
}

/// Extra applier passes run after a switch commits.
///
/// Delays are measured from the commit. The switch is settled once the last
/// pass has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleSchedule {
    delays: Vec<Duration>,
}

impl SettleSchedule {
    pub fn new(mut delays: Vec<Duration>) -> Self {
        delays.sort();
        Self { delays }
    }

    /// No extra passes: the switch settles right after the first apply.
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }

    /// Re-apply immediately, then at 500 ms and 1 s after the commit.
    pub fn staggered() -> Self {
        Self::new(vec![
            Duration::ZERO,
            Duration::from_millis(500),
            Duration::from_millis(1000),
        ])
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }
}

impl Default for SettleSchedule {
    fn default() -> Self {
        Self::staggered()
    }
}

impl FromStr for SettleSchedule {
    type Err = anyhow::Error;

    /// Parse a comma separated list of millisecond delays (`"0,500,1000"`).
    /// An empty string means no extra passes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let delays = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|e| anyhow::anyhow!("Invalid settle delay '{}': {}", part, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(delays))
    }
}

/// How a switch request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchKind {
    /// Target was already active; targets were re-applied
    Refreshed,
    /// Fresh bundle loaded and committed
    Switched,
    /// Fresh reload failed; committed with the best bundle available
    Degraded { error: String },
    /// A newer request started before this one committed
    Superseded,
}

/// Result of a settled switch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub language: Language,
    pub kind: SwitchKind,
    /// Report of the first apply after commit (empty when superseded)
    pub report: ApplyReport,
    /// Settle passes run after the first apply
    pub settle_passes: usize,
}

impl SwitchOutcome {
    /// Whether this request's language was committed.
    pub fn committed(&self) -> bool {
        !matches!(self.kind, SwitchKind::Superseded)
    }
}

struct Inner<D> {
    document: Arc<Mutex<D>>,
    loader: Arc<BundleLoader>,
    state: LanguageState,
    applier: TranslationApplier,
    schedule: SettleSchedule,
    phase: watch::Sender<SwitchPhase>,
    latest_ticket: AtomicU64,
    in_flight: AtomicUsize,
}

/// Coordinates language switches for one page.
pub struct Orchestrator<D> {
    inner: Arc<Inner<D>>,
}

impl<D> Clone for Orchestrator<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Document + Send + 'static> Orchestrator<D> {
    pub fn new(
        document: Arc<Mutex<D>>,
        loader: Arc<BundleLoader>,
        state: LanguageState,
        applier: TranslationApplier,
        schedule: SettleSchedule,
    ) -> Self {
        let (phase, _) = watch::channel(SwitchPhase::Idle);
        Self {
            inner: Arc::new(Inner {
                document,
                loader,
                state,
                applier,
                schedule,
                phase,
                latest_ticket: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn document(&self) -> &Arc<Mutex<D>> {
        &self.inner.document
    }

    pub fn loader(&self) -> &Arc<BundleLoader> {
        &self.inner.loader
    }

    pub fn state(&self) -> &LanguageState {
        &self.inner.state
    }

    pub fn active_language(&self) -> Language {
        self.inner.state.get()
    }

    /// Observe the orchestrator's phase.
    pub fn phase(&self) -> watch::Receiver<SwitchPhase> {
        self.inner.phase.subscribe()
    }

    /// Re-apply the active language's cached bundle to every target.
    ///
    /// Keys resolve against an empty bundle when nothing is cached, so the
    /// missing-key policy decides what is shown.
    pub fn refresh(&self) -> ApplyReport {
        let language = self.inner.state.get();
        let bundle = self.inner.loader.cached(language).unwrap_or_default();
        self.apply(&bundle, language)
    }

    /// Switch the page to `language`; the future resolves once the switch
    /// has settled.
    ///
    /// The request takes its ticket when this method is called, not when the
    /// future is first polled, so request order is call order.
    pub fn switch(
        &self,
        language: Language,
    ) -> impl Future<Output = SwitchOutcome> + Send + 'static {
        let ticket = self.inner.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let orchestrator = self.clone();
        async move { orchestrator.run(ticket, language).await }
    }

    /// Start a switch in the background.
    pub fn spawn_switch(&self, language: Language) -> JoinHandle<SwitchOutcome> {
        tokio::spawn(self.switch(language))
    }

    async fn run(&self, ticket: u64, language: Language) -> SwitchOutcome {
        let previous = self.inner.state.get();

        if language == previous {
            info!("{} already active, forcing refresh", language);
            let bundle = self.active_bundle(language).await;
            if self.inner.latest_ticket.load(Ordering::SeqCst) != ticket {
                debug!("Refresh of {} superseded by a newer request", language);
                return SwitchOutcome {
                    language,
                    kind: SwitchKind::Superseded,
                    report: ApplyReport::default(),
                    settle_passes: 0,
                };
            }
            let report = self.apply(&bundle, language);
            return SwitchOutcome {
                language,
                kind: SwitchKind::Refreshed,
                report,
                settle_passes: 0,
            };
        }

        info!("Switching language: {} -> {}", previous, language);
        self.begin();

        let (bundle, kind) = match self.inner.loader.reload(language).await {
            Ok(bundle) => (bundle, SwitchKind::Switched),
            Err(e) => {
                warn!(
                    "Fresh load of {} failed ({}), activating with best available bundle",
                    language, e
                );
                let bundle = match self.inner.loader.load(language).await {
                    Ok(bundle) => bundle,
                    Err(_) => Arc::new(Bundle::new()),
                };
                (
                    bundle,
                    SwitchKind::Degraded {
                        error: e.to_string(),
                    },
                )
            }
        };

        if self.inner.latest_ticket.load(Ordering::SeqCst) != ticket {
            debug!("Switch to {} superseded by a newer request", language);
            self.finish();
            return SwitchOutcome {
                language,
                kind: SwitchKind::Superseded,
                report: ApplyReport::default(),
                settle_passes: 0,
            };
        }

        self.inner.phase.send_replace(SwitchPhase::Applying);
        self.inner.state.set(language);
        let committed_at = Instant::now();
        let report = self.apply(&bundle, language);

        let mut settle_passes = 0;
        for delay in self.inner.schedule.delays() {
            sleep_until(committed_at + *delay).await;
            self.refresh();
            settle_passes += 1;
        }

        self.finish();
        info!(
            "Language switch to {} settled ({} settle passes)",
            language, settle_passes
        );

        SwitchOutcome {
            language,
            kind,
            report,
            settle_passes,
        }
    }

    /// Cached bundle for `language`, loading it when nothing is cached yet.
    async fn active_bundle(&self, language: Language) -> Arc<Bundle> {
        if let Some(bundle) = self.inner.loader.cached(language) {
            return bundle;
        }
        match self.inner.loader.load(language).await {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("Could not load active language {} ({}), showing keys", language, e);
                Arc::new(Bundle::new())
            }
        }
    }

    fn apply(&self, bundle: &Bundle, language: Language) -> ApplyReport {
        let mut document = self
            .inner
            .document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.inner.applier.apply(&mut *document, bundle, language)
    }

    fn begin(&self) {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        self.inner.phase.send_replace(SwitchPhase::Loading);
    }

    fn finish(&self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.phase.send_replace(SwitchPhase::Idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementSpec, MemoryDocument, PageQuery};
    use crate::i18n::{BundleSource, I18nMetrics, MissingKeyPolicy};
    use crate::preferences::{MemoryPreferences, PreferenceStore, LANGUAGE_KEY};

    const EN: &str = r#"{"hero-title": "Hello", "nav-about": "About"}"#;
    const FR: &str = r#"{"hero-title": "Bonjour", "nav-about": "À propos"}"#;

    fn page() -> MemoryDocument {
        MemoryDocument::from_spec(
            &ElementSpec::new("body")
                .with_child(ElementSpec::new("h1").with_id("title").with_key("hero-title"))
                .with_child(ElementSpec::new("a").with_id("about").with_key("nav-about")),
        )
    }

    fn orchestrator(
        source: BundleSource,
        initial: Language,
        schedule: SettleSchedule,
    ) -> (Orchestrator<MemoryDocument>, Arc<MemoryPreferences>) {
        let metrics = Arc::new(I18nMetrics::new());
        let prefs = Arc::new(MemoryPreferences::new());
        let orchestrator = Orchestrator::new(
            Arc::new(Mutex::new(page())),
            Arc::new(BundleLoader::new(source, Arc::clone(&metrics))),
            LanguageState::new(initial, prefs.clone()),
            TranslationApplier::new(MissingKeyPolicy::UseKey, metrics),
            schedule,
        );
        (orchestrator, prefs)
    }

    fn text(orchestrator: &Orchestrator<MemoryDocument>, id: &str) -> String {
        let doc = orchestrator.document().lock().unwrap();
        let node = doc.element_by_id(id).unwrap();
        doc.content(node).unwrap().to_string()
    }

    // ==================== SettleSchedule Tests ====================

    #[test]
    fn test_schedule_parse() {
        let schedule: SettleSchedule = "1000, 0,500".parse().unwrap();
        assert_eq!(schedule, SettleSchedule::staggered());
        assert!("".parse::<SettleSchedule>().unwrap().is_empty());
        assert!("0,soon".parse::<SettleSchedule>().is_err());
    }

    #[test]
    fn test_default_schedule_spans_one_second() {
        let schedule = SettleSchedule::default();
        assert_eq!(schedule.delays().len(), 3);
        assert_eq!(schedule.delays()[0], Duration::ZERO);
        assert_eq!(*schedule.delays().last().unwrap(), Duration::from_secs(1));
    }

    // ==================== Switch Tests ====================

    #[tokio::test]
    async fn test_switch_applies_new_language() {
        let (orchestrator, prefs) = orchestrator(
            BundleSource::memory([("en", EN), ("fr", FR)]),
            Language::ENGLISH,
            SettleSchedule::none(),
        );

        let outcome = orchestrator.switch(Language::FRENCH).await;

        assert_eq!(outcome.kind, SwitchKind::Switched);
        assert!(outcome.committed());
        assert_eq!(orchestrator.active_language(), Language::FRENCH);
        assert_eq!(text(&orchestrator, "title"), "Bonjour");
        assert_eq!(text(&orchestrator, "about"), "À propos");
        assert_eq!(prefs.get(LANGUAGE_KEY).as_deref(), Some("fr"));
        assert_eq!(*orchestrator.phase().borrow(), SwitchPhase::Idle);
    }

    #[tokio::test]
    async fn test_switch_to_active_language_forces_refresh() {
        let (orchestrator, _) = orchestrator(
            BundleSource::memory([("fr", FR)]),
            Language::FRENCH,
            SettleSchedule::staggered(),
        );
        orchestrator.loader().load(Language::FRENCH).await.unwrap();

        // Content drifted away from the active language
        {
            let mut doc = orchestrator.document().lock().unwrap();
            let node = doc.element_by_id("title").unwrap();
            doc.set_content(node, "stale");
        }

        let outcome = orchestrator.switch(Language::FRENCH).await;

        assert_eq!(outcome.kind, SwitchKind::Refreshed);
        assert_eq!(outcome.report.writes, 2);
        assert_eq!(text(&orchestrator, "title"), "Bonjour");
    }

    #[tokio::test]
    async fn test_switch_to_active_language_loads_uncached_bundle() {
        let (orchestrator, prefs) = orchestrator(
            BundleSource::memory([("en", EN)]),
            Language::ENGLISH,
            SettleSchedule::none(),
        );
        assert!(orchestrator.loader().cached(Language::ENGLISH).is_none());

        let outcome = orchestrator.switch(Language::ENGLISH).await;

        assert_eq!(outcome.kind, SwitchKind::Refreshed);
        assert_eq!(text(&orchestrator, "title"), "Hello");
        assert_eq!(text(&orchestrator, "about"), "About");
        assert!(outcome.report.missing.is_empty());
        assert_eq!(orchestrator.loader().metrics().bundle_fetches(), 1);
        assert_eq!(prefs.get(LANGUAGE_KEY), None);

        // Cached now, so a second refresh does not fetch again
        orchestrator.switch(Language::ENGLISH).await;
        assert_eq!(orchestrator.loader().metrics().bundle_fetches(), 1);
    }

    #[tokio::test]
    async fn test_switch_to_active_language_without_bundle_shows_keys() {
        let (orchestrator, _) = orchestrator(
            BundleSource::memory([("fr", FR)]),
            Language::ENGLISH,
            SettleSchedule::none(),
        );

        let outcome = orchestrator.switch(Language::ENGLISH).await;

        assert_eq!(outcome.kind, SwitchKind::Refreshed);
        assert_eq!(text(&orchestrator, "title"), "hero-title");
        assert_eq!(outcome.report.missing.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_matches_fresh_reload() {
        let (orchestrator, _) = orchestrator(
            BundleSource::memory([("en", EN), ("fr", FR)]),
            Language::ENGLISH,
            SettleSchedule::none(),
        );
        orchestrator.switch(Language::FRENCH).await;
        let after_switch = orchestrator.document().lock().unwrap().to_spec();

        orchestrator.switch(Language::FRENCH).await;

        assert_eq!(orchestrator.document().lock().unwrap().to_spec(), after_switch);
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_to_cached_partial_bundle() {
        let (orchestrator, _) = orchestrator(
            BundleSource::memory([("en", EN)]),
            Language::ENGLISH,
            SettleSchedule::none(),
        );
        orchestrator
            .loader()
            .insert(Language::FRENCH, [("hero-title", "Bonjour")].into_iter().collect());

        let outcome = orchestrator.switch(Language::FRENCH).await;

        assert!(matches!(outcome.kind, SwitchKind::Degraded { .. }));
        assert_eq!(orchestrator.active_language(), Language::FRENCH);
        assert_eq!(text(&orchestrator, "title"), "Bonjour");
        assert_eq!(text(&orchestrator, "about"), "nav-about");
        assert_eq!(outcome.report.missing, vec!["nav-about"]);
        assert_eq!(orchestrator.loader().metrics().missing_keys(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_without_cache_shows_keys() {
        let (orchestrator, _) = orchestrator(
            BundleSource::memory([("en", EN)]),
            Language::ENGLISH,
            SettleSchedule::none(),
        );

        let outcome = orchestrator.switch(Language::FRENCH).await;

        match outcome.kind {
            SwitchKind::Degraded { error } => assert!(error.contains("fr")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(orchestrator.active_language(), Language::FRENCH);
        assert_eq!(text(&orchestrator, "title"), "hero-title");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_passes_run_on_schedule() {
        let (orchestrator, _) = orchestrator(
            BundleSource::memory([("en", EN), ("fr", FR)]),
            Language::ENGLISH,
            SettleSchedule::staggered(),
        );
        let started = Instant::now();

        let outcome = orchestrator.switch(Language::FRENCH).await;

        assert_eq!(outcome.settle_passes, 3);
        assert!(started.elapsed() >= Duration::from_secs(1));
        // One commit apply plus three settle passes
        assert_eq!(orchestrator.loader().metrics().apply_passes(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_resolves_only_after_settling() {
        let (orchestrator, _) = orchestrator(
            BundleSource::memory([("en", EN), ("fr", FR)]),
            Language::ENGLISH,
            SettleSchedule::staggered(),
        );

        let mut switch = tokio_test::task::spawn(orchestrator.switch(Language::FRENCH));
        tokio_test::assert_pending!(switch.poll());

        // Committed and applied, but still inside the settle window
        assert_eq!(orchestrator.active_language(), Language::FRENCH);
        assert_eq!(text(&orchestrator, "title"), "Bonjour");

        tokio::time::advance(Duration::from_millis(1001)).await;
        let outcome = tokio_test::assert_ready!(switch.poll());
        assert_eq!(outcome.settle_passes, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_transitions() {
        let (orchestrator, _) = orchestrator(
            BundleSource::memory([("en", EN), ("fr", FR)]),
            Language::ENGLISH,
            SettleSchedule::staggered(),
        );
        let mut phase = orchestrator.phase();

        let handle = orchestrator.spawn_switch(Language::FRENCH);
        phase
            .wait_for(|p| *p == SwitchPhase::Applying)
            .await
            .unwrap();
        assert_eq!(orchestrator.active_language(), Language::FRENCH);

        phase.wait_for(|p| *p == SwitchPhase::Idle).await.unwrap();
        assert_eq!(handle.await.unwrap().settle_passes, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_succession_settles_on_latest_request() {
        let (orchestrator, prefs) = orchestrator(
            BundleSource::memory([("en", EN), ("fr", FR)]),
            Language::ENGLISH,
            SettleSchedule::staggered(),
        );

        let to_french = orchestrator.spawn_switch(Language::FRENCH);
        let to_english = orchestrator.spawn_switch(Language::ENGLISH);

        let french = to_french.await.unwrap();
        let english = to_english.await.unwrap();

        assert_eq!(orchestrator.active_language(), Language::ENGLISH);
        assert_eq!(text(&orchestrator, "title"), "Hello");
        assert_eq!(prefs.get(LANGUAGE_KEY).as_deref(), Some("en"));
        assert!(french.committed() || english.committed());
        assert_eq!(*orchestrator.phase().borrow(), SwitchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_settle_passes_follow_active_language() {
        let (orchestrator, _) = orchestrator(
            BundleSource::memory([("en", EN), ("fr", FR)]),
            Language::ENGLISH,
            SettleSchedule::staggered(),
        );

        // French commits and starts its settle window
        let to_french = orchestrator.spawn_switch(Language::FRENCH);
        let mut phase = orchestrator.phase();
        phase
            .wait_for(|p| *p == SwitchPhase::Applying)
            .await
            .unwrap();

        // English arrives while French is still settling
        tokio::time::sleep(Duration::from_millis(200)).await;
        let english = orchestrator.switch(Language::ENGLISH).await;
        let french = to_french.await.unwrap();

        assert_eq!(english.kind, SwitchKind::Switched);
        assert_eq!(french.kind, SwitchKind::Switched);
        assert_eq!(orchestrator.active_language(), Language::ENGLISH);
        assert_eq!(text(&orchestrator, "title"), "Hello");
        assert_eq!(text(&orchestrator, "about"), "About");
    }
}
