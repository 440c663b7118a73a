//! Translation pipeline metrics.
//!
//! Counters for bundle fetches, fetch failures, missing keys and applier
//! passes. One `I18nMetrics` is owned by each page context and shared by
//! reference-counted handle, so tests get isolated counters.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters describing the translation pipeline's activity.
#[derive(Debug, Default)]
pub struct I18nMetrics {
    /// Number of bundle fetches that hit the source (cache misses and reloads)
    bundle_fetches: AtomicUsize,

    /// Number of bundle requests served from the cache
    cache_hits: AtomicUsize,

    /// Number of bundle fetches that failed
    load_failures: AtomicUsize,

    /// Number of key lookups that found no translation
    missing_keys: AtomicUsize,

    /// Number of applier passes over the document
    apply_passes: AtomicUsize,
}

impl I18nMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bundle_fetch(&self) {
        self.bundle_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_key(&self) {
        self.missing_keys.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_apply_pass(&self) {
        self.apply_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bundle_fetches(&self) -> usize {
        self.bundle_fetches.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn load_failures(&self) -> usize {
        self.load_failures.load(Ordering::Relaxed)
    }

    pub fn missing_keys(&self) -> usize {
        self.missing_keys.load(Ordering::Relaxed)
    }

    pub fn apply_passes(&self) -> usize {
        self.apply_passes.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let fetches = self.bundle_fetches();
        let failures = self.load_failures();
        let fetch_success_rate = if fetches > 0 {
            (fetches.saturating_sub(failures) as f64 / fetches as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            bundle_fetches: fetches,
            cache_hits: self.cache_hits(),
            load_failures: failures,
            fetch_success_rate,
            missing_keys: self.missing_keys(),
            apply_passes: self.apply_passes(),
        }
    }
}

/// Snapshot of the pipeline counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub bundle_fetches: usize,
    pub cache_hits: usize,
    pub load_failures: usize,

    /// Fetch success rate as a percentage (0-100)
    pub fetch_success_rate: f64,

    pub missing_keys: usize,
    pub apply_passes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = I18nMetrics::new();
        let report = metrics.report();

        assert_eq!(report.bundle_fetches, 0);
        assert_eq!(report.cache_hits, 0);
        assert_eq!(report.load_failures, 0);
        assert_eq!(report.fetch_success_rate, 0.0);
        assert_eq!(report.missing_keys, 0);
        assert_eq!(report.apply_passes, 0);
    }

    #[test]
    fn test_record_increments() {
        let metrics = I18nMetrics::new();

        metrics.record_missing_key();
        metrics.record_missing_key();
        metrics.record_apply_pass();
        metrics.record_cache_hit();

        assert_eq!(metrics.missing_keys(), 2);
        assert_eq!(metrics.apply_passes(), 1);
        assert_eq!(metrics.cache_hits(), 1);
    }

    #[test]
    fn test_fetch_success_rate() {
        let metrics = I18nMetrics::new();

        // 4 fetches, 1 failure = 75% success rate
        for _ in 0..4 {
            metrics.record_bundle_fetch();
        }
        metrics.record_load_failure();

        let report = metrics.report();
        assert_eq!(report.load_failures, 1);
        assert_eq!(report.fetch_success_rate, 75.0);
    }

    #[test]
    fn test_all_fetches_failed() {
        let metrics = I18nMetrics::new();
        metrics.record_bundle_fetch();
        metrics.record_load_failure();

        assert_eq!(metrics.report().fetch_success_rate, 0.0);
    }

    #[test]
    fn test_instances_are_independent() {
        let a = I18nMetrics::new();
        let b = I18nMetrics::new();
        a.record_apply_pass();

        assert_eq!(a.apply_passes(), 1);
        assert_eq!(b.apply_passes(), 0);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = I18nMetrics::new();
        metrics.record_missing_key();

        let json = serde_json::to_value(metrics.report()).expect("serialize");
        assert_eq!(json["missing_keys"], 1);
    }
}
