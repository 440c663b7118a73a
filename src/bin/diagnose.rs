//! Diagnose binary - checks every translation bundle against the default one
//!
//! Usage:
//!   cargo run --bin diagnose              # Check all enabled languages
//!   cargo run --bin diagnose -- --samples # Also print a few keys per bundle
//!   cargo run --bin diagnose -- --page data/page.json
//!                                         # Also list every target of a page manifest
//!                                         # with its key, translation and current text
//!
//! Optional environment variables:
//! - LOCALES_BASE (defaults to ./locales)
//! - DEFAULT_LANGUAGE (defaults to en)
//! - FETCH_TIMEOUT_SECS (defaults to 10)
//!
//! Exits with an error when any bundle fails to load or has missing keys.

use anyhow::{bail, Context, Result};
use futures::future::join_all;
use portfolio_i18n::config::Config;
use portfolio_i18n::document::MemoryDocument;
use portfolio_i18n::i18n::{
    describe_targets, Bundle, BundleLoader, BundleSource, BundleValidator, I18nMetrics, Language,
    LanguageRegistry,
};
use std::sync::Arc;
use tracing::{error, info};

const SAMPLE_KEYS: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portfolio_i18n=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let show_samples = args.iter().any(|arg| arg == "--samples");
    let page_path = match args.iter().position(|arg| arg == "--page") {
        Some(i) => Some(args.get(i + 1).context("--page needs a manifest path")?.clone()),
        None => None,
    };
    let config = Config::from_env()?;

    let source = BundleSource::from_location(&config.locales_base, config.fetch_timeout)
        .context("Failed to build bundle source")?;
    let loader = BundleLoader::new(source, Arc::new(I18nMetrics::new()));

    let languages: Vec<Language> = LanguageRegistry::get()
        .list_enabled()
        .into_iter()
        .filter_map(|lang| Language::from_code(lang.code).ok())
        .collect();

    info!("Loading {} bundles from {}", languages.len(), config.locales_base);
    let results = join_all(languages.iter().map(|&language| loader.load(language))).await;

    let mut failed = false;
    for (language, result) in languages.iter().zip(&results) {
        match result {
            Ok(bundle) => {
                println!("{} ({}): {} keys", language.native_name(), language, bundle.len());
                if show_samples {
                    let mut keys: Vec<&str> = bundle.keys().collect();
                    keys.sort_unstable();
                    for key in keys.into_iter().take(SAMPLE_KEYS) {
                        println!("  {} = {}", key, bundle.get(key).unwrap_or_default());
                    }
                }
            }
            Err(e) => {
                error!("{}", e);
                failed = true;
            }
        }
    }

    let reference = loader
        .cached(config.default_language)
        .with_context(|| format!("Reference bundle '{}' is not available", config.default_language))?;

    for language in languages.iter().filter(|&&l| l != config.default_language) {
        let Some(candidate) = loader.cached(*language) else {
            continue;
        };

        let report = BundleValidator::validate(&reference, &candidate);
        if report.is_clean() {
            println!("\n{}: ✓ complete", language);
            continue;
        }

        println!(
            "\n{}: {} errors, {} warnings",
            language,
            report.errors.len(),
            report.warnings.len()
        );
        for message in &report.errors {
            println!("  ✗ {}", message);
        }
        for message in &report.warnings {
            println!("  ⚠ {}", message);
        }
        failed |= report.has_errors();
    }

    if let Some(path) = &page_path {
        print_targets(path, &reference, config.default_language)?;
    }

    let metrics = loader.metrics().report();
    info!(
        "Fetches: {}, failures: {}",
        metrics.bundle_fetches, metrics.load_failures
    );

    if failed {
        bail!("Translation problems found");
    }
    Ok(())
}

/// Print every translation target of a page manifest: key, the bundle's
/// text for it and what the manifest currently shows.
fn print_targets(path: &str, bundle: &Bundle, language: Language) -> Result<()> {
    let manifest =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let document = MemoryDocument::from_json(&manifest)
        .with_context(|| format!("Invalid page manifest {}", path))?;

    let entries = describe_targets(&document, bundle);
    println!("\n{} targets in {} ({}):", entries.len(), path, language);

    for (index, entry) in entries.iter().enumerate() {
        let tag = document.tag(entry.node).unwrap_or("?");
        let attr = if entry.placeholder_only {
            "data-i18n-placeholder"
        } else {
            "data-i18n"
        };
        println!("  [{}] <{} {}=\"{}\">", index, tag, attr, entry.key);
        println!(
            "      translation: {}",
            entry.translation.as_deref().unwrap_or("(missing)")
        );
        println!(
            "      current:     {}",
            entry.current.as_deref().unwrap_or("(empty)")
        );
    }
    Ok(())
}
