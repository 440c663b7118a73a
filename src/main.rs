//! Render a page manifest in the visitor's language.
//!
//! Usage:
//!   cargo run -- [MANIFEST] [LANGUAGE]
//!
//! MANIFEST defaults to data/page.json. When LANGUAGE is given the page is
//! switched to it after start-up, exactly like clicking a language flag.
//! The rendered manifest is printed to stdout.
//!
//! Optional environment variables:
//! - LOCALES_BASE (defaults to ./locales; http(s) URLs are fetched)
//! - DEFAULT_LANGUAGE (defaults to en)
//! - FALLBACK_LANGUAGES (defaults to en,fr)
//! - PREFERRED_LANGUAGES (defaults to the LANGUAGE/LC_ALL/LC_MESSAGES/LANG locale)
//! - PREFERENCES_FILE (defaults to data/preferences.json)
//! - MISSING_KEY_POLICY (key or keep, defaults to key)
//! - SETTLE_DELAYS_MS (defaults to 0,500,1000)
//! - TYPEWRITER_INTERVAL_MS (defaults to 100)
//! - FETCH_TIMEOUT_SECS (defaults to 10)

use anyhow::{Context, Result};
use portfolio_i18n::config::Config;
use portfolio_i18n::document::MemoryDocument;
use portfolio_i18n::i18n::{environment_languages, BundleSource, Language};
use portfolio_i18n::preferences::FilePreferences;
use portfolio_i18n::site::Site;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portfolio_i18n=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    let mut args = std::env::args().skip(1);
    let manifest_path = args.next().unwrap_or_else(|| "data/page.json".to_string());
    let requested = args
        .next()
        .map(|code| Language::resolve(&code).with_context(|| format!("Unsupported language: {}", code)))
        .transpose()?;

    // Step 1: Read the page
    info!("Reading page manifest {}", manifest_path);
    let manifest = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read {}", manifest_path))?;
    let document = MemoryDocument::from_json(&manifest)
        .with_context(|| format!("Invalid page manifest {}", manifest_path))?;

    // Step 2: Start the page
    let preferences = Arc::new(FilePreferences::open(&config.preferences_file)?);
    let source = BundleSource::from_location(&config.locales_base, config.fetch_timeout)
        .context("Failed to build bundle source")?;
    let environment = config
        .preferred_languages
        .clone()
        .unwrap_or_else(environment_languages);

    let site = Site::start(&config, document, preferences, source, &environment).await;

    // Step 3: Switch language if asked
    if let Some(language) = requested {
        let outcome = site.switch_language(language).await;
        info!("Switch finished: {:?}", outcome.kind);
    }

    // Let the title animation finish so the printed page is final
    while site.typewriter().is_running() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // Step 4: Print the rendered page
    let rendered = site
        .document()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .to_spec();
    println!("{}", serde_json::to_string_pretty(&rendered)?);

    info!(
        "Metrics: {}",
        serde_json::to_string(&site.metrics().report())?
    );
    Ok(())
}
