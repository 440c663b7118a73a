//! Resource loader: fetches and caches per-language bundles.

use crate::i18n::{Bundle, I18nMetrics, Language};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure to obtain a bundle for a language.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch bundle for '{code}': {source}")]
    Http {
        code: String,
        source: reqwest::Error,
    },

    #[error("bundle request for '{code}' returned {status}")]
    Status {
        code: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read bundle for '{code}' from {}: {source}", .path.display())]
    Io {
        code: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid bundle JSON for '{code}': {source}")]
    Parse {
        code: String,
        source: serde_json::Error,
    },

    #[error("no bundle available for '{code}'")]
    NotFound { code: String },
}

impl LoadError {
    /// The language code whose bundle could not be loaded.
    pub fn code(&self) -> &str {
        match self {
            LoadError::Http { code, .. }
            | LoadError::Status { code, .. }
            | LoadError::Io { code, .. }
            | LoadError::Parse { code, .. }
            | LoadError::NotFound { code } => code,
        }
    }
}

/// Where bundles come from. Every source is addressed as `{base}/{code}.json`.
#[derive(Debug, Clone)]
pub enum BundleSource {
    /// Static HTTP location, fetched with no-cache semantics
    Http {
        client: reqwest::Client,
        base_url: String,
    },

    /// Local directory containing one JSON file per language
    Directory(PathBuf),

    /// Raw JSON documents keyed by language code
    Memory(HashMap<String, String>),
}

impl BundleSource {
    /// Build a source from a location string.
    ///
    /// `http://` and `https://` locations are fetched over the network, any
    /// other value is treated as a directory path.
    pub fn from_location(location: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let client = reqwest::Client::builder().timeout(timeout).build()?;
            Ok(BundleSource::Http {
                client,
                base_url: location.trim_end_matches('/').to_string(),
            })
        } else {
            Ok(BundleSource::Directory(PathBuf::from(location)))
        }
    }

    /// In-memory source from `(code, json)` pairs.
    pub fn memory<I, K, V>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        BundleSource::Memory(
            documents
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    async fn fetch(&self, code: &str) -> Result<Bundle, LoadError> {
        let raw = match self {
            BundleSource::Http { client, base_url } => {
                let url = format!("{}/{}.json", base_url, code);
                debug!("Fetching bundle {}", url);

                let response = client
                    .get(&url)
                    .header("Cache-Control", "no-store")
                    .header("Pragma", "no-cache")
                    .send()
                    .await
                    .map_err(|source| LoadError::Http {
                        code: code.to_string(),
                        source,
                    })?;

                if !response.status().is_success() {
                    return Err(LoadError::Status {
                        code: code.to_string(),
                        status: response.status(),
                    });
                }

                response.text().await.map_err(|source| LoadError::Http {
                    code: code.to_string(),
                    source,
                })?
            }
            BundleSource::Directory(dir) => {
                let path = dir.join(format!("{}.json", code));
                debug!("Reading bundle {}", path.display());

                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| LoadError::Io {
                        code: code.to_string(),
                        path,
                        source,
                    })?
            }
            BundleSource::Memory(documents) => {
                documents
                    .get(code)
                    .cloned()
                    .ok_or_else(|| LoadError::NotFound {
                        code: code.to_string(),
                    })?
            }
        };

        Bundle::from_json(&raw).map_err(|source| LoadError::Parse {
            code: code.to_string(),
            source,
        })
    }
}

/// Loads bundles from a [`BundleSource`] and caches them per language.
#[derive(Debug)]
pub struct BundleLoader {
    source: BundleSource,
    cache: Mutex<HashMap<Language, Arc<Bundle>>>,
    metrics: Arc<I18nMetrics>,
}

impl BundleLoader {
    pub fn new(source: BundleSource, metrics: Arc<I18nMetrics>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    /// Get the bundle for a language, fetching it on first use.
    pub async fn load(&self, language: Language) -> Result<Arc<Bundle>, LoadError> {
        if let Some(bundle) = self.cached(language) {
            self.metrics.record_cache_hit();
            return Ok(bundle);
        }
        self.fetch_and_cache(language).await
    }

    /// Fetch the bundle again, bypassing the cache.
    ///
    /// The cache entry is only replaced on success; a failed reload leaves
    /// any previously cached bundle in place.
    pub async fn reload(&self, language: Language) -> Result<Arc<Bundle>, LoadError> {
        self.fetch_and_cache(language).await
    }

    /// Return the cached bundle for a language without any I/O.
    pub fn cached(&self, language: Language) -> Option<Arc<Bundle>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&language)
            .cloned()
    }

    /// Seed the cache with a bundle, replacing any existing entry.
    pub fn insert(&self, language: Language, bundle: Bundle) -> Arc<Bundle> {
        let bundle = Arc::new(bundle);
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(language, Arc::clone(&bundle));
        bundle
    }

    pub fn metrics(&self) -> &Arc<I18nMetrics> {
        &self.metrics
    }

    async fn fetch_and_cache(&self, language: Language) -> Result<Arc<Bundle>, LoadError> {
        self.metrics.record_bundle_fetch();

        match self.source.fetch(language.code()).await {
            Ok(bundle) => {
                info!(
                    "Loaded {} bundle ({} keys)",
                    language.name(),
                    bundle.len()
                );
                Ok(self.insert(language, bundle))
            }
            Err(e) => {
                self.metrics.record_load_failure();
                warn!("Bundle load failed: {}", e);
                Err(e)
            }
        }
    }
}
