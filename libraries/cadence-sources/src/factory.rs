//! Source registry and cache
//!
//! One backend instance per kind, created on first request and reused until
//! [`SourceFactory::cleanup`] drops the cache.

use crate::config::SourcesConfig;
use crate::error::{Result, SourceError};
use crate::local::LocalSource;
use crate::output::OutputProvider;
use crate::remote::RemoteSource;
use crate::source::PlaybackSource;
use cadence_core::SourceKind;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

type Constructor = Box<dyn Fn() -> Result<Arc<dyn PlaybackSource>> + Send + Sync>;

/// Creates and caches playback backends
pub struct SourceFactory {
    constructors: Vec<(SourceKind, Constructor)>,
    cache: Mutex<HashMap<SourceKind, Arc<dyn PlaybackSource>>>,
}

impl SourceFactory {
    pub fn builder() -> SourceFactoryBuilder {
        SourceFactoryBuilder::default()
    }

    /// Local always, Remote when enabled
    pub fn from_config(config: &SourcesConfig, provider: Arc<dyn OutputProvider>) -> Self {
        let mut builder = Self::builder();

        let local = config.local.clone();
        let local_provider = Arc::clone(&provider);
        builder = builder.register(SourceKind::Local, move || {
            let source: Arc<dyn PlaybackSource> =
                Arc::new(LocalSource::new(local.clone(), Arc::clone(&local_provider)));
            Ok(source)
        });

        if config.remote.enabled {
            let remote = config.remote.clone();
            builder = builder.register(SourceKind::Remote, move || {
                let source: Arc<dyn PlaybackSource> =
                    Arc::new(RemoteSource::from_config(&remote, Arc::clone(&provider))?);
                Ok(source)
            });
        }

        builder.build()
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<SourceKind, Arc<dyn PlaybackSource>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached backend for `kind`, constructing it on first use
    pub fn create_source(&self, kind: SourceKind) -> Result<Arc<dyn PlaybackSource>> {
        let mut cache = self.cache();
        if let Some(source) = cache.get(&kind) {
            return Ok(Arc::clone(source));
        }

        let (_, constructor) = self
            .constructors
            .iter()
            .find(|(k, _)| *k == kind)
            .ok_or_else(|| SourceError::UnsupportedSourceKind(kind.to_string()))?;

        let source = constructor()?;
        debug!(kind = %kind, "Created source backend");
        cache.insert(kind, Arc::clone(&source));
        Ok(source)
    }

    /// Like [`create_source`](Self::create_source), parsing the kind first
    pub fn create_source_named(&self, name: &str) -> Result<Arc<dyn PlaybackSource>> {
        let kind = name
            .parse::<SourceKind>()
            .map_err(|_| SourceError::UnsupportedSourceKind(name.to_string()))?;
        self.create_source(kind)
    }

    /// Registered kinds, Local first
    pub fn available_kinds(&self) -> Vec<SourceKind> {
        let mut kinds: Vec<_> = self.constructors.iter().map(|(kind, _)| *kind).collect();
        kinds.sort();
        kinds
    }

    /// Clean up every cached backend concurrently and empty the cache
    ///
    /// Every backend is cleaned even when some fail; the first failure is
    /// returned.
    pub async fn cleanup(&self) -> Result<()> {
        let sources: Vec<_> = self.cache().drain().map(|(_, source)| source).collect();
        if sources.is_empty() {
            return Ok(());
        }

        info!(count = sources.len(), "Cleaning up source backends");
        let results = join_all(sources.iter().map(|source| source.cleanup())).await;

        let mut first_error = None;
        for (source, result) in sources.iter().zip(results) {
            if let Err(e) = result {
                warn!(kind = %source.kind(), error = %e, "Source cleanup failed");
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Builder for [`SourceFactory`]
#[derive(Default)]
pub struct SourceFactoryBuilder {
    constructors: Vec<(SourceKind, Constructor)>,
}

impl SourceFactoryBuilder {
    /// Register (or replace) the constructor for `kind`
    pub fn register<F>(mut self, kind: SourceKind, constructor: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn PlaybackSource>> + Send + Sync + 'static,
    {
        self.constructors.retain(|(k, _)| *k != kind);
        self.constructors.push((kind, Box::new(constructor)));
        self
    }

    pub fn build(self) -> SourceFactory {
        SourceFactory {
            constructors: self.constructors,
            cache: Mutex::new(HashMap::new()),
        }
    }
}
