//! Dependency Loader and Loaded Module Cache
//!
//! The cache is the process-wide "what has been fetched" table, keyed by
//! resource locator. It is injectable (so tests can reset or share it)
//! rather than ambient global state, append-only, and never evicted.
//! Invariant: a locator is fetched at most once — concurrent requests for
//! the same locator join the in-flight load instead of issuing a second
//! fetch. Each slot is a `tokio::sync::OnceCell`, which gives exactly that
//! join-don't-refetch behavior.
//!
//! The loader resolves a scanned capability list against the registry and
//! brings every required locator into the cache. One unsupported capability
//! aborts the whole request before any loading begins, so the host is never
//! left with a half-initialized scope. A fetch failure is fatal for the
//! request and is not retried automatically (a later request may retry,
//! since a failed slot stays empty).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use jsx_preview_types::{DependencySource, Descriptor, PreviewError};

use crate::fetcher::ResourceFetcher;
use crate::registry::DependencyRegistry;

type Slot = Arc<OnceCell<Arc<str>>>;

/// Locator-keyed cache of fetched module sources.
#[derive(Default)]
pub struct ModuleCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, locator: &str) -> Slot {
        self.slots
            .lock()
            .entry(locator.to_string())
            .or_default()
            .clone()
    }

    /// The cached source for a locator, if its load has completed.
    pub fn get(&self, locator: &str) -> Option<Arc<str>> {
        self.slots
            .lock()
            .get(locator)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.get(locator).is_some()
    }

    /// Number of completed loads.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the source for `locator`, fetching it if this is the first
    /// request. Returns the source and whether this call performed the
    /// fetch. Concurrent callers for the same locator converge on one
    /// in-flight fetch; on failure the slot stays empty.
    pub async fn get_or_load(
        &self,
        locator: &str,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> anyhow::Result<(Arc<str>, bool)> {
        let slot = self.slot(locator);
        let mut fetched = false;
        let source = slot
            .get_or_try_init(|| {
                fetched = true;
                let locator = locator.to_string();
                async move {
                    let body =
                        tokio::task::spawn_blocking(move || fetcher.fetch(&locator)).await??;
                    Ok::<Arc<str>, anyhow::Error>(Arc::from(body))
                }
            })
            .await?
            .clone();
        Ok((source, fetched))
    }
}

/// One script that must be evaluated to make a capability available.
///
/// `key` identifies the script for once-per-context registration: the
/// locator for remote scripts, a `builtin:` tag for bundled ones.
#[derive(Debug, Clone)]
pub struct LoadedScript {
    pub key: String,
    pub source: Arc<str>,
}

/// A capability with all of its scripts present.
#[derive(Debug, Clone)]
pub struct LoadedCapability {
    pub name: String,
    /// Scope global the scripts register their module value under.
    pub global: String,
    pub scripts: Vec<LoadedScript>,
}

/// Result of one loader call.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Requested capabilities, each with every script ready, in request
    /// order.
    pub capabilities: Vec<LoadedCapability>,
    /// Locators fetched by this call (cache misses only).
    pub newly_loaded: Vec<String>,
    /// Whether all required capabilities are now ready.
    pub ready: bool,
}

/// Resolves capability names and brings their resources into the cache.
pub struct DependencyLoader {
    registry: Arc<DependencyRegistry>,
    cache: Arc<ModuleCache>,
    fetcher: Arc<dyn ResourceFetcher>,
}

impl DependencyLoader {
    pub fn new(
        registry: Arc<DependencyRegistry>,
        cache: Arc<ModuleCache>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        Self {
            registry,
            cache,
            fetcher,
        }
    }

    /// Make every requested capability ready.
    ///
    /// Resolution happens for the full list before any fetch is issued;
    /// the first unsupported name aborts with zero fetches. Safe to call
    /// repeatedly — already-cached locators are not refetched.
    pub async fn ensure(&self, names: &[String]) -> Result<LoadReport, PreviewError> {
        let mut resolved: Vec<(String, Descriptor)> = Vec::with_capacity(names.len());
        for name in names {
            match self.registry.lookup(name) {
                Some(descriptor) => resolved.push((name.clone(), descriptor.clone())),
                None => {
                    return Err(PreviewError::UnsupportedCapability {
                        capability: name.clone(),
                    })
                }
            }
        }

        let mut report = LoadReport::default();
        for (name, descriptor) in resolved {
            let mut scripts = Vec::new();
            match descriptor.source {
                DependencySource::Builtin { source } => {
                    debug!(capability = %name, "capability is builtin; no load needed");
                    scripts.push(LoadedScript {
                        key: format!("builtin:{}", name),
                        source: Arc::from(source),
                    });
                }
                DependencySource::Remote { locators } => {
                    for locator in locators {
                        let (source, fetched) = self
                            .cache
                            .get_or_load(&locator, self.fetcher.clone())
                            .await
                            .map_err(|err| PreviewError::DependencyLoadFailed {
                                capability: name.clone(),
                                locator: locator.clone(),
                                reason: format!("{:#}", err),
                            })?;
                        if fetched {
                            info!(capability = %name, locator = %locator, origin = self.fetcher.origin(), "loaded dependency resource");
                            report.newly_loaded.push(locator.clone());
                        } else {
                            debug!(capability = %name, locator = %locator, "dependency resource already cached");
                        }
                        scripts.push(LoadedScript {
                            key: locator,
                            source,
                        });
                    }
                }
            }
            report.capabilities.push(LoadedCapability {
                name,
                global: descriptor.global,
                scripts,
            });
        }
        report.ready = true;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::MockFetcher;

    fn loader_with(
        registry: DependencyRegistry,
        fetcher: MockFetcher,
    ) -> (DependencyLoader, Arc<ModuleCache>, Arc<MockFetcher>) {
        let cache = Arc::new(ModuleCache::new());
        let fetcher = Arc::new(fetcher);
        let loader = DependencyLoader::new(
            Arc::new(registry),
            cache.clone(),
            fetcher.clone() as Arc<dyn ResourceFetcher>,
        );
        (loader, cache, fetcher)
    }

    #[tokio::test]
    async fn unsupported_capability_aborts_with_zero_fetches() {
        let mut registry = DependencyRegistry::empty();
        registry.insert_remote("react", "React", vec!["https://cdn.test/react.js".into()]);
        let mut mock = MockFetcher::new();
        mock.add_response("https://cdn.test/react.js", "globalThis.React = {};");
        let (loader, _, fetcher) = loader_with(registry, mock);

        let err = loader
            .ensure(&["react".into(), "chart-lib".into()])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PreviewError::UnsupportedCapability {
                capability: "chart-lib".into()
            }
        );
        assert_eq!(fetcher.fetch_count(), 0);
    }

    #[tokio::test]
    async fn capability_with_two_locators_needs_both() {
        let mut registry = DependencyRegistry::empty();
        registry.insert_remote(
            "chart.js",
            "Chart",
            vec![
                "https://cdn.test/chart.js".into(),
                "https://cdn.test/chart.theme.js".into(),
            ],
        );
        let mut mock = MockFetcher::new();
        mock.add_response("https://cdn.test/chart.js", "globalThis.Chart = {};");
        mock.add_response("https://cdn.test/chart.theme.js", "Chart.theme = 'plain';");
        let (loader, cache, _) = loader_with(registry, mock);

        let report = loader.ensure(&["chart.js".into()]).await.unwrap();
        assert!(report.ready);
        assert_eq!(report.newly_loaded.len(), 2);
        assert_eq!(report.capabilities[0].scripts.len(), 2);
        assert!(cache.contains("https://cdn.test/chart.js"));
        assert!(cache.contains("https://cdn.test/chart.theme.js"));
    }

    #[tokio::test]
    async fn load_failure_names_capability_and_locator() {
        let mut registry = DependencyRegistry::empty();
        registry.insert_remote("axios", "axios", vec!["https://cdn.test/axios.js".into()]);
        let mut mock = MockFetcher::new();
        mock.set_error("connection refused");
        let (loader, _, _) = loader_with(registry, mock);

        let err = loader.ensure(&["axios".into()]).await.unwrap_err();
        match err {
            PreviewError::DependencyLoadFailed {
                capability,
                locator,
                reason,
            } => {
                assert_eq!(capability, "axios");
                assert_eq!(locator, "https://cdn.test/axios.js");
                assert!(reason.contains("connection refused"));
            }
            other => panic!("expected DependencyLoadFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn repeated_ensure_does_not_refetch() {
        let mut registry = DependencyRegistry::empty();
        registry.insert_remote("react", "React", vec!["https://cdn.test/react.js".into()]);
        let mut mock = MockFetcher::new();
        mock.add_response("https://cdn.test/react.js", "globalThis.React = {};");
        let (loader, _, fetcher) = loader_with(registry, mock);

        let first = loader.ensure(&["react".into()]).await.unwrap();
        assert_eq!(first.newly_loaded.len(), 1);
        let second = loader.ensure(&["react".into()]).await.unwrap();
        assert!(second.ready);
        assert!(second.newly_loaded.is_empty());
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn builtin_capability_is_ready_without_fetching() {
        let mut registry = DependencyRegistry::empty();
        registry.insert_builtin("widgets", "Widgets", "globalThis.Widgets = {};");
        let (loader, cache, fetcher) = loader_with(registry, MockFetcher::new());

        let report = loader.ensure(&["widgets".into()]).await.unwrap();
        assert!(report.ready);
        assert!(report.newly_loaded.is_empty());
        assert_eq!(report.capabilities[0].scripts[0].key, "builtin:widgets");
        assert_eq!(fetcher.fetch_count(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_loads_of_one_locator_fetch_once() {
        struct SlowFetcher(MockFetcher);
        impl ResourceFetcher for SlowFetcher {
            fn fetch(&self, locator: &str) -> anyhow::Result<String> {
                std::thread::sleep(std::time::Duration::from_millis(50));
                self.0.fetch(locator)
            }
            fn origin(&self) -> &str {
                "slow-mock"
            }
        }

        let mut mock = MockFetcher::new();
        mock.add_response("https://cdn.test/lib.js", "globalThis.Lib = {};");
        let fetcher = Arc::new(SlowFetcher(mock));
        let cache = Arc::new(ModuleCache::new());

        let a = {
            let cache = cache.clone();
            let fetcher = fetcher.clone() as Arc<dyn ResourceFetcher>;
            tokio::spawn(
                async move { cache.get_or_load("https://cdn.test/lib.js", fetcher).await },
            )
        };
        let b = {
            let cache = cache.clone();
            let fetcher = fetcher.clone() as Arc<dyn ResourceFetcher>;
            tokio::spawn(
                async move { cache.get_or_load("https://cdn.test/lib.js", fetcher).await },
            )
        };

        let (source_a, _) = a.await.unwrap().unwrap();
        let (source_b, _) = b.await.unwrap().unwrap();
        assert_eq!(source_a, source_b);
        assert_eq!(fetcher.0.fetch_count(), 1);
    }

    #[tokio::test]
    async fn failed_slot_stays_empty_for_a_later_retry() {
        let mut registry = DependencyRegistry::empty();
        registry.insert_remote("lodash", "_", vec!["https://cdn.test/lodash.js".into()]);

        let cache = Arc::new(ModuleCache::new());
        let mut failing = MockFetcher::new();
        failing.set_error("timeout");
        let loader = DependencyLoader::new(
            Arc::new(registry.clone()),
            cache.clone(),
            Arc::new(failing) as Arc<dyn ResourceFetcher>,
        );
        assert!(loader.ensure(&["lodash".into()]).await.is_err());
        assert!(!cache.contains("https://cdn.test/lodash.js"));

        let mut working = MockFetcher::new();
        working.add_response("https://cdn.test/lodash.js", "globalThis._ = {};");
        let loader = DependencyLoader::new(
            Arc::new(registry),
            cache.clone(),
            Arc::new(working) as Arc<dyn ResourceFetcher>,
        );
        let report = loader.ensure(&["lodash".into()]).await.unwrap();
        assert!(report.ready);
        assert!(cache.contains("https://cdn.test/lodash.js"));
    }
}
