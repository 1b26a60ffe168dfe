//! Preview Pipeline
//!
//! Drives one snippet through scan, load, transform, execute, render and
//! delivers at most one outcome per submission. Submissions supersede:
//! each one takes the next generation number, and a request that is no
//! longer the newest publishes nothing and returns no outcome — its only
//! lasting effect is whatever it left in the module cache.
//!
//! Stage transitions are broadcast on a watch channel tagged with the
//! generation they belong to, so an observer can ignore snapshots from
//! requests it has moved past.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use jsx_preview_types::{
    PipelineStage, PreviewError, PreviewOutcome, RenderedPreview,
};

use crate::fetcher::ResourceFetcher;
use crate::loader::{DependencyLoader, ModuleCache};
use crate::normalize;
use crate::registry::DependencyRegistry;
use crate::sandbox::{self, HostRuntime, ScriptHost};
use crate::scanner;
use crate::supervisor;
use crate::transform::SourceTransformer;

/// One observed point of one request's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSnapshot {
    pub generation: u64,
    pub stage: PipelineStage,
}

/// The engine: long-lived pipeline state shared across submissions.
pub struct PreviewEngine {
    loader: DependencyLoader,
    cache: Arc<ModuleCache>,
    transformer: Arc<dyn SourceTransformer>,
    runtime: HostRuntime,
    generation: Arc<AtomicU64>,
    stage_tx: watch::Sender<StageSnapshot>,
}

impl PreviewEngine {
    pub fn new(
        registry: Arc<DependencyRegistry>,
        fetcher: Arc<dyn ResourceFetcher>,
        transformer: Arc<dyn SourceTransformer>,
    ) -> Self {
        Self::with_cache(registry, Arc::new(ModuleCache::new()), fetcher, transformer)
    }

    /// Build an engine around an existing cache, so several engines (or a
    /// test) can share fetched resources.
    pub fn with_cache(
        registry: Arc<DependencyRegistry>,
        cache: Arc<ModuleCache>,
        fetcher: Arc<dyn ResourceFetcher>,
        transformer: Arc<dyn SourceTransformer>,
    ) -> Self {
        let (stage_tx, _) = watch::channel(StageSnapshot {
            generation: 0,
            stage: PipelineStage::Idle,
        });
        Self {
            loader: DependencyLoader::new(registry, cache.clone(), fetcher),
            cache,
            transformer,
            runtime: HostRuntime::default(),
            generation: Arc::new(AtomicU64::new(0)),
            stage_tx,
        }
    }

    /// Subscribe to stage transitions. The receiver sees the latest
    /// snapshot at subscription time and every change after it.
    pub fn stage_watch(&self) -> watch::Receiver<StageSnapshot> {
        self.stage_tx.subscribe()
    }

    pub fn module_cache(&self) -> &Arc<ModuleCache> {
        &self.cache
    }

    fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    fn publish(&self, token: u64, stage: PipelineStage) {
        if self.is_current(token) {
            self.stage_tx.send_replace(StageSnapshot {
                generation: token,
                stage,
            });
        }
    }

    /// Deliver the outcome, unless a newer submission has taken over.
    fn settle(
        &self,
        token: u64,
        result: Result<RenderedPreview, PreviewError>,
    ) -> Option<PreviewOutcome> {
        if !self.is_current(token) {
            debug!(generation = token, "request superseded; discarding outcome");
            return None;
        }
        let outcome = match result {
            Ok(preview) => {
                info!(generation = token, "preview rendered");
                PreviewOutcome::Rendered(preview)
            }
            Err(err) => {
                warn!(generation = token, stage = err.stage_label(), error = %err, "preview failed");
                PreviewOutcome::Failed(err)
            }
        };
        self.publish(token, PipelineStage::Settled(outcome.settled_kind()));
        Some(outcome)
    }

    /// Run one snippet through the whole pipeline.
    ///
    /// Returns `None` when a later submission arrived while this one was
    /// in flight; the caller must treat that as "nothing happened", not
    /// as an error.
    pub async fn submit(&self, source: &str) -> Option<PreviewOutcome> {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(generation = token, bytes = source.len(), "preview request submitted");

        self.publish(token, PipelineStage::Scanning);
        let scan = scanner::scan(source);
        debug!(
            generation = token,
            capabilities = scan.capabilities.len(),
            "import scan complete"
        );

        self.publish(token, PipelineStage::Loading);
        let names = scan.capability_names();
        let report = match self.loader.ensure(&names).await {
            Ok(report) => report,
            Err(err) => return self.settle(token, Err(err)),
        };
        if !self.is_current(token) {
            debug!(generation = token, "superseded during dependency load");
            return None;
        }

        self.publish(token, PipelineStage::Transforming);
        let normalized = normalize::normalize(source);
        debug!(
            generation = token,
            flavor = self.transformer.flavor(),
            "transforming snippet"
        );
        let code = match self.transformer.transform(&normalized.code) {
            Ok(code) => code,
            Err(err) => return self.settle(token, Err(err)),
        };

        self.publish(token, PipelineStage::Executing);
        // The script context is not Send, so execution and rendering share
        // one blocking section; the render transition is published from
        // inside it.
        let runtime = self.runtime.clone();
        let capabilities = report.capabilities;
        let entry = normalized.entry_symbol;
        let stage_tx = self.stage_tx.clone();
        let generation = self.generation.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let mut host = ScriptHost::new(&runtime)?;
            for capability in &capabilities {
                host.register_capability(capability)?;
            }
            let bindings = sandbox::resolve_bindings(&mut host, &runtime, &scan, &capabilities);
            let handle = host.execute(&code, &entry, &bindings)?;
            if generation.load(Ordering::SeqCst) == token {
                stage_tx.send_replace(StageSnapshot {
                    generation: token,
                    stage: PipelineStage::Rendering,
                });
            }
            supervisor::render_supervised(&mut host, &handle)
        })
        .await;
        let result = match joined {
            Ok(result) => result,
            Err(join_err) => Err(PreviewError::ExecutionFailed {
                message: format!("execution task failed: {}", join_err),
            }),
        };
        self.settle(token, result)
    }
}
