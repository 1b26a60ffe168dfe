//! Resource Fetcher Abstraction
//!
//! The loader fetches resource locators through the `ResourceFetcher`
//! trait so the pipeline can run against the real network, a recorded
//! fixture set, or mocks in tests.
//!
//! Implementations are synchronous; the loader moves calls onto the
//! blocking pool. They should be stateless where possible so a fetcher can
//! be shared behind an `Arc` across requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

/// Fetches the text of one external resource.
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the resource at `locator` and return its text.
    fn fetch(&self, locator: &str) -> Result<String>;

    /// Where this fetcher gets data from (for logging/debugging).
    fn origin(&self) -> &str;
}

/// HTTP fetcher backed by a shared agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    pub fn new() -> Self {
        Self::with_timeouts(
            Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .timeout_connect(connect_timeout)
                .build(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, locator: &str) -> Result<String> {
        let response = self
            .agent
            .get(locator)
            .call()
            .with_context(|| format!("fetching {}", locator))?;
        response
            .into_string()
            .with_context(|| format!("reading body of {}", locator))
    }

    fn origin(&self) -> &str {
        "http"
    }
}

/// A fetcher that always fails. Used when network access is disabled;
/// capabilities already in the cache (or builtin) still work.
pub struct NoopFetcher;

impl ResourceFetcher for NoopFetcher {
    fn fetch(&self, locator: &str) -> Result<String> {
        Err(anyhow!(
            "fetching is disabled; cannot load {}. Construct the engine with HttpFetcher to enable network loads.",
            locator
        ))
    }

    fn origin(&self) -> &str {
        "none"
    }
}

/// A mock fetcher for tests: pre-configured responses, a fetch counter,
/// and an optional forced error.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, String>,
    force_error: Option<String>,
    fetch_count: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a response for a locator.
    pub fn add_response(&mut self, locator: &str, body: &str) -> &mut Self {
        self.responses
            .insert(locator.to_string(), body.to_string());
        self
    }

    /// Force all subsequent fetch calls to return the given error.
    pub fn set_error(&mut self, error: &str) -> &mut Self {
        self.force_error = Some(error.to_string());
        self
    }

    /// How many fetches were issued, regardless of outcome.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

impl ResourceFetcher for MockFetcher {
    fn fetch(&self, locator: &str) -> Result<String> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(ref error) = self.force_error {
            return Err(anyhow!("{}", error));
        }
        self.responses
            .get(locator)
            .cloned()
            .ok_or_else(|| anyhow!("MockFetcher: no response for {}", locator))
    }

    fn origin(&self) -> &str {
        "mock"
    }
}
