//! jsx-preview engine
//!
//! Turns one string of untrusted component source text into a live,
//! rendered preview, with no build step. The pipeline per request:
//!
//! 1. [`scanner`]: discover which external capabilities the snippet needs
//! 2. [`loader`]: resolve them against the [`registry`] and fetch missing
//!    resources exactly once (shared, append-only module cache)
//! 3. [`normalize`] + [`transform`]: strip module declarations and hand the
//!    source to the black-box transformer
//! 4. [`sandbox`]: execute the transformed code in a constrained scope and
//!    obtain the entry component value
//! 5. [`supervisor`]: instantiate it inside a failure-isolating boundary
//!
//! [`pipeline::PreviewEngine`] drives the stages, enforces their strict
//! ordering, and drops superseded requests by generation token.
//!
//! # Example
//!
//! ```ignore
//! use jsx_preview_core::fetcher::HttpFetcher;
//! use jsx_preview_core::pipeline::PreviewEngine;
//! use jsx_preview_core::registry::DependencyRegistry;
//! use jsx_preview_core::transform::PlainTransformer;
//! use std::sync::Arc;
//!
//! let engine = PreviewEngine::new(
//!     Arc::new(DependencyRegistry::with_default_catalog()),
//!     Arc::new(HttpFetcher::new()),
//!     Arc::new(PlainTransformer),
//! );
//! let outcome = engine.submit(source_text).await;
//! ```

pub mod fetcher;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod sandbox;
pub mod scanner;
pub mod supervisor;
pub mod transform;

// Re-export main types at crate root for convenience
pub use fetcher::{HttpFetcher, MockFetcher, NoopFetcher, ResourceFetcher};
pub use loader::{DependencyLoader, LoadReport, ModuleCache};
pub use pipeline::{PreviewEngine, StageSnapshot};
pub use registry::DependencyRegistry;
pub use sandbox::{HostRuntime, ScriptHost};
pub use transform::{PlainTransformer, SourceTransformer};
