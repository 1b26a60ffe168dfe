//! Facade over the jsx-preview workspace crates.
//!
//! Hosts embedding the engine depend on this package and get the whole
//! API surface in one place; the implementation lives in
//! `jsx-preview-core` and the shared vocabulary in `jsx-preview-types`.

pub use jsx_preview_core::{
    DependencyLoader, DependencyRegistry, HostRuntime, HttpFetcher, LoadReport, MockFetcher,
    ModuleCache, NoopFetcher, PlainTransformer, PreviewEngine, ResourceFetcher, ScriptHost,
    SourceTransformer, StageSnapshot,
};
pub use jsx_preview_types::{
    BindingRequest, CapabilityImport, DependencySource, Descriptor, NamedBinding, PipelineStage,
    PreviewError, PreviewOutcome, RenderedPreview, ScanReport, SettledKind,
};
