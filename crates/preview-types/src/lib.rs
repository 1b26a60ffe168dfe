//! Shared data model for the jsx-preview pipeline.
//!
//! This crate holds the vocabulary that flows between pipeline stages and
//! out to the host application:
//!
//! - [`binding`]: capability names and the binding requests a snippet makes
//! - [`descriptor`]: registry records describing how a capability is satisfied
//! - [`error`]: the typed, stage-labeled error taxonomy
//! - [`outcome`]: pipeline stages and the terminal outcome of a request
//!
//! No engine logic lives here; the engine is in `jsx-preview-core`.

pub mod binding;
pub mod descriptor;
pub mod error;
pub mod outcome;

pub use binding::{BindingRequest, CapabilityImport, NamedBinding, ScanReport};
pub use descriptor::{DependencySource, Descriptor};
pub use error::PreviewError;
pub use outcome::{PipelineStage, PreviewOutcome, RenderedPreview, SettledKind};
