//! Pipeline stages and terminal outcomes.

use serde::{Deserialize, Serialize};

use crate::error::PreviewError;

/// How a settled request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettledKind {
    Ok,
    Error,
}

/// The per-request state machine.
///
/// `Idle → Scanning → Loading → Transforming → Executing → Rendering →
/// Settled`. Any stage failure transitions directly to `Settled(Error)`.
/// A new source-text submission is the only transition out of `Settled`,
/// restarting at `Scanning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// No source text yet; the host shows a waiting placeholder.
    Idle,
    Scanning,
    Loading,
    Transforming,
    Executing,
    Rendering,
    Settled(SettledKind),
}

/// A successfully rendered preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPreview {
    /// Markup produced by rendering the component tree.
    pub markup: String,
    /// Console output captured from the executed snippet, in order.
    pub console: Vec<String>,
}

/// The terminal result of one preview request.
///
/// Exactly one outcome exists per completed or failed request. A request
/// superseded before completion produces no outcome at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    Rendered(RenderedPreview),
    Failed(PreviewError),
}

impl PreviewOutcome {
    pub fn settled_kind(&self) -> SettledKind {
        match self {
            PreviewOutcome::Rendered(_) => SettledKind::Ok,
            PreviewOutcome::Failed(_) => SettledKind::Error,
        }
    }

    pub fn err(&self) -> Option<&PreviewError> {
        match self {
            PreviewOutcome::Failed(err) => Some(err),
            PreviewOutcome::Rendered(_) => None,
        }
    }
}
