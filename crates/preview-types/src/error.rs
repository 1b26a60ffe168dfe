//! Typed, stage-labeled pipeline errors.
//!
//! Every stage failure short-circuits the remaining stages and surfaces as
//! exactly one of these variants; nothing is merged into a generic
//! "something went wrong". Superseded requests are not errors and have no
//! variant here — they are dropped silently by the pipeline.

use serde_json::json;

/// A fatal pipeline failure, labeled with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    /// The snippet imports a capability the registry does not know.
    /// Raised before any loading begins.
    UnsupportedCapability { capability: String },

    /// A resource locator backing a supported capability failed to fetch
    /// or to evaluate. Not retried automatically.
    DependencyLoadFailed {
        capability: String,
        locator: String,
        reason: String,
    },

    /// The external transformer reported a syntax/semantic problem.
    /// The message is the collaborator's diagnostic, verbatim.
    TransformFailed { message: String },

    /// The compiled snippet threw during top-level evaluation or
    /// invocation.
    ExecutionFailed { message: String },

    /// The produced component failed during instantiation or a lifecycle
    /// callback. Fatal to that render only; the boundary isolates it.
    RenderFailed {
        message: String,
        component_stack: Option<String>,
    },
}

impl PreviewError {
    /// The stage label used in the host-facing payload.
    pub fn stage_label(&self) -> &'static str {
        match self {
            PreviewError::UnsupportedCapability { .. } => "scan",
            PreviewError::DependencyLoadFailed { .. } => "load",
            PreviewError::TransformFailed { .. } => "transform",
            PreviewError::ExecutionFailed { .. } => "execute",
            PreviewError::RenderFailed { .. } => "render",
        }
    }

    /// The host-facing payload: `{ stage, message, detail? }`.
    pub fn to_payload(&self) -> serde_json::Value {
        let mut payload = json!({
            "stage": self.stage_label(),
            "message": self.to_string(),
        });
        let detail = match self {
            PreviewError::UnsupportedCapability { capability } => {
                Some(json!({ "capability": capability }))
            }
            PreviewError::DependencyLoadFailed {
                capability,
                locator,
                reason,
            } => Some(json!({
                "capability": capability,
                "locator": locator,
                "reason": reason,
            })),
            PreviewError::RenderFailed {
                component_stack: Some(stack),
                ..
            } => Some(json!({ "componentStack": stack })),
            _ => None,
        };
        if let Some(detail) = detail {
            payload["detail"] = detail;
        }
        payload
    }
}

impl std::fmt::Display for PreviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviewError::UnsupportedCapability { capability } => {
                write!(f, "unsupported capability: {}", capability)
            }
            PreviewError::DependencyLoadFailed {
                capability,
                locator,
                reason,
            } => {
                write!(
                    f,
                    "dependency load failed for {} ({}): {}",
                    capability, locator, reason
                )
            }
            PreviewError::TransformFailed { message } => {
                write!(f, "transform failed: {}", message)
            }
            PreviewError::ExecutionFailed { message } => {
                write!(f, "execution failed: {}", message)
            }
            PreviewError::RenderFailed { message, .. } => {
                write!(f, "render failed: {}", message)
            }
        }
    }
}

impl std::error::Error for PreviewError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_cover_the_taxonomy() {
        let cases = [
            (
                PreviewError::UnsupportedCapability {
                    capability: "chart-lib".into(),
                },
                "scan",
            ),
            (
                PreviewError::DependencyLoadFailed {
                    capability: "chart.js".into(),
                    locator: "https://cdn/chart.js".into(),
                    reason: "timeout".into(),
                },
                "load",
            ),
            (
                PreviewError::TransformFailed {
                    message: "unexpected token".into(),
                },
                "transform",
            ),
            (
                PreviewError::ExecutionFailed {
                    message: "boom".into(),
                },
                "execute",
            ),
            (
                PreviewError::RenderFailed {
                    message: "boom".into(),
                    component_stack: None,
                },
                "render",
            ),
        ];
        for (err, label) in cases {
            assert_eq!(err.stage_label(), label);
        }
    }

    #[test]
    fn payload_carries_stage_message_and_detail() {
        let err = PreviewError::DependencyLoadFailed {
            capability: "chart.js".into(),
            locator: "https://cdn/chart.js".into(),
            reason: "connection refused".into(),
        };
        let payload = err.to_payload();
        assert_eq!(payload["stage"], "load");
        assert!(payload["message"]
            .as_str()
            .unwrap()
            .contains("connection refused"));
        assert_eq!(payload["detail"]["capability"], "chart.js");
    }

    #[test]
    fn render_payload_includes_component_stack() {
        let err = PreviewError::RenderFailed {
            message: "TypeError: x is not a function".into(),
            component_stack: Some("    in Widget".into()),
        };
        let payload = err.to_payload();
        assert_eq!(payload["detail"]["componentStack"], "    in Widget");
    }
}
