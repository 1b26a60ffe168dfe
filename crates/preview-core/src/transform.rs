//! External Transformer seam
//!
//! The markup-flavored-source-to-executable-source conversion is a
//! collaborator, not part of this engine. The contract is narrow: source
//! text in, plain executable text out, or a structured failure whose
//! diagnostic the pipeline propagates verbatim as a transform error —
//! never interpreted, never recovered from.

use jsx_preview_types::PreviewError;

/// Converts normalized snippet source into plain executable source.
///
/// Implementations report problems as [`PreviewError::TransformFailed`]
/// with their own diagnostic text; the pipeline passes it through
/// unchanged.
pub trait SourceTransformer: Send + Sync {
    fn transform(&self, source: &str) -> Result<String, PreviewError>;

    /// The source flavor this transformer accepts (for logging).
    fn flavor(&self) -> &str;
}

/// Passthrough for snippets already written in executable form.
pub struct PlainTransformer;

impl SourceTransformer for PlainTransformer {
    fn transform(&self, source: &str) -> Result<String, PreviewError> {
        Ok(source.to_string())
    }

    fn flavor(&self) -> &str {
        "plain"
    }
}
