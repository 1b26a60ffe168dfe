//! Source Normalizer
//!
//! Prepares raw snippet text for the transformer and the execution scope:
//! removes every import declaration, records the entry symbol from the
//! default-export declaration, and strips export declarations (exports have
//! no meaning inside the execution scope).
//!
//! Like the scanner this is permissive pattern matching. If no default
//! export of an identifier is found the entry symbol falls back to the
//! conventional `Component` placeholder — a best-effort convention, not a
//! hard requirement.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

/// Entry symbol used when no default export names one.
pub const DEFAULT_ENTRY_SYMBOL: &str = "Component";

/// Snippet text with module declarations removed, plus the symbol whose
/// value the execution scope should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSource {
    pub code: String,
    pub entry_symbol: String,
}

fn import_strip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)import\s+[^'"]*?from\s*['"][^'"]*['"];?[^\S\n]*\n?"#)
            .expect("import strip pattern is valid")
    })
}

fn side_effect_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"import\s*['"][^'"]*['"];?[^\S\n]*\n?"#)
            .expect("side-effect import pattern is valid")
    })
}

fn default_export_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"export\s+default\s+(?:function|class)\s+([A-Za-z_$][A-Za-z0-9_$]*)")
            .expect("default export declaration pattern is valid")
    })
}

fn default_export_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"export\s+default\s+(function|class)")
            .expect("default export prefix pattern is valid")
    })
}

fn default_export_ident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"export\s+default\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*;?")
            .expect("default export identifier pattern is valid")
    })
}

/// Strip module declarations and determine the entry symbol.
pub fn normalize(source: &str) -> NormalizedSource {
    let code = import_strip_re().replace_all(source, "");
    let code = side_effect_import_re().replace_all(&code, "");

    // Entry symbol: `export default function X` / `export default class X`
    // first (the identifier form would capture the keyword), then
    // `export default X`.
    let mut entry_symbol = DEFAULT_ENTRY_SYMBOL.to_string();
    let mut code = code.into_owned();
    if let Some(captures) = default_export_decl_re().captures(&code) {
        entry_symbol = captures[1].to_string();
        // Keep the declaration itself; drop only the export prefix.
        code = default_export_prefix_re().replace(&code, "$1").into_owned();
    } else if let Some(captures) = default_export_ident_re().captures(&code) {
        entry_symbol = captures[1].to_string();
        code = default_export_ident_re().replace(&code, "").into_owned();
    }

    // Remaining export declarations (named exports, a second default) are
    // meaningless in the execution scope; drop the keywords, keep the
    // declarations.
    let code = code.replace("export default ", "").replace("export ", "");

    debug!(entry_symbol = %entry_symbol, "normalized snippet");
    NormalizedSource { code, entry_symbol }
}
