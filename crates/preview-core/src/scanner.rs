//! Import Scanner
//!
//! Finds top-level `import ... from '...'` declarations in raw source text
//! and reports which external capabilities the snippet needs, together with
//! the binding requests made against each one.
//!
//! Scanning is deliberately permissive pattern matching, not a grammar-aware
//! parse: text that is not a well-formed import declaration is simply not
//! reported (the normalizer/transformer validate the rest). Declarations may
//! span multiple lines; every pattern is compiled with `(?s)`. Relative and
//! local targets (leading `.` or `/`) are never reported.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use jsx_preview_types::{BindingRequest, CapabilityImport, NamedBinding, ScanReport};

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // The clause cannot contain quotes, so a side-effect import
        // (`import 'x';`) never bleeds into a later declaration's `from`.
        Regex::new(r#"(?s)import\s+([^'"]*?)\s*from\s*['"]([^'"]+)['"];?"#)
            .expect("import pattern is valid")
    })
}

fn ident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("ident pattern is valid"))
}

/// True if `name` is usable as a scope parameter name.
pub(crate) fn is_identifier(name: &str) -> bool {
    ident_re().is_match(name)
}

/// Derive the capability name from an import target.
///
/// Scoped packages keep both segments (`@scope/name`); other targets are
/// truncated to the first path segment. Relative/local targets yield `None`.
fn capability_of(target: &str) -> Option<String> {
    if target.starts_with('.') || target.starts_with('/') {
        return None;
    }
    if let Some(rest) = target.strip_prefix('@') {
        let mut parts = rest.splitn(3, '/');
        let scope = parts.next()?;
        let name = parts.next()?;
        if scope.is_empty() || name.is_empty() {
            return None;
        }
        return Some(format!("@{}/{}", scope, name));
    }
    let first = target.split('/').next()?;
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

/// Split an import clause on commas that sit outside braces.
fn split_clause(clause: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in clause.chars() {
        match ch {
            '{' => {
                depth += 1;
                current.push(ch);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Parse one `a` / `a as b` named-import entry. Malformed entries are
/// dropped, matching the scanner's no-failure contract.
fn parse_named_entry(entry: &str) -> Option<NamedBinding> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    let mut words = entry.split_whitespace();
    let original = words.next()?;
    match (words.next(), words.next(), words.next()) {
        (None, _, _) if is_identifier(original) || original == "default" => {
            Some(NamedBinding::plain(original))
        }
        (Some("as"), Some(alias), None) if is_identifier(alias) => {
            Some(NamedBinding::new(original, alias))
        }
        _ => None,
    }
}

/// Parse the clause between `import` and `from` into binding requests.
fn parse_clause(clause: &str) -> Vec<BindingRequest> {
    let mut requests = Vec::new();
    for part in split_clause(clause) {
        if let Some(rest) = part.strip_prefix('*') {
            let rest = rest.trim();
            if let Some(alias) = rest.strip_prefix("as ") {
                let alias = alias.trim();
                if is_identifier(alias) {
                    requests.push(BindingRequest::Namespace {
                        alias: alias.to_string(),
                    });
                }
            }
        } else if part.starts_with('{') {
            let inner = part.trim_start_matches('{').trim_end_matches('}');
            let imports: Vec<NamedBinding> =
                inner.split(',').filter_map(parse_named_entry).collect();
            if !imports.is_empty() {
                requests.push(BindingRequest::Named { imports });
            }
        } else if is_identifier(&part) {
            requests.push(BindingRequest::Default { symbol: part });
        }
    }
    requests
}

/// Scan source text for capability imports.
///
/// Returns capabilities in first-appearance order, de-duplicated by name,
/// with binding requests from repeated declarations merged in source order.
/// Never fails: malformed imports are not reported as dependencies.
pub fn scan(source: &str) -> ScanReport {
    let mut report = ScanReport::default();
    for captures in import_re().captures_iter(source) {
        let clause = &captures[1];
        let target = &captures[2];
        let Some(name) = capability_of(target) else {
            continue;
        };
        let bindings = parse_clause(clause);
        match report.capabilities.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.bindings.extend(bindings),
            None => report.capabilities.push(CapabilityImport { name, bindings }),
        }
    }
    debug!(
        capabilities = report.capabilities.len(),
        "scanned import declarations"
    );
    report
}
