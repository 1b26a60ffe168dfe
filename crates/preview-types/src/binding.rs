//! Capability names and binding requests.
//!
//! A *capability name* identifies an external dependency the way the snippet
//! author spelled it: the whole two-segment name for scoped packages
//! (`@scope/name`), otherwise the first path segment of the import target.
//! A *binding request* is one name-to-value association the executed code
//! expects to find in scope.

use serde::{Deserialize, Serialize};

/// One named import, optionally aliased (`name as alias`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedBinding {
    /// The exported symbol name on the module.
    pub original: String,
    /// The identifier the snippet binds it to. Equal to `original` when no
    /// alias was written.
    pub alias: String,
}

impl NamedBinding {
    pub fn new(original: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            alias: alias.into(),
        }
    }

    /// A named import without an alias.
    pub fn plain(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            original: name,
        }
    }
}

/// A binding request found in an import declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingRequest {
    /// `import Symbol from '...'` — the module's default export.
    Default { symbol: String },
    /// `import * as Alias from '...'` — the whole module value.
    Namespace { alias: String },
    /// `import { a, b as c } from '...'`.
    Named { imports: Vec<NamedBinding> },
}

/// All binding requests targeting one capability.
///
/// Multiple import declarations may target the same capability; their
/// requests are merged in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityImport {
    pub name: String,
    pub bindings: Vec<BindingRequest>,
}

/// Scanner output: the ordered, de-duplicated capability list.
///
/// Order is first-appearance order. It is preserved for deterministic
/// diagnostics, not for semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub capabilities: Vec<CapabilityImport>,
}

impl ScanReport {
    /// Capability names in first-appearance order.
    pub fn capability_names(&self) -> Vec<String> {
        self.capabilities.iter().map(|c| c.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
