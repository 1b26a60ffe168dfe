//! Registry records describing how a capability is satisfied.

use serde::{Deserialize, Serialize};

/// How a capability's module value is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencySource {
    /// One or more external resource locators that must all be fetched
    /// before the capability is ready (e.g. a core library plus a companion
    /// resource). Order is evaluation order.
    Remote { locators: Vec<String> },
    /// Script bundled into the host process; available synchronously,
    /// never fetched.
    Builtin { source: String },
}

/// A registry entry for one capability.
///
/// `global` is the scope-global name under which the capability's scripts
/// register their module value once evaluated (the UMD convention the
/// original dependency map relied on).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub global: String,
    pub source: DependencySource,
}

impl Descriptor {
    pub fn remote(global: impl Into<String>, locators: Vec<String>) -> Self {
        Self {
            global: global.into(),
            source: DependencySource::Remote { locators },
        }
    }

    pub fn builtin(global: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            global: global.into(),
            source: DependencySource::Builtin {
                source: source.into(),
            },
        }
    }

    /// The locators that must be present in the module cache before this
    /// capability is ready. Empty for builtins.
    pub fn locators(&self) -> &[String] {
        match &self.source {
            DependencySource::Remote { locators } => locators,
            DependencySource::Builtin { .. } => &[],
        }
    }
}
