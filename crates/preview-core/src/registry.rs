//! Dependency Registry
//!
//! The single process-wide source of truth for which capabilities are
//! supported and how each one is satisfied. Built once at startup and
//! read-only at pipeline-run time. Absence of an entry means the
//! capability is unsupported.
//!
//! Two descriptor shapes exist: capabilities backed by one or more external
//! resource locators (all must load before the capability is ready), and
//! capabilities bundled directly into the host process. Each entry also
//! names the scope global its scripts register (`window.Chart` style), the
//! convention the loader and sandbox use to find the module value.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use jsx_preview_types::{DependencySource, Descriptor};

/// Capability name → descriptor table.
#[derive(Debug, Clone, Default)]
pub struct DependencyRegistry {
    entries: HashMap<String, Descriptor>,
}

/// One entry of a JSON catalog file.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    global: String,
    locators: Vec<String>,
}

impl DependencyRegistry {
    /// An empty registry: every capability is unsupported.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The default catalog.
    ///
    /// Mirrors the capability set the original preview page supported, with
    /// locators pointing at browser-style single-file bundles that register
    /// a scope global when evaluated.
    pub fn with_default_catalog() -> Self {
        let mut registry = Self::empty();
        // React is supplied by the host runtime; the entry exists so the
        // import resolves without a fetch.
        registry.insert_builtin("react", "React", "/* provided by the host runtime */");
        registry.insert_remote(
            "chart.js",
            "Chart",
            vec!["https://unpkg.com/chart.js@4.5.0/dist/chart.umd.js".into()],
        );
        registry.insert_remote(
            "axios",
            "axios",
            vec!["https://unpkg.com/axios@1.4.0/dist/axios.min.js".into()],
        );
        registry.insert_remote(
            "lodash",
            "_",
            vec!["https://unpkg.com/lodash@4.17.21/lodash.min.js".into()],
        );
        registry.insert_remote(
            "motion",
            "Motion",
            vec!["https://unpkg.com/framer-motion@11.13.1/dist/framer-motion.js".into()],
        );
        registry.insert_remote(
            "clsx",
            "clsx",
            vec!["https://unpkg.com/clsx@2.1.1/dist/clsx.min.js".into()],
        );
        registry.insert_remote(
            "lucide-react",
            "lucide",
            vec!["https://unpkg.com/lucide@0.525.0/dist/umd/lucide.min.js".into()],
        );
        registry.insert_remote(
            "mathjs",
            "math",
            vec!["https://unpkg.com/mathjs@14.5.3/lib/browser/math.js".into()],
        );
        registry
    }

    /// Load a registry from a JSON catalog file:
    /// `{ "<capability>": { "global": "...", "locators": ["...", ...] }, ... }`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let catalog: HashMap<String, CatalogEntry> = serde_json::from_str(&content)
            .with_context(|| format!("parsing catalog {}", path.display()))?;
        let mut registry = Self::empty();
        for (name, entry) in catalog {
            registry.insert_remote(&name, &entry.global, entry.locators);
        }
        Ok(registry)
    }

    /// Register a capability backed by external resource locators.
    pub fn insert_remote(&mut self, name: &str, global: &str, locators: Vec<String>) -> &mut Self {
        self.entries
            .insert(name.to_string(), Descriptor::remote(global, locators));
        self
    }

    /// Register a capability bundled into the host process.
    pub fn insert_builtin(&mut self, name: &str, global: &str, source: &str) -> &mut Self {
        self.entries
            .insert(name.to_string(), Descriptor::builtin(global, source));
        self
    }

    /// Look a capability up. `None` means unsupported.
    pub fn lookup(&self, name: &str) -> Option<&Descriptor> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
