//! Execution Sandbox
//!
//! The one place in the engine that turns text into running code. A
//! `ScriptHost` owns a single `boa_engine` context; the rest of the
//! pipeline talks to it through a narrow surface: register a capability's
//! scripts (once per context), probe a module's exports, execute the
//! transformed snippet in a scope built from named bindings.
//!
//! The scope limits which *names* are visible to the snippet, nothing
//! more; this is not a security boundary. Everything crossing back out of
//! the script world travels as JSON, never as engine handles.

use std::collections::HashSet;

use boa_engine::{Context, Source};
use tracing::{debug, warn};

use jsx_preview_types::{BindingRequest, PreviewError, ScanReport};

use crate::loader::LoadedCapability;
use crate::scanner::is_identifier;

/// Context slot the executed snippet's entry value is stored under.
const COMPONENT_SLOT: &str = "__preview_component__";

/// The always-available framework bindings, supplied out of band from any
/// capability resolution: a setup script evaluated before anything else,
/// and the binding names it makes available to snippets.
#[derive(Debug, Clone)]
pub struct HostRuntime {
    pub setup: String,
    pub binding_names: Vec<String>,
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self {
            setup: include_str!("runtime/host_runtime.js").to_string(),
            binding_names: [
                "React",
                "useState",
                "useEffect",
                "useRef",
                "useCallback",
                "useMemo",
                "useContext",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// A name-to-value-expression pair for the execution scope. The value
/// expression is evaluated in the context at invocation time.
#[derive(Debug, Clone)]
pub struct ResolvedBinding {
    pub name: String,
    pub(crate) value_expr: String,
}

/// Handle to an executed snippet's entry value, valid for the host that
/// produced it.
#[derive(Debug)]
pub struct ComponentHandle {
    pub(crate) slot: &'static str,
}

/// Quote a Rust string as a JS string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).expect("strings always serialize")
}

/// One script context plus the set of script keys already evaluated into
/// it (the equivalent of the original's script-tag-id dedup, per context).
pub struct ScriptHost {
    context: Context,
    registered: HashSet<String>,
}

impl ScriptHost {
    /// Create a context and install the host runtime into it.
    pub fn new(runtime: &HostRuntime) -> Result<Self, PreviewError> {
        let mut host = Self {
            context: Context::default(),
            registered: HashSet::new(),
        };
        host.eval(&runtime.setup)
            .map_err(|reason| PreviewError::ExecutionFailed {
                message: format!("host runtime setup failed: {}", reason),
            })?;
        Ok(host)
    }

    /// The narrow eval boundary. Everything else goes through here.
    fn eval(&mut self, source: &str) -> Result<boa_engine::JsValue, String> {
        self.context
            .eval(Source::from_bytes(source))
            .map_err(|err| err.to_string())
    }

    /// Evaluate an expression that yields a JSON string and parse it.
    fn eval_json(&mut self, source: &str) -> Result<serde_json::Value, String> {
        let value = self.eval(source)?;
        let text = value
            .as_string()
            .map(|s| s.to_std_string_escaped())
            .ok_or_else(|| "expression did not return a string".to_string())?;
        serde_json::from_str(&text).map_err(|err| err.to_string())
    }

    /// Evaluate a capability's scripts into this context, at most once per
    /// script key, then verify the expected scope global appeared.
    pub fn register_capability(&mut self, capability: &LoadedCapability) -> Result<(), PreviewError> {
        for script in &capability.scripts {
            if !self.registered.insert(script.key.clone()) {
                debug!(key = %script.key, "script already registered in this context");
                continue;
            }
            self.eval(&script.source)
                .map_err(|reason| PreviewError::DependencyLoadFailed {
                    capability: capability.name.clone(),
                    locator: script.key.clone(),
                    reason: format!("script evaluation failed: {}", reason),
                })?;
            debug!(key = %script.key, capability = %capability.name, "registered capability script");
        }

        let check = format!(
            "typeof globalThis[{}] !== \"undefined\"",
            js_string(&capability.global)
        );
        let present = self
            .eval(&check)
            .map(|value| value.to_boolean())
            .unwrap_or(false);
        if !present {
            return Err(PreviewError::DependencyLoadFailed {
                capability: capability.name.clone(),
                locator: capability
                    .scripts
                    .last()
                    .map(|s| s.key.clone())
                    .unwrap_or_default(),
                reason: format!(
                    "scripts evaluated but scope global '{}' was not registered",
                    capability.global
                ),
            });
        }
        Ok(())
    }

    /// The exported keys of the module value under `global`. Empty when
    /// the global is missing or not inspectable.
    pub fn module_exports(&mut self, global: &str) -> Vec<String> {
        let probe = format!(
            r#"(function () {{
                var m = globalThis[{g}];
                if (m === null || m === undefined) {{ return "[]"; }}
                return JSON.stringify(Object.keys(Object(m)));
            }})()"#,
            g = js_string(global)
        );
        match self.eval_json(&probe) {
            Ok(serde_json::Value::Array(keys)) => keys
                .into_iter()
                .filter_map(|k| k.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Compile the transformed code as a function body parameterized by
    /// the binding names, invoke it with the matching values, and stash
    /// the entry symbol's value in the component slot.
    pub fn execute(
        &mut self,
        code: &str,
        entry_symbol: &str,
        bindings: &[ResolvedBinding],
    ) -> Result<ComponentHandle, PreviewError> {
        if !is_identifier(entry_symbol) {
            return Err(PreviewError::ExecutionFailed {
                message: format!("entry symbol '{}' is not a valid identifier", entry_symbol),
            });
        }
        let params: Vec<&str> = bindings.iter().map(|b| b.name.as_str()).collect();
        let args: Vec<&str> = bindings.iter().map(|b| b.value_expr.as_str()).collect();
        let program = format!(
            "globalThis[{slot}] = (function ({params}) {{\n{code}\n;return {entry};\n}})({args});",
            slot = js_string(COMPONENT_SLOT),
            params = params.join(", "),
            code = code,
            entry = entry_symbol,
            args = args.join(", "),
        );
        self.eval(&program)
            .map_err(|message| PreviewError::ExecutionFailed { message })?;
        debug!(entry = %entry_symbol, bindings = bindings.len(), "snippet executed");
        Ok(ComponentHandle {
            slot: COMPONENT_SLOT,
        })
    }

    /// Evaluate an expression that yields a JSON string (used by the
    /// render supervisor's harness).
    pub(crate) fn eval_json_expr(&mut self, source: &str) -> Result<serde_json::Value, String> {
        self.eval_json(source)
    }
}

/// Build the execution scope: host runtime bindings first, then each
/// scanned binding request resolved against its loaded module value.
///
/// Rules: a namespace binding receives the whole module value; a named
/// binding receives `module[original]` under its alias; the reserved
/// `default` token (and default bindings) map to the module's `default`
/// export when present, else the module value itself. An unresolvable
/// named binding is skipped with a diagnostic rather than aborting. The
/// first binding of a given name wins.
pub fn resolve_bindings(
    host: &mut ScriptHost,
    runtime: &HostRuntime,
    scan: &ScanReport,
    capabilities: &[LoadedCapability],
) -> Vec<ResolvedBinding> {
    let mut bindings: Vec<ResolvedBinding> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut add = |bindings: &mut Vec<ResolvedBinding>, name: &str, value_expr: String| {
        if !is_identifier(name) {
            warn!(name = %name, "binding name is not a valid identifier; skipping");
            return;
        }
        if !seen.insert(name.to_string()) {
            debug!(name = %name, "binding name already in scope; keeping the first");
            return;
        }
        bindings.push(ResolvedBinding {
            name: name.to_string(),
            value_expr,
        });
    };

    for name in &runtime.binding_names {
        add(&mut bindings, name, format!("globalThis[{}]", js_string(name)));
    }

    for import in &scan.capabilities {
        let Some(capability) = capabilities.iter().find(|c| c.name == import.name) else {
            continue;
        };
        let module_expr = format!("globalThis[{}]", js_string(&capability.global));
        let exports = host.module_exports(&capability.global);
        let default_expr = if exports.iter().any(|k| k == "default") {
            format!("{}[\"default\"]", module_expr)
        } else {
            module_expr.clone()
        };

        for request in &import.bindings {
            match request {
                BindingRequest::Default { symbol } => {
                    add(&mut bindings, symbol, default_expr.clone());
                }
                BindingRequest::Namespace { alias } => {
                    add(&mut bindings, alias, module_expr.clone());
                }
                BindingRequest::Named { imports } => {
                    for named in imports {
                        if named.original == "default" {
                            add(&mut bindings, &named.alias, default_expr.clone());
                        } else if exports.iter().any(|k| k == &named.original) {
                            add(
                                &mut bindings,
                                &named.alias,
                                format!("{}[{}]", module_expr, js_string(&named.original)),
                            );
                        } else {
                            warn!(
                                capability = %import.name,
                                symbol = %named.original,
                                "named import not found on module; omitting it from the scope"
                            );
                        }
                    }
                }
            }
        }
    }
    bindings
}
