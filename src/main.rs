//! Command-line preview runner.
//!
//! Renders one component snippet through the full pipeline and prints the
//! result: markup on stdout, captured console output and failures on
//! stderr. Intended for smoke-testing snippets and capability catalogs
//! outside a host editor.
//!
//! **Modes**
//! - Default: print rendered markup (`jsx-preview widget.js`)
//! - `--json`: print the full outcome payload, success or failure
//! - `--offline`: never fetch; remote capabilities fail as load errors
//! - `--catalog`: replace the built-in capability catalog with a JSON file

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use jsx_preview_core::{
    DependencyRegistry, HttpFetcher, NoopFetcher, PlainTransformer, PreviewEngine, ResourceFetcher,
};
use jsx_preview_types::PreviewOutcome;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Snippet file to render ('-' reads stdin).
    #[arg(value_name = "FILE")]
    snippet: PathBuf,

    /// Capability catalog JSON: `{ "<name>": { "global": ..., "locators": [...] } }`.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Do not fetch anything.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Print the outcome as a JSON payload instead of plain text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let source = if args.snippet.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading snippet from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&args.snippet)
            .with_context(|| format!("reading snippet from {}", args.snippet.display()))?
    };

    let registry = match &args.catalog {
        Some(path) => DependencyRegistry::from_json_file(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => DependencyRegistry::with_default_catalog(),
    };

    let fetcher: Arc<dyn ResourceFetcher> = if args.offline {
        Arc::new(NoopFetcher)
    } else {
        Arc::new(HttpFetcher::new())
    };

    let engine = PreviewEngine::new(Arc::new(registry), fetcher, Arc::new(PlainTransformer));
    // A single submission can never be superseded, so the outcome is
    // always present.
    let outcome = engine
        .submit(&source)
        .await
        .context("request superseded before completion")?;

    match outcome {
        PreviewOutcome::Rendered(preview) => {
            if args.json {
                let payload = serde_json::json!({
                    "ok": true,
                    "markup": preview.markup,
                    "console": preview.console,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for line in &preview.console {
                    eprintln!("console: {}", line);
                }
                println!("{}", preview.markup);
            }
            Ok(())
        }
        PreviewOutcome::Failed(err) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&err.to_payload())?);
            } else {
                eprintln!("preview failed at {}: {}", err.stage_label(), err);
            }
            std::process::exit(1);
        }
    }
}
