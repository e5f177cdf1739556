use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::instrument;
use tracing_subscriber::EnvFilter;

struct Host;

impl cjs_sandbox_runtime::host::Host for Host {
    fn resolve_module(&self, base: Option<String>, name: String) -> Result<String> {
        // Relative specifiers are joined to the directory of the requiring module.
        let dir = match &base {
            Some(base) => Path::new(base)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
            None => PathBuf::from("."),
        };

        let mut path = dir.join(&name);
        if path.extension().is_none() {
            path.set_extension("js");
        }

        let path = path
            .canonicalize()
            .with_context(|| format!("Resolving module {name:?} from {dir:?}"))?;
        Ok(path.display().to_string().replace('\\', "/"))
    }

    fn load_module(&self, identity: String) -> Result<String> {
        fs::read_to_string(&identity).with_context(|| format!("Loading module {identity:?}"))
    }
}

const EXAMPLES: &str = "\u{001b}[1;4mExamples:\u{001b}[0m
  Require an entry module located at ./index.js and print its exports:
    $ cat ./index.js
    const math = require('./math');
    exports.answer = math.add(1, 41);

    $ cat ./math.js
    exports.add = (a, b) => a + b;

    $ cjs-sandbox-runtime ./index.js
    Exports: {\"answer\":42}
";

/// Require an entry module with a synchronous CommonJS loader and print its exports as JSON.
///
/// Modules are resolved against the local filesystem. Set `RUST_LOG=debug` to trace
/// resolution, cache hits and module execution.
#[derive(clap::Parser)]
#[command(version, about)]
#[clap(after_help = EXAMPLES)]
struct Cli {
    /// The path to the entry module.
    entry: PathBuf,

    /// Pretty-print the exports JSON.
    #[arg(long)]
    pretty: bool,
}

#[instrument(skip_all, level = "info")]
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Cli { entry, pretty } = Cli::parse();

    let entry = entry
        .canonicalize()
        .with_context(|| format!("Locating entry module {entry:?}"))?;

    let session = cjs_sandbox_runtime::Session::new(Host)?;
    let exports = session.require(&entry.display().to_string())?;

    let exports = if pretty {
        let value: serde_json::Value =
            serde_json::from_str(&exports).context("Parsing exports JSON")?;
        serde_json::to_string_pretty(&value)?
    } else {
        exports
    };
    println!("Exports: {exports}");

    Ok(())
}
