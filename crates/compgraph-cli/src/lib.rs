//! Shared plumbing for the four `compgraph-cli` binaries: each one parses
//! its own [`clap`] arguments, builds one of `compgraph`'s ready-made
//! pipelines over a file source, and hands the resulting graph to
//! [`run_to_json_array`].
//!
//! None of the four pipelines' column names are exposed on the command
//! line - the original `click`-based scripts this mirrors don't expose
//! them either (see `examples/run_word_count.py` and friends upstream);
//! every binary here just runs a pipeline with its `Default` column
//! naming.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process::ExitCode;

use compgraph::{json::row_to_json, Graph, Sources};

/// Installs a `tracing-subscriber` `fmt` layer honoring `RUST_LOG`
/// (defaulting to `warn` so a successful run stays quiet).
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs `graph` with no iterator-source bindings (every leaf is a file
/// source) and writes its output rows as a JSON array to `output_path`.
///
/// Returns `Ok(())` having written the file on success; any error from the
/// engine or from writing the output is returned to the caller, which maps
/// it to a non-zero exit code and a stderr message - the CLI contract
/// carried over from the original scripts' `click` entry points.
pub fn run_to_json_array(graph: &Graph, output_path: &Path) -> anyhow::Result<()> {
    let rows = graph.run(&Sources::new())?;
    let values = rows
        .map(|row| row.map(|row| row_to_json(&row)))
        .collect::<compgraph::Result<Vec<_>>>()?;
    let file = File::create(output_path)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", output_path.display()))?;
    serde_json::to_writer(BufWriter::new(file), &values)?;
    Ok(())
}

/// Runs `body`, printing any error to stderr and mapping it to a non-zero
/// exit code; used as the tail call of every binary's `main`.
pub fn report(body: anyhow::Result<()>) -> ExitCode {
    match body {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
