//! Computes per-document TF-IDF (top 3 words per document) over one
//! line-delimited JSON input file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use compgraph::{inverted_index_graph, InvertedIndexColumns};
use compgraph_cli::{init_logging, report, run_to_json_array};

/// Compute per-document TF-IDF over a line-delimited JSON input file.
#[derive(Parser)]
struct Args {
    /// Path to the line-delimited JSON input.
    input: PathBuf,
    /// Path the JSON array of result rows is written to.
    output: PathBuf,
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    report(run(&args))
}

fn run(args: &Args) -> anyhow::Result<()> {
    let source = compgraph::graph::from_json_file(&args.input);
    let graph = inverted_index_graph(&source, &InvertedIndexColumns::default())?;
    run_to_json_array(&graph, &args.output)
}
