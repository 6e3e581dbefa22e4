//! Computes per-document top-10 words by pointwise mutual information over
//! one line-delimited JSON input file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use compgraph::{pmi_graph, PmiColumns};
use compgraph_cli::{init_logging, report, run_to_json_array};

/// Compute per-document PMI rankings over a line-delimited JSON input file.
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
    let graph = pmi_graph(&source, &PmiColumns::default())?;
    run_to_json_array(&graph, &args.output)
}
