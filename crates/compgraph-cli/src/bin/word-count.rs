//! Counts word occurrences across one line-delimited JSON input file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use compgraph::{word_count_graph, WordCountColumns};
use compgraph_cli::{init_logging, report, run_to_json_array};

/// Count word occurrences in a line-delimited JSON input file.
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
    let graph = word_count_graph(&source, &WordCountColumns::default())?;
    run_to_json_array(&graph, &args.output)
}
