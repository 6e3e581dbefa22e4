//! Computes average vehicle speed by weekday and hour from two
//! line-delimited JSON input files: trip timings and edge geometries.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use compgraph::{traffic_speed_graph, TrafficSpeedColumns};
use compgraph_cli::{init_logging, report, run_to_json_array};

/// Compute average speed by weekday and hour from trip-timing and
/// edge-geometry input files.
#[derive(Parser)]
struct Args {
    /// Path to the line-delimited JSON trip-timing input (enter/leave times, edge id).
    times: PathBuf,
    /// Path to the line-delimited JSON edge-geometry input (edge id, start/end coordinates).
    lengths: PathBuf,
    /// Path the JSON array of result rows is written to.
    output: PathBuf,
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    report(run(&args))
}

fn run(args: &Args) -> anyhow::Result<()> {
    let time_source = compgraph::graph::from_json_file(&args.times);
    let length_source = compgraph::graph::from_json_file(&args.lengths);
    let graph = traffic_speed_graph(&time_source, &length_source, &TrafficSpeedColumns::default())?;
    run_to_json_array(&graph, &args.output)
}
