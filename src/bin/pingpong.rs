use std::{path::PathBuf, process::ExitCode};

use pingpong::architecture::{relay_ring, simple_loop};
use pingpong::prelude::*;
use structopt::StructOpt;

/// Runs a ping pong simulation.
#[derive(Debug, StructOpt)]
#[structopt(name = "pingpong")]
struct Opt {
    /// Number of ping pong assemblies in the relay ring, one per rank.
    #[structopt(long, default_value = "2")]
    num: u32,

    /// Messages each Ping receives before voting to end.
    #[structopt(long, default_value = "5")]
    repeats: u64,

    /// Runs a single Ping and Pong in a direct loop instead of a ring.
    #[structopt(long)]
    simple: bool,

    /// Loads the topology from a YAML file.
    #[structopt(long, parse(from_os_str), conflicts_with = "simple")]
    topology: Option<PathBuf>,

    /// Stops the simulation after this many seconds of simulated time.
    #[structopt(long)]
    max_time: Option<SimTime>,

    /// Suppresses runtime messages.
    #[structopt(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    pingpong::tracing::init();
    let opt = Opt::from_args();

    let topology = match &opt.topology {
        Some(path) => match TopologyDef::from_yaml_file(path) {
            Ok(topo) => topo,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None if opt.simple => simple_loop(opt.repeats),
        None => relay_ring(opt.num.max(1), opt.repeats),
    };

    let mut builder = Builder::new();
    if opt.quiet {
        builder = builder.quiet();
    }
    if let Some(max_time) = opt.max_time {
        builder = builder.max_time(max_time);
    }

    let sim = match builder.build(&topology, &ElementRegistry::with_builtin()) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match sim.run() {
        Ok(report) => {
            println!(
                "{} after {} ({} events)",
                report.reason, report.end_time, report.events
            );
            for rank in &report.ranks {
                println!(
                    "  rank {}: {} events, {}/{} voters ready",
                    rank.rank, rank.events, rank.ready, rank.participants
                );
            }
            for link in &report.links {
                println!("  {link}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
