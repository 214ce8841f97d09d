//! schedbench: run the cooperative-kernel benchmark and verify its counters.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use schedbench::{Scenario, Simulator, Workload};

/// Run the deterministic scheduler benchmark and check its counters
/// against the expected constants for the chosen workload.
#[derive(Parser)]
#[command(name = "schedbench", version)]
struct Cli {
    /// Workload scale.
    #[arg(short, long, value_enum, default_value_t = Workload::Small, env = "SCHEDBENCH_WORKLOAD")]
    workload: Workload,

    /// Collect the diagnostic character trace during the run.
    #[arg(long)]
    trace: bool,

    /// Print the collected trace to stderr (implies --trace).
    #[arg(long)]
    dump_trace: bool,

    /// Number of back-to-back runs; each is verified independently.
    #[arg(short, long, default_value_t = 1)]
    iterations: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("benchmark starting");

    for run in 0..cli.iterations {
        let mut sim = Simulator::new(Scenario::benchmark(cli.workload));
        if cli.trace || cli.dump_trace {
            sim = sim.with_trace();
        }

        let result = sim.run();
        info!(
            run,
            queued_packets = result.queued_packets,
            holds = result.holds,
            "run complete"
        );
        println!(
            "queued packet count = {}  hold count = {}",
            result.queued_packets, result.holds
        );

        if cli.dump_trace {
            if let Some(trace) = &result.trace {
                trace.dump();
            }
        }

        result.verify(cli.workload)?;
    }

    println!("results correct");
    Ok(())
}
