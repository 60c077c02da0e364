//! `gluonic-verify`: verifies the distributed addressing of a 4D lattice.
//!
//! Decomposes the lattice over the requested processes, walks it once
//! monolithically and once rank by rank, and cross-checks the two walks.
//!
//! **Usage:**
//! ```text
//! gluonic-verify --dims 16,16,16,16 --procs 16 [--order xyzt|tzyx]
//!                [--monolithic-out <path>] [--distributed-out <path>] [--json]
//! gluonic-verify --config run.json [--parallel]
//! ```
//!
//! Exits non-zero if any check fails.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use gluonic_clients::{init_tracing, LatticeArgs};
use gluonic_conformance::{run, RunReport, Severity};
use gluonic_lattice::MajorOrder;

/// Verify the distributed addressing of a 4D lattice.
#[derive(Parser)]
#[command(
    name = "gluonic-verify",
    about = "Cross-check monolithic and distributed lattice addressing"
)]
struct Args {
    #[command(flatten)]
    lattice: LatticeArgs,

    /// Nesting of the monolithic walk (default: tzyx).
    #[arg(long)]
    order: Option<MajorOrder>,

    /// Write the monolithic report here (`-` for stdout).
    #[arg(long, value_name = "PATH")]
    monolithic_out: Option<PathBuf>,

    /// Write the per-rank distributed report here (`-` for stdout).
    #[arg(long, value_name = "PATH")]
    distributed_out: Option<PathBuf>,

    /// Enumerate rank blocks on all cores.
    #[arg(long)]
    parallel: bool,

    /// Disputed offsets listed in the report.
    #[arg(long, value_name = "N")]
    max_discrepancies: Option<usize>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let mut config = args.lattice.resolve()?;
    if let Some(order) = args.order {
        config.order = order;
    }
    if let Some(path) = args.monolithic_out {
        config.monolithic_report = Some(path);
    }
    if let Some(path) = args.distributed_out {
        config.distributed_report = Some(path);
    }
    if let Some(max) = args.max_discrepancies {
        config.max_discrepancies = max;
    }
    config.parallel |= args.parallel;

    let report = run(&config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.all_passed() {
        eprintln!(
            "Failure: {} check(s) did not pass.",
            report.verification.failure_count()
        );
        process::exit(1);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let d = &report.decomposition;
    println!("Gluonic Lattice Verification");
    println!("============================");
    println!();
    println!(
        "Lattice:     {} ({} sites)",
        d.dimensions(),
        d.dimensions().volume()
    );
    println!(
        "Processes:   {} (grid {}, sub-lattice {})",
        d.processes(),
        d.process_grid(),
        d.sub_lattice()
    );
    if report.idle_ranks > 0 {
        println!(
            "Idle ranks:  {} of {}",
            report.idle_ranks, report.requested_processes
        );
    }
    println!("Order:       {}", report.order);
    println!();

    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut warned = 0usize;

    for result in &report.verification.results {
        let status = match result.severity {
            Severity::Pass => {
                passed += 1;
                "PASS"
            }
            Severity::Warning => {
                warned += 1;
                "WARN"
            }
            Severity::Failure => {
                failed += 1;
                "FAIL"
            }
        };
        println!("[{}] {}: {}", status, result.check, result.message);
        for detail in &result.details {
            println!("       {}", detail);
        }
    }

    println!();
    println!(
        "Summary: {} passed, {} warnings, {} failed",
        passed, warned, failed
    );
    if failed == 0 {
        println!("Success: Equal number of elements accessed.");
    }
}
