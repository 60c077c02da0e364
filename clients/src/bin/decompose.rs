//! `gluonic-decompose`: prints how a lattice splits over a process count.
//!
//! **Usage:**
//! ```text
//! gluonic-decompose --dims 48,48,48,96 --procs 512 [--ranks] [--json]
//! ```
//!
//! Exits non-zero if the lattice cannot be decomposed.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use gluonic_clients::{init_tracing, LatticeArgs};
use gluonic_conformance::dump::write_summary;
use gluonic_lattice::{neighbours, rank_to_coord, Decomposition, ProcessCoord};
use serde::Serialize;

/// Print the decomposition of a 4D lattice.
#[derive(Parser)]
#[command(
    name = "gluonic-decompose",
    about = "Derive the process grid and sub-lattice of a 4D lattice"
)]
struct Args {
    #[command(flatten)]
    lattice: LatticeArgs,

    /// Also list each rank's process coordinate and neighbours.
    #[arg(long)]
    ranks: bool,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Serialize)]
struct RankEntry {
    rank: usize,
    coord: ProcessCoord,
    neighbours: [usize; 8],
}

#[derive(Serialize)]
struct Summary<'a> {
    #[serde(flatten)]
    decomposition: &'a Decomposition,
    requested_processes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranks: Option<Vec<RankEntry>>,
}

fn rank_entries(d: &Decomposition) -> Result<Vec<RankEntry>> {
    d.ranks()
        .map(|rank| -> Result<RankEntry> {
            Ok(RankEntry {
                rank,
                coord: rank_to_coord(rank, &d.process_grid(), &d.process_volumes())?,
                neighbours: neighbours(rank, d)?.list,
            })
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let config = args.lattice.resolve()?;
    let inputs = config.validate().context("Invalid run configuration")?;
    let decomposition = inputs.decompose().with_context(|| {
        format!(
            "Failed to decompose {} over {} processes",
            inputs.dimensions, inputs.processes
        )
    })?;

    if args.json {
        let summary = Summary {
            decomposition: &decomposition,
            requested_processes: inputs.requested.get(),
            ranks: if args.ranks {
                Some(rank_entries(&decomposition)?)
            } else {
                None
            },
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let mut out = std::io::stdout().lock();
        write_summary(&mut out, &decomposition, args.ranks)?;
        if inputs.idle_ranks() > 0 {
            writeln!(
                out,
                "Idle ranks:                       {} of {}",
                inputs.idle_ranks(),
                inputs.requested
            )?;
        }
    }
    Ok(())
}
