//! Gluonic lattice addressing verifier.
//!
//! This crate runs one verification of a lattice decomposition: it walks the
//! lattice monolithically as ground truth, walks it again rank by rank, and
//! cross-checks the two. Both walks are streamed into the verifier record by
//! record.
//!
//! # Checks
//!
//! | Order | Id | Source |
//! |-------|----|--------|
//! | (a) | `verify/count` | [`verifier`] |
//! | (b) | `verify/sum` | [`verifier`] |
//! | (c) | `verify/coverage` | [`verifier`] |
//! | (d) | `rank-map/*` | [`validators::rank_map`] |
//! | (e) | `placement/round-trip` | [`validators::placement`] |
//!
//! # Entry Point
//!
//! ```
//! use gluonic_conformance::{run, RunConfig};
//! use gluonic_lattice::Dimensions;
//!
//! let config = RunConfig::new(Dimensions::new([16, 16, 16, 16]).unwrap(), 16);
//! let report = run(&config).unwrap();
//! assert!(report.all_passed());
//! assert_eq!(report.decomposition.sub_lattice().0, [8, 8, 8, 8]);
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod dump;
pub mod report;
pub mod validators;
pub mod verifier;

pub use config::{RunConfig, ValidatedInputs};
pub use report::{Discrepancy, DiscrepancyKind, Severity, Tally, TestResult, VerificationReport};
pub use verifier::{verify, Verifier};

use anyhow::{Context, Result};
use gluonic_lattice::enumerate::{monolithic, rank_block, MajorOrder};
use gluonic_lattice::{Decomposition, Dimensions, MemoryRecord};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::dump::{open_sink, DistributedWriter, MonolithicWriter};
use crate::validators::placement::PlacementCheck;

/// Rank blocks collected per parallel batch.
#[cfg(feature = "parallel")]
pub const PARALLEL_BATCH_RANKS: usize = 64;

/// Outcome of one verification run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// The decomposition that was verified.
    pub decomposition: Decomposition,
    /// Nesting of the monolithic walk.
    pub order: MajorOrder,
    /// Process count before truncation.
    pub requested_processes: usize,
    /// Ranks left without a block.
    pub idle_ranks: usize,
    /// Every check result.
    pub verification: VerificationReport,
}

impl RunReport {
    /// Returns true if no check failed.
    pub fn all_passed(&self) -> bool {
        self.verification.all_passed()
    }
}

/// Runs one verification.
///
/// Configuration and decomposition errors abort before either walk starts.
/// A verification mismatch is not an error; it is reported in the
/// returned [`RunReport`].
///
/// # Errors
///
/// Returns an error for an invalid configuration, a lattice that cannot be
/// decomposed, or a report sink that cannot be written.
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let inputs = config.validate().context("Invalid run configuration")?;
    let decomposition = inputs.decompose().with_context(|| {
        format!(
            "Failed to decompose {} over {} processes",
            inputs.dimensions, inputs.processes
        )
    })?;

    let _run = info_span!(
        "run",
        lattice = %inputs.dimensions,
        processes = inputs.processes.get()
    )
    .entered();
    info!(
        grid = %decomposition.process_grid(),
        sub_lattice = %decomposition.sub_lattice(),
        "decomposed lattice"
    );

    let mut verifier = Verifier::for_lattice(&inputs.dimensions)
        .with_max_discrepancies(config.max_discrepancies);
    walk_monolithic(config, &inputs.dimensions, &mut verifier)?;
    let placements = walk_distributed(config, &decomposition, &mut verifier)?;

    let mut verification = verifier.finish();
    verification.extend(validators::rank_map::validate(&decomposition));
    verification.extend(placements);

    let idle_ranks = inputs.idle_ranks();
    if idle_ranks > 0 {
        warn!(idle_ranks, "ranks left idle by truncation");
        verification.push(TestResult::warn(
            "run/idle-ranks",
            format!(
                "{idle_ranks} of {} ranks idle, decomposed over {}",
                inputs.requested, inputs.processes
            ),
        ));
    }

    info!(
        failures = verification.failure_count(),
        discrepancies = verification.discrepancy_total,
        "verification finished"
    );
    Ok(RunReport {
        decomposition,
        order: config.order,
        requested_processes: inputs.requested.get(),
        idle_ranks,
        verification,
    })
}

fn walk_monolithic(config: &RunConfig, dims: &Dimensions, verifier: &mut Verifier) -> Result<()> {
    let _walk = info_span!("monolithic", order = %config.order).entered();
    let mut writer = match &config.monolithic_report {
        Some(path) => Some(
            MonolithicWriter::new(open_sink(path)?, config.order, dims.volume())
                .with_context(|| format!("Failed to write {}", path.display()))?,
        ),
        None => None,
    };

    for record in monolithic(dims, config.order) {
        if let Some(writer) = writer.as_mut() {
            writer
                .write(&record)
                .context("Failed to write monolithic report")?;
        }
        verifier.observe_monolithic(&record);
    }

    if let Some(writer) = writer {
        writer
            .finish()
            .context("Failed to flush monolithic report")?;
    }
    info!(records = dims.volume(), "monolithic walk complete");
    Ok(())
}

fn walk_distributed(
    config: &RunConfig,
    decomposition: &Decomposition,
    verifier: &mut Verifier,
) -> Result<VerificationReport> {
    let _walk = info_span!("distributed", parallel = config.parallel).entered();
    let mut writer = match &config.distributed_report {
        Some(path) => Some(DistributedWriter::new(open_sink(path)?, decomposition)),
        None => None,
    };
    let mut placements = PlacementCheck::new(decomposition);

    let mut absorb = |record: &MemoryRecord| -> Result<()> {
        if let Some(writer) = writer.as_mut() {
            writer
                .write(record)
                .context("Failed to write distributed report")?;
        }
        placements.observe(record);
        verifier.observe_distributed(record);
        Ok(())
    };
    if config.parallel {
        walk_parallel(decomposition, &mut absorb)?;
    } else {
        walk_sequential(decomposition, &mut absorb)?;
    }

    if let Some(writer) = writer {
        writer
            .finish()
            .context("Failed to flush distributed report")?;
    }
    info!(ranks = decomposition.processes(), "distributed walk complete");
    Ok(placements.finish())
}

fn walk_sequential(
    decomposition: &Decomposition,
    absorb: &mut impl FnMut(&MemoryRecord) -> Result<()>,
) -> Result<()> {
    for rank in decomposition.ranks() {
        debug!(rank, "walking rank block");
        for record in rank_block(decomposition, rank)? {
            absorb(&record)?;
        }
    }
    Ok(())
}

// Batches are absorbed in rank order, so the result equals the sequential walk.
#[cfg(feature = "parallel")]
fn walk_parallel(
    decomposition: &Decomposition,
    absorb: &mut impl FnMut(&MemoryRecord) -> Result<()>,
) -> Result<()> {
    use gluonic_lattice::enumerate::rank_blocks_par;

    let processes = decomposition.processes();
    let mut first = 0;
    while first < processes {
        let end = processes.min(first + PARALLEL_BATCH_RANKS);
        debug!(first, last = end - 1, "walking rank batch");
        for block in rank_blocks_par(decomposition, first..end)? {
            for record in &block {
                absorb(record)?;
            }
        }
        first = end;
    }
    Ok(())
}

#[cfg(not(feature = "parallel"))]
fn walk_parallel(
    decomposition: &Decomposition,
    absorb: &mut impl FnMut(&MemoryRecord) -> Result<()>,
) -> Result<()> {
    warn!("built without the `parallel` feature, walking ranks sequentially");
    walk_sequential(decomposition, absorb)
}
