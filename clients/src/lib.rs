//! Shared plumbing for the gluonic client binaries.
//!
//! | Binary | Purpose |
//! |--------|---------|
//! | `gluonic-verify` | decompose, walk both addressings, print the verification report |
//! | `gluonic-decompose` | print the derived decomposition without walking the lattice |
//!
//! Both accept the lattice either as flags or as a JSON run configuration;
//! flags given alongside `--config` override the file.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use gluonic_conformance::RunConfig;
use gluonic_lattice::Dimensions;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_directives` applies.
///
/// # Errors
///
/// Returns an error for malformed directives or if a global subscriber is
/// already installed.
pub fn init_tracing(default_directives: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives)
            .with_context(|| format!("invalid log level `{default_directives}`"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}

/// Lattice and process flags shared by every client.
#[derive(Debug, Clone, Args)]
pub struct LatticeArgs {
    /// JSON run configuration; other flags override its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Lattice extent, e.g. `16,16,16,32`.
    #[arg(long, value_name = "N0,N1,N2,N3")]
    pub dims: Option<Dimensions>,

    /// Number of worker processes.
    #[arg(long, short = 'p', value_name = "P")]
    pub procs: Option<usize>,

    /// Validate this sub-lattice shape instead of deriving one.
    #[arg(long, value_name = "S0,S1,S2,S3")]
    pub sub_lattice: Option<Dimensions>,

    /// Decompose over the largest power of two not above the process count.
    #[arg(long)]
    pub truncate_ranks: bool,
}

impl LatticeArgs {
    /// Builds the run configuration from `--config` and the flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read, or if
    /// the lattice or process count is given nowhere.
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => {
                debug!(path = %path.display(), "loading run configuration");
                RunConfig::from_json_file(path)?
            }
            None => {
                let dims = self.dims.context("--dims is required without --config")?;
                let procs = self.procs.context("--procs is required without --config")?;
                RunConfig::new(dims, procs)
            }
        };
        if let Some(dims) = self.dims {
            config.dimensions = dims.extent().0.to_vec();
        }
        if let Some(procs) = self.procs {
            config.processes = procs;
        }
        if let Some(sub) = self.sub_lattice {
            config.sub_lattice = Some(sub.extent().0);
        }
        config.truncate_ranks |= self.truncate_ranks;
        Ok(config)
    }
}
