//! Run configuration.
//!
//! A run is described by a [`RunConfig`], read from JSON or assembled from
//! command-line flags:
//!
//! ```json
//! {
//!   "dimensions": [16, 16, 16, 32],
//!   "processes": 16,
//!   "order": "xyzt",
//!   "monolithic_report": "monolithic.txt",
//!   "distributed_report": "distributed.txt"
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gluonic_lattice::enumerate::MajorOrder;
use gluonic_lattice::{
    decompose, decompose_with_preset, Coord, Decomposition, Dimensions, LatticeError, ProcessCount,
};
use serde::{Deserialize, Serialize};

use crate::verifier::DEFAULT_MAX_DISCREPANCIES;

fn default_max_discrepancies() -> usize {
    DEFAULT_MAX_DISCREPANCIES
}

/// Everything needed for one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Global lattice extent, four positive integers.
    pub dimensions: Vec<usize>,
    /// Requested number of worker processes.
    pub processes: usize,
    /// Nesting of the monolithic walk.
    #[serde(default)]
    pub order: MajorOrder,
    /// Sub-lattice shape to validate instead of deriving one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_lattice: Option<[usize; 4]>,
    /// Decompose over the largest power of two not above `processes`.
    #[serde(default)]
    pub truncate_ranks: bool,
    /// Enumerate rank blocks on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
    /// Disputed offsets listed in the report.
    #[serde(default = "default_max_discrepancies")]
    pub max_discrepancies: usize,
    /// Where to write the monolithic report; `-` for stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monolithic_report: Option<PathBuf>,
    /// Where to write the distributed report; `-` for stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributed_report: Option<PathBuf>,
}

/// A [`RunConfig`] whose inputs have been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedInputs {
    /// Lattice extent.
    pub dimensions: Dimensions,
    /// Process count as requested.
    pub requested: ProcessCount,
    /// Process count the lattice is decomposed over.
    pub processes: ProcessCount,
    /// Preset sub-lattice, if any.
    pub sub_lattice: Option<Coord>,
}

impl ValidatedInputs {
    /// Ranks left without a block after truncation.
    pub fn idle_ranks(&self) -> usize {
        self.requested.get() - self.processes.get()
    }

    /// Derives the decomposition, or validates the preset sub-lattice.
    ///
    /// # Errors
    ///
    /// Returns a decomposition-kind [`LatticeError`] when the lattice
    /// cannot be split over the process count.
    pub fn decompose(&self) -> Result<Decomposition, LatticeError> {
        match self.sub_lattice {
            Some(sub) => decompose_with_preset(&self.dimensions, self.processes, sub),
            None => decompose(&self.dimensions, self.processes),
        }
    }
}

impl RunConfig {
    /// A configuration with defaults for everything but the lattice and
    /// the process count.
    pub fn new(dimensions: Dimensions, processes: usize) -> Self {
        Self {
            dimensions: dimensions.extent().0.to_vec(),
            processes,
            order: MajorOrder::default(),
            sub_lattice: None,
            truncate_ranks: false,
            parallel: false,
            max_discrepancies: DEFAULT_MAX_DISCREPANCIES,
            monolithic_report: None,
            distributed_report: None,
        }
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or unknown fields.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse run configuration")
    }

    /// Reads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Checks the lattice, process count, and preset shape.
    ///
    /// # Errors
    ///
    /// Returns a configuration-kind [`LatticeError`] for a wrong arity, a
    /// zero extent or process count, or a volume that overflows.
    pub fn validate(&self) -> Result<ValidatedInputs, LatticeError> {
        let dimensions = Dimensions::from_slice(&self.dimensions)?;
        let requested = ProcessCount::new(self.processes)?;
        let processes = if self.truncate_ranks {
            requested.active()
        } else {
            requested
        };
        let sub_lattice = self
            .sub_lattice
            .map(|sub| Dimensions::new(sub).map(|sub| sub.extent()))
            .transpose()?;
        Ok(ValidatedInputs {
            dimensions,
            requested,
            processes,
            sub_lattice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluonic_lattice::ErrorKind;

    #[test]
    fn minimal_json_takes_defaults() {
        let config =
            RunConfig::from_json_str(r#"{ "dimensions": [16, 16, 16, 16], "processes": 16 }"#)
                .unwrap();
        assert_eq!(config.order, MajorOrder::Tzyx);
        assert_eq!(config.max_discrepancies, DEFAULT_MAX_DISCREPANCIES);
        assert!(!config.parallel);
        assert_eq!(config.monolithic_report, None);
        assert_eq!(
            config,
            RunConfig::new(Dimensions::new([16, 16, 16, 16]).unwrap(), 16)
        );
    }

    #[test]
    fn full_json() {
        let config = RunConfig::from_json_str(
            r#"{
                "dimensions": [32, 32, 16, 16],
                "processes": 20,
                "order": "xyzt",
                "sub_lattice": [8, 8, 16, 16],
                "truncate_ranks": true,
                "parallel": true,
                "max_discrepancies": 8,
                "distributed_report": "-"
            }"#,
        )
        .unwrap();
        assert_eq!(config.order, MajorOrder::Xyzt);
        assert_eq!(config.distributed_report.as_deref(), Some(Path::new("-")));

        let inputs = config.validate().unwrap();
        assert_eq!(inputs.processes.get(), 16);
        assert_eq!(inputs.idle_ranks(), 4);
        assert_eq!(inputs.sub_lattice, Some(Coord::new(8, 8, 16, 16)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = RunConfig::from_json_str(
            r#"{ "dimensions": [4, 4, 4, 4], "processes": 1, "ranks": 2 }"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn validation_reports_configuration_errors() {
        let mut config = RunConfig::new(Dimensions::new([4, 4, 4, 4]).unwrap(), 1);
        config.dimensions = vec![4, 4, 4];
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Configuration);

        config.dimensions = vec![4, 0, 4, 4];
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Configuration);

        config.dimensions = vec![4, 4, 4, 4];
        config.processes = 0;
        assert_eq!(
            config.validate().unwrap_err(),
            LatticeError::NoProcesses
        );
    }
}
