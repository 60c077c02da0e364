//! Error taxonomy for lattice configuration, decomposition, and addressing.

use crate::Coord;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, LatticeError>;

/// Coarse classification of a [`LatticeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input rejected before anything is derived.
    Configuration,
    /// The requested process count cannot split the lattice.
    Decomposition,
    /// A coordinate, rank, or offset lies outside its domain.
    OutOfRange,
}

/// Errors raised while configuring, decomposing, or addressing a lattice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LatticeError {
    /// Wrong number of lattice extents.
    #[error("expected {expected} lattice extents, found {found}")]
    Arity {
        /// Required number of extents.
        expected: usize,
        /// Number supplied.
        found: usize,
    },

    /// A lattice extent is zero.
    #[error("lattice extent on axis {axis} must be positive")]
    NonPositiveExtent {
        /// Offending axis.
        axis: usize,
    },

    /// The lattice volume does not fit in a `usize`.
    #[error("lattice volume of {extent} overflows the address space")]
    VolumeOverflow {
        /// Requested extent.
        extent: Coord,
    },

    /// Zero processes were requested.
    #[error("process count must be positive")]
    NoProcesses,

    /// The textual form of the dimensions could not be parsed.
    #[error("invalid lattice dimensions `{input}`: {reason}")]
    Parse {
        /// Input text.
        input: String,
        /// What went wrong.
        reason: String,
    },

    /// A sub-lattice extent is 2 or less.
    #[error(
        "sub-lattice too small on axis {axis}: extent {extent} in sub-lattice {sub_lattice}; \
         use fewer processes or a larger lattice"
    )]
    SubLatticeTooSmall {
        /// First offending axis.
        axis: usize,
        /// Its sub-lattice extent.
        extent: usize,
        /// The full sub-lattice extent.
        sub_lattice: Coord,
    },

    /// A lattice extent is not a whole multiple of its sub-lattice extent.
    #[error("axis {axis}: lattice extent {extent} is not divisible by sub-lattice extent {sub_extent}")]
    IndivisibleAxis {
        /// Offending axis.
        axis: usize,
        /// Lattice extent on that axis.
        extent: usize,
        /// Sub-lattice extent on that axis.
        sub_extent: usize,
    },

    /// The derived process grid does not hold exactly the requested ranks.
    #[error("process grid {grid} holds {grid_size} ranks but {processes} were requested")]
    ProcessGridMismatch {
        /// Processes per axis.
        grid: Coord,
        /// Product of `grid`.
        grid_size: usize,
        /// Requested process count.
        processes: usize,
    },

    /// A coordinate lies outside its extent.
    #[error("coordinate {coord} outside extent {bounds}")]
    CoordinateOutOfRange {
        /// Offending coordinate.
        coord: Coord,
        /// Extent it was checked against.
        bounds: Coord,
    },

    /// A rank lies outside the process grid.
    #[error("rank {rank} outside process grid of {processes} ranks")]
    RankOutOfRange {
        /// Offending rank.
        rank: usize,
        /// Number of ranks in the grid.
        processes: usize,
    },

    /// A scalar offset lies outside the volume.
    #[error("offset {offset} outside volume {volume}")]
    OffsetOutOfRange {
        /// Offending offset.
        offset: usize,
        /// Volume it was checked against.
        volume: usize,
    },
}

impl LatticeError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Arity { .. }
            | Self::NonPositiveExtent { .. }
            | Self::VolumeOverflow { .. }
            | Self::NoProcesses
            | Self::Parse { .. } => ErrorKind::Configuration,
            Self::SubLatticeTooSmall { .. }
            | Self::IndivisibleAxis { .. }
            | Self::ProcessGridMismatch { .. } => ErrorKind::Decomposition,
            Self::CoordinateOutOfRange { .. }
            | Self::RankOutOfRange { .. }
            | Self::OffsetOutOfRange { .. } => ErrorKind::OutOfRange,
        }
    }
}
