//! Splitting a lattice into one sub-lattice per process.
//!
//! The split follows a fixed round-robin halving rule rather than an
//! optimal factorisation:
//!
//! ```text
//! NSub = N, remaining = P
//! for axis in 0, 1, 2, 3, 0, 1, ...:
//!     if remaining < 2: stop
//!     NSub[axis] /= 2; remaining /= 2
//! ProcsPerDim[i] = N[i] / NSub[i]
//! ```
//!
//! A result is accepted only if every sub-lattice extent exceeds
//! [`MIN_SUB_EXTENT`] − 1, every axis divides evenly, and the process grid
//! holds exactly `P` ranks.
//!
//! # Example
//!
//! ```
//! use gluonic_lattice::{decompose, Dimensions, ErrorKind, ProcessCount};
//!
//! let dims = Dimensions::new([4, 4, 4, 8]).unwrap();
//! let err = decompose(&dims, ProcessCount::new(2).unwrap()).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Decomposition);
//! ```

use core::ops::Range;

use tracing::debug;

use crate::error::{LatticeError, Result};
use crate::index::prefix_volumes;
use crate::{Coord, Dimensions, ProcessCount, AXES};

/// Smallest admissible sub-lattice extent on any axis.
pub const MIN_SUB_EXTENT: usize = 3;

/// A validated split of a lattice across a process grid.
///
/// Computed once and shared read-only by every enumerator.
///
/// # Invariants
///
/// - `dimensions[i] == sub_lattice[i] * process_grid[i]`
/// - `sub_lattice[i] >= MIN_SUB_EXTENT`
/// - `∏ process_grid == processes`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Decomposition {
    dimensions: Dimensions,
    processes: usize,
    process_grid: Coord,
    sub_lattice: Coord,
    volumes: [usize; AXES],
    sub_volumes: [usize; AXES],
    process_volumes: [usize; AXES],
}

/// Derives the process grid and sub-lattice for `processes` ranks.
///
/// # Errors
///
/// Returns a [`Decomposition`](crate::ErrorKind::Decomposition)-kind error
/// if any sub-lattice extent ends up at 2 or below, an axis does not divide
/// evenly, or the process grid does not hold exactly `processes` ranks
/// (e.g. a count that is not a power of two).
pub fn decompose(dims: &Dimensions, processes: ProcessCount) -> Result<Decomposition> {
    let sub_lattice = halve_round_robin(dims.extent(), processes.get());
    Decomposition::validated(*dims, processes.get(), sub_lattice)
}

/// Accepts a caller-chosen sub-lattice instead of deriving one.
///
/// # Errors
///
/// Same acceptance rules as [`decompose`].
pub fn decompose_with_preset(
    dims: &Dimensions,
    processes: ProcessCount,
    sub_lattice: Coord,
) -> Result<Decomposition> {
    Decomposition::validated(*dims, processes.get(), sub_lattice)
}

fn halve_round_robin(extent: Coord, processes: usize) -> Coord {
    let mut sub = extent.0;
    let mut remaining = processes;
    'halving: while remaining >= 2 {
        for n in sub.iter_mut() {
            *n /= 2;
            remaining /= 2;
            if remaining < 2 {
                break 'halving;
            }
        }
    }
    Coord(sub)
}

impl Decomposition {
    fn validated(dimensions: Dimensions, processes: usize, sub_lattice: Coord) -> Result<Self> {
        if let Some(axis) = sub_lattice.0.iter().position(|&n| n < MIN_SUB_EXTENT) {
            return Err(LatticeError::SubLatticeTooSmall {
                axis,
                extent: sub_lattice[axis],
                sub_lattice,
            });
        }

        let extent = dimensions.extent();
        let mut grid = [0usize; AXES];
        for (axis, g) in grid.iter_mut().enumerate() {
            if extent[axis] % sub_lattice[axis] != 0 {
                return Err(LatticeError::IndivisibleAxis {
                    axis,
                    extent: extent[axis],
                    sub_extent: sub_lattice[axis],
                });
            }
            *g = extent[axis] / sub_lattice[axis];
        }
        let process_grid = Coord(grid);

        // Bounded by the lattice volume.
        let grid_size = process_grid.product().unwrap_or(usize::MAX);
        if grid_size != processes {
            return Err(LatticeError::ProcessGridMismatch {
                grid: process_grid,
                grid_size,
                processes,
            });
        }

        let decomposition = Self {
            dimensions,
            processes,
            process_grid,
            sub_lattice,
            volumes: prefix_volumes(&extent),
            sub_volumes: prefix_volumes(&sub_lattice),
            process_volumes: prefix_volumes(&process_grid),
        };
        debug!(
            lattice = %dimensions,
            processes,
            grid = %process_grid,
            sub_lattice = %sub_lattice,
            "derived decomposition"
        );
        Ok(decomposition)
    }

    /// Global lattice dimensions `N`.
    #[inline]
    pub const fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    /// Global extent `N` as a coordinate.
    #[inline]
    pub const fn extent(&self) -> Coord {
        self.dimensions.extent()
    }

    /// Number of ranks `P`.
    #[inline]
    pub const fn processes(&self) -> usize {
        self.processes
    }

    /// All ranks, `0..P`.
    #[inline]
    pub const fn ranks(&self) -> Range<usize> {
        0..self.processes
    }

    /// Processes per axis, `ProcsPerDim`.
    #[inline]
    pub const fn process_grid(&self) -> Coord {
        self.process_grid
    }

    /// Sub-lattice extent, `NSub`.
    #[inline]
    pub const fn sub_lattice(&self) -> Coord {
        self.sub_lattice
    }

    /// Sites per sub-lattice.
    #[inline]
    pub const fn sub_volume(&self) -> usize {
        self.sub_volumes[AXES - 1]
    }

    /// Prefix volumes `V` of the lattice.
    #[inline]
    pub const fn volumes(&self) -> [usize; AXES] {
        self.volumes
    }

    /// Prefix volumes `VSub` of a sub-lattice.
    #[inline]
    pub const fn sub_volumes(&self) -> [usize; AXES] {
        self.sub_volumes
    }

    /// Prefix volumes `VProc` of the process grid.
    #[inline]
    pub const fn process_volumes(&self) -> [usize; AXES] {
        self.process_volumes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn dims(n: [usize; 4]) -> Dimensions {
        Dimensions::new(n).unwrap()
    }

    fn procs(p: usize) -> ProcessCount {
        ProcessCount::new(p).unwrap()
    }

    #[test]
    fn sixteen_cubed_over_sixteen() {
        let d = decompose(&dims([16, 16, 16, 16]), procs(16)).unwrap();
        assert_eq!(d.process_grid(), Coord::new(2, 2, 2, 2));
        assert_eq!(d.sub_lattice(), Coord::new(8, 8, 8, 8));
        assert_eq!(d.sub_volume(), 4096);
        assert_eq!(d.volumes(), [16, 256, 4096, 65536]);
        assert_eq!(d.sub_volumes(), [8, 64, 512, 4096]);
        assert_eq!(d.process_volumes(), [2, 4, 8, 16]);
    }

    #[test]
    fn thin_axis_is_rejected() {
        let err = decompose(&dims([4, 4, 4, 8]), procs(2)).unwrap_err();
        assert_eq!(
            err,
            LatticeError::SubLatticeTooSmall {
                axis: 0,
                extent: 2,
                sub_lattice: Coord::new(2, 4, 4, 8)
            }
        );
    }

    #[test]
    fn too_many_processes_rejected() {
        let err = decompose(&dims([4, 4, 4, 4]), procs(512)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decomposition);
    }

    #[test]
    fn halving_wraps_round_robin() {
        // 512 = 2^9: axes 0,1,2,3,0,1,2,3,0
        let d = decompose(&dims([48, 48, 48, 96]), procs(512)).unwrap();
        assert_eq!(d.sub_lattice(), Coord::new(6, 12, 12, 24));
        assert_eq!(d.process_grid(), Coord::new(8, 4, 4, 4));
    }

    #[test]
    fn single_process_keeps_whole_lattice() {
        let d = decompose(&dims([4, 4, 4, 8]), procs(1)).unwrap();
        assert_eq!(d.sub_lattice(), Coord::new(4, 4, 4, 8));
        assert_eq!(d.process_grid(), Coord::new(1, 1, 1, 1));
    }

    #[test]
    fn non_power_of_two_rejected() {
        let err = decompose(&dims([16, 16, 16, 16]), procs(3)).unwrap_err();
        assert!(matches!(
            err,
            LatticeError::ProcessGridMismatch {
                grid_size: 2,
                processes: 3,
                ..
            }
        ));
    }

    #[test]
    fn odd_extent_rejected() {
        let err = decompose(&dims([7, 8, 8, 8]), procs(2)).unwrap_err();
        // 7 / 2 = 3 leaves a remainder of 1.
        assert!(matches!(err, LatticeError::IndivisibleAxis { axis: 0, .. }));
    }

    #[test]
    fn preset_is_validated() {
        let n = dims([16, 16, 16, 32]);
        let d = decompose_with_preset(&n, procs(8), Coord::new(8, 8, 8, 16)).unwrap();
        assert_eq!(d.process_grid(), Coord::new(2, 2, 2, 2));

        let mismatch = decompose_with_preset(&n, procs(4), Coord::new(8, 8, 8, 16));
        assert!(matches!(mismatch, Err(LatticeError::ProcessGridMismatch { .. })));

        let indivisible = decompose_with_preset(&n, procs(4), Coord::new(5, 16, 16, 32));
        assert!(matches!(indivisible, Err(LatticeError::IndivisibleAxis { .. })));
    }
}
