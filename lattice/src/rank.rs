//! Ranks, process-grid coordinates, neighbours, and the two-level index.
//!
//! A rank's position in the process grid is decoded digit by digit, using
//! the cumulative grid volumes `VProc` as divisors beyond the first digit:
//!
//! ```text
//! c0 = rank % P0
//! c1 = (rank / VProc0) % P1
//! c2 = (rank / VProc1) % P2
//! c3 = (rank / VProc2) % P3
//! ```
//!
//! Whether that decode is a bijection onto the grid is checked by the
//! conformance validators rather than assumed.

use crate::decompose::Decomposition;
use crate::error::{LatticeError, Result};
use crate::index::{coordinate_of, linear_index, linear_index_unchecked};
use crate::{Coord, GlobalCoord, ProcessCoord, AXES};

/// Position of `rank` in a process grid.
///
/// # Errors
///
/// Returns [`LatticeError::RankOutOfRange`] unless
/// `rank < process_volumes[3]`.
pub fn rank_to_coord(
    rank: usize,
    grid: &Coord,
    process_volumes: &[usize; AXES],
) -> Result<ProcessCoord> {
    let processes = process_volumes[AXES - 1];
    if rank >= processes {
        return Err(LatticeError::RankOutOfRange { rank, processes });
    }
    Ok(decode_rank(rank, grid, process_volumes))
}

#[inline]
pub(crate) fn decode_rank(rank: usize, grid: &Coord, vproc: &[usize; AXES]) -> ProcessCoord {
    Coord([
        rank % grid[0],
        (rank / vproc[0]) % grid[1],
        (rank / vproc[1]) % grid[2],
        (rank / vproc[2]) % grid[3],
    ])
}

/// Rank at a process-grid position, axis 0 fastest.
///
/// # Errors
///
/// Returns [`LatticeError::CoordinateOutOfRange`] if `coord` lies outside
/// `grid`.
pub fn coord_to_rank(coord: &ProcessCoord, grid: &Coord) -> Result<usize> {
    linear_index(coord, grid)
}

/// The eight nearest-neighbour ranks of one rank on the periodic grid.
///
/// `list[2μ]` is the neighbour one step backward along axis `μ`,
/// `list[2μ + 1]` one step forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Neighbours {
    /// The rank these neighbours belong to.
    pub rank: usize,
    /// Neighbour ranks, backward/forward interleaved per axis.
    pub list: [usize; 2 * AXES],
}

impl Neighbours {
    /// Neighbour one step backward (−μ) along `axis`.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= 4`.
    #[inline]
    pub fn backward(&self, axis: usize) -> usize {
        self.list[2 * axis]
    }

    /// Neighbour one step forward (+μ) along `axis`.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= 4`.
    #[inline]
    pub fn forward(&self, axis: usize) -> usize {
        self.list[2 * axis + 1]
    }
}

/// Periodic nearest neighbours of `rank`.
///
/// # Errors
///
/// Returns [`LatticeError::RankOutOfRange`] for a rank outside the grid.
pub fn neighbours(rank: usize, decomposition: &Decomposition) -> Result<Neighbours> {
    let grid = decomposition.process_grid();
    let here = rank_to_coord(rank, &grid, &decomposition.process_volumes())?;
    let mut list = [0usize; 2 * AXES];
    for axis in 0..AXES {
        let mut back = here;
        back.0[axis] = (here[axis] + grid[axis] - 1) % grid[axis];
        let mut fwd = here;
        fwd.0[axis] = (here[axis] + 1) % grid[axis];
        list[2 * axis] = linear_index_unchecked(&back, &grid);
        list[2 * axis + 1] = linear_index_unchecked(&fwd, &grid);
    }
    Ok(Neighbours { rank, list })
}

/// The distributed address of a lattice site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    /// Owning rank.
    pub rank: usize,
    /// Offset inside the rank's sub-lattice, axis 0 fastest.
    pub local_offset: usize,
}

/// Finds the rank and local offset that own a global site.
///
/// # Errors
///
/// Returns [`LatticeError::CoordinateOutOfRange`] if `global` lies outside
/// the lattice.
///
/// # Example
///
/// ```
/// use gluonic_lattice::{decompose, locate, global_of, Coord, Dimensions, ProcessCount};
///
/// let dims = Dimensions::new([16, 16, 16, 16]).unwrap();
/// let d = decompose(&dims, ProcessCount::new(16).unwrap()).unwrap();
///
/// let site = Coord::new(9, 0, 3, 15);
/// let p = locate(&site, &d).unwrap();
/// assert_eq!(p.rank, 1 + 8);
/// assert_eq!(global_of(&p, &d).unwrap(), site);
/// ```
pub fn locate(global: &GlobalCoord, decomposition: &Decomposition) -> Result<Placement> {
    let extent = decomposition.extent();
    if !global.within(&extent) {
        return Err(LatticeError::CoordinateOutOfRange {
            coord: *global,
            bounds: extent,
        });
    }
    let sub = decomposition.sub_lattice();
    let process = Coord(core::array::from_fn(|axis| global[axis] / sub[axis]));
    let local = Coord(core::array::from_fn(|axis| global[axis] % sub[axis]));
    Ok(Placement {
        rank: linear_index_unchecked(&process, &decomposition.process_grid()),
        local_offset: linear_index_unchecked(&local, &sub),
    })
}

/// Inverse of [`locate`].
///
/// # Errors
///
/// Returns [`LatticeError::RankOutOfRange`] or
/// [`LatticeError::OffsetOutOfRange`] for a placement outside the grid or
/// sub-lattice.
pub fn global_of(placement: &Placement, decomposition: &Decomposition) -> Result<GlobalCoord> {
    let process = rank_to_coord(
        placement.rank,
        &decomposition.process_grid(),
        &decomposition.process_volumes(),
    )?;
    let sub = decomposition.sub_lattice();
    let local = coordinate_of(placement.local_offset, &sub)?;
    Ok(Coord(core::array::from_fn(|axis| {
        local[axis] + process[axis] * sub[axis]
    })))
}
