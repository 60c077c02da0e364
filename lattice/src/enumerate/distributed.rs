//! Rank-by-rank walk over every sub-lattice.

use core::ops::Range;

use super::{MajorOrder, MemoryRecord, Sites};
use crate::decompose::Decomposition;
use crate::error::Result;
use crate::index::linear_index_unchecked;
use crate::rank::{decode_rank, rank_to_coord, Placement};
use crate::{Coord, AXES};

/// The sites of one rank's sub-lattice, local TZYX nesting.
#[derive(Debug, Clone)]
pub struct RankBlock<'a> {
    decomposition: &'a Decomposition,
    rank: usize,
    origin: Coord,
    sites: Sites,
}

impl<'a> RankBlock<'a> {
    fn at(decomposition: &'a Decomposition, rank: usize, process: Coord) -> Self {
        let sub = decomposition.sub_lattice();
        Self {
            decomposition,
            rank,
            origin: Coord(core::array::from_fn(|axis| process[axis] * sub[axis])),
            sites: Sites::new(sub, MajorOrder::Tzyx),
        }
    }

    /// Rank that owns this block.
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Global coordinate of the block's local origin.
    #[inline]
    pub fn origin(&self) -> Coord {
        self.origin
    }
}

/// The sub-lattice of a single rank.
///
/// # Errors
///
/// Returns [`LatticeError::RankOutOfRange`](crate::LatticeError::RankOutOfRange)
/// for a rank outside the process grid.
pub fn rank_block(decomposition: &Decomposition, rank: usize) -> Result<RankBlock<'_>> {
    let process = rank_to_coord(
        rank,
        &decomposition.process_grid(),
        &decomposition.process_volumes(),
    )?;
    Ok(RankBlock::at(decomposition, rank, process))
}

impl Iterator for RankBlock<'_> {
    type Item = MemoryRecord;

    fn next(&mut self) -> Option<MemoryRecord> {
        let local = self.sites.next()?;
        let mut global = [0usize; AXES];
        for (axis, g) in global.iter_mut().enumerate() {
            *g = local[axis] + self.origin[axis];
        }
        let coord = Coord(global);
        let sub = self.decomposition.sub_lattice();
        Some(MemoryRecord {
            offset: linear_index_unchecked(&coord, &self.decomposition.extent()),
            coord,
            placement: Some(Placement {
                rank: self.rank,
                local_offset: linear_index_unchecked(&local, &sub),
            }),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.sites.size_hint()
    }
}

impl ExactSizeIterator for RankBlock<'_> {}

/// Iterator returned by [`distributed`].
#[derive(Debug, Clone)]
pub struct Distributed<'a> {
    decomposition: &'a Decomposition,
    ranks: Range<usize>,
    current: Option<RankBlock<'a>>,
}

/// Every rank's sub-lattice in rank order, global coordinates throughout.
///
/// Yields one record per lattice site, each carrying its [`Placement`].
pub fn distributed(decomposition: &Decomposition) -> Distributed<'_> {
    Distributed {
        decomposition,
        ranks: decomposition.ranks(),
        current: None,
    }
}

impl Iterator for Distributed<'_> {
    type Item = MemoryRecord;

    fn next(&mut self) -> Option<MemoryRecord> {
        loop {
            if let Some(record) = self.current.as_mut().and_then(Iterator::next) {
                return Some(record);
            }
            let rank = self.ranks.next()?;
            let d = self.decomposition;
            // rank < processes == VProc[3]
            let process = decode_rank(rank, &d.process_grid(), &d.process_volumes());
            self.current = Some(RankBlock::at(d, rank, process));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let in_block = self.current.as_ref().map_or(0, ExactSizeIterator::len);
        let n = in_block + self.ranks.len() * self.decomposition.sub_volume();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Distributed<'_> {}

/// Collects the blocks of `ranks` concurrently, returned in rank order.
///
/// # Errors
///
/// Returns [`LatticeError::RankOutOfRange`](crate::LatticeError::RankOutOfRange)
/// if any rank lies outside the process grid.
#[cfg(feature = "parallel")]
pub fn rank_blocks_par(
    decomposition: &Decomposition,
    ranks: Range<usize>,
) -> Result<Vec<Vec<MemoryRecord>>> {
    use rayon::prelude::*;

    ranks
        .into_par_iter()
        .map(|rank| rank_block(decomposition, rank).map(|block| block.collect::<Vec<_>>()))
        .collect()
}
