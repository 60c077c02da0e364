//! Ground-truth walk over the whole lattice.

use super::{MajorOrder, MemoryRecord, Sites};
use crate::index::linear_index_unchecked;
use crate::{Coord, Dimensions};

/// Iterator returned by [`monolithic`].
#[derive(Debug, Clone)]
pub struct Monolithic {
    extent: Coord,
    sites: Sites,
}

/// Every site of the lattice exactly once, in `order` nesting.
///
/// Yields `dims.volume()` records with no placement.
pub fn monolithic(dims: &Dimensions, order: MajorOrder) -> Monolithic {
    Monolithic {
        extent: dims.extent(),
        sites: Sites::new(dims.extent(), order),
    }
}

impl Iterator for Monolithic {
    type Item = MemoryRecord;

    #[inline]
    fn next(&mut self) -> Option<MemoryRecord> {
        let coord = self.sites.next()?;
        Some(MemoryRecord {
            offset: linear_index_unchecked(&coord, &self.extent),
            coord,
            placement: None,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.sites.size_hint()
    }
}

impl ExactSizeIterator for Monolithic {}
