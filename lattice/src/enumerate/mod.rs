//! Lazy enumeration of lattice sites as memory records.
//!
//! | Enumerator | Walk | Records |
//! |------------|------|---------|
//! | [`monolithic`] | full lattice, XYZT or TZYX nesting | `(offset, coord)` |
//! | [`distributed`] | rank by rank, each sub-lattice in TZYX nesting | `(offset, coord, placement)` |
//!
//! Both are pure functions of their inputs: every call restarts from the
//! first site and no state is shared between iterators.
//!
//! # Example
//!
//! ```
//! use gluonic_lattice::enumerate::{monolithic, MajorOrder};
//! use gluonic_lattice::{Coord, Dimensions};
//!
//! let dims = Dimensions::new([3, 3, 3, 4]).unwrap();
//! let mut sites = monolithic(&dims, MajorOrder::Xyzt);
//! assert_eq!(sites.len(), 108);
//! assert_eq!(sites.next().unwrap().coord, Coord::ORIGIN);
//! // t varies fastest in XYZT nesting
//! assert_eq!(sites.next().unwrap().coord, Coord::new(0, 0, 0, 1));
//! ```

mod distributed;
mod monolithic;

#[cfg(test)]
mod tests;

use core::fmt;
use core::str::FromStr;

use crate::rank::Placement;
use crate::{Coord, AXES};

pub use distributed::{distributed, rank_block, Distributed, RankBlock};
#[cfg(feature = "parallel")]
pub use distributed::rank_blocks_par;
pub use monolithic::{monolithic, Monolithic};

/// Nesting order of a lattice walk, outermost axis first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum MajorOrder {
    /// `x` outermost, `t` innermost.
    Xyzt,
    /// `t` outermost, `x` innermost. Sites come out in offset order.
    #[default]
    Tzyx,
}

impl MajorOrder {
    /// Axes from outermost to innermost loop.
    #[inline]
    pub const fn nesting(self) -> [usize; AXES] {
        match self {
            Self::Xyzt => [0, 1, 2, 3],
            Self::Tzyx => [3, 2, 1, 0],
        }
    }

    /// Upper-case label, `"XYZT"` or `"TZYX"`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Xyzt => "XYZT",
            Self::Tzyx => "TZYX",
        }
    }
}

impl fmt::Display for MajorOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for an unrecognised [`MajorOrder`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown major order `{0}` (expected `xyzt` or `tzyx`)")]
pub struct ParseOrderError(pub String);

impl FromStr for MajorOrder {
    type Err = ParseOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xyzt" => Ok(Self::Xyzt),
            "tzyx" => Ok(Self::Tzyx),
            _ => Err(ParseOrderError(s.to_string())),
        }
    }
}

/// One lattice site as seen by an enumerator.
///
/// Transient: produced by an enumerator and consumed by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryRecord {
    /// Global scalar offset of the site.
    pub offset: usize,
    /// Global coordinate of the site.
    pub coord: Coord,
    /// Owning rank and local offset; `None` for monolithic records.
    pub placement: Option<Placement>,
}

impl MemoryRecord {
    /// Owning rank, if this record came from a distributed walk.
    #[inline]
    pub fn rank(&self) -> Option<usize> {
        self.placement.map(|p| p.rank)
    }
}

/// Odometer over every coordinate of a box in a fixed nesting order.
#[derive(Debug, Clone)]
pub(crate) struct Sites {
    extent: Coord,
    nesting: [usize; AXES],
    next: Coord,
    remaining: usize,
}

impl Sites {
    pub(crate) fn new(extent: Coord, order: MajorOrder) -> Self {
        Self {
            extent,
            nesting: order.nesting(),
            next: Coord::ORIGIN,
            remaining: extent.product().unwrap_or(0),
        }
    }
}

impl Iterator for Sites {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next;
        for &axis in self.nesting.iter().rev() {
            self.next.0[axis] += 1;
            if self.next.0[axis] < self.extent[axis] {
                break;
            }
            self.next.0[axis] = 0;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Sites {}
