//! Linear indexing of 4D coordinates, axis 0 fastest.
//!
//! ```text
//! offset = c0 + n0·(c1 + n1·(c2 + n2·c3))
//! ```
//!
//! For a fixed extent `n` this is a bijection between the box
//! `∏[0, n[i])` and `[0, ∏n[i])`. The same formula addresses lattice
//! sites (extent `N`), sub-lattice sites (extent `NSub`), and ranks in the
//! process grid (extent `ProcsPerDim`).

use crate::error::{LatticeError, Result};
use crate::{Coord, AXES};

/// Flat offset of `coord` inside a box of extent `extent`.
///
/// # Errors
///
/// Returns [`LatticeError::CoordinateOutOfRange`] if any component of
/// `coord` is not below the matching extent.
///
/// # Example
///
/// ```
/// use gluonic_lattice::{linear_index, Coord};
///
/// let n = Coord::new(4, 4, 4, 8);
/// assert_eq!(linear_index(&Coord::new(1, 0, 0, 0), &n).unwrap(), 1);
/// assert_eq!(linear_index(&Coord::new(0, 1, 0, 0), &n).unwrap(), 4);
/// assert_eq!(linear_index(&Coord::new(3, 3, 3, 7), &n).unwrap(), 511);
/// assert!(linear_index(&Coord::new(4, 0, 0, 0), &n).is_err());
/// ```
pub fn linear_index(coord: &Coord, extent: &Coord) -> Result<usize> {
    if !coord.within(extent) {
        return Err(LatticeError::CoordinateOutOfRange {
            coord: *coord,
            bounds: *extent,
        });
    }
    Ok(linear_index_unchecked(coord, extent))
}

/// [`linear_index`] without the range check.
///
/// The caller guarantees `coord` lies inside `extent`; out-of-range input
/// yields an offset that aliases another site.
#[inline]
pub const fn linear_index_unchecked(coord: &Coord, extent: &Coord) -> usize {
    let [c0, c1, c2, c3] = coord.0;
    let [n0, n1, n2, _] = extent.0;
    c0 + n0 * (c1 + n1 * (c2 + n2 * c3))
}

/// Inverse of [`linear_index`].
///
/// # Errors
///
/// Returns [`LatticeError::OffsetOutOfRange`] if `offset` is not below the
/// volume of `extent` (a zero or overflowing extent has no valid offsets).
pub fn coordinate_of(offset: usize, extent: &Coord) -> Result<Coord> {
    let volume = extent.product().unwrap_or(0);
    if offset >= volume {
        return Err(LatticeError::OffsetOutOfRange { offset, volume });
    }
    let mut rest = offset;
    let mut coord = [0usize; AXES];
    for (axis, c) in coord.iter_mut().enumerate() {
        *c = rest % extent[axis];
        rest /= extent[axis];
    }
    Ok(Coord(coord))
}

/// Cumulative products `[n0, n0·n1, n0·n1·n2, n0·n1·n2·n3]`, saturating.
///
/// These are the weights of the axis-0-fastest layout: `V`, `VSub`, and
/// `VProc` for the lattice, sub-lattice, and process grid respectively.
pub fn prefix_volumes(extent: &Coord) -> [usize; AXES] {
    let mut volumes = [0usize; AXES];
    let mut acc = 1usize;
    for (axis, v) in volumes.iter_mut().enumerate() {
        acc = acc.saturating_mul(extent[axis]);
        *v = acc;
    }
    volumes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijection_exhaustive_small() {
        let n = Coord::new(3, 2, 4, 5);
        let volume = n.product().unwrap();
        let mut seen = vec![false; volume];
        for t in 0..5 {
            for z in 0..4 {
                for y in 0..2 {
                    for x in 0..3 {
                        let c = Coord::new(x, y, z, t);
                        let offset = linear_index(&c, &n).unwrap();
                        assert!(!seen[offset], "offset {} produced twice", offset);
                        seen[offset] = true;
                        assert_eq!(coordinate_of(offset, &n).unwrap(), c);
                    }
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn axis_zero_is_fastest() {
        let n = Coord::new(4, 4, 4, 8);
        assert_eq!(linear_index_unchecked(&Coord::new(0, 0, 1, 0), &n), 16);
        assert_eq!(linear_index_unchecked(&Coord::new(0, 0, 0, 1), &n), 64);
    }

    #[test]
    fn out_of_range_coordinate() {
        let n = Coord::new(2, 2, 2, 2);
        let err = linear_index(&Coord::new(0, 0, 0, 2), &n).unwrap_err();
        assert_eq!(
            err,
            LatticeError::CoordinateOutOfRange {
                coord: Coord::new(0, 0, 0, 2),
                bounds: n
            }
        );
    }

    #[test]
    fn out_of_range_offset() {
        let n = Coord::new(2, 2, 2, 2);
        assert_eq!(
            coordinate_of(16, &n),
            Err(LatticeError::OffsetOutOfRange {
                offset: 16,
                volume: 16
            })
        );
    }

    #[test]
    fn prefix_volumes_are_cumulative() {
        assert_eq!(prefix_volumes(&Coord::new(2, 3, 4, 5)), [2, 6, 24, 120]);
    }
}
