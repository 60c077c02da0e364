//! Fixed-size coordinates, lattice dimensions, and process counts.

use core::fmt;
use core::ops::Index;
use core::str::FromStr;

use crate::error::{LatticeError, Result};
use crate::AXES;

/// A 4-tuple of lattice indices or extents, axis 0 first.
///
/// The same value type serves as a site coordinate, a sub-lattice
/// coordinate, a process-grid coordinate, and as the extent of any of
/// those spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord(pub [usize; AXES]);

/// Coordinate of a site in the full lattice.
pub type GlobalCoord = Coord;
/// Coordinate of a site inside one sub-lattice.
pub type LocalCoord = Coord;
/// Position of a rank in the process grid.
pub type ProcessCoord = Coord;

impl Coord {
    /// The all-zero coordinate.
    pub const ORIGIN: Self = Self([0; AXES]);

    /// Creates a coordinate from its four components.
    #[inline]
    pub const fn new(x: usize, y: usize, z: usize, t: usize) -> Self {
        Self([x, y, z, t])
    }

    /// True if every component is strictly below the matching bound.
    #[inline]
    pub fn within(&self, bounds: &Coord) -> bool {
        self.0.iter().zip(bounds.0.iter()).all(|(c, b)| c < b)
    }

    /// Product of all components, or `None` on overflow.
    #[inline]
    pub fn product(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
    }

    /// Component-wise `self[i] - 1`, saturating at zero.
    pub fn last(&self) -> Self {
        Self(self.0.map(|n| n.saturating_sub(1)))
    }
}

impl Index<usize> for Coord {
    type Output = usize;

    #[inline]
    fn index(&self, axis: usize) -> &usize {
        &self.0[axis]
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z, t] = self.0;
        write!(f, "[{},{},{},{}]", x, y, z, t)
    }
}

/// Global lattice extent `(N0, N1, N2, N3)`.
///
/// # Invariant
///
/// Every extent is positive and the volume `N0·N1·N2·N3` fits in a `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<usize>", into = "[usize; 4]")
)]
pub struct Dimensions {
    extent: Coord,
    volume: usize,
}

impl Dimensions {
    /// Validates and wraps a lattice extent.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::NonPositiveExtent`] for a zero extent and
    /// [`LatticeError::VolumeOverflow`] when the volume does not fit.
    pub fn new(extent: [usize; AXES]) -> Result<Self> {
        if let Some(axis) = extent.iter().position(|&n| n == 0) {
            return Err(LatticeError::NonPositiveExtent { axis });
        }
        let extent = Coord(extent);
        let volume = extent
            .product()
            .ok_or(LatticeError::VolumeOverflow { extent })?;
        Ok(Self { extent, volume })
    }

    /// Validates extents supplied as a slice of arbitrary length.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::Arity`] unless exactly four extents are given,
    /// and otherwise the errors of [`Dimensions::new`].
    pub fn from_slice(extents: &[usize]) -> Result<Self> {
        let extent: [usize; AXES] = extents.try_into().map_err(|_| LatticeError::Arity {
            expected: AXES,
            found: extents.len(),
        })?;
        Self::new(extent)
    }

    /// The extent as a coordinate.
    #[inline]
    pub const fn extent(&self) -> Coord {
        self.extent
    }

    /// Number of lattice sites.
    #[inline]
    pub const fn volume(&self) -> usize {
        self.volume
    }
}

impl FromStr for Dimensions {
    type Err = LatticeError;

    /// Parses `"16,16,16,32"` (commas, `x`, or whitespace as separators).
    fn from_str(input: &str) -> Result<Self> {
        let mut extents = Vec::with_capacity(AXES);
        for part in input
            .split(|c: char| c == ',' || c == 'x' || c.is_whitespace())
            .filter(|s| !s.is_empty())
        {
            let n = part.parse::<usize>().map_err(|_| LatticeError::Parse {
                input: input.to_string(),
                reason: format!("`{}` is not a non-negative integer", part),
            })?;
            extents.push(n);
        }
        Self::from_slice(&extents)
    }
}

impl TryFrom<Vec<usize>> for Dimensions {
    type Error = LatticeError;

    fn try_from(extents: Vec<usize>) -> Result<Self> {
        Self::from_slice(&extents)
    }
}

impl From<Dimensions> for [usize; AXES] {
    fn from(dims: Dimensions) -> Self {
        dims.extent.0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z, t] = self.extent.0;
        write!(f, "{}x{}x{}x{}", x, y, z, t)
    }
}

/// Total number of worker processes. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "usize", into = "usize")
)]
pub struct ProcessCount(usize);

impl ProcessCount {
    /// Validates a process count.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::NoProcesses`] for zero.
    pub fn new(processes: usize) -> Result<Self> {
        if processes == 0 {
            return Err(LatticeError::NoProcesses);
        }
        Ok(Self(processes))
    }

    /// The raw count.
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    /// The largest power of two not exceeding this count.
    ///
    /// Ranks at or above this value sit idle when a launcher hands out a
    /// process count that is not a power of two.
    ///
    /// ```
    /// use gluonic_lattice::ProcessCount;
    ///
    /// assert_eq!(ProcessCount::new(24).unwrap().active().get(), 16);
    /// assert_eq!(ProcessCount::new(1).unwrap().active().get(), 1);
    /// ```
    pub const fn active(self) -> Self {
        Self(1 << (usize::BITS - 1 - self.0.leading_zeros()))
    }
}

impl TryFrom<usize> for ProcessCount {
    type Error = LatticeError;

    fn try_from(processes: usize) -> Result<Self> {
        Self::new(processes)
    }
}

impl From<ProcessCount> for usize {
    fn from(count: ProcessCount) -> Self {
        count.0
    }
}

impl fmt::Display for ProcessCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn parses_separators() {
        let a: Dimensions = "4,4,4,8".parse().unwrap();
        let b: Dimensions = "4x4x4x8".parse().unwrap();
        let c: Dimensions = " 4 4 4 8 ".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.volume(), 512);
        assert_eq!(a.to_string(), "4x4x4x8");
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = "4,4,4".parse::<Dimensions>().unwrap_err();
        assert_eq!(err, LatticeError::Arity { expected: 4, found: 3 });
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn rejects_zero_and_negative_extents() {
        let zero = "4,0,4,4".parse::<Dimensions>().unwrap_err();
        assert_eq!(zero, LatticeError::NonPositiveExtent { axis: 1 });
        let negative = "4,-4,4,4".parse::<Dimensions>().unwrap_err();
        assert_eq!(negative.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn rejects_overflowing_volume() {
        let err = Dimensions::new([usize::MAX, 2, 1, 1]).unwrap_err();
        assert!(matches!(err, LatticeError::VolumeOverflow { .. }));
    }

    #[test]
    fn zero_processes_rejected() {
        assert_eq!(ProcessCount::new(0), Err(LatticeError::NoProcesses));
    }

    #[test]
    fn active_count_is_power_of_two_floor() {
        for (p, active) in [(1, 1), (2, 2), (3, 2), (7, 4), (16, 16), (17, 16), (511, 256)] {
            assert_eq!(ProcessCount::new(p).unwrap().active().get(), active, "P = {}", p);
        }
    }

    #[test]
    fn coord_display_and_last() {
        let c = Coord::new(2, 2, 1, 4);
        assert_eq!(c.to_string(), "[2,2,1,4]");
        assert_eq!(c.last(), Coord::new(1, 1, 0, 3));
        assert!(Coord::new(1, 1, 0, 3).within(&c));
        assert!(!c.within(&c));
    }
}
