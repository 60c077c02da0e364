//! Gluonic lattice addressing.
//!
//! A 4-dimensional periodic lattice of extent `N = (N0, N1, N2, N3)` is
//! split into equal sub-lattices, one per worker process. This crate derives
//! that split and provides the two addressings of every lattice site:
//!
//! ```text
//! monolithic:  offset = x + N0·(y + N1·(z + N2·t))
//! distributed: (rank, local offset within the rank's sub-lattice)
//! ```
//!
//! # Pipeline
//!
//! | Stage | Entry point | Output |
//! |-------|-------------|--------|
//! | Decompose | [`decompose`] | [`Decomposition`] (process grid, sub-lattice, prefix volumes) |
//! | Ground truth | [`enumerate::monolithic`] | one [`MemoryRecord`] per site |
//! | Distributed | [`enumerate::distributed`] | one [`MemoryRecord`] per site, tagged with its [`Placement`] |
//!
//! Both enumerations are lazy iterators; nothing is materialised unless the
//! caller collects it.
//!
//! # Axis Convention
//!
//! Axis 0 (`x`) is fastest-varying in memory, axis 3 (`t`) slowest. Every
//! linear index in the crate (lattice sites, sub-lattice sites, process
//! ranks) follows the same convention.
//!
//! # Example
//!
//! ```
//! use gluonic_lattice::{decompose, enumerate, Dimensions, ProcessCount};
//!
//! let dims: Dimensions = "16,16,16,16".parse().unwrap();
//! let d = decompose(&dims, ProcessCount::new(16).unwrap()).unwrap();
//! assert_eq!(d.process_grid().0, [2, 2, 2, 2]);
//! assert_eq!(d.sub_lattice().0, [8, 8, 8, 8]);
//!
//! let sum: u128 = enumerate::distributed(&d).map(|r| r.offset as u128).sum();
//! let volume = dims.volume() as u128;
//! assert_eq!(sum, volume * (volume - 1) / 2);
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

/// Number of lattice axes.
pub const AXES: usize = 4;

mod coord;
mod error;

pub mod decompose;
pub mod enumerate;
pub mod index;
pub mod rank;

pub use coord::{Coord, Dimensions, GlobalCoord, LocalCoord, ProcessCoord, ProcessCount};
pub use decompose::{decompose, decompose_with_preset, Decomposition};
pub use enumerate::{MajorOrder, MemoryRecord};
pub use error::{ErrorKind, LatticeError, Result};
pub use index::{coordinate_of, linear_index};
pub use rank::{coord_to_rank, global_of, locate, neighbours, rank_to_coord, Neighbours, Placement};
