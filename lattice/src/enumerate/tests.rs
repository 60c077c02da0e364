//! Tests for the monolithic and distributed enumerators.

use super::*;
use crate::{decompose, Dimensions, LatticeError, ProcessCount};

fn split(n: [usize; 4], p: usize) -> crate::Decomposition {
    decompose(&Dimensions::new(n).unwrap(), ProcessCount::new(p).unwrap()).unwrap()
}

// ============================================================================
// Monolithic
// ============================================================================

#[test]
fn tzyx_walk_is_offset_order() {
    let dims = Dimensions::new([3, 4, 3, 5]).unwrap();
    for (expected, record) in monolithic(&dims, MajorOrder::Tzyx).enumerate() {
        assert_eq!(record.offset, expected);
        assert_eq!(record.placement, None);
    }
}

#[test]
fn xyzt_walk_covers_every_offset() {
    let dims = Dimensions::new([3, 4, 3, 5]).unwrap();
    let mut offsets: Vec<usize> = monolithic(&dims, MajorOrder::Xyzt).map(|r| r.offset).collect();
    assert_eq!(offsets.len(), dims.volume());
    assert_eq!(offsets[1], 36); // t steps by N0·N1·N2
    offsets.sort_unstable();
    assert!(offsets.iter().enumerate().all(|(i, &o)| i == o));
}

#[test]
fn monolithic_is_restartable() {
    let dims = Dimensions::new([4, 3, 3, 3]).unwrap();
    let a: Vec<_> = monolithic(&dims, MajorOrder::Xyzt).collect();
    let b: Vec<_> = monolithic(&dims, MajorOrder::Xyzt).collect();
    assert_eq!(a, b);
}

#[test]
fn order_names_parse() {
    assert_eq!("xyzt".parse::<MajorOrder>(), Ok(MajorOrder::Xyzt));
    assert_eq!("TZYX".parse::<MajorOrder>(), Ok(MajorOrder::Tzyx));
    assert!("zyxt".parse::<MajorOrder>().is_err());
    assert_eq!(MajorOrder::default(), MajorOrder::Tzyx);
}

// ============================================================================
// Distributed
// ============================================================================

#[test]
fn sixteen_cubed_over_sixteen_covers_lattice() {
    let d = split([16, 16, 16, 16], 16);
    let records = distributed(&d);
    assert_eq!(records.len(), 65536);

    let mut seen = vec![false; 65536];
    for record in records {
        assert!(!seen[record.offset], "offset {} duplicated", record.offset);
        seen[record.offset] = true;
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn records_agree_with_locate() {
    let d = split([24, 24, 24, 48], 64);
    for record in distributed(&d) {
        let placement = record.placement.unwrap();
        assert_eq!(crate::locate(&record.coord, &d).unwrap(), placement);
        assert_eq!(
            crate::linear_index(&record.coord, &d.extent()).unwrap(),
            record.offset
        );
    }
}

#[test]
fn block_local_offsets_are_sequential() {
    let d = split([16, 16, 16, 32], 8);
    let block = rank_block(&d, 5).unwrap();
    assert_eq!(block.rank(), 5);
    // grid [2,2,2,1]: rank 5 sits at [1,0,1,0]
    assert_eq!(block.origin(), Coord::new(8, 0, 8, 0));
    for (i, record) in block.enumerate() {
        assert_eq!(record.rank(), Some(5));
        assert_eq!(record.placement.unwrap().local_offset, i);
    }
}

#[test]
fn block_for_unknown_rank() {
    let d = split([16, 16, 16, 16], 16);
    assert!(matches!(
        rank_block(&d, 16),
        Err(LatticeError::RankOutOfRange { rank: 16, .. })
    ));
}

#[test]
fn distributed_len_tracks_progress() {
    let d = split([16, 16, 16, 16], 2);
    let mut walk = distributed(&d);
    assert_eq!(walk.len(), 65536);
    walk.by_ref().take(40000).for_each(drop);
    assert_eq!(walk.len(), 65536 - 40000);
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_blocks_match_sequential() {
    let d = split([16, 16, 16, 16], 16);
    let sequential: Vec<MemoryRecord> = distributed(&d).collect();
    let parallel: Vec<MemoryRecord> = rank_blocks_par(&d, d.ranks())
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(sequential, parallel);
}
