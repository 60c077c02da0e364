//! Rank map validator.
//!
//! Decodes every rank in `0..P` with [`rank_to_coord`] and confirms that each
//! one lands inside the process grid and that no two ranks share a process
//! coordinate. It then checks that every grid position is reached and that
//! ranks `0` and `P-1` sit at the grid's two corners.

use gluonic_lattice::{
    coord_to_rank, coordinate_of, rank_to_coord, Coord, Decomposition, ProcessCoord,
};

use crate::report::{TestResult, VerificationReport};

const VALIDATOR: &str = "rank-map";
const MAX_LISTED: usize = 16;

/// Validates the rank decode of `decomposition`.
pub fn validate(decomposition: &Decomposition) -> VerificationReport {
    let grid = decomposition.process_grid();
    let vproc = decomposition.process_volumes();
    let processes = decomposition.processes();

    let mut report = VerificationReport::new();
    let owner = check_decodes(&mut report, &grid, processes, |rank| {
        rank_to_coord(rank, &grid, &vproc)
    });

    let unreached: Vec<Coord> = owner
        .iter()
        .enumerate()
        .filter(|(_, owner)| owner.is_none())
        .filter_map(|(slot, _)| coordinate_of(slot, &grid).ok())
        .collect();
    if unreached.is_empty() {
        report.push(TestResult::pass(
            format!("{VALIDATOR}/onto"),
            format!("every position of grid {grid} has a rank"),
        ));
    } else {
        report.push(TestResult::fail_with_details(
            format!("{VALIDATOR}/onto"),
            format!("{} grid positions have no rank", unreached.len()),
            unreached
                .iter()
                .take(MAX_LISTED)
                .map(ToString::to_string)
                .collect(),
        ));
    }

    let first = rank_to_coord(0, &grid, &vproc).ok();
    let last = processes
        .checked_sub(1)
        .and_then(|rank| rank_to_coord(rank, &grid, &vproc).ok());
    if first == Some(Coord::ORIGIN) && last == Some(grid.last()) {
        report.push(TestResult::pass(
            format!("{VALIDATOR}/corners"),
            format!("rank 0 at {}, rank {} at {}", Coord::ORIGIN, processes - 1, grid.last()),
        ));
    } else {
        report.push(TestResult::fail_with_details(
            format!("{VALIDATOR}/corners"),
            "first and last ranks are not at the grid corners",
            vec![
                format!("rank 0: {first:?}"),
                format!("rank {}: {last:?}", processes.saturating_sub(1)),
            ],
        ));
    }

    report
}

// Pushes `domain` and `injective`; returns the first rank decoded into each
// grid slot.
fn check_decodes(
    report: &mut VerificationReport,
    grid: &Coord,
    processes: usize,
    decode: impl Fn(usize) -> gluonic_lattice::Result<ProcessCoord>,
) -> Vec<Option<usize>> {
    let mut owner: Vec<Option<usize>> = vec![None; processes];
    let mut strays = Vec::new();
    let mut stray_total = 0usize;
    let mut collisions = Vec::new();
    let mut collision_total = 0usize;

    for rank in 0..processes {
        let decoded = decode(rank)
            .and_then(|coord| coord_to_rank(&coord, grid).map(|slot| (coord, slot)));
        let (coord, slot) = match decoded {
            Ok(found) => found,
            Err(e) => {
                stray_total += 1;
                if strays.len() < MAX_LISTED {
                    strays.push(format!("rank {rank}: {e}"));
                }
                continue;
            }
        };
        match owner.get_mut(slot) {
            Some(entry) => match *entry {
                None => *entry = Some(rank),
                Some(first) => {
                    collision_total += 1;
                    if collisions.len() < MAX_LISTED {
                        collisions.push(format!("ranks {first} and {rank} both decode to {coord}"));
                    }
                }
            },
            None => {
                stray_total += 1;
                if strays.len() < MAX_LISTED {
                    strays.push(format!("rank {rank} decodes to {coord}, slot {slot} of {processes}"));
                }
            }
        }
    }

    if stray_total == 0 {
        report.push(TestResult::pass(
            format!("{VALIDATOR}/domain"),
            format!("{processes} ranks decode inside grid {grid}"),
        ));
    } else {
        report.push(TestResult::fail_with_details(
            format!("{VALIDATOR}/domain"),
            format!("{stray_total} ranks decode outside grid {grid}"),
            strays,
        ));
    }

    if collision_total == 0 {
        report.push(TestResult::pass(
            format!("{VALIDATOR}/injective"),
            format!("{processes} ranks decode to distinct grid positions"),
        ));
    } else {
        report.push(TestResult::fail_with_details(
            format!("{VALIDATOR}/injective"),
            format!("{collision_total} ranks collide"),
            collisions,
        ));
    }

    owner
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluonic_lattice::{decompose, decompose_with_preset, Dimensions, ProcessCount};

    #[test]
    fn derived_grids_are_bijective() {
        for (n, p) in [
            ([16, 16, 16, 16], 16),
            ([48, 48, 48, 96], 512),
            ([24, 24, 24, 48], 64),
            ([8, 8, 8, 8], 1),
        ] {
            let dims = Dimensions::new(n).unwrap();
            let d = decompose(&dims, ProcessCount::new(p).unwrap()).unwrap();
            let report = validate(&d);
            assert!(report.all_passed(), "{n:?}/{p}: {:?}", report.results);
            assert_eq!(report.results.len(), 4);
        }
    }

    #[test]
    fn uneven_preset_grid_is_bijective() {
        let dims = Dimensions::new([32, 32, 16, 16]).unwrap();
        let d = decompose_with_preset(
            &dims,
            ProcessCount::new(16).unwrap(),
            Coord::new(8, 8, 16, 16),
        )
        .unwrap();
        assert_eq!(d.process_grid(), Coord::new(4, 4, 1, 1));
        assert!(validate(&d).all_passed());
    }

    #[test]
    fn out_of_grid_decodes_are_not_collisions() {
        // Ranks 2 and 3 run off a 2x2 grid along axis 0; rank 1 is never reached.
        let grid = Coord::new(2, 2, 1, 1);
        let mut report = VerificationReport::new();
        let owner = check_decodes(&mut report, &grid, 4, |rank| Ok(Coord::new(rank, 0, 0, 0)));

        let domain = report.result("rank-map/domain").unwrap();
        assert!(domain.is_failure());
        assert_eq!(domain.message, "2 ranks decode outside grid [2,2,1,1]");
        assert!(domain.details[0].starts_with("rank 2: "));
        assert!(!report.result("rank-map/injective").unwrap().is_failure());
        assert_eq!(owner, vec![Some(0), Some(1), None, None]);
    }

    #[test]
    fn shared_positions_are_collisions() {
        let grid = Coord::new(2, 2, 1, 1);
        let mut report = VerificationReport::new();
        check_decodes(&mut report, &grid, 4, |rank| Ok(Coord::new(rank % 2, 0, 0, 0)));

        assert!(!report.result("rank-map/domain").unwrap().is_failure());
        let injective = report.result("rank-map/injective").unwrap();
        assert_eq!(injective.message, "2 ranks collide");
        assert_eq!(injective.details[0], "ranks 0 and 2 both decode to [0,0,0,0]");
    }
}
