//! Cross-check of the monolithic and distributed walks.
//!
//! Records are absorbed one at a time; the verifier keeps two `u8`
//! multiplicities per offset plus the running totals, so neither walk has to
//! be materialised. A slot that fills up carries on in an exact overflow map.
//! Checks run in a fixed order:
//!
//! | Check | Id | Passes when |
//! |-------|----|-------------|
//! | (a) | `verify/count` | both walks produced the same number of records |
//! | (b) | `verify/sum` | both offset sums are equal |
//! | (c) | `verify/coverage` | every offset has equal multiplicity in both walks |
//!
//! A mismatch is an outcome recorded in the [`VerificationReport`], never a
//! panic or an error.

use std::collections::BTreeMap;

use gluonic_lattice::{Dimensions, MemoryRecord};
use tracing::warn;

use crate::report::{Discrepancy, Tally, TestResult, VerificationReport};

/// Disputed offsets listed in a report unless configured otherwise.
pub const DEFAULT_MAX_DISCREPANCIES: usize = 64;

const MONOLITHIC: usize = 0;
const DISTRIBUTED: usize = 1;

/// Streaming verifier for one run.
#[derive(Debug, Clone)]
pub struct Verifier {
    counts: Vec<[u8; 2]>,
    // Counts past `u8::MAX` for offsets inside the volume.
    overflow: BTreeMap<usize, [usize; 2]>,
    // Offsets beyond the expected volume.
    stray: BTreeMap<usize, [usize; 2]>,
    monolithic: Tally,
    distributed: Tally,
    expected_sum: Option<u128>,
    max_discrepancies: usize,
}

impl Verifier {
    /// A verifier expecting offsets in `0..capacity`.
    ///
    /// Offsets outside that range are still tracked, just less compactly.
    pub fn new(capacity: usize) -> Self {
        Self {
            counts: vec![[0; 2]; capacity],
            overflow: BTreeMap::new(),
            stray: BTreeMap::new(),
            monolithic: Tally::default(),
            distributed: Tally::default(),
            expected_sum: None,
            max_discrepancies: DEFAULT_MAX_DISCREPANCIES,
        }
    }

    /// A verifier sized for `dims` that also reports the closed-form sum.
    pub fn for_lattice(dims: &Dimensions) -> Self {
        let v = dims.volume() as u128;
        Self {
            expected_sum: Some(v * v.saturating_sub(1) / 2),
            ..Self::new(dims.volume())
        }
    }

    /// Caps the number of disputed offsets listed in the report.
    pub fn with_max_discrepancies(mut self, max: usize) -> Self {
        self.max_discrepancies = max;
        self
    }

    /// Absorbs one record of the monolithic walk.
    pub fn observe_monolithic(&mut self, record: &MemoryRecord) {
        self.monolithic.observe(record.offset);
        self.bump(record.offset, MONOLITHIC);
    }

    /// Absorbs one record of the distributed walk.
    pub fn observe_distributed(&mut self, record: &MemoryRecord) {
        self.distributed.observe(record.offset);
        self.bump(record.offset, DISTRIBUTED);
    }

    fn bump(&mut self, offset: usize, side: usize) {
        match self.counts.get_mut(offset) {
            Some(slot) if slot[side] < u8::MAX => slot[side] += 1,
            Some(_) => self.overflow.entry(offset).or_default()[side] += 1,
            None => self.stray.entry(offset).or_default()[side] += 1,
        }
    }

    /// Runs checks (a) to (c) and returns the report.
    pub fn finish(self) -> VerificationReport {
        let Self {
            counts,
            mut overflow,
            stray,
            monolithic,
            distributed,
            expected_sum,
            max_discrepancies,
        } = self;

        let mut report = VerificationReport {
            monolithic,
            distributed,
            expected_sum,
            ..VerificationReport::new()
        };

        report.push(check_count(&monolithic, &distributed));
        report.push(check_sum(&monolithic, &distributed, expected_sum));

        let disputed = counts
            .into_iter()
            .enumerate()
            .map(|(offset, [m, d])| {
                let [om, od] = overflow.remove(&offset).unwrap_or_default();
                (offset, [usize::from(m) + om, usize::from(d) + od])
            })
            .chain(stray)
            .filter_map(|(offset, [m, d])| Discrepancy::classify(offset, m, d));
        for discrepancy in disputed {
            report.discrepancy_total += 1;
            if report.discrepancies.len() < max_discrepancies {
                report.discrepancies.push(discrepancy);
            }
        }
        let coverage = check_coverage(&report);
        report.push(coverage);
        report
    }
}

/// Verifies two complete walks.
///
/// Sized from the monolithic walk's lower size hint; for lattice-sized
/// inputs prefer [`Verifier::for_lattice`] and stream.
pub fn verify<M, D>(monolithic: M, distributed: D) -> VerificationReport
where
    M: IntoIterator<Item = MemoryRecord>,
    D: IntoIterator<Item = MemoryRecord>,
{
    let monolithic = monolithic.into_iter();
    let mut verifier = Verifier::new(monolithic.size_hint().0);
    for record in monolithic {
        verifier.observe_monolithic(&record);
    }
    for record in distributed {
        verifier.observe_distributed(&record);
    }
    verifier.finish()
}

fn check_count(monolithic: &Tally, distributed: &Tally) -> TestResult {
    if monolithic.records == distributed.records {
        TestResult::pass(
            "verify/count",
            format!("{} records in both walks", monolithic.records),
        )
    } else {
        warn!(
            monolithic = monolithic.records,
            distributed = distributed.records,
            "record counts differ"
        );
        TestResult::fail_with_details(
            "verify/count",
            "record counts differ",
            vec![
                format!("monolithic: {}", monolithic.records),
                format!("distributed: {}", distributed.records),
            ],
        )
    }
}

fn check_sum(monolithic: &Tally, distributed: &Tally, expected: Option<u128>) -> TestResult {
    let mut details = vec![
        format!("monolithic: {}", monolithic.offset_sum),
        format!("distributed: {}", distributed.offset_sum),
    ];
    if let Some(expected) = expected {
        details.push(format!("closed form: {expected}"));
    }
    if monolithic.offset_sum == distributed.offset_sum {
        TestResult::pass_with_details("verify/sum", "offset sums are equal", details)
    } else {
        warn!(
            monolithic = %monolithic.offset_sum,
            distributed = %distributed.offset_sum,
            "offset sums differ"
        );
        TestResult::fail_with_details("verify/sum", "offset sums differ", details)
    }
}

fn check_coverage(report: &VerificationReport) -> TestResult {
    if report.discrepancy_total == 0 {
        return TestResult::pass(
            "verify/coverage",
            "every offset has the same multiplicity in both walks",
        );
    }
    warn!(disputed = report.discrepancy_total, "coverage mismatch");
    let mut details: Vec<String> = report.discrepancies.iter().map(ToString::to_string).collect();
    let unlisted = report.discrepancy_total - report.discrepancies.len();
    if unlisted > 0 {
        details.push(format!("... and {unlisted} more"));
    }
    TestResult::fail_with_details(
        "verify/coverage",
        format!("{} offsets disagree", report.discrepancy_total),
        details,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::DiscrepancyKind;
    use gluonic_lattice::enumerate::{distributed, monolithic, MajorOrder};
    use gluonic_lattice::{decompose, Coord, ProcessCount};

    fn record(offset: usize) -> MemoryRecord {
        MemoryRecord {
            offset,
            coord: Coord::ORIGIN,
            placement: None,
        }
    }

    fn walk(offsets: &[usize]) -> Vec<MemoryRecord> {
        offsets.iter().copied().map(record).collect()
    }

    #[test]
    fn sixteen_to_the_fourth_over_sixteen_passes() {
        let dims = Dimensions::new([16, 16, 16, 16]).unwrap();
        let d = decompose(&dims, ProcessCount::new(16).unwrap()).unwrap();
        let report = verify(monolithic(&dims, MajorOrder::Xyzt), distributed(&d));
        assert!(report.all_passed(), "{:?}", report.results);
        assert_eq!(report.monolithic.records, 65536);
        assert_eq!(report.distributed.records, 65536);
        assert_eq!(report.monolithic.offset_sum, 65536 * 65535 / 2);
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn dropped_record_is_missing() {
        let report = verify(walk(&[0, 1, 2, 3]), walk(&[0, 1, 3]));
        assert!(report.result("verify/count").unwrap().is_failure());
        assert!(report.result("verify/sum").unwrap().is_failure());
        assert_eq!(report.discrepancy_total, 1);
        assert_eq!(report.discrepancies[0].offset, 2);
        assert_eq!(report.discrepancies[0].kind, DiscrepancyKind::Missing);
    }

    #[test]
    fn equal_sums_do_not_hide_a_permutation_error() {
        // 1 + 2 == 0 + 3
        let report = verify(walk(&[0, 1, 2, 3]), walk(&[0, 0, 3, 3]));
        assert!(!report.result("verify/count").unwrap().is_failure());
        assert!(!report.result("verify/sum").unwrap().is_failure());
        assert!(report.result("verify/coverage").unwrap().is_failure());

        let kinds: Vec<_> = report.discrepancies.iter().map(|d| (d.offset, d.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (0, DiscrepancyKind::Duplicated),
                (1, DiscrepancyKind::Missing),
                (2, DiscrepancyKind::Missing),
                (3, DiscrepancyKind::Duplicated),
            ]
        );
    }

    #[test]
    fn offsets_past_the_volume_are_unexpected() {
        let mut verifier = Verifier::new(2);
        verifier.observe_monolithic(&record(0));
        verifier.observe_monolithic(&record(1));
        verifier.observe_distributed(&record(0));
        verifier.observe_distributed(&record(usize::MAX));
        let report = verifier.finish();
        assert_eq!(report.discrepancy_total, 2);
        assert_eq!(report.discrepancies[1].offset, usize::MAX);
        assert_eq!(report.discrepancies[1].kind, DiscrepancyKind::Unexpected);
    }

    #[test]
    fn listing_is_capped_but_total_is_not() {
        let dims = Dimensions::new([4, 4, 4, 4]).unwrap();
        let mut verifier = Verifier::for_lattice(&dims).with_max_discrepancies(3);
        for r in monolithic(&dims, MajorOrder::Tzyx) {
            verifier.observe_monolithic(&r);
        }
        let report = verifier.finish();
        assert_eq!(report.discrepancy_total, 256);
        assert_eq!(report.discrepancies.len(), 3);
        assert_eq!(report.expected_sum, Some(256 * 255 / 2));
        let coverage = report.result("verify/coverage").unwrap();
        assert_eq!(coverage.details.last().unwrap(), "... and 253 more");
    }

    #[test]
    fn multiplicities_past_a_byte_stay_exact() {
        let mut verifier = Verifier::new(1);
        verifier.observe_monolithic(&record(0));
        for _ in 0..300 {
            verifier.observe_distributed(&record(0));
        }
        let report = verifier.finish();
        assert_eq!(report.distributed.records, 300);
        assert_eq!(report.discrepancies[0].distributed, 300);
    }

    #[test]
    fn heavy_multisets_that_balance_in_aggregate_still_disagree() {
        // Counts and sums are both 900; only the per-offset multiplicities differ.
        let repeat = |offset: usize, times: usize| std::iter::repeat(record(offset)).take(times);
        let monolithic: Vec<_> = repeat(0, 300).chain(repeat(1, 300)).chain(repeat(2, 300)).collect();
        let distributed: Vec<_> = repeat(0, 301).chain(repeat(1, 298)).chain(repeat(2, 301)).collect();
        let report = verify(monolithic, distributed);

        assert!(!report.result("verify/count").unwrap().is_failure());
        assert!(!report.result("verify/sum").unwrap().is_failure());
        assert!(report.result("verify/coverage").unwrap().is_failure());
        let listed: Vec<_> = report
            .discrepancies
            .iter()
            .map(|d| (d.offset, d.kind, d.monolithic, d.distributed))
            .collect();
        assert_eq!(
            listed,
            vec![
                (0, DiscrepancyKind::Duplicated, 300, 301),
                (1, DiscrepancyKind::Missing, 300, 298),
                (2, DiscrepancyKind::Duplicated, 300, 301),
            ]
        );
    }
}
