//! Placement round-trip validator.
//!
//! Every distributed record carries the `(rank, local_offset)` its
//! enumerator assigned. This validator recomputes the placement from the
//! record's global coordinate with [`locate`], maps it back with
//! [`global_of`], and checks that the scalar offset agrees with the
//! record's coordinate.

use gluonic_lattice::{global_of, linear_index, locate, Decomposition, MemoryRecord};

use crate::report::{TestResult, VerificationReport};

const CHECK: &str = "placement/round-trip";
const MAX_LISTED: usize = 16;

/// Streaming placement check, fed the distributed walk record by record.
#[derive(Debug)]
pub struct PlacementCheck<'a> {
    decomposition: &'a Decomposition,
    checked: usize,
    failures: Vec<String>,
    failure_total: usize,
}

impl<'a> PlacementCheck<'a> {
    /// A check against `decomposition`.
    pub fn new(decomposition: &'a Decomposition) -> Self {
        Self {
            decomposition,
            checked: 0,
            failures: Vec::new(),
            failure_total: 0,
        }
    }

    /// Checks one distributed record.
    pub fn observe(&mut self, record: &MemoryRecord) {
        self.checked += 1;
        if let Err(reason) = self.round_trip(record) {
            self.failure_total += 1;
            if self.failures.len() < MAX_LISTED {
                self.failures
                    .push(format!("offset {} at {}: {reason}", record.offset, record.coord));
            }
        }
    }

    fn round_trip(&self, record: &MemoryRecord) -> Result<(), String> {
        let d = self.decomposition;
        let carried = record.placement.ok_or("record has no placement")?;
        let located = locate(&record.coord, d).map_err(|e| e.to_string())?;
        if located != carried {
            return Err(format!(
                "carries rank {} local {} but locates to rank {} local {}",
                carried.rank, carried.local_offset, located.rank, located.local_offset
            ));
        }
        let back = global_of(&carried, d).map_err(|e| e.to_string())?;
        if back != record.coord {
            return Err(format!("placement maps back to {back}"));
        }
        let offset = linear_index(&record.coord, &d.extent()).map_err(|e| e.to_string())?;
        if offset != record.offset {
            return Err(format!("coordinate indexes to {offset}"));
        }
        Ok(())
    }

    /// The accumulated result.
    pub fn finish(self) -> VerificationReport {
        let mut report = VerificationReport::new();
        if self.failure_total == 0 {
            report.push(TestResult::pass(
                CHECK,
                format!("{} placements round-trip", self.checked),
            ));
        } else {
            let mut details = self.failures;
            if self.failure_total > details.len() {
                details.push(format!("... and {} more", self.failure_total - details.len()));
            }
            report.push(TestResult::fail_with_details(
                CHECK,
                format!(
                    "{} of {} placements do not round-trip",
                    self.failure_total, self.checked
                ),
                details,
            ));
        }
        report
    }
}
