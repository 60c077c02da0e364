//! Verification report types: results, severity levels, discrepancies, and
//! report aggregation.

use serde::Serialize;

/// Severity level of a verification check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The check passed.
    Pass,
    /// The check identified a warning (non-blocking).
    Warning,
    /// The check failed.
    Failure,
}

/// A single verification check result.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    /// Short identifier of the check that produced this result.
    pub check: String,
    /// Human-readable message describing the outcome.
    pub message: String,
    /// Severity of the result.
    pub severity: Severity,
    /// Optional additional detail lines.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl TestResult {
    /// Creates a passing result.
    pub fn pass(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            message: message.into(),
            severity: Severity::Pass,
            details: Vec::new(),
        }
    }

    /// Creates a passing result with additional detail lines.
    pub fn pass_with_details(
        check: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self {
            details,
            ..Self::pass(check, message)
        }
    }

    /// Creates a failure result.
    pub fn fail(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            message: message.into(),
            severity: Severity::Failure,
            details: Vec::new(),
        }
    }

    /// Creates a failure result with additional detail lines.
    pub fn fail_with_details(
        check: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self {
            details,
            ..Self::fail(check, message)
        }
    }

    /// Creates a warning result.
    pub fn warn(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            message: message.into(),
            severity: Severity::Warning,
            details: Vec::new(),
        }
    }

    /// Returns true if this result represents a failure.
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }
}

/// How one offset's distributed multiplicity departs from the monolithic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscrepancyKind {
    /// Seen fewer times in the distributed walk than in the monolithic walk.
    Missing,
    /// Seen more times in the distributed walk, and at least once in the
    /// monolithic walk.
    Duplicated,
    /// Seen in the distributed walk but never in the monolithic walk.
    Unexpected,
}

/// One offset whose multiplicities disagree between the two walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    /// The disputed linear offset.
    pub offset: usize,
    /// Classification of the disagreement.
    pub kind: DiscrepancyKind,
    /// Times the monolithic walk produced this offset.
    pub monolithic: usize,
    /// Times the distributed walk produced this offset.
    pub distributed: usize,
}

impl Discrepancy {
    pub(crate) fn classify(offset: usize, monolithic: usize, distributed: usize) -> Option<Self> {
        let kind = match distributed.cmp(&monolithic) {
            core::cmp::Ordering::Equal => return None,
            core::cmp::Ordering::Less => DiscrepancyKind::Missing,
            core::cmp::Ordering::Greater if monolithic == 0 => DiscrepancyKind::Unexpected,
            core::cmp::Ordering::Greater => DiscrepancyKind::Duplicated,
        };
        Some(Self {
            offset,
            kind,
            monolithic,
            distributed,
        })
    }
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            DiscrepancyKind::Missing => "missing",
            DiscrepancyKind::Duplicated => "duplicated",
            DiscrepancyKind::Unexpected => "unexpected",
        };
        write!(
            f,
            "offset {} {} (monolithic x{}, distributed x{})",
            self.offset, kind, self.monolithic, self.distributed
        )
    }
}

/// Record count and offset sum of one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// Records observed.
    pub records: usize,
    /// Sum of every observed offset.
    pub offset_sum: u128,
}

impl Tally {
    pub(crate) fn observe(&mut self, offset: usize) {
        self.records += 1;
        self.offset_sum += offset as u128;
    }
}

/// Aggregated report from the cross-check and every run-time validator.
#[derive(Debug, Default, Serialize)]
pub struct VerificationReport {
    /// All individual check results in the order they were produced.
    pub results: Vec<TestResult>,
    /// Totals of the monolithic walk.
    pub monolithic: Tally,
    /// Totals of the distributed walk.
    pub distributed: Tally,
    /// `V·(V−1)/2` for the lattice volume `V`, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_sum: Option<u128>,
    /// The first disputed offsets, in ascending offset order.
    pub discrepancies: Vec<Discrepancy>,
    /// Number of disputed offsets, including those not listed.
    pub discrepancy_total: usize,
}

impl VerificationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result to this report.
    pub fn push(&mut self, result: TestResult) {
        self.results.push(result);
    }

    /// Extends this report with the results of another report.
    pub fn extend(&mut self, other: VerificationReport) {
        self.results.extend(other.results);
    }

    /// Returns the count of failed checks.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// Returns true if all checks passed (no failures).
    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }

    /// Looks up the first result produced by `check`.
    pub fn result(&self, check: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.check == check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrepancies_are_classified() {
        assert_eq!(Discrepancy::classify(4, 1, 1), None);
        assert_eq!(
            Discrepancy::classify(4, 1, 0).map(|d| d.kind),
            Some(DiscrepancyKind::Missing)
        );
        assert_eq!(
            Discrepancy::classify(4, 1, 2).map(|d| d.kind),
            Some(DiscrepancyKind::Duplicated)
        );
        assert_eq!(
            Discrepancy::classify(4, 0, 1).map(|d| d.kind),
            Some(DiscrepancyKind::Unexpected)
        );
    }

    #[test]
    fn warnings_do_not_fail_a_report() {
        let mut report = VerificationReport::new();
        report.push(TestResult::pass("verify/count", "equal"));
        report.push(TestResult::warn("run/idle", "2 ranks idle"));
        assert!(report.all_passed());
        report.push(TestResult::fail("verify/sum", "unequal"));
        assert_eq!(report.failure_count(), 1);
        assert!(report.result("verify/sum").is_some_and(TestResult::is_failure));
    }
}
