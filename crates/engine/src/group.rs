//! Group update aggregation
//!
//! A group update is a set of independent single-key updates. Each key
//! produces one [`KeyResult`]; the [`GroupReport`] is a fold over them and
//! is identical whether the keys ran sequentially or in parallel.

use atomdoc_core::{Error, PrimaryKey};

/// What happened to one candidate key
#[derive(Debug, Clone, PartialEq)]
pub enum KeyResult {
    /// The key's update was written back
    Applied,
    /// The key was gone by the time it was updated
    Vanished,
    /// The key's update failed and nothing was written for it
    Failed(Error),
    /// Cancellation was requested before the key was reached
    Skipped,
}

/// Per-key breakdown of a group update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupReport {
    /// Candidate keys produced by the scan
    pub matched: usize,
    /// Keys whose update was written back
    pub applied: usize,
    /// Keys deleted between scan and update
    pub vanished: Vec<PrimaryKey>,
    /// Keys whose update failed, with the error
    pub failed: Vec<(PrimaryKey, Error)>,
    /// Keys not attempted because of cancellation
    pub skipped: usize,
    /// Whether cancellation was observed
    pub cancelled: bool,
}

impl GroupReport {
    /// Fold per-key results into a report
    pub fn from_results(results: impl IntoIterator<Item = (PrimaryKey, KeyResult)>) -> Self {
        let mut report = GroupReport::default();
        for (key, result) in results {
            report.matched += 1;
            match result {
                KeyResult::Applied => report.applied += 1,
                KeyResult::Vanished => report.vanished.push(key),
                KeyResult::Failed(e) => report.failed.push((key, e)),
                KeyResult::Skipped => {
                    report.skipped += 1;
                    report.cancelled = true;
                }
            }
        }
        report
    }

    /// The group verdict
    ///
    /// True only if at least one record matched and every matched record
    /// was updated.
    pub fn succeeded(&self) -> bool {
        self.matched > 0 && self.applied == self.matched
    }

    /// Keys that matched but were not updated, for whatever reason
    pub fn unapplied(&self) -> usize {
        self.matched - self.applied
    }
}
