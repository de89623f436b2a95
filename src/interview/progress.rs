//! Derived interview progress.
//!
//! A pure computation over (catalog, profile, stage) with no side effects,
//! safe to recompute on every read.

use serde::Serialize;

use crate::catalog::QuestionCatalog;
use crate::interview::profile::ProfileStore;
use crate::interview::sequencer::Stage;

/// Snapshot of how far the interview has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    /// Catalog steps with a non-empty answer in the profile.
    pub answered: usize,
    pub remaining: usize,
    /// round(answered / total * 100); 0 for an empty catalog.
    pub percentage: u8,
    /// 0 at welcome, total at summary, else the 1-based catalog position of
    /// the active step.
    pub current_index: usize,
    pub total: usize,
}

/// Compute the current progress.
pub fn compute(catalog: &QuestionCatalog, profile: &ProfileStore, stage: Stage) -> ProgressReport {
    let total = catalog.len();
    let answered = catalog.iter().filter(|q| profile.is_answered(q.key)).count();
    let remaining = total - answered;

    let percentage = if total == 0 {
        0
    } else {
        (answered as f64 / total as f64 * 100.0).round() as u8
    };

    let current_index = match stage {
        Stage::Welcome => 0,
        Stage::Summary => total,
        // An off-catalog step cannot occur under correct sequencing; report 0.
        Stage::Question(key) => catalog.index_of(key).map_or(0, |i| i + 1),
    };

    ProgressReport {
        answered,
        remaining,
        percentage,
        current_index,
        total,
    }
}
