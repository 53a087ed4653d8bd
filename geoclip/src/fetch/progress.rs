//! Run progress reporting.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Processing,
    Complete,
}

/// Progress after a job finishes.
///
/// `saved` counts jobs that kept at least one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub saved: usize,
    pub total: usize,
    pub status: ProgressStatus,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            processed: 0,
            saved: 0,
            total,
            status: ProgressStatus::Processing,
        }
    }

    /// Records one finished job.
    pub fn job_done(&mut self, kept_any: bool) {
        self.processed += 1;
        if kept_any {
            self.saved += 1;
        }
    }

    /// Copy of this progress marked complete.
    pub fn completed(&self) -> Self {
        Self {
            status: ProgressStatus::Complete,
            ..*self
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == ProgressStatus::Complete
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} jobs processed, {} saved",
            self.processed, self.total, self.saved
        )
    }
}
