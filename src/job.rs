//! Job data model shared by every polled feature.
//!
//! A job is the client-side record of one long-running server-side
//! operation. It is created when a submit call hands back a handle
//! instead of an immediate result, mutated only by status responses,
//! and discarded once terminal or cancelled.

use serde::{Deserialize, Serialize};

// =============================================================================
// KIND AND STATUS
// =============================================================================

/// The job families the client drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// A streamed chat reply assembled chunk by chunk.
    ChatResponse,
    /// A multi-conversation PDF export batch.
    PdfExportBatch,
    /// The knowledge-base migration singleton.
    Migration,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JobKind::ChatResponse => "chat-response",
            JobKind::PdfExportBatch => "pdf-export-batch",
            JobKind::Migration => "migration",
        };
        write!(f, "{label}")
    }
}

/// Lifecycle status as reported by the status endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal statuses end polling; there are no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Counted progress as carried by a status payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Items finished so far, failures included.
    pub current: u64,
    /// Total items in the batch; zero until the server has sized it.
    pub total: u64,
    /// Items that finished unsuccessfully.
    pub failed: u64,
}

impl Progress {
    #[must_use]
    pub fn new(current: u64, total: u64, failed: u64) -> Self {
        Self { current, total, failed }
    }

    /// Completion percentage in `[0.0, 100.0]`.
    ///
    /// A zero total reads as 0%: status payloads report `total: 0` before
    /// the server has sized the batch, and that must not divide.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        let percent = (self.current as f32 / self.total as f32) * 100.0;
        percent.clamp(0.0, 100.0)
    }

    /// Progress text for display, e.g. `2 of 3 (1 failed)`.
    #[must_use]
    pub fn label(&self) -> String {
        if self.failed == 0 {
            format!("{} of {}", self.current, self.total)
        } else {
            format!("{} of {} ({} failed)", self.current, self.total, self.failed)
        }
    }
}

// =============================================================================
// JOB
// =============================================================================

/// One tracked server-side operation.
#[derive(Debug, Clone)]
pub struct Job {
    /// Server-assigned handle: a batch id, a response id, or a fixed
    /// label for singleton jobs.
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Latest counted progress, for features that report one.
    pub progress: Option<Progress>,
    /// Failure message once `status` is `Failed`.
    pub error: Option<String>,
}

impl Job {
    /// A freshly accepted job that has not been polled yet.
    #[must_use]
    pub fn accepted(id: impl Into<String>, kind: JobKind) -> Self {
        Self { id: id.into(), kind, status: JobStatus::Pending, progress: None, error: None }
    }
}

#[cfg(test)]
#[path = "job_test.rs"]
mod tests;
