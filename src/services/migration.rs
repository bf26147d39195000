//! Knowledge-base migration: a site-wide singleton job.
//!
//! Unlike exports there is no handle to pass around; the status action
//! takes no arguments and always describes the one migration the site
//! can run. Attempting to start a second one is refused server-side and
//! surfaces as a verbatim [`ClientError::Api`] message.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ClientError;
use crate::job::{JobStatus, Progress};
use crate::poll::{JobProbe, Step};
use crate::transport::Ajax;

pub const ACTION_START_MIGRATION: &str = "ai_botkit_start_migration";
pub const ACTION_MIGRATION_STATUS: &str = "ai_botkit_get_migration_status";

/// Fixed job handle for the singleton.
pub const MIGRATION_JOB_ID: &str = "migration";

const GENERIC_MIGRATION_FAILURE: &str = "migration failed";

// =============================================================================
// OPTIONS AND RESULTS
// =============================================================================

/// Parameters forwarded to the migration job.
#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    /// Entries migrated per server-side batch; server default when `None`.
    pub batch_size: Option<u32>,
    /// Walk the data without writing anything.
    pub dry_run: bool,
}

/// One status snapshot of the migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub status: JobStatus,
    pub progress: Progress,
    /// Phase description, e.g. which table is being copied.
    pub message: Option<String>,
}

/// Terminal summary of a finished migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Entries moved successfully.
    pub migrated: u64,
    /// Entries that could not be moved.
    pub failed: u64,
    pub message: Option<String>,
}

/// Outcome of a start call: nothing to do, or a job now running.
#[derive(Debug)]
pub enum MigrationSubmit {
    Complete(MigrationReport),
    Processing,
}

/// Serde default for `status`: a payload that does not say otherwise is
/// still being worked.
fn processing() -> JobStatus {
    JobStatus::Processing
}

#[derive(Debug, Deserialize)]
struct MigrationStatusData {
    #[serde(default = "processing")]
    status: JobStatus,
    #[serde(default)]
    progress: u64,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    failed: u64,
    #[serde(default)]
    message: Option<String>,
}

impl MigrationStatusData {
    fn into_status(self) -> MigrationStatus {
        MigrationStatus {
            status: self.status,
            progress: Progress::new(self.progress, self.total, self.failed),
            message: self.message,
        }
    }
}

fn report_from(status: MigrationStatus) -> MigrationReport {
    MigrationReport {
        migrated: status.progress.current.saturating_sub(status.progress.failed),
        failed: status.progress.failed,
        message: status.message,
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Kick off the migration.
///
/// A site with nothing to migrate completes on the spot; everything
/// else comes back as `Processing` to be polled.
pub async fn start_migration(
    ajax: &dyn Ajax,
    options: &MigrationOptions,
) -> Result<MigrationSubmit, ClientError> {
    let mut fields: Vec<(&str, String)> = Vec::with_capacity(2);
    if let Some(batch_size) = options.batch_size {
        fields.push(("batch_size", batch_size.to_string()));
    }
    fields.push(("dry_run", options.dry_run.to_string()));

    let data = ajax.post(ACTION_START_MIGRATION, &fields).await?;
    let data: MigrationStatusData =
        serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))?;
    let status = data.into_status();

    match status.status {
        JobStatus::Completed => Ok(MigrationSubmit::Complete(report_from(status))),
        JobStatus::Failed => Err(ClientError::JobFailed {
            message: status.message.unwrap_or_else(|| GENERIC_MIGRATION_FAILURE.to_owned()),
        }),
        JobStatus::Pending | JobStatus::Processing => Ok(MigrationSubmit::Processing),
    }
}

/// Read the migration status once. Takes no arguments: the job is a
/// site-wide singleton.
pub async fn fetch_migration_status(ajax: &dyn Ajax) -> Result<MigrationStatus, ClientError> {
    let data = ajax.post(ACTION_MIGRATION_STATUS, &[]).await?;
    let data: MigrationStatusData =
        serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))?;
    Ok(data.into_status())
}

// =============================================================================
// PROBE
// =============================================================================

/// Polls the running migration until it is terminal.
pub struct MigrationProbe {
    ajax: Arc<dyn Ajax>,
}

impl MigrationProbe {
    #[must_use]
    pub fn new(ajax: Arc<dyn Ajax>) -> Self {
        Self { ajax }
    }
}

#[async_trait]
impl JobProbe for MigrationProbe {
    type Update = Option<String>;
    type Output = MigrationReport;

    async fn poll(&mut self) -> Result<Step<Option<String>, MigrationReport>, ClientError> {
        let status = fetch_migration_status(self.ajax.as_ref()).await?;
        match status.status {
            JobStatus::Completed => Ok(Step::Done(report_from(status))),
            JobStatus::Failed => Err(ClientError::JobFailed {
                message: status.message.unwrap_or_else(|| GENERIC_MIGRATION_FAILURE.to_owned()),
            }),
            JobStatus::Pending | JobStatus::Processing => {
                Ok(Step::Running { progress: Some(status.progress), update: status.message })
            }
        }
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
