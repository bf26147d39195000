//! Batch PDF export: submission, status polling, artifact handoff.
//!
//! Small selections render synchronously and the submit response
//! already carries the download URL. Larger ones come back as a batch
//! id that is polled via the status action until the server reports a
//! terminal state. A batch with some failed conversations still
//! completes; the failure count rides along for the caller to surface.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ClientError;
use crate::job::{JobStatus, Progress};
use crate::poll::{JobProbe, Step};
use crate::transport::Ajax;

pub const ACTION_BATCH_EXPORT: &str = "ai_botkit_batch_export";
pub const ACTION_EXPORT_STATUS: &str = "ai_botkit_export_status";

const GENERIC_EXPORT_FAILURE: &str = "export failed";

// =============================================================================
// OPTIONS
// =============================================================================

/// Page format for rendered PDFs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl std::fmt::Display for PaperSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PaperSize::A4 => "a4",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for PaperSize {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "a4" => Ok(PaperSize::A4),
            "letter" => Ok(PaperSize::Letter),
            "legal" => Ok(PaperSize::Legal),
            other => Err(format!("unknown paper size: {other}")),
        }
    }
}

/// Parameters for one export batch.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub conversation_ids: Vec<i64>,
    pub include_metadata: bool,
    pub include_branding: bool,
    pub paper_size: PaperSize,
}

// =============================================================================
// SUBMIT
// =============================================================================

/// Terminal result of a finished batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportComplete {
    /// Where the rendered PDF can be fetched.
    pub download_url: String,
    /// Conversations that made it into the PDF.
    pub completed: u64,
    /// Conversations the server skipped.
    pub failed: u64,
}

/// Outcome of a submit: rendered on the spot, or accepted as a batch.
#[derive(Debug)]
pub enum ExportSubmit {
    Complete(ExportComplete),
    Processing { batch_id: String },
}

/// Serde default for `status`: a payload that does not say otherwise is
/// still being worked.
fn processing() -> JobStatus {
    JobStatus::Processing
}

#[derive(Debug, Deserialize)]
struct BatchExportData {
    #[serde(default = "processing")]
    status: JobStatus,
    #[serde(default)]
    batch_id: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    failed: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

/// Submit an export batch.
pub async fn start_batch_export(
    ajax: &dyn Ajax,
    options: &ExportOptions,
) -> Result<ExportSubmit, ClientError> {
    let mut fields: Vec<(&str, String)> = Vec::with_capacity(options.conversation_ids.len() + 3);
    for id in &options.conversation_ids {
        fields.push(("conversation_ids[]", id.to_string()));
    }
    fields.push(("include_metadata", options.include_metadata.to_string()));
    fields.push(("include_branding", options.include_branding.to_string()));
    fields.push(("paper_size", options.paper_size.to_string()));

    let data = ajax.post(ACTION_BATCH_EXPORT, &fields).await?;
    let data: BatchExportData =
        serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))?;

    match data.status {
        JobStatus::Completed => {
            let Some(download_url) = data.download_url else {
                return Err(ClientError::Decode("completed export without download_url".to_owned()));
            };
            Ok(ExportSubmit::Complete(ExportComplete {
                download_url,
                completed: data.completed.unwrap_or(0),
                failed: data.failed.unwrap_or(0),
            }))
        }
        JobStatus::Failed => Err(ClientError::JobFailed {
            message: data.message.unwrap_or_else(|| GENERIC_EXPORT_FAILURE.to_owned()),
        }),
        JobStatus::Pending | JobStatus::Processing => {
            let Some(batch_id) = data.batch_id else {
                return Err(ClientError::Decode("accepted export without batch_id".to_owned()));
            };
            Ok(ExportSubmit::Processing { batch_id })
        }
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// One status snapshot for an export batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportStatus {
    pub status: JobStatus,
    pub progress: Progress,
    /// Present once the batch has completed.
    pub download_url: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExportStatusData {
    #[serde(default = "processing")]
    status: JobStatus,
    #[serde(default)]
    progress: u64,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    failed: u64,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Read the status of `batch_id` once.
///
/// Reading has no side effects server-side; a completed batch keeps
/// answering with the same terminal payload.
pub async fn fetch_export_status(
    ajax: &dyn Ajax,
    batch_id: &str,
) -> Result<ExportStatus, ClientError> {
    let fields = [("batch_id", batch_id.to_owned())];
    let data = ajax.post(ACTION_EXPORT_STATUS, &fields).await?;
    let data: ExportStatusData =
        serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))?;
    Ok(ExportStatus {
        status: data.status,
        progress: Progress::new(data.progress, data.total, data.failed),
        download_url: data.download_url,
        message: data.message,
    })
}

// =============================================================================
// PROBE
// =============================================================================

/// Polls an accepted batch until it is terminal.
pub struct ExportProbe {
    ajax: Arc<dyn Ajax>,
    batch_id: String,
}

impl ExportProbe {
    #[must_use]
    pub fn new(ajax: Arc<dyn Ajax>, batch_id: impl Into<String>) -> Self {
        Self { ajax, batch_id: batch_id.into() }
    }
}

#[async_trait]
impl JobProbe for ExportProbe {
    type Update = ();
    type Output = ExportComplete;

    async fn poll(&mut self) -> Result<Step<(), ExportComplete>, ClientError> {
        let status = fetch_export_status(self.ajax.as_ref(), &self.batch_id).await?;
        match status.status {
            JobStatus::Completed => {
                let Some(download_url) = status.download_url else {
                    return Err(ClientError::Decode(
                        "completed export without download_url".to_owned(),
                    ));
                };
                Ok(Step::Done(ExportComplete {
                    download_url,
                    completed: status.progress.current.saturating_sub(status.progress.failed),
                    failed: status.progress.failed,
                }))
            }
            JobStatus::Failed => Err(ClientError::JobFailed {
                message: status.message.unwrap_or_else(|| GENERIC_EXPORT_FAILURE.to_owned()),
            }),
            JobStatus::Pending | JobStatus::Processing => {
                Ok(Step::Running { progress: Some(status.progress), update: () })
            }
        }
    }
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
