//! Per-surface job ownership.
//!
//! DESIGN
//! ======
//! Each UI surface (the chat panel, the export dialog, the migration
//! screen) owns at most one active job. Submitting a new job supersedes
//! the old one: its relevance flag drops, its task is aborted, and a
//! response already in flight is discarded instead of merged. Events
//! reach the consumer over a per-job channel gated on that flag, so
//! after [`JobSurface::cancel`] neither a progress update nor a
//! terminal event is delivered; the channel just closes.
//!
//! Terminal events are delivered exactly once per job: [`drive`]
//! returns once, and the task maps that single return to a single
//! [`JobEvent::Completed`] or [`JobEvent::Failed`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::job::Job;
use crate::poll::{JobProbe, PollPolicy, drive};

/// Progress events are dropped, not awaited, when the consumer lags.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Events a driven job delivers to its surface.
#[derive(Debug)]
pub enum JobEvent<U, T> {
    /// Non-terminal update with a snapshot of the job record.
    Progress(Job, U),
    /// Terminal success.
    Completed(T),
    /// Terminal failure.
    Failed(ClientError),
}

struct ActiveJob {
    generation: u64,
    live: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Owner of the single active job on one UI surface.
pub struct JobSurface {
    active: Option<ActiveJob>,
    generation: u64,
}

impl JobSurface {
    #[must_use]
    pub fn new() -> Self {
        Self { active: None, generation: 0 }
    }

    /// Whether a job is currently being driven.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.active.as_ref().is_some_and(|active| !active.task.is_finished())
    }

    /// Start driving `job`, superseding any prior job on this surface.
    ///
    /// Returns the event stream for the new job. The prior job, if any,
    /// is cancelled first and its stream closes without a terminal event.
    pub fn submit<P>(
        &mut self,
        mut probe: P,
        mut job: Job,
        policy: PollPolicy,
    ) -> mpsc::Receiver<JobEvent<P::Update, P::Output>>
    where
        P: JobProbe + 'static,
        P::Update: 'static,
        P::Output: 'static,
    {
        self.cancel();

        self.generation += 1;
        let generation = self.generation;
        let live = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let task_live = Arc::clone(&live);
        let task = tokio::spawn(async move {
            let update_tx = tx.clone();
            let update_live = Arc::clone(&task_live);
            let outcome = drive(&mut probe, &mut job, &policy, move |job, update| {
                if !update_live.load(Ordering::SeqCst) {
                    return;
                }
                // Closed means the consumer dropped its receiver, not a fault.
                match update_tx.try_send(JobEvent::Progress(job.clone(), update)) {
                    Ok(()) | Err(mpsc::error::TrySendError::Closed(_)) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(kind = %job.kind, id = %job.id, "event channel full, progress dropped");
                    }
                }
            })
            .await;

            if !task_live.load(Ordering::SeqCst) {
                return;
            }
            let event = match outcome {
                Ok(output) => JobEvent::Completed(output),
                Err(e) => JobEvent::Failed(e),
            };
            let _ = tx.send(event).await;
        });

        debug!(generation, "surface job started");
        self.active = Some(ActiveJob { generation, live, task });
        rx
    }

    /// Cancel the active job, if any.
    ///
    /// The relevance flag drops before the task is aborted, so a status
    /// response already in flight cannot deliver an event afterwards.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.live.store(false, Ordering::SeqCst);
            if !active.task.is_finished() {
                info!(generation = active.generation, "surface job cancelled");
            }
            active.task.abort();
        }
    }
}

impl Default for JobSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobSurface {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "surface_test.rs"]
mod tests;
