use std::sync::atomic::AtomicU32;
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::job::{JobKind, JobStatus, Progress};
use crate::poll::Step;

fn policy_1s() -> PollPolicy {
    PollPolicy::with_interval(Duration::from_secs(1))
}

/// Replays a fixed list of steps, then panics if polled again.
struct ScriptedProbe {
    steps: Vec<Result<Step<u32, &'static str>, ClientError>>,
}

#[async_trait]
impl JobProbe for ScriptedProbe {
    type Update = u32;
    type Output = &'static str;

    async fn poll(&mut self) -> Result<Step<u32, &'static str>, ClientError> {
        assert!(!self.steps.is_empty(), "probe polled past its script");
        self.steps.remove(0)
    }
}

/// Reports running forever; the shared counter observes every poll.
struct EndlessProbe {
    polled: Arc<AtomicU32>,
}

#[async_trait]
impl JobProbe for EndlessProbe {
    type Update = u32;
    type Output = &'static str;

    async fn poll(&mut self) -> Result<Step<u32, &'static str>, ClientError> {
        let n = self.polled.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Step::Running { progress: Some(Progress::new(u64::from(n), 100, 0)), update: n })
    }
}

/// First poll answers instantly; the second hangs like a stalled request.
struct StallingProbe {
    polled: Arc<AtomicU32>,
    stall: Duration,
}

#[async_trait]
impl JobProbe for StallingProbe {
    type Update = u32;
    type Output = &'static str;

    async fn poll(&mut self) -> Result<Step<u32, &'static str>, ClientError> {
        let n = self.polled.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= 2 {
            tokio::time::sleep(self.stall).await;
        }
        Ok(Step::Running { progress: None, update: n })
    }
}

// =============================================================================
// EVENT FLOW
// =============================================================================

#[tokio::test(start_paused = true)]
async fn events_flow_to_completion() {
    let mut surface = JobSurface::new();
    let probe = ScriptedProbe {
        steps: vec![
            Ok(Step::Running { progress: Some(Progress::new(1, 2, 0)), update: 1 }),
            Ok(Step::Done("url")),
        ],
    };

    let mut rx = surface.submit(probe, Job::accepted("b1", JobKind::PdfExportBatch), policy_1s());

    let Some(JobEvent::Progress(job, update)) = rx.recv().await else {
        panic!("expected a progress event first");
    };
    assert_eq!(update, 1);
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.progress, Some(Progress::new(1, 2, 0)));

    let Some(JobEvent::Completed(output)) = rx.recv().await else {
        panic!("expected completion");
    };
    assert_eq!(output, "url");

    assert!(rx.recv().await.is_none());
    tokio::task::yield_now().await;
    assert!(!surface.is_busy());
}

#[tokio::test(start_paused = true)]
async fn failure_is_delivered_once_then_closes() {
    let mut surface = JobSurface::new();
    let probe =
        ScriptedProbe { steps: vec![Err(ClientError::Api { message: "Invalid nonce".to_owned() })] };

    let mut rx = surface.submit(probe, Job::accepted("c1", JobKind::ChatResponse), policy_1s());

    let Some(JobEvent::Failed(err)) = rx.recv().await else {
        panic!("expected a failure event");
    };
    assert_eq!(err.to_string(), "Invalid nonce");
    assert!(rx.recv().await.is_none());
}

// =============================================================================
// CANCELLATION
// =============================================================================

#[tokio::test(start_paused = true)]
async fn cancel_suppresses_events_and_polling() {
    let mut surface = JobSurface::new();
    let polled = Arc::new(AtomicU32::new(0));
    let probe = EndlessProbe { polled: Arc::clone(&polled) };

    let mut rx = surface.submit(probe, Job::accepted("m1", JobKind::Migration), policy_1s());
    let Some(JobEvent::Progress(..)) = rx.recv().await else {
        panic!("expected progress before cancel");
    };

    surface.cancel();
    assert!(!surface.is_busy());
    assert!(rx.recv().await.is_none(), "cancelled job must not emit further events");

    let polls_at_cancel = polled.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(polled.load(Ordering::SeqCst), polls_at_cancel, "polling must stop on cancel");
}

#[tokio::test(start_paused = true)]
async fn cancel_discards_response_already_in_flight() {
    let mut surface = JobSurface::new();
    let polled = Arc::new(AtomicU32::new(0));
    let probe = StallingProbe { polled: Arc::clone(&polled), stall: Duration::from_secs(3600) };

    let mut rx = surface.submit(probe, Job::accepted("c1", JobKind::ChatResponse), policy_1s());
    let Some(JobEvent::Progress(..)) = rx.recv().await else {
        panic!("expected the instant first response");
    };

    // second request is now in flight and will not resolve for an hour
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(polled.load(Ordering::SeqCst), 2);

    surface.cancel();
    tokio::time::sleep(Duration::from_secs(7200)).await;

    assert!(rx.recv().await.is_none(), "in-flight response must be discarded after cancel");
    assert_eq!(polled.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_without_active_job_is_a_noop() {
    let mut surface = JobSurface::new();
    surface.cancel();
    assert!(!surface.is_busy());
}

// =============================================================================
// SUPERSEDE
// =============================================================================

#[tokio::test(start_paused = true)]
async fn resubmit_supersedes_the_previous_job() {
    let mut surface = JobSurface::new();
    let polled_a = Arc::new(AtomicU32::new(0));
    let probe_a = EndlessProbe { polled: Arc::clone(&polled_a) };

    let mut rx_a = surface.submit(probe_a, Job::accepted("old", JobKind::Migration), policy_1s());
    let Some(JobEvent::Progress(..)) = rx_a.recv().await else {
        panic!("expected progress from the first job");
    };

    let probe_b = ScriptedProbe { steps: vec![Ok(Step::Done("fresh"))] };
    let mut rx_b = surface.submit(probe_b, Job::accepted("new", JobKind::Migration), policy_1s());

    assert!(rx_a.recv().await.is_none(), "superseded job must close without a terminal event");

    let Some(JobEvent::Completed(output)) = rx_b.recv().await else {
        panic!("expected the new job to complete");
    };
    assert_eq!(output, "fresh");

    let polls_when_superseded = polled_a.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(polled_a.load(Ordering::SeqCst), polls_when_superseded);
}
