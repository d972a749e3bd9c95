//! Trait boundaries between the workflow core and its collaborators: the
//! remote service, the visible UI, and the timer. Tests swap all three.

use std::time::Duration;

use async_trait::async_trait;
use shroud_client::{PollOutcome, ProcessingOptions, Result, SubmissionOutcome};

use crate::intake::SelectedFile;
use crate::renderer::ResultView;

/// Boundary to the remote redaction service: submission, one status poll,
/// and download-reference construction.
#[async_trait]
pub trait JobGateway: Send + Sync {
    async fn submit(
        &self,
        files: &[SelectedFile],
        options: &ProcessingOptions,
    ) -> Result<SubmissionOutcome>;

    async fn status(&self, task_id: &str) -> Result<PollOutcome>;

    fn download_url(&self, token: &str) -> String;
}

/// Owns all workflow delays (poll cadence, display and reset pauses) so the
/// state machine itself never sleeps and tests run instantly.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn delay(&self, duration: Duration);
}

/// Real scheduler backed by the tokio timer.
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Which part of the interface is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Intake,
    Progress,
    Results,
}

/// The four progress-step indicators shown while a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Upload,
    Queue,
    Detect,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Error,
}

/// Everything the workflow surfaces to a user. The hosting shell binds this
/// to its UI; the core only emits, it never reads back.
pub trait ProgressSink: Send + Sync {
    /// The "ready to submit" flag; true iff the selection is non-empty.
    fn ready_changed(&self, ready: bool);
    fn stage_changed(&self, stage: Stage);
    fn progress_changed(&self, percent: u8, message: &str);
    fn step_activated(&self, step: Step);
    fn notified(&self, level: Notice, message: &str);
    fn results_ready(&self, view: &ResultView);
    /// Intake restored to its default, unselected appearance.
    fn intake_reset(&self);
}
