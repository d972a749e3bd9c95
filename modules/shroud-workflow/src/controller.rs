//! The workflow state machine: intake → submission → polling → completion or
//! failure. Transitions are pure event handlers returning an [`Advance`]
//! instruction; a thin async driver interprets those against the gateway and
//! scheduler, so supersession and cancellation are testable without timers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shroud_client::{PollOutcome, ProcessingOptions, ResultPayload, ShroudError, SubmissionOutcome};

use crate::intake::{FileIntake, NoValidFiles, SelectedFile};
use crate::renderer::{self, ResultView};
use crate::traits::{JobGateway, Notice, ProgressSink, Scheduler, Stage, Step};

/// Fixed delay between successive status polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);
/// Pause between marking a job complete and switching to the results view.
pub const COMPLETE_DISPLAY_DELAY: Duration = Duration::from_millis(1500);
/// Pause between a failure notification and the reset back to intake.
pub const FAILURE_RESET_DELAY: Duration = Duration::from_millis(3000);

/// Progress shown once the upload has been accepted and the task queued.
const SUBMITTED_PROGRESS: u8 = 25;
/// Above this progress the detection step indicator lights up.
const DETECT_STEP_THRESHOLD: u8 = 30;

/// Where the workflow currently is. `AwaitingAsyncResult` carries the task
/// identifier the polling chain is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Uploading,
    AwaitingAsyncResult {
        task_id: String,
    },
    Completed,
    Failed,
}

/// Phase of the single active job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    NotStarted,
    Uploading,
    Submitted,
    Polling,
    Completed,
    Failed,
}

/// One processing attempt, created at submission time and superseded on
/// reset or a new submission.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Option<String>,
    pub state: JobState,
    pub progress_percent: u8,
    pub message: String,
    pub started_at: DateTime<Utc>,
}

/// Handle tying events to one submission. Stale tickets make every event a
/// no-op, which is how a superseded polling chain is cut off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTicket(u64);

/// What the driver should do after an event has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Poll the task after the given delay (zero for the first poll).
    Poll { task_id: String, after: Duration },
    /// Terminal success: show the results view after the display delay.
    ShowResults(ResultView),
    /// Terminal failure: reset to idle after the failure delay.
    Reset,
    /// The event belonged to a superseded job; do nothing further.
    Superseded,
}

pub struct WorkflowController {
    gateway: Arc<dyn JobGateway>,
    sink: Arc<dyn ProgressSink>,
    scheduler: Arc<dyn Scheduler>,
    intake: FileIntake,
    state: WorkflowState,
    job: Option<Job>,
    seq: u64,
}

impl WorkflowController {
    pub fn new(
        gateway: Arc<dyn JobGateway>,
        sink: Arc<dyn ProgressSink>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            gateway,
            sink,
            scheduler,
            intake: FileIntake::new(),
            state: WorkflowState::Idle,
            job: None,
            seq: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn selection(&self) -> &[SelectedFile] {
        self.intake.selection()
    }

    /// Combined size of the current selection, for pre-submit size warnings.
    pub fn total_size_bytes(&self) -> u64 {
        self.intake.total_size_bytes()
    }

    /// Replace the current selection. An all-invalid batch surfaces as a
    /// notification and leaves the workflow unable to submit.
    pub fn select_files(&mut self, raw: Vec<SelectedFile>) -> Result<usize, NoValidFiles> {
        match self.intake.select(raw, self.sink.as_ref()) {
            Ok(kept) => {
                tracing::info!(files = kept.len(), "Selection ready for submission");
                Ok(kept.len())
            }
            Err(err) => {
                self.sink.notified(Notice::Error, &err.to_string());
                Err(err)
            }
        }
    }

    /// `Idle -> Uploading`. Returns `None` when the selection is empty, which
    /// never reaches `Uploading`. Starting while a prior job is in flight
    /// supersedes it: the returned ticket invalidates every older one.
    pub fn begin_submission(&mut self) -> Option<JobTicket> {
        if !self.intake.is_ready() {
            self.sink.notified(Notice::Error, &NoValidFiles.to_string());
            return None;
        }

        self.seq += 1;
        self.state = WorkflowState::Uploading;
        self.job = Some(Job {
            id: None,
            state: JobState::Uploading,
            progress_percent: 0,
            message: "Uploading files...".to_string(),
            started_at: Utc::now(),
        });

        tracing::info!(seq = self.seq, files = self.intake.selection().len(), "Starting submission");
        self.sink.stage_changed(Stage::Progress);
        self.sink.progress_changed(0, "Uploading files...");
        self.sink.step_activated(Step::Upload);

        Some(JobTicket(self.seq))
    }

    /// Apply the submission outcome: async task id moves to
    /// `AwaitingAsyncResult` and starts the polling chain; a synchronous
    /// result completes immediately; any error fails the job.
    pub fn on_submission(
        &mut self,
        ticket: JobTicket,
        outcome: Result<SubmissionOutcome, ShroudError>,
    ) -> Advance {
        if ticket.0 != self.seq {
            return Advance::Superseded;
        }

        match outcome {
            Ok(SubmissionOutcome::Queued { task_id }) => {
                if let Some(job) = self.job.as_mut() {
                    job.id = Some(task_id.clone());
                    job.state = JobState::Submitted;
                }
                self.state = WorkflowState::AwaitingAsyncResult {
                    task_id: task_id.clone(),
                };
                self.sink.step_activated(Step::Queue);
                self.observe_progress(SUBMITTED_PROGRESS, "Files uploaded, processing queued");
                tracing::info!(task_id = %task_id, "Submission accepted, polling for completion");
                Advance::Poll {
                    task_id,
                    after: Duration::ZERO,
                }
            }
            Ok(SubmissionOutcome::Immediate(payload)) => self.complete(payload),
            Err(err) => self.fail(&err.to_string()),
        }
    }

    /// Apply one poll outcome. `InProgress` keeps the chain alive with the
    /// standard interval; `Completed` and `Failed` are terminal; a transport
    /// or parse error is terminal too, never retried.
    pub fn on_poll(
        &mut self,
        ticket: JobTicket,
        outcome: Result<PollOutcome, ShroudError>,
    ) -> Advance {
        if ticket.0 != self.seq {
            return Advance::Superseded;
        }
        let WorkflowState::AwaitingAsyncResult { task_id } = &self.state else {
            return Advance::Superseded;
        };
        let task_id = task_id.clone();

        match outcome {
            Ok(PollOutcome::InProgress { progress, message }) => {
                if let Some(job) = self.job.as_mut() {
                    job.state = JobState::Polling;
                }
                self.observe_progress(progress, &message);
                if self.job.as_ref().map(|j| j.progress_percent).unwrap_or(0)
                    > DETECT_STEP_THRESHOLD
                {
                    self.sink.step_activated(Step::Detect);
                }
                Advance::Poll {
                    task_id,
                    after: POLL_INTERVAL,
                }
            }
            Ok(PollOutcome::Completed(payload)) => self.complete(payload),
            Ok(PollOutcome::Failed { message }) => self.fail(&message),
            Err(err) => self.fail(&err.to_string()),
        }
    }

    /// Switch the interface to the results view. Called by the driver after
    /// the display delay; guarded so a supersession during the pause wins.
    pub fn present_results(&mut self, ticket: JobTicket, view: &ResultView) {
        if ticket.0 != self.seq {
            return;
        }
        self.sink.stage_changed(Stage::Results);
        self.sink.results_ready(view);
    }

    /// Return to idle after a failure. Called by the driver after the reset
    /// delay; guarded like every other continuation.
    pub fn finish_reset(&mut self, ticket: JobTicket) {
        if ticket.0 != self.seq {
            return;
        }
        self.reset_to_idle();
    }

    /// User-initiated reset: discard the job and selection, restore intake.
    /// Bumping the sequence cuts off any polling chain still in flight.
    pub fn reset(&mut self) {
        self.seq += 1;
        self.reset_to_idle();
    }

    /// Drive one submission to its terminal state, which is returned even
    /// though a failure settles back to `Idle` afterwards. Network calls
    /// suspend here; all pauses go through the scheduler.
    pub async fn run_submission(&mut self, options: ProcessingOptions) -> WorkflowState {
        let Some(ticket) = self.begin_submission() else {
            return self.state.clone();
        };

        let files = self.intake.selection().to_vec();
        let outcome = self.gateway.submit(&files, &options).await;
        let mut advance = self.on_submission(ticket, outcome);

        loop {
            match advance {
                Advance::Poll { task_id, after } => {
                    if !after.is_zero() {
                        self.scheduler.delay(after).await;
                    }
                    let outcome = self.gateway.status(&task_id).await;
                    advance = self.on_poll(ticket, outcome);
                }
                Advance::ShowResults(view) => {
                    self.scheduler.delay(COMPLETE_DISPLAY_DELAY).await;
                    self.present_results(ticket, &view);
                    return WorkflowState::Completed;
                }
                Advance::Reset => {
                    self.scheduler.delay(FAILURE_RESET_DELAY).await;
                    self.finish_reset(ticket);
                    return WorkflowState::Failed;
                }
                Advance::Superseded => return self.state.clone(),
            }
        }
    }

    fn complete(&mut self, payload: ResultPayload) -> Advance {
        let completed_at = Utc::now();
        let started_at = self
            .job
            .as_ref()
            .map(|j| j.started_at)
            .unwrap_or(completed_at);

        if let Some(job) = self.job.as_mut() {
            job.state = JobState::Completed;
        }
        self.state = WorkflowState::Completed;
        self.sink.step_activated(Step::Done);
        self.observe_progress(100, "Processing complete");

        let view = renderer::render(
            started_at,
            completed_at,
            self.intake.selection().len(),
            &payload,
            self.gateway.as_ref(),
        );
        tracing::info!(
            total_pii_count = payload.total_pii_count,
            files = view.cards.len(),
            "Job completed"
        );
        Advance::ShowResults(view)
    }

    fn fail(&mut self, message: &str) -> Advance {
        if let Some(job) = self.job.as_mut() {
            job.state = JobState::Failed;
            job.message = message.to_string();
        }
        self.state = WorkflowState::Failed;
        tracing::warn!(error = message, "Job failed");
        self.sink.notified(Notice::Error, message);
        Advance::Reset
    }

    /// Progress is monotone non-decreasing for the lifetime of one job; a
    /// poll reporting less than we have shown keeps the shown value.
    fn observe_progress(&mut self, percent: u8, message: &str) {
        let Some(job) = self.job.as_mut() else {
            return;
        };
        job.progress_percent = job.progress_percent.max(percent.min(100));
        job.message = message.to_string();
        self.sink.progress_changed(job.progress_percent, message);
    }

    fn reset_to_idle(&mut self) {
        self.state = WorkflowState::Idle;
        self.job = None;
        self.intake.clear();
        self.sink.ready_changed(false);
        self.sink.intake_reset();
        self.sink.stage_changed(Stage::Intake);
        tracing::info!("Workflow reset to idle");
    }
}
