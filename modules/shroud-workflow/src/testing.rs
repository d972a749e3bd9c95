// Test doubles for the three workflow seams:
// - MockGateway (JobGateway) — queued outcomes, popped in order
// - RecordingSink (ProgressSink) — stateful event log
// - InstantScheduler (Scheduler) — records requested delays, returns at once
//
// Plus fixture helpers for building selections.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use shroud_client::{
    PollOutcome, ProcessingOptions, Result, ShroudError, SubmissionOutcome,
};

use crate::intake::SelectedFile;
use crate::renderer::ResultView;
use crate::traits::{JobGateway, Notice, ProgressSink, Scheduler, Stage, Step};

// ---------------------------------------------------------------------------
// MockGateway
// ---------------------------------------------------------------------------

/// Queue-based gateway. Each call pops the next scripted outcome; an empty
/// queue answers with a network error naming the mock.
pub struct MockGateway {
    submissions: Mutex<VecDeque<Result<SubmissionOutcome>>>,
    polls: Mutex<VecDeque<Result<PollOutcome>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(VecDeque::new()),
            polls: Mutex::new(VecDeque::new()),
        }
    }

    pub fn on_submit(self, outcome: Result<SubmissionOutcome>) -> Self {
        self.submissions.lock().unwrap().push_back(outcome);
        self
    }

    pub fn then_poll(self, outcome: Result<PollOutcome>) -> Self {
        self.polls.lock().unwrap().push_back(outcome);
        self
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobGateway for MockGateway {
    async fn submit(
        &self,
        _files: &[SelectedFile],
        _options: &ProcessingOptions,
    ) -> Result<SubmissionOutcome> {
        self.submissions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ShroudError::Network(
                    "MockGateway: no submission outcome queued".to_string(),
                ))
            })
    }

    async fn status(&self, _task_id: &str) -> Result<PollOutcome> {
        self.polls.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ShroudError::Network(
                "MockGateway: no poll outcome queued".to_string(),
            ))
        })
    }

    fn download_url(&self, token: &str) -> String {
        format!("mock://download/{token}")
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Everything a `ProgressSink` can be told, as a comparable value.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Ready(bool),
    Stage(Stage),
    Progress(u8, String),
    Step(Step),
    Notice(Notice, String),
    Results(ResultView),
    IntakeReset,
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Progress percentages in emission order.
    pub fn progress_values(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Progress(percent, _) => Some(percent),
                _ => None,
            })
            .collect()
    }

    /// Step activations in emission order, deduplicated.
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::new();
        for event in self.events() {
            if let UiEvent::Step(step) = event {
                if steps.last() != Some(&step) {
                    steps.push(step);
                }
            }
        }
        steps
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressSink for RecordingSink {
    fn ready_changed(&self, ready: bool) {
        self.push(UiEvent::Ready(ready));
    }

    fn stage_changed(&self, stage: Stage) {
        self.push(UiEvent::Stage(stage));
    }

    fn progress_changed(&self, percent: u8, message: &str) {
        self.push(UiEvent::Progress(percent, message.to_string()));
    }

    fn step_activated(&self, step: Step) {
        self.push(UiEvent::Step(step));
    }

    fn notified(&self, level: Notice, message: &str) {
        self.push(UiEvent::Notice(level, message.to_string()));
    }

    fn results_ready(&self, view: &ResultView) {
        self.push(UiEvent::Results(view.clone()));
    }

    fn intake_reset(&self) {
        self.push(UiEvent::IntakeReset);
    }
}

// ---------------------------------------------------------------------------
// InstantScheduler
// ---------------------------------------------------------------------------

/// Returns immediately from every delay, recording what was requested so
/// tests can assert the cadence without waiting for it.
#[derive(Default)]
pub struct InstantScheduler {
    delays: Mutex<Vec<Duration>>,
}

impl InstantScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scheduler for InstantScheduler {
    async fn delay(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn selected_file(name: &str, mime_type: &str, size_bytes: u64) -> SelectedFile {
    SelectedFile {
        name: name.to_string(),
        size_bytes,
        mime_type: mime_type.to_string(),
        contents: vec![0u8; size_bytes.min(64) as usize],
    }
}

pub fn pdf_file(name: &str) -> SelectedFile {
    selected_file(name, "application/pdf", 2_048_000)
}
