pub mod controller;
pub mod gateway;
pub mod intake;
pub mod renderer;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use controller::{
    Advance, Job, JobState, JobTicket, WorkflowController, WorkflowState,
    COMPLETE_DISPLAY_DELAY, FAILURE_RESET_DELAY, POLL_INTERVAL,
};
pub use gateway::HttpJobGateway;
pub use intake::{
    is_accepted, FileIntake, NoValidFiles, SelectedFile, ACCEPTED_EXTENSIONS,
    ACCEPTED_MIME_TYPES, MAX_UPLOAD_BYTES,
};
pub use renderer::{IconKind, ResultCard, ResultView, FILE_FAILED_LABEL, PROTECTION_BADGE};
pub use traits::{JobGateway, Notice, ProgressSink, Scheduler, Stage, Step, TokioScheduler};

/// Final payload of a completed job, as the service reports it.
pub use shroud_client::ResultPayload as JobResult;
