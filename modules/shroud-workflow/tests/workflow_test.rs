//! End-to-end workflow scenarios against mock collaborators: the full
//! submit → poll → complete chain, failure funnels, and supersession.

use std::sync::Arc;

use shroud_client::{
    FileResultPayload, PollOutcome, ProcessingOptions, ResultPayload, ShroudError,
    SubmissionOutcome,
};
use shroud_workflow::testing::{pdf_file, selected_file, InstantScheduler, MockGateway, UiEvent};
use shroud_workflow::{
    Advance, IconKind, JobGateway, Notice, Stage, Step, WorkflowController, WorkflowState,
    COMPLETE_DISPLAY_DELAY, FAILURE_RESET_DELAY, POLL_INTERVAL, PROTECTION_BADGE,
};

type Harness = (
    WorkflowController,
    Arc<shroud_workflow::testing::RecordingSink>,
    Arc<InstantScheduler>,
);

fn harness(gateway: MockGateway) -> Harness {
    let sink = Arc::new(shroud_workflow::testing::RecordingSink::new());
    let scheduler = Arc::new(InstantScheduler::new());
    let controller = WorkflowController::new(
        Arc::new(gateway),
        sink.clone(),
        scheduler.clone(),
    );
    (controller, sink, scheduler)
}

fn report_payload() -> ResultPayload {
    ResultPayload {
        total_pii_count: 3,
        results: vec![FileResultPayload {
            original_filename: "report.pdf".to_string(),
            pii_count: 3,
            output_file: Some("tok-99".to_string()),
        }],
    }
}

#[tokio::test]
async fn async_happy_path_reaches_completed_with_rendered_results() {
    let gateway = MockGateway::new()
        .on_submit(Ok(SubmissionOutcome::Queued {
            task_id: "abc123".to_string(),
        }))
        .then_poll(Ok(PollOutcome::InProgress {
            progress: 40,
            message: "scanning".to_string(),
        }))
        .then_poll(Ok(PollOutcome::Completed(report_payload())));
    let (mut controller, sink, scheduler) = harness(gateway);

    controller
        .select_files(vec![pdf_file("report.pdf")])
        .unwrap();
    let state = controller.run_submission(ProcessingOptions::default()).await;

    assert_eq!(state, WorkflowState::Completed);
    assert_eq!(controller.state(), &WorkflowState::Completed);

    // Idle -> Uploading -> AwaitingAsyncResult -> Completed, no skipped
    // steps, monotone progress.
    assert_eq!(
        sink.steps(),
        vec![Step::Upload, Step::Queue, Step::Detect, Step::Done]
    );
    assert_eq!(sink.progress_values(), vec![0, 25, 40, 100]);

    // One delayed poll, then the display pause before the results stage.
    assert_eq!(
        scheduler.delays(),
        vec![POLL_INTERVAL, COMPLETE_DISPLAY_DELAY]
    );

    let events = sink.events();
    let view = events
        .iter()
        .find_map(|event| match event {
            UiEvent::Results(view) => Some(view.clone()),
            _ => None,
        })
        .expect("results view emitted");
    assert_eq!(view.files_processed, 1);
    assert_eq!(view.total_pii_count, 3);
    assert_eq!(view.protection_badge, PROTECTION_BADGE);
    assert_eq!(view.cards.len(), 1);
    assert_eq!(view.cards[0].filename, "report.pdf");
    assert_eq!(view.cards[0].icon, IconKind::Document);
    assert_eq!(
        view.cards[0].download_url.as_deref(),
        Some("mock://download/tok-99")
    );

    // Results stage comes last, after the progress stage.
    assert_eq!(events.last(), Some(&UiEvent::Results(view)));
    assert!(events.contains(&UiEvent::Stage(Stage::Progress)));
    assert!(events.contains(&UiEvent::Stage(Stage::Results)));
}

#[tokio::test]
async fn all_invalid_selection_never_reaches_uploading() {
    let (mut controller, sink, _scheduler) = harness(MockGateway::new());

    let err = controller
        .select_files(vec![selected_file("notes.txt", "text/plain", 512)])
        .unwrap_err();
    assert_eq!(err, shroud_workflow::NoValidFiles);

    let state = controller.run_submission(ProcessingOptions::default()).await;
    assert_eq!(state, WorkflowState::Idle);

    let events = sink.events();
    assert!(events.contains(&UiEvent::Ready(false)));
    assert!(!events.contains(&UiEvent::Stage(Stage::Progress)));
}

#[tokio::test]
async fn synchronous_result_completes_without_polling() {
    let gateway = MockGateway::new().on_submit(Ok(SubmissionOutcome::Immediate(report_payload())));
    let (mut controller, sink, scheduler) = harness(gateway);

    controller
        .select_files(vec![pdf_file("report.pdf")])
        .unwrap();
    let state = controller.run_submission(ProcessingOptions::default()).await;

    assert_eq!(state, WorkflowState::Completed);
    assert_eq!(sink.steps(), vec![Step::Upload, Step::Done]);
    assert_eq!(scheduler.delays(), vec![COMPLETE_DISPLAY_DELAY]);
}

#[tokio::test]
async fn completed_poll_is_terminal_regardless_of_progress_value() {
    // First and only poll reports COMPLETED while progress never moved.
    let gateway = MockGateway::new()
        .on_submit(Ok(SubmissionOutcome::Queued {
            task_id: "t1".to_string(),
        }))
        .then_poll(Ok(PollOutcome::Completed(report_payload())));
    let (mut controller, _sink, _scheduler) = harness(gateway);

    controller
        .select_files(vec![pdf_file("report.pdf")])
        .unwrap();
    let state = controller.run_submission(ProcessingOptions::default()).await;
    assert_eq!(state, WorkflowState::Completed);
}

#[tokio::test]
async fn failed_poll_funnels_to_failed_and_resets_to_idle() {
    let gateway = MockGateway::new()
        .on_submit(Ok(SubmissionOutcome::Queued {
            task_id: "t1".to_string(),
        }))
        .then_poll(Ok(PollOutcome::Failed {
            message: "Processing failed: OCR crashed".to_string(),
        }));
    let (mut controller, sink, scheduler) = harness(gateway);

    controller
        .select_files(vec![pdf_file("report.pdf")])
        .unwrap();
    let state = controller.run_submission(ProcessingOptions::default()).await;

    assert_eq!(state, WorkflowState::Failed);
    assert_eq!(controller.state(), &WorkflowState::Idle);
    assert!(controller.selection().is_empty());

    let events = sink.events();
    assert!(events.contains(&UiEvent::Notice(
        Notice::Error,
        "Processing failed: OCR crashed".to_string()
    )));
    assert!(events.contains(&UiEvent::IntakeReset));
    assert_eq!(events.last(), Some(&UiEvent::Stage(Stage::Intake)));
    assert!(scheduler.delays().contains(&FAILURE_RESET_DELAY));
}

#[tokio::test]
async fn poll_transport_error_is_terminal_not_retried() {
    let gateway = MockGateway::new()
        .on_submit(Ok(SubmissionOutcome::Queued {
            task_id: "t1".to_string(),
        }))
        .then_poll(Err(ShroudError::Network("connection refused".to_string())));
    let (mut controller, _sink, scheduler) = harness(gateway);

    controller
        .select_files(vec![pdf_file("report.pdf")])
        .unwrap();
    let state = controller.run_submission(ProcessingOptions::default()).await;

    assert_eq!(state, WorkflowState::Failed);
    // First poll is immediate, so the only recorded delay is the reset
    // pause; no retry interval was ever scheduled.
    assert_eq!(scheduler.delays(), vec![FAILURE_RESET_DELAY]);
}

#[tokio::test]
async fn http_500_on_submission_fails_with_numeric_status_and_clears_selection() {
    let gateway = MockGateway::new().on_submit(Err(ShroudError::Api { status: 500 }));
    let (mut controller, sink, _scheduler) = harness(gateway);

    controller
        .select_files(vec![pdf_file("report.pdf")])
        .unwrap();
    let state = controller.run_submission(ProcessingOptions::default()).await;

    assert_eq!(state, WorkflowState::Failed);
    assert_eq!(controller.state(), &WorkflowState::Idle);
    assert!(controller.selection().is_empty());
    assert!(sink
        .events()
        .contains(&UiEvent::Notice(Notice::Error, "Server error: 500".to_string())));
}

#[tokio::test]
async fn new_submission_supersedes_the_previous_polling_chain() {
    let (mut controller, sink, _scheduler) = harness(MockGateway::new());

    controller
        .select_files(vec![pdf_file("report.pdf")])
        .unwrap();

    let t1 = controller.begin_submission().expect("first ticket");
    let advance = controller.on_submission(
        t1,
        Ok(SubmissionOutcome::Queued {
            task_id: "T1".to_string(),
        }),
    );
    assert!(matches!(advance, Advance::Poll { ref task_id, .. } if task_id == "T1"));

    // Second submission begins while T1 is awaiting its result.
    let t2 = controller.begin_submission().expect("second ticket");
    let events_before = sink.events().len();

    // Every continuation of T1 is now a no-op, whatever it carries.
    assert_eq!(
        controller.on_poll(
            t1,
            Ok(PollOutcome::InProgress {
                progress: 90,
                message: "late update".to_string()
            })
        ),
        Advance::Superseded
    );
    assert_eq!(
        controller.on_poll(t1, Ok(PollOutcome::Completed(report_payload()))),
        Advance::Superseded
    );
    assert_eq!(sink.events().len(), events_before);

    // T2 proceeds normally.
    let advance = controller.on_submission(
        t2,
        Ok(SubmissionOutcome::Queued {
            task_id: "T2".to_string(),
        }),
    );
    assert!(matches!(advance, Advance::Poll { ref task_id, .. } if task_id == "T2"));
}

#[tokio::test]
async fn superseded_display_continuation_shows_nothing() {
    let (mut controller, sink, _scheduler) = harness(MockGateway::new());

    controller
        .select_files(vec![pdf_file("report.pdf")])
        .unwrap();
    let t1 = controller.begin_submission().unwrap();
    let advance = controller.on_submission(t1, Ok(SubmissionOutcome::Immediate(report_payload())));
    let view = match advance {
        Advance::ShowResults(view) => view,
        other => panic!("expected results, got {other:?}"),
    };

    // Supersession lands during the display pause.
    controller.begin_submission().unwrap();
    let events_before = sink.events().len();
    controller.present_results(t1, &view);
    assert_eq!(sink.events().len(), events_before);
}

#[tokio::test]
async fn progress_is_monotone_across_polls() {
    let (mut controller, sink, _scheduler) = harness(MockGateway::new());

    controller
        .select_files(vec![pdf_file("report.pdf")])
        .unwrap();
    let t1 = controller.begin_submission().unwrap();
    controller.on_submission(
        t1,
        Ok(SubmissionOutcome::Queued {
            task_id: "T1".to_string(),
        }),
    );

    controller.on_poll(
        t1,
        Ok(PollOutcome::InProgress {
            progress: 40,
            message: "scanning".to_string(),
        }),
    );
    controller.on_poll(
        t1,
        Ok(PollOutcome::InProgress {
            progress: 35,
            message: "still scanning".to_string(),
        }),
    );

    assert_eq!(sink.progress_values(), vec![0, 25, 40, 40]);
    assert_eq!(controller.job().unwrap().progress_percent, 40);
}

#[tokio::test]
async fn user_reset_clears_the_job_and_selection() {
    let gateway = MockGateway::new().on_submit(Ok(SubmissionOutcome::Immediate(report_payload())));
    let (mut controller, sink, _scheduler) = harness(gateway);

    controller
        .select_files(vec![pdf_file("report.pdf")])
        .unwrap();
    let state = controller.run_submission(ProcessingOptions::default()).await;
    assert_eq!(state, WorkflowState::Completed);

    controller.reset();
    assert_eq!(controller.state(), &WorkflowState::Idle);
    assert!(controller.job().is_none());
    assert!(controller.selection().is_empty());
    assert!(sink.events().contains(&UiEvent::IntakeReset));

    // Nothing selected, so a new submission cannot start.
    assert!(controller.begin_submission().is_none());
}

#[tokio::test]
async fn download_reference_uses_the_gateway() {
    // Renderer delegates to JobGateway::download_url; the mock makes the
    // binding visible.
    let gateway = MockGateway::new();
    assert_eq!(gateway.download_url("tok-1"), "mock://download/tok-1");
}
