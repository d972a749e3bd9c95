use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shroud_client::{ProcessingOptions, RedactClient};
use shroud_workflow::{
    HttpJobGateway, Notice, ProgressSink, ResultView, SelectedFile, Stage, Step, TokioScheduler,
    WorkflowController, WorkflowState, MAX_UPLOAD_BYTES,
};

/// Submit documents to a redaction service and wait for the results.
#[derive(Parser)]
#[command(name = "shroud")]
struct Args {
    /// Files to submit (pdf, jpg, jpeg, png, docx).
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// PII category tag to redact; repeat for several. Empty means all.
    #[arg(long = "pii-type")]
    pii_types: Vec<String>,
}

/// Shell configuration from environment variables.
struct ShellConfig {
    base_url: String,
}

impl ShellConfig {
    fn from_env() -> Self {
        Self {
            base_url: env::var("SHROUD_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
        }
    }
}

/// Sink that narrates workflow state over the log output.
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn ready_changed(&self, ready: bool) {
        info!(ready, "Selection state changed");
    }

    fn stage_changed(&self, stage: Stage) {
        info!(?stage, "Stage changed");
    }

    fn progress_changed(&self, percent: u8, message: &str) {
        info!(percent, "{message}");
    }

    fn step_activated(&self, step: Step) {
        info!(?step, "Step active");
    }

    fn notified(&self, level: Notice, message: &str) {
        match level {
            Notice::Info => info!("{message}"),
            Notice::Error => error!("{message}"),
        }
    }

    fn results_ready(&self, view: &ResultView) {
        info!(
            files = view.files_processed,
            total_pii_count = view.total_pii_count,
            elapsed_secs = view.elapsed_secs,
            badge = view.protection_badge,
            "Results ready"
        );
        for card in &view.cards {
            match &card.download_url {
                Some(url) => info!(
                    file = card.filename.as_str(),
                    pii_count = card.pii_count,
                    icon = card.icon.css_class(),
                    url = url.as_str(),
                    "Redacted file available"
                ),
                None => warn!(
                    file = card.filename.as_str(),
                    "{}", shroud_workflow::FILE_FAILED_LABEL
                ),
            }
        }
    }

    fn intake_reset(&self) {
        info!("Intake reset");
    }
}

fn load_file(path: &Path) -> Result<SelectedFile> {
    let contents = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime_for(&name).to_string();
    Ok(SelectedFile {
        size_bytes: contents.len() as u64,
        name,
        mime_type,
        contents,
    })
}

fn mime_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("shroud=info".parse()?))
        .init();

    let args = Args::parse();
    let config = ShellConfig::from_env();
    info!(base_url = config.base_url.as_str(), "Shroud client starting");

    let files = args
        .files
        .iter()
        .map(|path| load_file(path))
        .collect::<Result<Vec<_>>>()?;

    let gateway = HttpJobGateway::new(RedactClient::new(&config.base_url));
    let mut controller = WorkflowController::new(
        Arc::new(gateway),
        Arc::new(ConsoleSink),
        Arc::new(TokioScheduler),
    );

    let kept = controller.select_files(files)?;
    if kept < args.files.len() {
        warn!(
            offered = args.files.len(),
            kept, "Some files were excluded as unsupported"
        );
    }

    let total = controller.total_size_bytes();
    if total > MAX_UPLOAD_BYTES {
        warn!(
            total_bytes = total,
            limit = MAX_UPLOAD_BYTES,
            "Selection exceeds the service upload limit; the server will likely reject it"
        );
    }

    let options = ProcessingOptions {
        pii_types: args.pii_types,
        ..Default::default()
    };

    match controller.run_submission(options).await {
        WorkflowState::Completed => Ok(()),
        WorkflowState::Failed => bail!("processing failed; see the notice above"),
        state => bail!("workflow ended unexpectedly in {state:?}"),
    }
}
