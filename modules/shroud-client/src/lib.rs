pub mod error;
pub mod types;

pub use error::{Result, ShroudError};
pub use types::{
    FileResultPayload, PollOutcome, ProcessingOptions, RedactionMethod, ResultPayload,
    SubmissionOutcome, UploadFile,
};

use std::time::Duration;

use types::{StatusBody, StatusResponse, UploadResponse};

pub struct RedactClient {
    client: reqwest::Client,
    base_url: String,
}

impl RedactClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Submit files plus options as one multipart request. Returns either a
    /// queued task id or, when the service short-circuits, a complete result.
    pub async fn submit(
        &self,
        files: &[UploadFile],
        options: &ProcessingOptions,
    ) -> Result<SubmissionOutcome> {
        tracing::info!(
            files = files.len(),
            pii_types = options.pii_types.len(),
            method = options.redaction_method.as_str(),
            "Submitting redaction job"
        );

        let mut form = reqwest::multipart::Form::new()
            .text("pii_types", serde_json::to_string(&options.pii_types)?)
            .text("redaction_method", options.redaction_method.as_str());

        for file in files {
            let part = reqwest::multipart::Part::bytes(file.contents.clone())
                .file_name(file.filename.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| ShroudError::Parse(e.to_string()))?;
            form = form.part("files", part);
        }

        let url = format!("{}/api/upload", self.base_url);
        let resp = self.client.post(&url).multipart(form).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ShroudError::Api {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        match serde_json::from_str::<UploadResponse>(&body)? {
            UploadResponse::Error { error } => Err(ShroudError::ServerReported(error)),
            UploadResponse::Queued { task_id } => {
                tracing::info!(task_id = %task_id, "Job queued for async processing");
                Ok(SubmissionOutcome::Queued { task_id })
            }
            UploadResponse::Immediate(payload) => {
                tracing::info!(
                    total_pii_count = payload.total_pii_count,
                    "Service returned a synchronous result"
                );
                Ok(SubmissionOutcome::Immediate(payload))
            }
        }
    }

    /// Query the status of one queued task. Each call is a single poll; the
    /// caller owns the cadence between polls.
    pub async fn status(&self, task_id: &str) -> Result<PollOutcome> {
        let url = format!("{}/api/status/{}", self.base_url, task_id);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ShroudError::Api {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        match serde_json::from_str::<StatusResponse>(&body)? {
            StatusResponse::Error { error } => Ok(PollOutcome::Failed { message: error }),
            StatusResponse::State(state) => decode_state(task_id, state),
        }
    }

    /// Build the download reference for a processed file. The client never
    /// fetches the bytes itself.
    pub fn download_url(&self, token: &str) -> String {
        format!("{}/api/download/{}", self.base_url, token)
    }
}

fn decode_state(task_id: &str, body: StatusBody) -> Result<PollOutcome> {
    match body.state.as_str() {
        "PENDING" | "PROGRESS" => {
            let progress = body.progress.unwrap_or(0).min(100);
            let message = body.message.unwrap_or_default();
            tracing::debug!(task_id, progress, "Task still in progress");
            Ok(PollOutcome::InProgress { progress, message })
        }
        "COMPLETED" => Ok(PollOutcome::Completed(ResultPayload {
            total_pii_count: body.total_pii_count.unwrap_or(0),
            results: body.results.unwrap_or_default(),
        })),
        "FAILED" => Ok(PollOutcome::Failed {
            message: body
                .message
                .unwrap_or_else(|| "Processing failed".to_string()),
        }),
        other => Err(ShroudError::Parse(format!("unknown task state: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(state: &str, progress: Option<u8>, message: Option<&str>) -> StatusBody {
        StatusBody {
            state: state.to_string(),
            progress,
            message: message.map(String::from),
            total_pii_count: None,
            results: None,
        }
    }

    #[test]
    fn pending_and_progress_states_stay_in_progress() {
        for state in ["PENDING", "PROGRESS"] {
            let outcome = decode_state("t1", body(state, Some(40), Some("scanning"))).unwrap();
            assert_eq!(
                outcome,
                PollOutcome::InProgress {
                    progress: 40,
                    message: "scanning".to_string()
                }
            );
        }
    }

    #[test]
    fn completed_state_is_terminal_even_without_progress() {
        let outcome = decode_state("t1", body("COMPLETED", None, None)).unwrap();
        assert!(matches!(outcome, PollOutcome::Completed(_)));
    }

    #[test]
    fn failed_state_carries_the_server_message() {
        let outcome = decode_state("t1", body("FAILED", None, Some("OCR crashed"))).unwrap();
        assert_eq!(
            outcome,
            PollOutcome::Failed {
                message: "OCR crashed".to_string()
            }
        );
    }

    #[test]
    fn unknown_state_is_a_parse_error() {
        let err = decode_state("t1", body("RETRYING", None, None)).unwrap_err();
        assert!(matches!(err, ShroudError::Parse(_)));
    }

    #[test]
    fn download_url_targets_the_download_endpoint() {
        let client = RedactClient::new("http://localhost:5000/");
        assert_eq!(
            client.download_url("tok-99"),
            "http://localhost:5000/api/download/tok-99"
        );
    }
}
