use serde::{Deserialize, Serialize};

/// One file to submit, as the multipart body will carry it.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub mime_type: String,
    pub contents: Vec<u8>,
}

/// Options for one processing job. Built once per submission, immutable after.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingOptions {
    /// PII category tags to redact. Empty means the service default (all).
    pub pii_types: Vec<String>,
    pub redaction_method: RedactionMethod,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedactionMethod {
    #[default]
    Blackout,
}

impl RedactionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedactionMethod::Blackout => "blackout",
        }
    }
}

/// Successful upload response. A true union: the service either queued an
/// async task or short-circuited to a complete result.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Queued { task_id: String },
    Immediate(ResultPayload),
}

/// Final payload of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultPayload {
    pub total_pii_count: u64,
    pub results: Vec<FileResultPayload>,
}

/// Per-file slice of a completed job. `output_file` is the opaque download
/// token, present iff this file processed successfully.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileResultPayload {
    pub original_filename: String,
    pub pii_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

/// Raw upload response body. Variant order matters: `error` and `task_id`
/// discriminate before the full result shape is attempted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum UploadResponse {
    Error { error: String },
    Queued { task_id: String },
    Immediate(ResultPayload),
}

/// Raw status response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum StatusResponse {
    Error { error: String },
    State(StatusBody),
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatusBody {
    pub state: String,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total_pii_count: Option<u64>,
    #[serde(default)]
    pub results: Option<Vec<FileResultPayload>>,
}

/// Outcome of one status poll, decoded from the server's `state` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Server states `PENDING` and `PROGRESS`.
    InProgress { progress: u8, message: String },
    /// Server state `COMPLETED`, regardless of the numeric progress field.
    Completed(ResultPayload),
    /// Server state `FAILED`, or a body-level `error` field.
    Failed { message: String },
}
