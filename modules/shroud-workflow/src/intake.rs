//! File intake: per-file validation against the accepted-type predicate and
//! wholesale replacement of the current selection.

use thiserror::Error;

use crate::traits::ProgressSink;

/// Extensions the service accepts, matched case-insensitively.
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["pdf", "jpg", "jpeg", "png", "docx"];

/// MIME types the service accepts, matched case-insensitively.
pub const ACCEPTED_MIME_TYPES: [&str; 5] = [
    "application/pdf",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// The service rejects bodies above this with HTTP 413; exposed so a shell
/// can warn before submitting.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// One file in the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("No valid files selected. Accepted types: pdf, jpg, jpeg, png, docx")]
pub struct NoValidFiles;

/// True iff the file passes by declared MIME type or filename extension.
pub fn is_accepted(file: &SelectedFile) -> bool {
    let mime = file.mime_type.to_ascii_lowercase();
    if ACCEPTED_MIME_TYPES.contains(&mime.as_str()) {
        return true;
    }
    match extension(&file.name) {
        Some(ext) => ACCEPTED_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Holds the validated selection. Each `select` call replaces the previous
/// selection entirely; there is no merging.
#[derive(Default)]
pub struct FileIntake {
    selection: Vec<SelectedFile>,
}

impl FileIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter `raw` down to accepted files and store the result. Invalid
    /// files inside a valid batch are excluded without notice; an entirely
    /// invalid (or empty) batch yields `NoValidFiles`. Either way the sink's
    /// ready flag tracks whether anything submittable remains.
    pub fn select(
        &mut self,
        raw: Vec<SelectedFile>,
        sink: &dyn ProgressSink,
    ) -> Result<&[SelectedFile], NoValidFiles> {
        let offered = raw.len();
        self.selection = raw.into_iter().filter(is_accepted).collect();

        let excluded = offered - self.selection.len();
        if excluded > 0 {
            tracing::debug!(offered, excluded, "Excluded unsupported files from selection");
        }

        sink.ready_changed(!self.selection.is_empty());
        if self.selection.is_empty() {
            Err(NoValidFiles)
        } else {
            Ok(&self.selection)
        }
    }

    pub fn selection(&self) -> &[SelectedFile] {
        &self.selection
    }

    pub fn is_ready(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.selection.iter().map(|f| f.size_bytes).sum()
    }

    pub fn clear(&mut self) {
        self.selection.clear();
    }
}
