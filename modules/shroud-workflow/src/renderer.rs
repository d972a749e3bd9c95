//! Turns a completed job's payload into user-facing summaries and per-file
//! download descriptors. Pure transform; card order follows the backend.

use chrono::{DateTime, Utc};
use shroud_client::ResultPayload;

use crate::traits::JobGateway;

/// Badge text shown on every completed job.
pub const PROTECTION_BADGE: &str = "100% protected";

/// Label shown on a card whose file failed inside an otherwise-successful job.
pub const FILE_FAILED_LABEL: &str = "Processing failed";

/// Classification icon for a result card, keyed by filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Document,
    Image,
    WordDocument,
    Generic,
}

impl IconKind {
    pub fn for_filename(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => IconKind::Document,
            "jpg" | "jpeg" | "png" => IconKind::Image,
            "docx" => IconKind::WordDocument,
            _ => IconKind::Generic,
        }
    }

    /// CSS class name the hosting shell attaches to the card icon.
    pub fn css_class(&self) -> &'static str {
        match self {
            IconKind::Document => "document",
            IconKind::Image => "image",
            IconKind::WordDocument => "word-document",
            IconKind::Generic => "generic",
        }
    }
}

/// One per-file result card. `download_url` is present iff the file was
/// processed successfully; otherwise the card shows `FILE_FAILED_LABEL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCard {
    pub filename: String,
    pub pii_count: u64,
    pub icon: IconKind,
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub files_processed: usize,
    pub total_pii_count: u64,
    /// Wall-clock seconds from submission to completion, rounded.
    pub elapsed_secs: u64,
    pub protection_badge: &'static str,
    pub cards: Vec<ResultCard>,
}

pub fn render(
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    files_processed: usize,
    payload: &ResultPayload,
    gateway: &dyn JobGateway,
) -> ResultView {
    let elapsed_ms = (completed_at - started_at).num_milliseconds().max(0) as f64;
    let elapsed_secs = (elapsed_ms / 1000.0).round() as u64;

    let cards = payload
        .results
        .iter()
        .map(|file| ResultCard {
            filename: file.original_filename.clone(),
            pii_count: file.pii_count,
            icon: IconKind::for_filename(&file.original_filename),
            download_url: file
                .output_file
                .as_deref()
                .map(|token| gateway.download_url(token)),
        })
        .collect();

    ResultView {
        files_processed,
        total_pii_count: payload.total_pii_count,
        elapsed_secs,
        protection_badge: PROTECTION_BADGE,
        cards,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGateway;
    use chrono::Duration;
    use shroud_client::FileResultPayload;

    #[test]
    fn icon_classification_by_extension() {
        assert_eq!(IconKind::for_filename("report.pdf"), IconKind::Document);
        assert_eq!(IconKind::for_filename("photo.JPG"), IconKind::Image);
        assert_eq!(IconKind::for_filename("scan.jpeg"), IconKind::Image);
        assert_eq!(IconKind::for_filename("shot.png"), IconKind::Image);
        assert_eq!(IconKind::for_filename("memo.docx"), IconKind::WordDocument);
        assert_eq!(IconKind::for_filename("data.csv"), IconKind::Generic);
        assert_eq!(IconKind::for_filename("noext"), IconKind::Generic);
    }

    #[test]
    fn cards_follow_backend_order_and_mark_per_file_failures() {
        let payload = ResultPayload {
            total_pii_count: 5,
            results: vec![
                FileResultPayload {
                    original_filename: "b.png".to_string(),
                    pii_count: 2,
                    output_file: Some("tok-2".to_string()),
                },
                FileResultPayload {
                    original_filename: "a.pdf".to_string(),
                    pii_count: 3,
                    output_file: None,
                },
            ],
        };

        let started = Utc::now();
        let completed = started + Duration::milliseconds(4_600);
        let gateway = MockGateway::new();
        let view = render(started, completed, 2, &payload, &gateway);

        assert_eq!(view.files_processed, 2);
        assert_eq!(view.total_pii_count, 5);
        assert_eq!(view.elapsed_secs, 5);
        assert_eq!(view.protection_badge, PROTECTION_BADGE);

        // Not re-sorted: b.png first, exactly as the backend returned it.
        assert_eq!(view.cards[0].filename, "b.png");
        assert_eq!(view.cards[0].icon, IconKind::Image);
        assert_eq!(
            view.cards[0].download_url.as_deref(),
            Some("mock://download/tok-2")
        );
        assert_eq!(view.cards[1].filename, "a.pdf");
        assert_eq!(view.cards[1].download_url, None);
    }
}
