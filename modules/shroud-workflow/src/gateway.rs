//! Real gateway: adapts the HTTP client to the `JobGateway` seam.

use async_trait::async_trait;
use shroud_client::{
    PollOutcome, ProcessingOptions, RedactClient, Result, SubmissionOutcome, UploadFile,
};

use crate::intake::SelectedFile;
use crate::traits::JobGateway;

pub struct HttpJobGateway {
    client: RedactClient,
}

impl HttpJobGateway {
    pub fn new(client: RedactClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobGateway for HttpJobGateway {
    async fn submit(
        &self,
        files: &[SelectedFile],
        options: &ProcessingOptions,
    ) -> Result<SubmissionOutcome> {
        let uploads: Vec<UploadFile> = files
            .iter()
            .map(|file| UploadFile {
                filename: file.name.clone(),
                mime_type: file.mime_type.clone(),
                contents: file.contents.clone(),
            })
            .collect();
        self.client.submit(&uploads, options).await
    }

    async fn status(&self, task_id: &str) -> Result<PollOutcome> {
        self.client.status(task_id).await
    }

    fn download_url(&self, token: &str) -> String {
        self.client.download_url(token)
    }
}
