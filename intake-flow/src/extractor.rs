use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{IntakeError, Result},
    intake::AcceptedFile,
    models::ExtractionResult,
};

/// Multipart field name the extraction service reads the document from
pub const FILE_FIELD: &str = "file";
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Anything that can turn an accepted document into an extraction result
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, file: AcceptedFile) -> Result<ExtractionResult>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}

/// Extraction service reached over HTTP: `POST {base}/extract`, `GET {base}/health`
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: Client,
    base_url: String,
}

impl HttpExtractor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn extract_url(&self) -> String {
        format!("{}/extract", self.base_url)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.health_url();
        debug!(url = %url, "Checking extraction service health");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntakeError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| IntakeError::MalformedBody(e.to_string()))
    }
}

impl Default for HttpExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL)
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, file: AcceptedFile) -> Result<ExtractionResult> {
        let (name, media_type, content) = file.into_parts();
        let url = self.extract_url();
        info!(url = %url, bytes = content.len(), "Uploading document");

        let part = Part::bytes(content)
            .file_name(name)
            .mime_str(media_type.as_str())?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Extraction service returned an error status");
            debug!(body = %body, "Error response body");
            return Err(IntakeError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        debug!(length = body.len(), "Received extraction response");

        let result = ExtractionResult::from_json(&body)?;
        if result.success == Some(false) {
            warn!(message = ?result.message, "Service flagged the extraction as unsuccessful");
        }
        Ok(result)
    }
}
