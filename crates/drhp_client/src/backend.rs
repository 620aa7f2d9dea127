use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use drhp_logging::{drhp_debug, drhp_info, drhp_warn};
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::sse::{EventStreamDecoder, StreamEvent};
use crate::{
    ClientError, CompanyRecord, FailureKind, LogoAsset, ReportArtifact, ReportSourceKind,
    StatusUpdate, StreamOutcome,
};

/// Backend used when nothing else is configured; `DRHP_API_BASE_URL` overrides it at build time.
pub const DEFAULT_BASE_URL: &str = match option_env!("DRHP_API_BASE_URL") {
    Some(url) => url,
    None => "http://localhost:8000",
};

const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    /// Bound on every call that is not a processing stream.
    pub request_timeout: Duration,
    /// Longest silence tolerated on a processing stream before it is abandoned.
    pub stream_idle_timeout: Duration,
    pub report_source: ReportSourceKind,
}

impl ApiSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            stream_idle_timeout: Duration::from_secs(600),
            report_source: ReportSourceKind::default(),
        }
    }
}

/// Receives non-terminal status records while a stream is being read.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, update: StatusUpdate);
}

#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn list_companies(&self) -> Result<Vec<CompanyRecord>, ClientError>;

    /// Submits a DRHP PDF and reads its status stream to a terminal record.
    async fn upload_drhp(
        &self,
        path: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<StreamOutcome, ClientError>;

    async fn regenerate(
        &self,
        company_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<StreamOutcome, ClientError>;

    async fn fetch_report(
        &self,
        company_id: &str,
        company_name: &str,
    ) -> Result<ReportArtifact, ClientError>;

    async fn delete_company(&self, company_id: &str) -> Result<(), ClientError>;

    async fn render_pdf(&self, markdown: &str, company_name: &str) -> Result<Bytes, ClientError>;

    /// `content_type` is the image type already accepted by the caller.
    async fn upload_logo(&self, path: &Path, content_type: &str)
        -> Result<LogoAsset, ClientError>;
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    markdown_content: &'a str,
    company_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct MarkdownReport {
    markdown: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ApiSettings) -> Result<Self, ClientError> {
        // No client-wide timeout: it would also cut off long processing streams.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Appends percent-encoded `segments` to the base URL's path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::new(
                    FailureKind::InvalidUrl,
                    format!("{} cannot be a base URL", self.settings.base_url),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await
    }

    /// Opens a processing stream. Only the wait for headers is bounded, by the idle timeout.
    async fn open_stream(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<reqwest::Response>, ClientError> {
        match tokio::time::timeout(self.settings.stream_idle_timeout, request.send()).await {
            Err(_) => Ok(None),
            Ok(sent) => {
                let response = sent.map_err(map_reqwest_error)?;
                check_status(response).await.map(Some)
            }
        }
    }

    async fn consume_stream(
        &self,
        response: reqwest::Response,
        sink: &dyn ProgressSink,
    ) -> Result<StreamOutcome, ClientError> {
        let mut decoder = EventStreamDecoder::new();
        let mut stream = response.bytes_stream();
        loop {
            let chunk =
                match tokio::time::timeout(self.settings.stream_idle_timeout, stream.next()).await
                {
                    Err(_) => {
                        drhp_warn!(
                            "No stream data for {:?}; giving up",
                            self.settings.stream_idle_timeout
                        );
                        return Ok(StreamOutcome::TimedOut);
                    }
                    Ok(None) => {
                        if decoder.pending() > 0 {
                            drhp_debug!(
                                "Stream ended with {} bytes of an unterminated record",
                                decoder.pending()
                            );
                        }
                        return Ok(StreamOutcome::Ended);
                    }
                    Ok(Some(chunk)) => chunk.map_err(map_reqwest_error)?,
                };

            for event in decoder.push(&chunk) {
                match event {
                    StreamEvent::Progress(update) => sink.emit(update),
                    StreamEvent::Completed { markdown } => {
                        return Ok(StreamOutcome::Completed { markdown });
                    }
                    StreamEvent::Failed { message } => {
                        return Ok(StreamOutcome::Failed { message });
                    }
                }
            }
        }
    }

    async fn run_stream(
        &self,
        request: reqwest::RequestBuilder,
        sink: &dyn ProgressSink,
    ) -> Result<StreamOutcome, ClientError> {
        match self.open_stream(request).await? {
            Some(response) => self.consume_stream(response, sink).await,
            None => Ok(StreamOutcome::TimedOut),
        }
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn list_companies(&self) -> Result<Vec<CompanyRecord>, ClientError> {
        let url = self.endpoint(&["companies", ""])?;
        let response = self.send(self.client.get(url)).await?;
        response
            .json::<Vec<CompanyRecord>>()
            .await
            .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))
    }

    async fn upload_drhp(
        &self,
        path: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<StreamOutcome, ClientError> {
        let url = self.endpoint(&["companies", ""])?;
        let form = file_form(path, PDF_MIME).await?;
        drhp_info!("Uploading {:?} to {}", path, url);
        self.run_stream(self.client.post(url).multipart(form), sink)
            .await
    }

    async fn regenerate(
        &self,
        company_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<StreamOutcome, ClientError> {
        let url = self.endpoint(&["companies", company_id, "regenerate"])?;
        drhp_info!("Regenerating report for company {}", company_id);
        self.run_stream(self.client.post(url), sink).await
    }

    async fn fetch_report(
        &self,
        company_id: &str,
        company_name: &str,
    ) -> Result<ReportArtifact, ClientError> {
        match self.settings.report_source {
            ReportSourceKind::Markdown => {
                let url = self.endpoint(&["companies", company_id, "report"])?;
                let report: MarkdownReport = self
                    .send(self.client.get(url))
                    .await?
                    .json()
                    .await
                    .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))?;
                let pdf = self.render_pdf(&report.markdown, company_name).await?;
                Ok(ReportArtifact {
                    pdf,
                    markdown: Some(report.markdown),
                })
            }
            ReportSourceKind::Pdf => {
                let mut url = self.endpoint(&["report", company_id])?;
                url.query_pairs_mut().append_pair("format", "pdf");
                let pdf = self
                    .send(self.client.get(url))
                    .await?
                    .bytes()
                    .await
                    .map_err(map_reqwest_error)?;
                Ok(ReportArtifact {
                    pdf,
                    markdown: None,
                })
            }
        }
    }

    async fn delete_company(&self, company_id: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["companies", company_id])?;
        self.send(self.client.delete(url)).await?;
        drhp_info!("Deleted company {}", company_id);
        Ok(())
    }

    async fn render_pdf(&self, markdown: &str, company_name: &str) -> Result<Bytes, ClientError> {
        let url = self.endpoint(&["reports", "generate-pdf"])?;
        let body = RenderRequest {
            markdown_content: markdown,
            company_name,
        };
        self.send(self.client.post(url).json(&body))
            .await?
            .bytes()
            .await
            .map_err(map_reqwest_error)
    }

    async fn upload_logo(
        &self,
        path: &Path,
        content_type: &str,
    ) -> Result<LogoAsset, ClientError> {
        let url = self.endpoint(&["assets", "logos"])?;
        let form = file_form(path, content_type).await?;
        self.send(self.client.post(url).multipart(form))
            .await?
            .json()
            .await
            .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))
    }
}

async fn file_form(path: &Path, mime: &str) -> Result<Form, ClientError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ClientError::new(FailureKind::Io, format!("{}: {err}", path.display())))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    let part = Part::bytes(bytes)
        .file_name(filename)
        .mime_str(mime)
        .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))?;
    Ok(Form::new().part("file", part))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|error| match error.detail {
            serde_json::Value::String(detail) => detail,
            other => other.to_string(),
        })
        .unwrap_or_else(|| status.to_string());
    Err(ClientError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ClientError::new(FailureKind::Decode, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}
