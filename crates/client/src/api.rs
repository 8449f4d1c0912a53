use crate::error::{ApiError, ApiResult};
use crate::types::{Credentials, HealthStatus, PageExplanation, PdfInfo, UploadResponse};
use rand::Rng;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 10_000;


#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            request: Duration::from_secs(120),
        }
    }
}

#[derive(Clone)]
pub struct BackendApi {
    client: Client,
    base_url: Url,
}

fn calculate_backoff(attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..250);
    let exponential = BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(exponential.saturating_add(jitter).min(MAX_BACKOFF_MS))
}

/// FastAPI reports `detail` either as a string or as a list of validation entries.
fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| extract_detail(&body));
        return Err(ApiError::Server {
            status: status.as_u16(),
            detail,
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Retries idempotent requests. Uploads never go through here.
async fn with_retry<T, F, Fut>(mut operation: F) -> ApiResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ApiResult<T>>,
{
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempts < MAX_RETRIES && e.is_retryable() => {
                let delay = calculate_backoff(attempts);
                tracing::debug!(attempt = attempts, ?delay, "Retrying after error: {e}");
                tokio::time::sleep(delay).await;
                attempts += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

impl BackendApi {
    pub fn new(base_url: &str, timeouts: Timeouts) -> ApiResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(concat!("ppt-helper/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()
            .unwrap_or_else(|_| Client::new());
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn with_credentials(request: RequestBuilder, creds: &Credentials) -> RequestBuilder {
        match creds.api_key {
            Some(ref key) => request
                .header("X-Api-Key", key)
                .header("X-Model", &creds.model),
            None => request,
        }
    }

    pub async fn health(&self) -> ApiResult<HealthStatus> {
        let url = self.endpoint("")?;
        with_retry(move || {
            let url = url.clone();
            async move { decode(self.client.get(url).send().await?).await }
        })
        .await
    }

    /// Sends the document as multipart field `file`. Not retried.
    pub async fn upload_pdf(&self, file_name: &str, content: Vec<u8>) -> ApiResult<UploadResponse> {
        let url = self.endpoint("api/upload")?;
        let size = content.len();
        let part = reqwest::multipart::Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        tracing::info!(file = file_name, size, "Uploading PDF");
        let response = self.client.post(url).multipart(form).send().await?;
        let upload: UploadResponse = decode(response).await?;
        tracing::info!(
            pdf_id = %upload.pdf_id,
            total_pages = upload.total_pages,
            "PDF upload acknowledged"
        );
        Ok(upload)
    }

    pub async fn pdf_info(&self, pdf_id: &str) -> ApiResult<PdfInfo> {
        let url = self.endpoint(&format!("api/pdf/{pdf_id}/info"))?;
        with_retry(move || {
            let url = url.clone();
            async move { decode(self.client.get(url).send().await?).await }
        })
        .await
    }

    pub async fn explain_page(
        &self,
        pdf_id: &str,
        page_number: u32,
        creds: &Credentials,
    ) -> ApiResult<PageExplanation> {
        let url = self.endpoint(&format!("api/explain/{pdf_id}/{page_number}"))?;
        with_retry(move || {
            let request = Self::with_credentials(self.client.get(url.clone()), creds);
            async move { decode(request.send().await?).await }
        })
        .await
    }
}
