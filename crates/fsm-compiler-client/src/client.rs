//! Client for the manual-to-FSM compiler service.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use url::Url;

use crate::error::CompilerClientError;
use crate::types::{
    CompileRequest, CompileResponse, ErrorBody, HealthResponse, FILE_FIELD, MANUAL_MIME,
    TEXT_FIELD,
};

/// Default service location used by the reference deployment
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path of the compile endpoint, relative to the base URL
const COMPILE_PATH: &str = "compile";

/// Client for the FSM compiler service.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    /// HTTP client for making requests
    http_client: reqwest::Client,
    /// Base URL, always ending in `/` so relative joins keep any path prefix
    base_url: Url,
}

impl Client {
    /// Create a client for the service at `base_url` with no request timeout.
    ///
    /// # Example
    /// ```rust,no_run
    /// use fsm_compiler_client::{Client, CompileRequest};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = Client::new("http://localhost:8000")?;
    /// let response = client
    ///     .compile(CompileRequest::text("If the light is red, stop."))
    ///     .await?;
    /// println!("{} states", response.fsm_stats.states);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(base_url: &str) -> Result<Self, CompilerClientError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client whose requests fail after `timeout`.
    pub fn with_timeout(
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, CompilerClientError> {
        let base_url = normalize_base_url(base_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(CompilerClientError::HttpError)?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of the compile endpoint.
    pub fn compile_url(&self) -> Result<Url, CompilerClientError> {
        Ok(self.base_url.join(COMPILE_PATH)?)
    }

    /// Submit a manual for compilation.
    ///
    /// Sends exactly one multipart request carrying either the `file` or the
    /// `text` field. Non-2xx statuses map to [`CompilerClientError::ApiError`]
    /// and bodies that do not match [`CompileResponse`] map to
    /// [`CompilerClientError::ParseError`].
    pub async fn compile(
        &self,
        request: CompileRequest,
    ) -> Result<CompileResponse, CompilerClientError> {
        let url = self.compile_url()?;
        let field = request.field_name();
        let size = request.len();
        let form = build_form(request)?;

        tracing::info!(%url, field, bytes = size, "Sending compile request");

        let response = self
            .http_client
            .post(url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Compile response received");

        parse_compile_response(status, &body)
    }

    /// Ask the service root whether it is up.
    pub async fn health(&self) -> Result<HealthResponse, CompilerClientError> {
        let response = self.http_client.get(self.base_url.clone()).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Parse and normalize a base URL so that joins are relative to its full path.
fn normalize_base_url(base_url: &str) -> Result<Url, CompilerClientError> {
    let mut url = Url::parse(base_url.trim())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CompilerClientError::ConfigError(format!(
            "Unsupported URL scheme '{}' (expected http or https)",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Build the single-part multipart body for a request.
fn build_form(request: CompileRequest) -> Result<Form, CompilerClientError> {
    let form = Form::new();
    match request {
        CompileRequest::Text(text) => Ok(form.text(TEXT_FIELD, text)),
        CompileRequest::File { name, content } => {
            let part = Part::bytes(content.to_vec())
                .file_name(name)
                .mime_str(MANUAL_MIME)?;
            Ok(form.part(FILE_FIELD, part))
        }
    }
}

/// Interpret a compile response from its status and raw body.
pub(crate) fn parse_compile_response(
    status: StatusCode,
    body: &str,
) -> Result<CompileResponse, CompilerClientError> {
    if !status.is_success() {
        return Err(api_error(status, body));
    }

    serde_json::from_str(body).map_err(|e| {
        tracing::debug!("Compile response did not match expected shape: {}", e);
        CompilerClientError::ParseError(e.to_string())
    })
}

/// Build an `ApiError`, preferring the service's `detail` field over the raw body.
fn api_error(status: StatusCode, body: &str) -> CompilerClientError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.to_string(),
    };

    CompilerClientError::ApiError {
        status: status.as_u16(),
        message,
    }
}
