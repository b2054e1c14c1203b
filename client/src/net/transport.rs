//! HTTP transport: request descriptions and the `reqwest` implementation.
//!
//! DESIGN
//! ======
//! Requests are plain owned data (`ApiRequest`) rather than
//! `reqwest::RequestBuilder`s so the session layer can replay them after a
//! token refresh. Multipart bodies are kept as parts and turned into a fresh
//! `reqwest::multipart::Form` on every send.
//!
//! The `Transport` trait is the seam tests use to script backend behavior.
//! `ReqwestTransport` owns a cookie jar, so the httpOnly session cookies set
//! by login/refresh ride along on every later call.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::path::Path;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Method;
use serde_json::Value;

use super::envelope::RawResponse;
use super::error::ApiError;
use crate::config::ClientConfig;

// =============================================================================
// REQUEST DESCRIPTION
// =============================================================================

/// A replayable description of one API call.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API root, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// One field of a multipart form.
#[derive(Clone, Debug, PartialEq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: FileUpload },
}

/// File contents staged for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).map(ToOwned::to_owned);
        Self { file_name, mime, bytes }
    }

    /// Read a file from disk for upload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] when the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: RequestBody::Empty }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    #[must_use]
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// `METHOD /path` for logs.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        "mkv" => Some("video/x-matroska"),
        _ => None,
    }
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// Sends one request and reports the raw outcome. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Perform `request` once.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when no response was received and
    /// [`ApiError::InvalidRequest`] when the request could not be built.
    /// HTTP error statuses are *not* errors at this layer.
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError>;
}

// =============================================================================
// REQWEST TRANSPORT
// =============================================================================

pub struct ReqwestTransport {
    http: reqwest::Client,
    api_url: String,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    /// Build a transport with an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_url: config.api_url.clone(), jar })
    }

    /// Current `Cookie` header value for the API origin, if any cookie is set.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        let url = self.api_url.parse::<reqwest::Url>().ok()?;
        let value = self.jar.cookies(&url)?;
        value.to_str().ok().map(ToOwned::to_owned)
    }

    /// Seed the jar from a previously saved `Cookie` header value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when the API URL does not parse.
    pub fn restore_cookies(&self, header: &str) -> Result<(), ApiError> {
        let url = self
            .api_url
            .parse::<reqwest::Url>()
            .map_err(|e| ApiError::Config(format!("invalid API URL '{}': {e}", self.api_url)))?;
        for pair in header.split(';').map(str::trim).filter(|p| p.contains('=')) {
            self.jar.add_cookie_str(&format!("{pair}; Path=/"), &url);
        }
        Ok(())
    }

    fn url_for(&self, request: &ApiRequest) -> String {
        format!("{}{}", self.api_url, request.path)
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        let mut builder = self.http.request(request.method.clone(), self.url_for(request));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        tracing::trace!(request = %request.label(), "sending api request");
        let response = builder.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown Status").to_owned(),
            body: parse_body(&text),
        })
    }
}

fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return Some(Value::Null);
    }
    serde_json::from_str(text).ok()
}

fn build_form(parts: &[FormPart]) -> Result<reqwest::multipart::Form, ApiError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File { name, file } => {
                let mut body = reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
                if let Some(mime) = &file.mime {
                    body = body
                        .mime_str(mime)
                        .map_err(|e| ApiError::InvalidRequest(format!("{name}: {e}")))?;
                }
                form.part(name.clone(), body)
            }
        };
    }
    Ok(form)
}
