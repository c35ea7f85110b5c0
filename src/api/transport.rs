//! HTTP exchange behind the client
//!
//! The client only builds [`HttpRequest`]s and reads [`HttpResponse`]s; the
//! [`Transport`] moves them over the wire. [`HttpTransport`] is the reqwest
//! implementation with connection pooling.

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

use super::capabilities::ClientCapabilities;
use super::constants::CLIENT_VERSION;
use super::error::{Result, ShotgunError};
use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Multipart upload of one file plus plain form fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub url: String,
    pub fields: Vec<(String, String)>,
    pub file_field: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// A 200 response carrying `body`
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, "OK", body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    async fn upload(&self, request: UploadRequest) -> Result<HttpResponse>;

    async fn download(&self, url: &str) -> Result<HttpResponse>;
}

/// User agent sent with every request
pub fn user_agent(caps: &ClientCapabilities) -> String {
    format!(
        "shotgun-json ({}); Rust {} ({})",
        CLIENT_VERSION,
        caps.runtime_version,
        caps.platform_name().unwrap_or("unknown")
    )
}

/// reqwest transport with connection pooling
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &Config, caps: &ClientCapabilities) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent(caps));

        if let Some(proxy) = config.proxy()? {
            debug!("Routing requests through proxy {}:{}", proxy.server, proxy.port);
            let proxy = reqwest::Proxy::all(proxy.url())
                .map_err(|e| ShotgunError::configuration(format!("invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let http_client = builder
            .build()
            .map_err(|e| ShotgunError::configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    pub fn with_custom_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    async fn into_response(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status();
        let body = response.bytes().await?;
        Ok(HttpResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            body.to_vec(),
        ))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ShotgunError::validation(format!("invalid HTTP method '{}'", request.method)))?;

        let mut builder = self.http_client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(request.body).send().await?;
        Self::into_response(response).await
    }

    async fn upload(&self, request: UploadRequest) -> Result<HttpResponse> {
        let mut form = Form::new();
        for (name, value) in request.fields {
            form = form.text(name, value);
        }
        form = form.part(request.file_field, Part::bytes(request.content).file_name(request.file_name));

        let response = self.http_client.post(&request.url).multipart(form).send().await?;
        Self::into_response(response).await
    }

    async fn download(&self, url: &str) -> Result<HttpResponse> {
        let response = self.http_client.get(url).send().await?;
        Self::into_response(response).await
    }
}
