//! HTTP transport layer
//!
//! A thin wrapper over reqwest issuing single requests with the configured
//! timeout and browser-mimicry headers. Automatic redirect following is
//! disabled so the warmup flow and the dispatcher can observe every hop of a
//! redirect chain. The [`Transport`] trait is the seam test doubles plug into.

use crate::{Result, config::Settings};
use async_trait::async_trait;
use reqwest::{
    Client, Method,
    header::{HeaderMap, HeaderName, HeaderValue, SET_COOKIE},
    redirect,
};
use url::Url;

/// A single outgoing request, fully resolved
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: Url,
    /// Headers beyond the transport's static defaults
    pub headers: Vec<(String, String)>,
    /// Form-encoded body pairs, if any
    pub form: Option<Vec<(String, String)>>,
}

impl TransportRequest {
    /// Create a request with no extra headers or body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            form: None,
        }
    }
}

/// A fully-read response from one network attempt
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Complete response body
    pub body: String,
}

impl TransportResponse {
    /// Content-Type header value, if present and readable
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Location header value, if present and readable
    pub fn location(&self) -> Option<String> {
        self.headers
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// True for a 3xx status
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Cookie pairs from every Set-Cookie header
    ///
    /// Attributes after the first `;` (Path, Expires, ...) are dropped; the
    /// session store only needs name and value.
    pub fn set_cookies(&self) -> Vec<(String, String)> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|raw| {
                let pair = raw.split(';').next()?;
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect()
    }
}

/// Transport seam: issues one request, returns one fully-read response
///
/// Implementations must not follow redirects or retry; both policies belong
/// to the dispatcher.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and read the complete response body
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Production transport backed by a reqwest client
#[derive(Debug)]
pub struct HttpTransport {
    /// Shared connection pool
    client: Client,
}

impl HttpTransport {
    /// Build a transport from the configured timeout and headers
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.http.user_agent.clone())
            .default_headers(Self::default_headers())
            .timeout(settings.request_timeout())
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Static headers mimicking a desktop browser, sent with every request
    fn default_headers() -> HeaderMap {
        let pairs = [
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,\
                 image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
            ),
            ("Accept-Language", "en-US,en;q=0.9"),
            (
                "Sec-Ch-Ua",
                "\"Not)A;Brand\";v=\"8\", \"Chromium\";v=\"138\", \"Google Chrome\";v=\"138\"",
            ),
            ("Sec-Ch-Ua-Mobile", "?0"),
            ("Sec-Ch-Ua-Platform", "\"Windows\""),
            ("Connection", "keep-alive"),
        ];

        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        headers
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self.client.request(request.method.clone(), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        tracing::debug!(status, bytes = body.len(), "received response");

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
