//! Request type definitions
//!
//! Defines the immutable request specification consumed by the dispatcher.
//! Endpoint modules construct a [`RequestSpec`] per call; the dispatcher is the
//! only consumer.

use reqwest::Method;

/// Which configured base URL a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetHost {
    /// The HTML site host (landing page, login)
    Site,
    /// The service API host
    Api,
}

/// Expected serialization format of a response payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// JSON body
    Json,
    /// XML body
    Xml,
    /// HTML document
    Html,
}

impl PayloadFormat {
    /// Detect the format from a Content-Type header value, if recognizable
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" | "text/json" => Some(Self::Json),
            "application/xml" | "text/xml" | "application/rss+xml" => Some(Self::Xml),
            "text/html" | "application/xhtml+xml" => Some(Self::Html),
            _ => None,
        }
    }
}

/// Specification for a single dispatched request
///
/// Immutable per call: built by a domain-specific call site, consumed once by
/// the dispatcher.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// HTTP method
    pub method: Method,
    /// Path relative to the target host
    pub path: String,
    /// Target host the path is resolved against
    pub host: TargetHost,
    /// Query string pairs
    pub query: Vec<(String, String)>,
    /// Form-encoded body pairs, if any
    pub form: Option<Vec<(String, String)>>,
    /// Additional per-request headers (e.g. Referer)
    pub headers: Vec<(String, String)>,
    /// Whether the request must not execute before the session is ready
    pub requires_token: bool,
    /// Expected response format, used when the server omits a usable
    /// Content-Type
    pub expected_format: PayloadFormat,
    /// Per-request override of the retry attempt budget
    pub retry_attempts: Option<u32>,
}

impl RequestSpec {
    /// Create a GET spec for the given path
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST spec for the given path
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a spec with the given method and path
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            host: TargetHost::Api,
            query: Vec::new(),
            form: None,
            headers: Vec::new(),
            requires_token: false,
            expected_format: PayloadFormat::Json,
            retry_attempts: None,
        }
    }

    /// Set the target host
    pub fn with_host(mut self, host: TargetHost) -> Self {
        self.host = host;
        self
    }

    /// Append a query pair
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Set a form-encoded body
    pub fn with_form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = Some(form);
        self
    }

    /// Append a per-request header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Require a ready session before execution
    pub fn with_required_token(mut self, required: bool) -> Self {
        self.requires_token = required;
        self
    }

    /// Declare the expected response format
    pub fn with_expected_format(mut self, format: PayloadFormat) -> Self {
        self.expected_format = format;
        self
    }

    /// Override the retry attempt budget for this request
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }
}
