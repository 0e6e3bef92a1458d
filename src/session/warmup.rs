//! Warmup flow definition and token extraction
//!
//! The warmup sequence establishes the initial session: fetch the landing
//! page, touch the geography and auth-session services, and harvest cookies
//! and tokens along the way. The sequence itself is data ([`WarmupPlan`]);
//! execution belongs to the dispatcher so redirect depth and retry policy
//! stay in one place.
//!
//! Token extraction is declarative: a [`TokenRule`] names where a token value
//! hides in a response. Rules are applied to every response, warmup or not,
//! so rotated tokens are picked up opportunistically.

use crate::{
    config::Settings,
    session::state::ResponseMetadata,
    session::transport::TransportResponse,
    types::TargetHost,
};
use regex::Regex;
use reqwest::Method;
use scraper::{Html, Selector};

/// Where a token value is found in a response
#[derive(Debug, Clone)]
pub enum TokenExtractor {
    /// Value of a Set-Cookie cookie with this name
    Cookie {
        /// Cookie name
        cookie: String,
    },
    /// JSON body member at this pointer (e.g. `/csrfToken`)
    JsonPointer {
        /// RFC 6901 pointer
        pointer: String,
    },
    /// Attribute (or text, when `attr` is None) of the first element
    /// matching a CSS selector in an HTML body
    HtmlAttr {
        /// CSS selector
        selector: String,
        /// Attribute to read; None reads the element text
        attr: Option<String>,
    },
    /// First capture group of a regex applied to the raw body
    ///
    /// The pattern is compiled lazily; an invalid pattern simply never
    /// matches, which surfaces as a missing-token failure naming the token.
    BodyPattern {
        /// Regex with one capture group
        pattern: String,
    },
}

/// A named token and the rule to extract it
#[derive(Debug, Clone)]
pub struct TokenRule {
    /// Logical token name (e.g. "csrf")
    pub name: String,
    /// Header the token is injected into on outgoing requests, if any
    pub header: Option<String>,
    /// Where to find the value
    pub extractor: TokenExtractor,
}

impl TokenRule {
    /// Create a rule
    pub fn new(
        name: impl Into<String>,
        header: Option<String>,
        extractor: TokenExtractor,
    ) -> Self {
        Self {
            name: name.into(),
            header,
            extractor,
        }
    }

    /// Try to extract this token's value from a response
    pub fn extract(&self, response: &TransportResponse) -> Option<String> {
        match &self.extractor {
            TokenExtractor::Cookie { cookie } => response
                .set_cookies()
                .into_iter()
                .find(|(name, _)| name == cookie)
                .map(|(_, value)| value),
            TokenExtractor::JsonPointer { pointer } => {
                let value: serde_json::Value = serde_json::from_str(&response.body).ok()?;
                match value.pointer(pointer)? {
                    serde_json::Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                }
            }
            TokenExtractor::HtmlAttr { selector, attr } => {
                let parsed = Selector::parse(selector).ok()?;
                let document = Html::parse_document(&response.body);
                let element = document.select(&parsed).next()?;
                match attr {
                    Some(attr) => element.value().attr(attr).map(str::to_string),
                    None => {
                        let text = element.text().collect::<String>().trim().to_string();
                        (!text.is_empty()).then_some(text)
                    }
                }
            }
            TokenExtractor::BodyPattern { pattern } => {
                let regex = Regex::new(pattern).ok()?;
                regex
                    .captures(&response.body)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            }
        }
    }
}

/// One ordered step of the warmup sequence
#[derive(Debug, Clone)]
pub struct WarmupStep {
    /// Step name used in error reporting
    pub name: String,
    /// HTTP method
    pub method: Method,
    /// Target host
    pub host: TargetHost,
    /// Path relative to the host
    pub path: String,
    /// Extra headers for this step (e.g. Referer)
    pub headers: Vec<(String, String)>,
}

/// The full warmup sequence plus the token extraction rules
#[derive(Debug, Clone)]
pub struct WarmupPlan {
    /// Ordered entry-point requests
    pub steps: Vec<WarmupStep>,
    /// Rules applied to every response
    pub token_rules: Vec<TokenRule>,
}

impl WarmupPlan {
    /// Default plan for the configured site: landing page, geography
    /// service, auth session, with the csrf token extracted from the
    /// auth-session JSON or a landing-page meta tag.
    pub fn for_settings(settings: &Settings) -> Self {
        let referer = format!("{}/", settings.endpoints.site_url.trim_end_matches('/'));

        let steps = vec![
            WarmupStep {
                name: "landing-page".to_string(),
                method: Method::GET,
                host: TargetHost::Site,
                path: "/".to_string(),
                headers: Vec::new(),
            },
            WarmupStep {
                name: "geography".to_string(),
                method: Method::GET,
                host: TargetHost::Api,
                path: "/services/geography".to_string(),
                headers: vec![("Referer".to_string(), referer.clone())],
            },
            WarmupStep {
                name: "auth-session".to_string(),
                method: Method::GET,
                host: TargetHost::Api,
                path: "/services/auth/session".to_string(),
                headers: vec![("Referer".to_string(), referer)],
            },
        ];

        let csrf_header = Some("x-csrf-token".to_string());
        let token_rules = vec![
            TokenRule::new(
                "csrf",
                csrf_header.clone(),
                TokenExtractor::JsonPointer {
                    pointer: "/csrfToken".to_string(),
                },
            ),
            TokenRule::new(
                "csrf",
                csrf_header.clone(),
                TokenExtractor::HtmlAttr {
                    selector: "meta[name=\"csrf-token\"]".to_string(),
                    attr: Some("content".to_string()),
                },
            ),
            TokenRule::new(
                "csrf",
                csrf_header,
                TokenExtractor::BodyPattern {
                    pattern: r#""csrfToken"\s*:\s*"([^"]+)""#.to_string(),
                },
            ),
        ];

        Self { steps, token_rules }
    }

    /// Header name for a token, if any rule declares one
    pub fn header_for_token(&self, token: &str) -> Option<&str> {
        self.token_rules
            .iter()
            .find(|rule| rule.name == token && rule.header.is_some())
            .and_then(|rule| rule.header.as_deref())
    }
}

/// Harvest cookies and rule-matched tokens from one fully-read response
pub fn harvest_metadata(response: &TransportResponse, rules: &[TokenRule]) -> ResponseMetadata {
    let mut metadata = ResponseMetadata::new();
    metadata.cookies = response.set_cookies();

    for rule in rules {
        if let Some(value) = rule.extract(response) {
            // First matching rule wins for a given token name
            if !metadata.tokens.iter().any(|(name, _)| name == &rule.name) {
                metadata.tokens.push((rule.name.clone(), value));
            }
        }
    }

    metadata
}
