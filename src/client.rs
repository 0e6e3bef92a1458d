//! The owning client
//!
//! One [`InstantDomainsClient`] owns its session state, transport, and
//! dispatcher; there is no process-wide singleton, so multiple independent
//! clients are safely constructible in the same process. Connection
//! resources are released when the client is dropped; [`close`] makes that
//! explicit.
//!
//! [`close`]: InstantDomainsClient::close

use crate::{
    Result,
    api::DomainSearchApi,
    config::Settings,
    normalize::{self, Shape},
    session::{Dispatcher, SessionState},
    types::{NormalizedResult, PayloadFormat, RawResponse, RequestSpec},
};
use std::sync::Arc;

/// Client for instantdomainsearch.com
///
/// # Examples
///
/// ```no_run
/// use instant_domains::InstantDomainsClient;
///
/// # async fn example() -> instant_domains::Result<()> {
/// let client = InstantDomainsClient::new()?;
/// client.warmup().await?;
///
/// let tlds = vec!["com".to_string(), "io".to_string()];
/// let results = client.domain_search().search("dealerflow", &tlds, true).await?;
/// for info in &results.main_results {
///     println!("{}: {}", info.domain, info.is_available);
/// }
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InstantDomainsClient {
    /// Shared dispatcher owning session state and transport
    dispatcher: Arc<Dispatcher>,
    /// Domain search endpoint module
    domain_search: DomainSearchApi,
}

impl InstantDomainsClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(Settings::default())
    }

    /// Create a client with the given settings
    pub fn with_settings(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let dispatcher = Arc::new(Dispatcher::new(settings)?);
        let domain_search = DomainSearchApi::new(Arc::clone(&dispatcher));
        Ok(Self {
            dispatcher,
            domain_search,
        })
    }

    /// Establish the session: entry-point requests, cookie/token harvesting
    ///
    /// Idempotent once the session is ready; concurrent callers share one
    /// warmup run.
    pub async fn warmup(&self) -> Result<()> {
        self.dispatcher.warmup().await
    }

    /// Execute a request specification through the dispatcher
    pub async fn execute(&self, spec: &RequestSpec) -> Result<RawResponse> {
        self.dispatcher.execute(spec).await
    }

    /// Normalize a raw response against a declared shape
    pub fn normalize(
        &self,
        raw: &RawResponse,
        declared: PayloadFormat,
        shape: &Shape,
    ) -> Result<NormalizedResult> {
        normalize::normalize(&raw.body, raw.content_type.as_deref(), declared, shape)
    }

    /// Domain availability search endpoints
    pub fn domain_search(&self) -> &DomainSearchApi {
        &self.domain_search
    }

    /// Snapshot of the current session state
    pub async fn session(&self) -> SessionState {
        self.dispatcher.store().snapshot().await
    }

    /// Number of warmup sequences run by this client
    pub fn warmup_runs(&self) -> u64 {
        self.dispatcher.warmup_runs()
    }

    /// Release connection resources
    ///
    /// Equivalent to dropping the last clone of the client; the underlying
    /// pool is torn down on every exit path either way.
    pub fn close(self) {
        drop(self);
        tracing::debug!("client closed");
    }
}
