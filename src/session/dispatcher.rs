//! Request dispatcher
//!
//! The single chokepoint through which every call flows. The dispatcher
//! injects session state into headers, executes via the transport, follows
//! redirect chains up to a bounded depth, classifies outcomes, retries
//! transient failures with exponential backoff, and updates session state
//! from response side effects. It also owns the warmup sequence so that at
//! most one warmup runs at a time.

use crate::{
    Error, Result,
    config::Settings,
    session::state::{SessionStatus, SessionStore},
    session::transport::{HttpTransport, Transport, TransportRequest, TransportResponse},
    session::warmup::{WarmupPlan, harvest_metadata},
    types::{RawResponse, RequestSpec, TargetHost},
};
use reqwest::Method;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::Mutex;
use url::Url;

/// Decides whether a response signals that the server invalidated the session
///
/// The exact status/body pattern meaning "session expired" is
/// reverse-engineered from observed site behavior and may be incomplete, so
/// the classification is pluggable rather than hard-coded.
pub trait ExpiryPolicy: Send + Sync + std::fmt::Debug {
    /// True when the response means the session is no longer valid
    fn is_session_expired(&self, response: &TransportResponse) -> bool;
}

/// Default classification: auth statuses, redirect-to-login, body markers
#[derive(Debug, Clone)]
pub struct DefaultExpiryPolicy {
    /// Path fragment identifying the login page in a redirect Location
    login_path: String,
    /// Body substrings that mark an invalidated session
    markers: Vec<String>,
}

impl DefaultExpiryPolicy {
    /// Build from the configured login path and body markers
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            login_path: settings.endpoints.login_path.clone(),
            markers: settings.warmup.session_expired_markers.clone(),
        }
    }
}

impl ExpiryPolicy for DefaultExpiryPolicy {
    fn is_session_expired(&self, response: &TransportResponse) -> bool {
        if response.status == 401 || response.status == 403 {
            return true;
        }
        if response.is_redirect()
            && let Some(location) = response.location()
            && location.contains(&self.login_path)
        {
            return true;
        }
        self.markers
            .iter()
            .any(|marker| response.body.contains(marker))
    }
}

/// Final response of one redirect chain
struct ChainOutcome {
    response: TransportResponse,
    depth_exceeded: bool,
}

/// Parameters of one logical call, rebuilt per retry attempt
struct CallParams<'a> {
    method: Method,
    host: TargetHost,
    path: &'a str,
    query: &'a [(String, String)],
    headers: &'a [(String, String)],
    form: Option<&'a Vec<(String, String)>>,
    attempts: u32,
}

/// Convenience type alias for the dispatcher with the production transport
pub type Dispatcher = DispatcherGeneric<HttpTransport>;

/// Request dispatcher, generic over the transport seam
#[derive(Debug)]
pub struct DispatcherGeneric<T: Transport = HttpTransport> {
    /// Configuration settings
    settings: Arc<Settings>,
    /// Transport issuing single requests
    transport: Arc<T>,
    /// Shared session state
    store: Arc<SessionStore>,
    /// Warmup sequence and token extraction rules
    plan: WarmupPlan,
    /// Session-invalidation classifier
    expiry_policy: Arc<dyn ExpiryPolicy>,
    /// Serializes warmup sequences; waiters piggyback on the in-flight run
    warmup_gate: Mutex<()>,
    /// Completed warmup sequence count, for diagnostics and tests
    warmup_runs: AtomicU64,
}

impl DispatcherGeneric<HttpTransport> {
    /// Create a dispatcher with the production HTTP transport
    pub fn new(settings: Settings) -> Result<Self> {
        let transport = HttpTransport::new(&settings)?;
        Ok(Self::with_transport(settings, transport))
    }
}

impl<T: Transport> DispatcherGeneric<T> {
    /// Create a dispatcher over a specific transport
    pub fn with_transport(settings: Settings, transport: T) -> Self {
        let plan = WarmupPlan::for_settings(&settings);
        let expiry_policy = Arc::new(DefaultExpiryPolicy::from_settings(&settings));
        Self {
            settings: Arc::new(settings),
            transport: Arc::new(transport),
            store: Arc::new(SessionStore::new()),
            plan,
            expiry_policy,
            warmup_gate: Mutex::new(()),
            warmup_runs: AtomicU64::new(0),
        }
    }

    /// Replace the session-expiry classifier
    pub fn with_expiry_policy(mut self, policy: Arc<dyn ExpiryPolicy>) -> Self {
        self.expiry_policy = policy;
        self
    }

    /// Replace the warmup plan
    pub fn with_warmup_plan(mut self, plan: WarmupPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Shared session store
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Number of warmup sequences started since construction
    pub fn warmup_runs(&self) -> u64 {
        self.warmup_runs.load(Ordering::Relaxed)
    }

    /// Execute one request specification
    ///
    /// Warms the session first when the spec requires a token, retries
    /// transient failures, and recovers from exactly one session
    /// invalidation by re-warming and retrying the whole call.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<RawResponse> {
        if spec.requires_token && self.store.status().await != SessionStatus::Ready {
            self.warmup().await?;
        }

        let params = CallParams {
            method: spec.method.clone(),
            host: spec.host,
            path: &spec.path,
            query: &spec.query,
            headers: &spec.headers,
            form: spec.form.as_ref(),
            attempts: spec
                .retry_attempts
                .unwrap_or(self.settings.retry.max_attempts),
        };

        let mut recovered = false;
        loop {
            let outcome = self.send_with_retries(&params).await?;
            let response = outcome.response;

            if self.expiry_policy.is_session_expired(&response) {
                self.store.invalidate().await;
                if recovered {
                    return Err(Error::authentication(format!(
                        "session invalidated again after re-warmup (status {}) on {}",
                        response.status, spec.path
                    )));
                }
                tracing::warn!(
                    path = %spec.path,
                    status = response.status,
                    "session invalidated, re-warming once"
                );
                recovered = true;
                self.warmup().await?;
                continue;
            }

            if outcome.depth_exceeded {
                return Err(Error::transport(
                    1,
                    format!(
                        "redirect depth {} exceeded for {}",
                        self.settings.warmup.max_redirects, spec.path
                    ),
                ));
            }

            if response.status >= 400 {
                return Err(Error::request(response.status, response.body));
            }

            return Ok(RawResponse::new(
                response.status,
                response.content_type(),
                response.body,
            ));
        }
    }

    /// Run the warmup sequence, or wait for the one already in flight
    ///
    /// At most one warmup runs to completion at a time; a caller arriving
    /// while one is in flight blocks on the gate and finds the session
    /// ready instead of starting a duplicate.
    pub async fn warmup(&self) -> Result<()> {
        let _guard = self.warmup_gate.lock().await;
        if self.store.status().await == SessionStatus::Ready {
            return Ok(());
        }

        self.warmup_runs.fetch_add(1, Ordering::Relaxed);
        self.store.mark_warming().await;
        tracing::info!("starting session warmup");

        let result = self.run_warmup_steps().await;
        if result.is_err() {
            self.store.invalidate().await;
        }
        result
    }

    async fn run_warmup_steps(&self) -> Result<()> {
        for step in &self.plan.steps {
            let params = CallParams {
                method: step.method.clone(),
                host: step.host,
                path: &step.path,
                query: &[],
                headers: &step.headers,
                form: None,
                attempts: self.settings.retry.max_attempts,
            };

            let outcome = self.send_with_retries(&params).await?;

            if outcome.depth_exceeded {
                return Err(Error::session_initialization(
                    &step.name,
                    format!(
                        "redirect depth {} exceeded",
                        self.settings.warmup.max_redirects
                    ),
                ));
            }
            if outcome.response.status >= 400 {
                return Err(Error::session_initialization(
                    &step.name,
                    format!("unexpected status {}", outcome.response.status),
                ));
            }

            tracing::debug!(step = %step.name, "warmup step complete");
        }

        let missing = self
            .store
            .missing_tokens(&self.settings.warmup.required_tokens)
            .await;
        if !missing.is_empty() {
            return Err(Error::missing_tokens(&missing));
        }

        self.store.mark_ready().await;
        tracing::info!("session warmup complete");
        Ok(())
    }

    /// Send with bounded exponential-backoff retry of transient failures
    ///
    /// Transient = network/timeout errors and 5xx statuses. Anything else
    /// returns on the first attempt. Exhaustion surfaces the last cause.
    async fn send_with_retries(&self, params: &CallParams<'_>) -> Result<ChainOutcome> {
        let attempts = params.attempts.max(1);
        let mut last_cause = String::new();
        let mut last_server_error: Option<TransportResponse> = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.backoff_delay(attempt - 1);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying");
                tokio::time::sleep(delay).await;
            }

            let request = self.build_request(params).await?;
            match self.send_chain(request).await {
                Ok(outcome) if outcome.response.status >= 500 => {
                    tracing::warn!(
                        path = params.path,
                        status = outcome.response.status,
                        attempt,
                        "server error, will retry"
                    );
                    last_cause = format!("server error {}", outcome.response.status);
                    last_server_error = Some(outcome.response);
                }
                Ok(outcome) => return Ok(outcome),
                Err(Error::Network(err)) => {
                    tracing::warn!(path = params.path, attempt, error = %err, "transport failure");
                    last_cause = err.to_string();
                    last_server_error = None;
                }
                Err(other) => return Err(other),
            }
        }

        match last_server_error {
            Some(response) => Err(Error::request(response.status, response.body)),
            None => Err(Error::transport(attempts, last_cause)),
        }
    }

    /// Follow a redirect chain up to the configured depth
    ///
    /// Each completed hop has its cookies/tokens applied to the session
    /// store immediately, so later hops (and later warmup steps) see them.
    /// A redirect pointing at the login page is returned unfollowed for the
    /// expiry policy to classify.
    async fn send_chain(&self, mut request: TransportRequest) -> Result<ChainOutcome> {
        let max_redirects = self.settings.warmup.max_redirects;
        let mut hops = 0u32;

        loop {
            let response = self.transport.send(request.clone()).await?;

            if response.status < 500 {
                let metadata = harvest_metadata(&response, &self.plan.token_rules);
                self.store.apply(&metadata).await;
            }

            if !response.is_redirect() {
                return Ok(ChainOutcome {
                    response,
                    depth_exceeded: false,
                });
            }

            let Some(location) = response.location() else {
                return Ok(ChainOutcome {
                    response,
                    depth_exceeded: false,
                });
            };

            if location.contains(&self.settings.endpoints.login_path) {
                return Ok(ChainOutcome {
                    response,
                    depth_exceeded: false,
                });
            }

            if hops >= max_redirects {
                tracing::warn!(hops, location = %location, "redirect depth exhausted");
                return Ok(ChainOutcome {
                    response,
                    depth_exceeded: true,
                });
            }
            hops += 1;

            let next_url = request.url.join(&location).map_err(|e| {
                Error::config(format!("unresolvable redirect location {}: {}", location, e))
            })?;
            tracing::debug!(hop = hops, url = %next_url, "following redirect");

            // Redirected hops degrade to GET without a body; session headers
            // are refreshed so cookies set earlier in the chain are sent.
            let mut next = TransportRequest::new(Method::GET, next_url);
            next.headers = self.session_headers(&[]).await;
            request = next;
        }
    }

    /// Build the transport request for one attempt from a fresh state snapshot
    async fn build_request(&self, params: &CallParams<'_>) -> Result<TransportRequest> {
        let base = match params.host {
            TargetHost::Site => &self.settings.endpoints.site_url,
            TargetHost::Api => &self.settings.endpoints.api_url,
        };
        let mut url = Url::parse(base)
            .map_err(|e| Error::config(format!("invalid base url {}: {}", base, e)))?
            .join(params.path)
            .map_err(|e| Error::config(format!("invalid request path {}: {}", params.path, e)))?;

        if !params.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params.query {
                pairs.append_pair(name, value);
            }
        }

        let mut request = TransportRequest::new(params.method.clone(), url);
        request.headers = self.session_headers(params.headers).await;
        request.form = params.form.cloned();
        Ok(request)
    }

    /// Merge session cookies and token headers with per-request headers
    async fn session_headers(&self, extra: &[(String, String)]) -> Vec<(String, String)> {
        let state = self.store.snapshot().await;
        let mut headers = Vec::new();

        if let Some(cookie) = state.cookie_header() {
            headers.push(("Cookie".to_string(), cookie));
        }
        for (name, value) in &state.tokens {
            if let Some(header) = self.plan.header_for_token(name) {
                headers.push((header.to_string(), value.clone()));
            }
        }
        headers.extend(extra.iter().cloned());
        headers
    }

    fn backoff_delay(&self, completed_attempts: u32) -> std::time::Duration {
        let exponent = completed_attempts.saturating_sub(1).min(16);
        let delay = self
            .settings
            .retry
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.settings.retry.max_delay_ms);
        std::time::Duration::from_millis(delay)
    }
}
