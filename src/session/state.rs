//! Session state store
//!
//! Holds the cookies, extracted tokens, and lifecycle status shared by every
//! request issued through one client. All mutation goes through a single
//! writer lock so concurrent responses never lose a merge; reads hand out
//! cloned snapshots.

use std::collections::HashMap;
use tokio::sync::RwLock;

/// Lifecycle status of the shared session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created empty, warmup never attempted
    Uninitialized,
    /// Warmup sequence in flight
    Warming,
    /// All required tokens present, authenticated calls may proceed
    Ready,
    /// Server signalled invalidation; next call must re-warm
    Expired,
}

/// Point-in-time snapshot of the session
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Cookie name → value for the target host
    pub cookies: HashMap<String, String>,
    /// Logical token name → current value
    pub tokens: HashMap<String, String>,
    /// Lifecycle status at snapshot time
    pub status: SessionStatus,
}

impl SessionState {
    /// Render the cookies as a Cookie header value, if any are set
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let mut pairs: Vec<_> = self.cookies.iter().collect();
        // Stable order so retried requests are byte-identical
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        Some(
            pairs
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Cookies and tokens harvested from a single response
///
/// The unit consumed by [`SessionStore::apply`]. Built entirely from a
/// fully-read response, so a canceled attempt never produces one.
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    /// Cookies from Set-Cookie headers
    pub cookies: Vec<(String, String)>,
    /// Tokens matched by the configured extraction rules
    pub tokens: Vec<(String, String)>,
}

impl ResponseMetadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the response carried nothing worth merging
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.tokens.is_empty()
    }

    /// Append a cookie pair
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Append a token pair
    pub fn with_token(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tokens.push((name.into(), value.into()));
        self
    }
}

/// Shared, lock-guarded session state
///
/// Exclusively owned by the client instance and shared across all concurrent
/// requests issued through it. No method returns an error; all are pure
/// state transitions.
///
/// # Examples
///
/// ```rust
/// use instant_domains::session::{ResponseMetadata, SessionStore};
///
/// # tokio_test::block_on(async {
/// let store = SessionStore::new();
/// store
///     .apply(&ResponseMetadata::new().with_cookie("sid", "abc"))
///     .await;
/// assert_eq!(store.snapshot().await.cookies["sid"], "abc");
/// # });
/// ```
#[derive(Debug)]
pub struct SessionStore {
    inner: RwLock<SessionState>,
}

impl SessionStore {
    /// Create an empty store in the Uninitialized state
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SessionState {
                cookies: HashMap::new(),
                tokens: HashMap::new(),
                status: SessionStatus::Uninitialized,
            }),
        }
    }

    /// Current snapshot of cookies, tokens, and status
    pub async fn snapshot(&self) -> SessionState {
        self.inner.read().await.clone()
    }

    /// Current lifecycle status
    pub async fn status(&self) -> SessionStatus {
        self.inner.read().await.status
    }

    /// Merge harvested cookies/tokens into the state
    ///
    /// Idempotent: reapplying the same value is a no-op, a new value
    /// overwrites. Does not touch the lifecycle status.
    pub async fn apply(&self, metadata: &ResponseMetadata) {
        if metadata.is_empty() {
            return;
        }
        let mut state = self.inner.write().await;
        for (name, value) in &metadata.cookies {
            state.cookies.insert(name.clone(), value.clone());
        }
        for (name, value) in &metadata.tokens {
            state.tokens.insert(name.clone(), value.clone());
        }
        tracing::debug!(
            cookies = metadata.cookies.len(),
            tokens = metadata.tokens.len(),
            "applied response metadata to session state"
        );
    }

    /// Force the session into the Expired state
    pub async fn invalidate(&self) {
        let mut state = self.inner.write().await;
        state.status = SessionStatus::Expired;
        tracing::debug!("session state invalidated");
    }

    /// Transition to Warming at the start of a warmup sequence
    pub async fn mark_warming(&self) {
        self.inner.write().await.status = SessionStatus::Warming;
    }

    /// Transition to Ready once all required tokens are present
    pub async fn mark_ready(&self) {
        self.inner.write().await.status = SessionStatus::Ready;
    }

    /// Required token names not yet present in the state
    pub async fn missing_tokens(&self, required: &[String]) -> Vec<String> {
        let state = self.inner.read().await;
        required
            .iter()
            .filter(|name| !state.tokens.contains_key(*name))
            .cloned()
            .collect()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
