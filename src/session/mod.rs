//! Session lifecycle management
//!
//! This module holds the shared session state (cookies, tokens, status), the
//! transport seam, the warmup flow that establishes a ready session, and the
//! dispatcher every request flows through.

pub mod dispatcher;
pub mod state;
pub mod transport;
pub mod warmup;

pub use dispatcher::{DefaultExpiryPolicy, Dispatcher, DispatcherGeneric, ExpiryPolicy};
pub use state::{ResponseMetadata, SessionState, SessionStatus, SessionStore};
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
pub use warmup::{TokenExtractor, TokenRule, WarmupPlan, WarmupStep};
