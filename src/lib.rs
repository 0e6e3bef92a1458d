//! Instant Domains client
//!
//! An async client for instantdomainsearch.com, a site whose endpoints were
//! never designed for programmatic use: responses arrive as HTML, JSON, or
//! XML depending on endpoint, authentication is cookie- and token-based with
//! a multi-step warmup flow, and response shapes drift over time.
//!
//! # Architecture
//!
//! The crate is organized around three cooperating pieces:
//! - **Session lifecycle** ([`session`]): shared cookie/token state with an
//!   explicit Uninitialized → Warming → Ready → Expired machine, a bounded
//!   warmup flow, and a dispatcher every request flows through
//! - **Response normalization** ([`normalize`]): declared shapes extracted
//!   from JSON, XML, or HTML with everything undeclared preserved in an
//!   open `extra` map
//! - **Endpoint modules** ([`api`]): thin call sites such as domain search
//!   that translate the generic contract into domain types
//!
//! # Examples
//!
//! ```no_run
//! use instant_domains::InstantDomainsClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = InstantDomainsClient::new()?;
//! client.warmup().await?;
//!
//! let tlds = instant_domains::api::domain_search::default_tlds();
//! let results = client.domain_search().search("dealerflow", &tlds, true).await?;
//! println!("{} results", results.main_results.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod normalize;
pub mod session;
pub mod types;

pub use client::InstantDomainsClient;
pub use config::Settings;
pub use error::{Error, Result};
pub use normalize::{FieldKind, FieldSource, FieldSpec, Shape};
pub use session::{Dispatcher, SessionState, SessionStatus};
pub use types::{NormalizedResult, PayloadFormat, RawResponse, RequestSpec};
