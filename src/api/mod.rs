//! Domain-specific endpoint modules
//!
//! Thin call sites over the session/dispatch/normalization core: each module
//! builds [`crate::types::RequestSpec`]s and target shapes, and translates
//! normalized results into its own public types.

pub mod domain_search;

pub use domain_search::{DomainInfo, DomainSearchApi, DomainSearchResults};
