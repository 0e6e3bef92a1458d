//! Type definitions for the instant-domains client
//!
//! This module contains the main data structures used for requests and responses.

pub mod request;
pub mod response;

pub use request::{PayloadFormat, RequestSpec, TargetHost};
pub use response::{NormalizedResult, RawResponse};
