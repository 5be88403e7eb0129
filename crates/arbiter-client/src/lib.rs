//! Fetch layer: authenticated GET requests against the case API, decoded into
//! [`arbiter_core::Envelope`]s.

pub mod http;

pub use http::{ApiClient, ApiError, DEFAULT_BASE_URL};
