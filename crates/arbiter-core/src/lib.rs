//! Core of the arbitration case aggregator: API envelopes, entity views, role
//! classification, case resolution and output shapes. No I/O lives here; the
//! upstream API is reached through the [`CaseApi`] trait.

pub mod classify;
pub mod entity;
pub mod envelope;
mod error;
pub mod format;
pub mod resolve;

pub use classify::{ARBITRATOR_KEYWORDS, KeywordMatcher, RoleMatcher, classify_role};
pub use envelope::{Envelope, Resource};
pub use error::FetchError;
pub use format::{ArbitratorProfile, CaseSummary, arbitrator_profile, case_summary};
pub use resolve::{
    CaseApi, CaseRecord, DecisionSearch, Resolution, Resolver, resolve_individual_and_cases,
};
