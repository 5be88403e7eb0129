//! Storage layer: a DuckDB table of known arbitrators.

mod duck;
mod error;

pub use duck::{Arbitrator, DEFAULT_DB_PATH, DEFAULT_SEED, NewArbitrator, RosterStore, parse_seed};
pub use error::StoreError;
