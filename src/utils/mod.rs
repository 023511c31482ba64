//! Utility modules shared across the oracle
//!
//! Currently the fetch policy applied to every upstream call.

pub mod retry;

pub use retry::{fetch_with_policy, FetchPolicy};
