//! Bank and cashbook reconciliation
//!
//! [`matcher`] decides which debits and credits belong together; [`engine`]
//! loads the entries, applies those decisions to storage and reports counts.

pub mod engine;
pub mod matcher;

pub use engine::*;
pub use matcher::{amount_key, plan_matches, PlannedPair};
