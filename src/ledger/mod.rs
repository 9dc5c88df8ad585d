//! Ledger entries as posted into the cashbook

pub mod entry;

pub use entry::*;
