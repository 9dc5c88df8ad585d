//! # Cashbook Reconcile
//!
//! Automatic and manual reconciliation of bank and cashbook ledger entries.
//!
//! ## Features
//!
//! - **Automatic matching**: greedy pairing of unreconciled debits and credits
//!   whose amounts agree within 0.01 and whose dates are at most 2 days apart
//! - **Manual pairing**: operator-initiated reconcile and unreconcile with audit stamps
//! - **Dry runs**: preview what a run would pair without writing anything
//! - **Concurrency guards**: per-tenant run lock and optimistic versioning of entries
//! - **Storage abstraction**: database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use cashbook_reconcile::{EntryBuilder, EntryStorage, Reconciler, TenantId};
//! use cashbook_reconcile::utils::MemoryStorage;
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # async fn run() -> cashbook_reconcile::ReconcileResult<()> {
//! let tenant = TenantId::new("acme");
//! let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let storage = MemoryStorage::new();
//!
//! let debit = EntryBuilder::debit(tenant.clone(), day.and_hms_opt(9, 0, 0).unwrap(), BigDecimal::from(100))
//!     .build()?;
//! let credit = EntryBuilder::credit(tenant.clone(), day.and_hms_opt(15, 0, 0).unwrap(), BigDecimal::from(100))
//!     .build()?;
//! storage.save_entry(&debit).await?;
//! storage.save_entry(&credit).await?;
//!
//! let reconciler = Reconciler::new(storage);
//! let result = reconciler.auto_reconcile(&tenant, day, day, "ops@acme").await?;
//! assert_eq!(result.pairs_reconciled, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod ledger;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ledger::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
