//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::types::*;

/// Storage abstraction for ledger entries taking part in reconciliation
///
/// This trait allows the reconciler to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these methods.
/// Every call is tenant-scoped.
#[async_trait]
pub trait EntryStorage: Send + Sync {
    /// All entries of the tenant that are not yet reconciled
    async fn get_unreconciled(&self, tenant: &TenantId) -> ReconcileResult<Vec<LedgerEntry>>;

    /// Get an entry by ID
    async fn get_entry(&self, tenant: &TenantId, entry_id: &str)
        -> ReconcileResult<Option<LedgerEntry>>;

    /// Persist a changed entry
    ///
    /// Must fail with [`ReconcileError::Conflict`] when the stored version is
    /// not `expected_version`, and return the stored entry with its version
    /// bumped otherwise.
    async fn update_entry(
        &self,
        tenant: &TenantId,
        entry: &LedgerEntry,
        expected_version: u64,
    ) -> ReconcileResult<LedgerEntry>;

    /// Insert a freshly posted entry
    async fn save_entry(&self, entry: &LedgerEntry) -> ReconcileResult<()>;
}

/// Source of the timestamp written into reconciliation audit stamps
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Utc::now().naive_utc()
    }
}

/// Clock pinned to a single instant, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
