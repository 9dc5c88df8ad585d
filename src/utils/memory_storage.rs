//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

type TenantEntries = HashMap<TenantId, HashMap<String, LedgerEntry>>;

/// In-memory storage implementation for testing and development
///
/// Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<TenantEntries>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ReconcileResult<()> {
        self.write()?.clear();
        Ok(())
    }

    /// Every entry of a tenant, reconciled or not, ordered by date then id
    pub fn all_entries(&self, tenant: &TenantId) -> ReconcileResult<Vec<LedgerEntry>> {
        let entries = self.read()?;
        Ok(sorted(
            entries
                .get(tenant)
                .map(|by_id| by_id.values().cloned().collect())
                .unwrap_or_default(),
        ))
    }

    fn read(&self) -> ReconcileResult<RwLockReadGuard<'_, TenantEntries>> {
        self.entries
            .read()
            .map_err(|_| ReconcileError::Storage("entry store lock poisoned".to_string()))
    }

    fn write(&self) -> ReconcileResult<RwLockWriteGuard<'_, TenantEntries>> {
        self.entries
            .write()
            .map_err(|_| ReconcileError::Storage("entry store lock poisoned".to_string()))
    }
}

fn sorted(mut entries: Vec<LedgerEntry>) -> Vec<LedgerEntry> {
    entries.sort_by(|a, b| {
        a.transaction_date
            .cmp(&b.transaction_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries
}

#[async_trait]
impl EntryStorage for MemoryStorage {
    async fn get_unreconciled(&self, tenant: &TenantId) -> ReconcileResult<Vec<LedgerEntry>> {
        let entries = self.read()?;
        let filtered: Vec<LedgerEntry> = entries
            .get(tenant)
            .map(|by_id| {
                by_id
                    .values()
                    .filter(|entry| !entry.reconciled)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(sorted(filtered))
    }

    async fn get_entry(
        &self,
        tenant: &TenantId,
        entry_id: &str,
    ) -> ReconcileResult<Option<LedgerEntry>> {
        Ok(self
            .read()?
            .get(tenant)
            .and_then(|by_id| by_id.get(entry_id))
            .cloned())
    }

    async fn update_entry(
        &self,
        tenant: &TenantId,
        entry: &LedgerEntry,
        expected_version: u64,
    ) -> ReconcileResult<LedgerEntry> {
        let mut entries = self.write()?;
        let stored = entries
            .get_mut(tenant)
            .and_then(|by_id| by_id.get_mut(&entry.id))
            .ok_or_else(|| ReconcileError::NotFound(entry.id.clone()))?;

        if stored.version != expected_version {
            return Err(ReconcileError::Conflict(format!(
                "entry '{}' was modified concurrently (expected version {}, found {})",
                entry.id, expected_version, stored.version
            )));
        }

        let mut updated = entry.clone();
        updated.version = expected_version + 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn save_entry(&self, entry: &LedgerEntry) -> ReconcileResult<()> {
        let mut entries = self.write()?;
        let by_id = entries.entry(entry.tenant_id.clone()).or_default();

        if by_id.contains_key(&entry.id) {
            return Err(ReconcileError::InvalidArgument(format!(
                "Entry with ID '{}' already exists",
                entry.id
            )));
        }

        by_id.insert(entry.id.clone(), entry.clone());
        Ok(())
    }
}
