//! Construction of ledger entries handed to the reconciler

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;

use crate::types::*;
use crate::utils::validation::{validate_entry_id, validate_positive_amount};

/// Builder for [`LedgerEntry`]
pub struct EntryBuilder {
    entry: LedgerEntry,
}

impl EntryBuilder {
    /// Start an entry with a random UUID v4 id
    pub fn new(
        tenant_id: TenantId,
        transaction_date: NaiveDateTime,
        amount: BigDecimal,
        direction: EntryType,
    ) -> Self {
        Self {
            entry: LedgerEntry::new(
                uuid::Uuid::new_v4().to_string(),
                tenant_id,
                transaction_date,
                amount,
                direction,
            ),
        }
    }

    /// Start a debit entry
    pub fn debit(tenant_id: TenantId, transaction_date: NaiveDateTime, amount: BigDecimal) -> Self {
        Self::new(tenant_id, transaction_date, amount, EntryType::Debit)
    }

    /// Start a credit entry
    pub fn credit(
        tenant_id: TenantId,
        transaction_date: NaiveDateTime,
        amount: BigDecimal,
    ) -> Self {
        Self::new(tenant_id, transaction_date, amount, EntryType::Credit)
    }

    /// Use a caller-supplied id instead of the generated one
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.entry.id = id.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.entry.description = Some(description.into());
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.entry.reference = Some(reference.into());
        self
    }

    /// Build the entry
    pub fn build(self) -> ReconcileResult<LedgerEntry> {
        validate_entry_id(&self.entry.id)?;
        validate_positive_amount(&self.entry.amount)?;
        Ok(self.entry)
    }
}
