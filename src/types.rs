//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tenant scope threaded through every storage and reconciliation call
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Create a tenant identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Side of the cashbook a ledger entry was posted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Money leaving the account (or the bank-side debit)
    Debit,
    /// Money entering the account (or the bank-side credit)
    Credit,
}

impl EntryType {
    /// The side a matching counterpart must be posted on
    pub fn opposite(&self) -> EntryType {
        match self {
            EntryType::Debit => EntryType::Credit,
            EntryType::Credit => EntryType::Debit,
        }
    }
}

/// Reconciliation state of a single entry
///
/// Both states are revisitable: `Unreconciled -> Reconciled` through an
/// automatic match or a manual pair, `Reconciled -> Unreconciled` through
/// an explicit unreconcile. There is no intermediate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReconciliationStatus {
    Unreconciled,
    Reconciled,
}

/// A single debit or credit posting as seen by the reconciler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for the entry within its tenant
    pub id: String,
    /// Tenant the entry belongs to
    pub tenant_id: TenantId,
    /// When the entry was posted; only the calendar date takes part in matching
    pub transaction_date: NaiveDateTime,
    /// Positive amount of the entry
    pub amount: BigDecimal,
    direction: EntryType,
    /// Whether the entry has been paired with a counterpart
    pub reconciled: bool,
    /// Actor who reconciled the entry
    pub reconciled_by: Option<String>,
    /// When the entry was reconciled
    pub reconciled_at: Option<NaiveDateTime>,
    /// Optional narration (bank memo, cheque payee, etc.)
    pub description: Option<String>,
    /// Optional external reference (statement line, cheque number, etc.)
    pub reference: Option<String>,
    /// Optimistic-concurrency token, bumped by storage on every update
    pub version: u64,
    /// When the entry was created
    pub created_at: NaiveDateTime,
    /// When the entry was last updated
    pub updated_at: NaiveDateTime,
}

impl LedgerEntry {
    /// Create a new, unreconciled entry
    pub fn new(
        id: String,
        tenant_id: TenantId,
        transaction_date: NaiveDateTime,
        amount: BigDecimal,
        direction: EntryType,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            tenant_id,
            transaction_date,
            amount,
            direction,
            reconciled: false,
            reconciled_by: None,
            reconciled_at: None,
            description: None,
            reference: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Debit or credit. Fixed at creation.
    pub fn direction(&self) -> EntryType {
        self.direction
    }

    /// Calendar date used for window filtering and date-gap comparisons
    pub fn date(&self) -> NaiveDate {
        self.transaction_date.date()
    }

    pub fn status(&self) -> ReconciliationStatus {
        if self.reconciled {
            ReconciliationStatus::Reconciled
        } else {
            ReconciliationStatus::Unreconciled
        }
    }

    /// Stamp the entry as reconciled by `performed_by` at `at`
    pub fn mark_reconciled(&mut self, performed_by: &str, at: NaiveDateTime) {
        self.reconciled = true;
        self.reconciled_by = Some(performed_by.to_string());
        self.reconciled_at = Some(at);
        self.updated_at = at;
    }

    /// Clear the reconciled flag and its audit stamps
    pub fn clear_reconciliation(&mut self, at: NaiveDateTime) {
        self.reconciled = false;
        self.reconciled_by = None;
        self.reconciled_at = None;
        self.updated_at = at;
    }

    /// Absolute calendar-day distance to another entry
    pub fn days_between(&self, other: &LedgerEntry) -> i64 {
        (other.date() - self.date()).num_days().abs()
    }
}

/// One debit/credit pair accepted by a reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub debit_id: String,
    pub credit_id: String,
    /// `|debit.amount - credit.amount|`
    pub amount_difference: BigDecimal,
    /// Calendar days between the two transaction dates
    pub day_gap: i64,
}

/// Outcome of an automatic reconciliation run (or a preview of one)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Unreconciled entries that fell inside the date window
    pub total_considered: usize,
    /// Number of debit/credit pairs reconciled
    pub pairs_reconciled: usize,
    /// `total_considered - 2 * pairs_reconciled`
    pub remaining_unreconciled: usize,
    /// Capped sample of ids still unreconciled, for operator review
    pub sample_unmatched: Vec<String>,
    /// The accepted pairs, in the order they were matched
    pub pairs: Vec<MatchedPair>,
}

/// Category of a reconciliation failure, for callers that surface it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    InvalidState,
    Conflict,
    Storage,
    Cancelled,
    Config,
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Ledger entry not found: {0}")]
    NotFound(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Reconciliation cancelled")]
    Cancelled,
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ReconcileError::NotFound(_) => ErrorKind::NotFound,
            ReconcileError::InvalidState(_) => ErrorKind::InvalidState,
            ReconcileError::Conflict(_) => ErrorKind::Conflict,
            ReconcileError::Storage(_) => ErrorKind::Storage,
            ReconcileError::Cancelled => ErrorKind::Cancelled,
            ReconcileError::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
