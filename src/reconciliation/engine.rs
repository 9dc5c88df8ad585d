//! Reconciler: runs the matcher against storage and applies its decisions

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::ReconciliationConfig;
use crate::reconciliation::matcher::{plan_matches, PlannedPair};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{validate_actor, validate_date_range, validate_entry_id};

/// Cooperative cancellation signal for a reconciliation run
///
/// Cloning shares the signal. The run checks it before each pair; pairs
/// already committed are kept.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Marks a tenant as having an automatic run in flight until dropped
struct RunGuard<'a> {
    active: &'a Mutex<HashSet<TenantId>>,
    tenant: TenantId,
}

impl<'a> RunGuard<'a> {
    fn acquire(active: &'a Mutex<HashSet<TenantId>>, tenant: &TenantId) -> ReconcileResult<Self> {
        let mut runs = active
            .lock()
            .map_err(|_| ReconcileError::Storage("run registry lock poisoned".to_string()))?;

        if !runs.insert(tenant.clone()) {
            return Err(ReconcileError::Conflict(format!(
                "a reconciliation run is already in progress for tenant '{}'",
                tenant
            )));
        }

        Ok(Self {
            active,
            tenant: tenant.clone(),
        })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.tenant);
    }
}

/// Pairs unreconciled debits with credits and records the outcome in storage
pub struct Reconciler<S: EntryStorage, C: Clock = SystemClock> {
    storage: S,
    clock: C,
    config: ReconciliationConfig,
    active_runs: Mutex<HashSet<TenantId>>,
}

impl<S: EntryStorage> Reconciler<S, SystemClock> {
    /// Create a reconciler with the default tolerances and the UTC wall clock
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: EntryStorage, C: Clock> Reconciler<S, C> {
    /// Create a reconciler stamping audit times from `clock`
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            config: ReconciliationConfig::default(),
            active_runs: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the tolerances; the config is validated first
    pub fn with_config(mut self, config: ReconciliationConfig) -> ReconcileResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Unreconciled entries of `tenant` dated within `[from, to]`, oldest first
    pub async fn list_unreconciled(
        &self,
        tenant: &TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ReconcileResult<Vec<LedgerEntry>> {
        validate_date_range(from, to)?;
        let mut entries = self.load_window(tenant, from, to).await?;
        entries.sort_by_key(|entry| entry.date());
        Ok(entries)
    }

    /// Compute what [`auto_reconcile`](Self::auto_reconcile) would do, without writing
    pub async fn preview(
        &self,
        tenant: &TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ReconcileResult<ReconciliationResult> {
        validate_date_range(from, to)?;

        let mut entries = self.load_window(tenant, from, to).await?;
        let planned = plan_matches(&entries, &self.config);
        let pairs: Vec<MatchedPair> = planned
            .iter()
            .map(|pair| pair.to_matched_pair(&entries))
            .collect();

        for pair in &planned {
            entries[pair.debit].reconciled = true;
            entries[pair.credit].reconciled = true;
        }

        Ok(self.summarize(&entries, pairs))
    }

    /// Greedily pair unreconciled debits and credits dated within `[from, to]`
    pub async fn auto_reconcile(
        &self,
        tenant: &TenantId,
        from: NaiveDate,
        to: NaiveDate,
        performed_by: &str,
    ) -> ReconcileResult<ReconciliationResult> {
        self.auto_reconcile_with_cancel(tenant, from, to, performed_by, &CancellationFlag::new())
            .await
    }

    /// [`auto_reconcile`](Self::auto_reconcile), checking `cancel` before each pair
    pub async fn auto_reconcile_with_cancel(
        &self,
        tenant: &TenantId,
        from: NaiveDate,
        to: NaiveDate,
        performed_by: &str,
        cancel: &CancellationFlag,
    ) -> ReconcileResult<ReconciliationResult> {
        validate_date_range(from, to)?;
        validate_actor(performed_by)?;

        let _run = RunGuard::acquire(&self.active_runs, tenant)?;

        let mut entries = self.load_window(tenant, from, to).await?;
        tracing::info!(
            tenant = %tenant,
            %from,
            %to,
            considered = entries.len(),
            "starting automatic reconciliation"
        );

        let planned = plan_matches(&entries, &self.config);
        let mut pairs = Vec::with_capacity(planned.len());

        for pair in &planned {
            self.apply_pair(tenant, &mut entries, pair, performed_by, cancel)
                .await?;
            pairs.push(pair.to_matched_pair(&entries));
        }

        let result = self.summarize(&entries, pairs);
        tracing::info!(
            tenant = %tenant,
            considered = result.total_considered,
            pairs = result.pairs_reconciled,
            remaining = result.remaining_unreconciled,
            "automatic reconciliation finished"
        );

        Ok(result)
    }

    /// Manually pair two entries outside the automatic sweep
    pub async fn reconcile_pair(
        &self,
        tenant: &TenantId,
        first_id: &str,
        second_id: &str,
        performed_by: &str,
    ) -> ReconcileResult<()> {
        validate_entry_id(first_id)?;
        validate_entry_id(second_id)?;
        validate_actor(performed_by)?;

        if first_id == second_id {
            return Err(ReconcileError::InvalidArgument(format!(
                "cannot reconcile entry '{}' with itself",
                first_id
            )));
        }

        let mut first = self.get_entry_required(tenant, first_id).await?;
        let mut second = self.get_entry_required(tenant, second_id).await?;

        for entry in [&first, &second] {
            if entry.reconciled {
                return Err(ReconcileError::InvalidState(format!(
                    "entry '{}' is already reconciled",
                    entry.id
                )));
            }
        }

        if second.direction() != first.direction().opposite() {
            return Err(ReconcileError::InvalidState(format!(
                "entries '{}' and '{}' are both {:?}",
                first.id,
                second.id,
                first.direction()
            )));
        }

        let difference = (&first.amount - &second.amount).abs();
        if difference > self.config.amount_tolerance {
            return Err(ReconcileError::InvalidState(format!(
                "amounts differ by {} which exceeds the tolerance of {}",
                difference, self.config.amount_tolerance
            )));
        }

        let now = self.clock.now();
        first.mark_reconciled(performed_by, now);
        second.mark_reconciled(performed_by, now);

        let stored_first = self
            .storage
            .update_entry(tenant, &first, first.version)
            .await?;

        if let Err(err) = self
            .storage
            .update_entry(tenant, &second, second.version)
            .await
        {
            self.restore_unpaired(tenant, stored_first, &err).await;
            return Err(err);
        }

        tracing::info!(
            tenant = %tenant,
            first = %first.id,
            second = %second.id,
            performed_by,
            "entries reconciled manually"
        );

        Ok(())
    }

    /// Return a reconciled entry to the unreconciled state
    pub async fn unreconcile(
        &self,
        tenant: &TenantId,
        entry_id: &str,
        performed_by: &str,
    ) -> ReconcileResult<()> {
        validate_entry_id(entry_id)?;
        validate_actor(performed_by)?;

        let mut entry = self.get_entry_required(tenant, entry_id).await?;
        if !entry.reconciled {
            return Err(ReconcileError::InvalidState(format!(
                "entry '{}' is not reconciled",
                entry.id
            )));
        }

        let previously_by = entry.reconciled_by.clone();
        entry.clear_reconciliation(self.clock.now());
        self.storage
            .update_entry(tenant, &entry, entry.version)
            .await?;

        tracing::info!(
            tenant = %tenant,
            entry = %entry.id,
            performed_by,
            previously_reconciled_by = previously_by.as_deref().unwrap_or("unknown"),
            "entry unreconciled"
        );

        Ok(())
    }

    /// Undo the first half of a manual pair whose second write failed
    ///
    /// The original failure is what the caller sees; a failed undo is logged.
    async fn restore_unpaired(
        &self,
        tenant: &TenantId,
        mut entry: LedgerEntry,
        cause: &ReconcileError,
    ) {
        let version = entry.version;
        entry.clear_reconciliation(self.clock.now());

        match self.storage.update_entry(tenant, &entry, version).await {
            Ok(_) => tracing::warn!(
                tenant = %tenant,
                entry = %entry.id,
                error = %cause,
                "manual pair failed on second write, first entry restored"
            ),
            Err(undo) => tracing::error!(
                tenant = %tenant,
                entry = %entry.id,
                error = %cause,
                undo_error = %undo,
                "manual pair failed and first entry could not be restored"
            ),
        }
    }

    async fn get_entry_required(
        &self,
        tenant: &TenantId,
        entry_id: &str,
    ) -> ReconcileResult<LedgerEntry> {
        self.storage
            .get_entry(tenant, entry_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(entry_id.to_string()))
    }

    /// Unreconciled entries whose calendar date is within `[from, to]`, in storage order
    async fn load_window(
        &self,
        tenant: &TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ReconcileResult<Vec<LedgerEntry>> {
        let entries = self.storage.get_unreconciled(tenant).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| !entry.reconciled)
            .filter(|entry| {
                let date = entry.date();
                date >= from && date <= to
            })
            .collect())
    }

    /// Stamp and persist both sides of a planned pair, debit first
    ///
    /// Cancellation is honoured only between pairs, never between the two writes
    /// of one pair.
    async fn apply_pair(
        &self,
        tenant: &TenantId,
        entries: &mut [LedgerEntry],
        pair: &PlannedPair,
        performed_by: &str,
        cancel: &CancellationFlag,
    ) -> ReconcileResult<()> {
        if cancel.is_cancelled() {
            tracing::warn!(
                tenant = %tenant,
                debit = %entries[pair.debit].id,
                credit = %entries[pair.credit].id,
                "automatic reconciliation cancelled before pair"
            );
            return Err(ReconcileError::Cancelled);
        }

        let now = self.clock.now();

        for index in [pair.debit, pair.credit] {
            let mut entry = entries[index].clone();
            entry.mark_reconciled(performed_by, now);

            match self.storage.update_entry(tenant, &entry, entry.version).await {
                Ok(stored) => entries[index] = stored,
                Err(err) => {
                    tracing::warn!(
                        tenant = %tenant,
                        entry = %entry.id,
                        error = %err,
                        "failed to persist reconciled entry"
                    );
                    return Err(err);
                }
            }
        }

        tracing::debug!(
            tenant = %tenant,
            debit = %entries[pair.debit].id,
            credit = %entries[pair.credit].id,
            day_gap = pair.day_gap,
            amount_difference = %pair.amount_difference,
            "matched pair"
        );

        Ok(())
    }

    fn summarize(&self, entries: &[LedgerEntry], pairs: Vec<MatchedPair>) -> ReconciliationResult {
        let total_considered = entries.len();
        let pairs_reconciled = pairs.len();
        let sample_unmatched = entries
            .iter()
            .filter(|entry| !entry.reconciled)
            .take(self.config.sample_size)
            .map(|entry| entry.id.clone())
            .collect();

        ReconciliationResult {
            total_considered,
            pairs_reconciled,
            remaining_unreconciled: total_considered - 2 * pairs_reconciled,
            sample_unmatched,
            pairs,
        }
    }
}
