//! Greedy debit/credit matching
//!
//! The matcher is a single forward pass over debits in date order. Each debit
//! claims the best credit it can see at that moment and the claimed credit is
//! gone for every later debit, even if a later debit would have been a better
//! fit. A global assignment (minimum-cost bipartite matching) is not attempted:
//! daily cashbook volumes are small and operators expect the earliest debit to
//! win.
//!
//! Credits are bucketed by amount rounded to two decimals. A debit looks in the
//! bucket with its own rounded amount first. If that bucket is missing or holds
//! no credit inside the date window, the remaining keys within tolerance are
//! tried in first-insertion order and the first bucket with a usable credit
//! wins, even when another key is closer in amount. Falling through an
//! unusable exact bucket keeps a second run over the same window from finding
//! pairs the first run skipped.

use bigdecimal::{BigDecimal, RoundingMode};
use std::collections::HashMap;

use crate::config::{ReconciliationConfig, AMOUNT_SCALE};
use crate::types::*;

/// A pair chosen by the planner, as indices into the planned slice
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPair {
    pub debit: usize,
    pub credit: usize,
    pub day_gap: i64,
    pub amount_difference: BigDecimal,
}

impl PlannedPair {
    /// Resolve the indices against the slice the plan was built from
    pub fn to_matched_pair(&self, entries: &[LedgerEntry]) -> MatchedPair {
        MatchedPair {
            debit_id: entries[self.debit].id.clone(),
            credit_id: entries[self.credit].id.clone(),
            amount_difference: self.amount_difference.clone(),
            day_gap: self.day_gap,
        }
    }
}

/// Amount rounded to the bucketing precision (half away from zero)
pub fn amount_key(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(AMOUNT_SCALE, RoundingMode::HalfUp)
}

/// Credit indices grouped by amount key, keys kept in first-insertion order
#[derive(Debug, Default)]
struct CreditBuckets {
    keys: Vec<BigDecimal>,
    slots: HashMap<BigDecimal, Vec<usize>>,
}

impl CreditBuckets {
    fn insert(&mut self, key: BigDecimal, credit: usize) {
        match self.slots.get_mut(&key) {
            Some(slot) => slot.push(credit),
            None => {
                self.keys.push(key.clone());
                self.slots.insert(key, vec![credit]);
            }
        }
    }

    /// Buckets a debit keyed `key` may draw from: its own first, then every
    /// other key within `tolerance` in first-insertion order
    fn search_order<'a>(
        &'a self,
        key: &'a BigDecimal,
        tolerance: &'a BigDecimal,
    ) -> impl Iterator<Item = &'a BigDecimal> + 'a {
        let exact = self.slots.get_key_value(key).map(|(k, _)| k);
        let near = self
            .keys
            .iter()
            .filter(move |candidate| *candidate != key && (*candidate - key).abs() <= *tolerance);
        exact.into_iter().chain(near)
    }

    fn candidates(&self, key: &BigDecimal) -> &[usize] {
        self.slots.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove the credit at `position` of bucket `key`; drops the bucket once empty
    fn take(&mut self, key: &BigDecimal, position: usize) -> Option<usize> {
        let slot = self.slots.get_mut(key)?;
        let credit = slot.remove(position);
        if slot.is_empty() {
            self.slots.remove(key);
            self.keys.retain(|k| k != key);
        }
        Some(credit)
    }
}

/// Position in `candidates` of the credit closest in date to `debit`
///
/// Candidates must be in ascending date order; on equal gaps the earlier one
/// wins. A same-day candidate ends the search.
fn closest_candidate(
    entries: &[LedgerEntry],
    debit: &LedgerEntry,
    candidates: &[usize],
    config: &ReconciliationConfig,
) -> Option<(usize, i64)> {
    let mut best: Option<(usize, i64)> = None;

    for (position, &index) in candidates.iter().enumerate() {
        let credit = &entries[index];

        // Bucket keys are rounded; the raw amounts must still be within tolerance
        if (&debit.amount - &credit.amount).abs() > config.amount_tolerance {
            continue;
        }

        let gap = debit.days_between(credit);
        if gap > config.date_window_days {
            continue;
        }

        if best.is_none_or(|(_, best_gap)| gap < best_gap) {
            best = Some((position, gap));
            if gap == 0 {
                break;
            }
        }
    }

    best
}

/// Plan debit/credit pairs over `entries` without touching them
///
/// Already reconciled entries are ignored. Returned pairs are in the order the
/// debits claimed them (ascending debit date).
pub fn plan_matches(entries: &[LedgerEntry], config: &ReconciliationConfig) -> Vec<PlannedPair> {
    let (mut debits, mut credits): (Vec<usize>, Vec<usize>) = (0..entries.len())
        .filter(|&i| !entries[i].reconciled)
        .partition(|&i| entries[i].direction() == EntryType::Debit);

    // Stable sorts: equal dates keep input order
    debits.sort_by_key(|&i| entries[i].date());
    credits.sort_by_key(|&i| entries[i].date());

    let mut buckets = CreditBuckets::default();
    for &credit in &credits {
        buckets.insert(amount_key(&entries[credit].amount), credit);
    }

    let mut pairs = Vec::new();

    for &debit_index in &debits {
        let debit = &entries[debit_index];
        let key = amount_key(&debit.amount);

        let found = buckets
            .search_order(&key, &config.amount_tolerance)
            .find_map(|bucket_key| {
                closest_candidate(entries, debit, buckets.candidates(bucket_key), config)
                    .map(|(position, day_gap)| (bucket_key.clone(), position, day_gap))
            });

        let Some((bucket_key, position, day_gap)) = found else {
            continue;
        };

        if let Some(credit_index) = buckets.take(&bucket_key, position) {
            pairs.push(PlannedPair {
                debit: debit_index,
                credit: credit_index,
                day_gap,
                amount_difference: (&debit.amount - &entries[credit_index].amount).abs(),
            });
        }
    }

    pairs
}
