//! Tunables for the reconciliation matcher

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::*;

/// Default cap on the number of unmatched ids reported back to the operator
pub const DEFAULT_SAMPLE_SIZE: usize = 25;

/// Default maximum calendar-day distance between a debit and its credit
pub const DEFAULT_DATE_WINDOW_DAYS: i64 = 2;

/// Decimal places amounts are rounded to when bucketing credits
pub const AMOUNT_SCALE: i64 = 2;

fn default_amount_tolerance() -> BigDecimal {
    // 0.01
    BigDecimal::new(1.into(), AMOUNT_SCALE)
}

/// Matching tolerances and reporting limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Largest amount difference two entries may have and still match
    pub amount_tolerance: BigDecimal,
    /// Largest calendar-day gap two entries may have and still match
    pub date_window_days: i64,
    /// Maximum ids returned in `sample_unmatched`
    pub sample_size: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: default_amount_tolerance(),
            date_window_days: DEFAULT_DATE_WINDOW_DAYS,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl ReconciliationConfig {
    /// Parse a JSON document; missing fields fall back to the defaults
    pub fn from_json_str(json: &str) -> ReconcileResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ReconcileError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the amount tolerance from its decimal string form (e.g. `"0.05"`)
    pub fn with_amount_tolerance(mut self, tolerance: &str) -> ReconcileResult<Self> {
        self.amount_tolerance = BigDecimal::from_str(tolerance)
            .map_err(|e| ReconcileError::Config(format!("amount_tolerance: {}", e)))?;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ReconcileResult<()> {
        if self.amount_tolerance < BigDecimal::from(0) {
            return Err(ReconcileError::Config(
                "amount_tolerance cannot be negative".to_string(),
            ));
        }

        if self.date_window_days < 0 {
            return Err(ReconcileError::Config(
                "date_window_days cannot be negative".to_string(),
            ));
        }

        if self.sample_size == 0 {
            return Err(ReconcileError::Config(
                "sample_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
