//! Validation utilities

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> ReconcileResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(ReconcileError::InvalidArgument(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that an entry ID is usable
///
/// Ids are opaque: only an empty one is rejected.
pub fn validate_entry_id(entry_id: &str) -> ReconcileResult<()> {
    if entry_id.trim().is_empty() {
        return Err(ReconcileError::InvalidArgument(
            "Entry ID cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validate the actor recorded in reconciliation audit stamps
pub fn validate_actor(performed_by: &str) -> ReconcileResult<()> {
    if performed_by.trim().is_empty() {
        return Err(ReconcileError::InvalidArgument(
            "performed_by cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validate an inclusive reconciliation window
pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> ReconcileResult<()> {
    if to < from {
        return Err(ReconcileError::InvalidArgument(format!(
            "to date {} is before from date {}",
            to, from
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        assert!(validate_date_range(d1, d1).is_ok());
        assert!(validate_date_range(d1, d2).is_ok());
        assert_eq!(
            validate_date_range(d2, d1).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_entry_id_and_actor() {
        assert!(validate_entry_id("stmt-0042").is_ok());
        assert!(validate_entry_id("  ").is_err());
        assert!(validate_entry_id(&"x".repeat(200)).is_ok());
        assert!(validate_actor("alice").is_ok());
        assert!(validate_actor("").is_err());
    }

    #[test]
    fn test_positive_amount() {
        assert!(validate_positive_amount(&BigDecimal::from(1)).is_ok());
        assert!(validate_positive_amount(&BigDecimal::from(0)).is_err());
        assert!(validate_positive_amount(&BigDecimal::from(-3)).is_err());
    }
}
