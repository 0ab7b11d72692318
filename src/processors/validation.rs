use chrono::{DateTime, Months, Utc};

use crate::errors::{LedgerError, Result, ValidationError};
use crate::money::Money;

/// amount must be positive and a whole number of increments
pub fn check_increment(
    amount: Money,
    increment: Money,
) -> std::result::Result<(), ValidationError> {
    if !amount.is_positive() {
        return Err(ValidationError::NonPositiveAmount);
    }
    if !amount.is_multiple_of(increment) {
        return Err(ValidationError::NotAnIncrement { amount, increment });
    }
    Ok(())
}

pub fn check_balance(
    available: Money,
    requested: Money,
) -> std::result::Result<(), ValidationError> {
    if available < requested {
        return Err(ValidationError::InsufficientBalance {
            available,
            requested,
        });
    }
    Ok(())
}

/// subtract after preconditions have passed; going negative is a logic defect
pub fn debit(balance: Money, amount: Money, what: &str) -> Result<Money> {
    balance.checked_sub(amount).ok_or_else(|| {
        LedgerError::invariant(format!("{} would go negative: {} - {}", what, balance, amount))
    })
}

pub fn credit(balance: Money, amount: Money, what: &str) -> Result<Money> {
    balance
        .checked_add(amount)
        .ok_or_else(|| {
            LedgerError::invariant(format!("{} overflows: {} + {}", what, balance, amount))
        })
}

pub fn increment_counter(counter: u32, what: &str) -> Result<u32> {
    counter
        .checked_add(1)
        .ok_or_else(|| LedgerError::invariant(format!("{} counter overflows", what)))
}

/// calendar month arithmetic; day-of-month clamps to the target month's length
pub fn add_months(date: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| {
            LedgerError::invariant(format!("{} + {} months is out of range", date, months))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_increment_rules() {
        let unit = Money::new(100);
        assert_eq!(check_increment(Money::ZERO, unit), Err(ValidationError::NonPositiveAmount));
        assert_eq!(
            check_increment(Money::new(150), unit),
            Err(ValidationError::NotAnIncrement {
                amount: Money::new(150),
                increment: unit,
            })
        );
        assert!(check_increment(Money::new(600), unit).is_ok());
    }

    #[test]
    fn test_balance_rule() {
        assert!(check_balance(Money::new(500), Money::new(500)).is_ok());
        assert!(matches!(
            check_balance(Money::new(500), Money::new(600)),
            Err(ValidationError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_debit_below_zero_is_an_invariant_breach() {
        let err = debit(Money::new(100), Money::new(200), "lender balance").unwrap_err();
        assert!(matches!(err, LedgerError::InvariantViolation { .. }));
        assert_eq!(debit(Money::new(300), Money::new(200), "x").unwrap(), Money::new(100));
    }

    #[test]
    fn test_calendar_months() {
        let jan_31 = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(
            add_months(jan_31, 1).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );

        let nov_15 = Utc.with_ymd_and_hms(2024, 11, 15, 0, 0, 0).unwrap();
        assert_eq!(
            add_months(nov_15, 3).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 15, 0, 0, 0).unwrap()
        );
    }
}
