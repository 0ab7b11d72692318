use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::entities::Borrower;
use crate::errors::{LedgerError, Result};

/// a reputation threshold and the rate charged above it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBracket {
    /// reputation must be strictly greater than this percentage
    pub above: Decimal,
    /// interest rate in percent
    pub rate: u32,
}

/// reputation pricing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// rate for borrowers with no funded loans
    pub no_history_rate: u32,
    /// brackets, checked from the highest threshold down
    pub brackets: Vec<RateBracket>,
    /// rate when no bracket matches (reputation of exactly zero)
    pub floor_rate: u32,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            no_history_rate: 10,
            brackets: vec![
                RateBracket { above: dec!(70), rate: 10 },
                RateBracket { above: dec!(50), rate: 15 },
                RateBracket { above: dec!(25), rate: 25 },
                RateBracket { above: dec!(0), rate: 35 },
            ],
            floor_rate: 35,
        }
    }
}

impl ReputationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.brackets.is_empty() {
            return Err(LedgerError::InvalidConfiguration {
                message: "reputation brackets must not be empty".to_string(),
            });
        }
        if self.brackets.iter().any(|b| b.above.is_sign_negative()) {
            return Err(LedgerError::InvalidConfiguration {
                message: "reputation thresholds must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// reputation and the rate it prices to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationReport {
    /// success / total * 100; `None` without history
    pub score: Option<Decimal>,
    pub rate: u32,
}

/// derives an interest rate from a borrower's repayment history
#[derive(Debug, Clone)]
pub struct ReputationCalculator {
    brackets: Vec<RateBracket>,
    no_history_rate: u32,
    floor_rate: u32,
}

impl ReputationCalculator {
    pub fn new(config: &ReputationConfig) -> Self {
        let mut brackets = config.brackets.clone();
        brackets.sort_by(|a, b| b.above.cmp(&a.above));
        Self {
            brackets,
            no_history_rate: config.no_history_rate,
            floor_rate: config.floor_rate,
        }
    }

    /// reputation as a percentage, `None` when `total` is zero
    pub fn score(total: u32, success: u32) -> Option<Decimal> {
        if total == 0 {
            return None;
        }
        Some(Decimal::from(success) / Decimal::from(total) * dec!(100))
    }

    /// interest rate in percent for the given counters
    pub fn rate_for(&self, total: u32, success: u32) -> u32 {
        match Self::score(total, success) {
            None => self.no_history_rate,
            Some(score) => self
                .brackets
                .iter()
                .find(|bracket| score > bracket.above)
                .map(|bracket| bracket.rate)
                .unwrap_or(self.floor_rate),
        }
    }

    pub fn rate(&self, borrower: &Borrower) -> u32 {
        self.rate_for(borrower.total, borrower.success)
    }

    pub fn report(&self, borrower: &Borrower) -> ReputationReport {
        ReputationReport {
            score: Self::score(borrower.total, borrower.success),
            rate: self.rate(borrower),
        }
    }
}

impl Default for ReputationCalculator {
    fn default() -> Self {
        Self::new(&ReputationConfig::default())
    }
}
