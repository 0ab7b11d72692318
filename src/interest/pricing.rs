use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::money::Money;

/// how a lender's contribution is recorded on their loan line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestPolicy {
    /// line tracks the contribution only
    #[default]
    PrincipalOnly,
    /// contribution plus `contribution / interest`
    RateDivisor,
    /// contribution plus `contribution * interest / 100`
    Percentage,
}

impl InterestPolicy {
    /// amount owed back to a lender for `contribution` at `interest` percent
    pub fn tracked_amount(&self, contribution: Money, interest: u32) -> Result<Money> {
        let priced = match self {
            InterestPolicy::PrincipalOnly => Some(contribution),
            InterestPolicy::RateDivisor => contribution
                .checked_div(interest)
                .and_then(|accrued| contribution.checked_add(accrued)),
            InterestPolicy::Percentage => contribution
                .percentage(interest)
                .and_then(|accrued| contribution.checked_add(accrued)),
        };

        priced.ok_or_else(|| {
            LedgerError::invariant(format!(
                "cannot price contribution {} at {}% under {:?}",
                contribution, interest, self
            ))
        })
    }
}
