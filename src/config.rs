use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::interest::{InterestPolicy, ReputationConfig};
use crate::money::Money;

/// ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// registry namespace the ledger's entities live under
    pub namespace: String,
    /// funding and repayment amounts must be whole multiples of this
    pub increment: Money,
    /// how contributions are tracked on lender lines
    pub interest_policy: InterestPolicy,
    pub reputation: ReputationConfig,
    /// identifier re-rolls before a loan request gives up
    pub max_id_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl LedgerConfig {
    /// retail deployment: 100-unit increments, principal-only lender lines
    pub fn standard() -> Self {
        Self {
            namespace: "org.acme.loan".to_string(),
            increment: Money::new(100),
            interest_policy: InterestPolicy::PrincipalOnly,
            reputation: ReputationConfig::default(),
            max_id_attempts: 8,
        }
    }

    /// wholesale deployment: 500-unit increments, interest added to lender lines
    pub fn wholesale() -> Self {
        Self {
            increment: Money::new(500),
            interest_policy: InterestPolicy::RateDivisor,
            ..Self::standard()
        }
    }

    pub fn with_increment(mut self, increment: Money) -> Self {
        self.increment = increment;
        self
    }

    pub fn with_interest_policy(mut self, policy: InterestPolicy) -> Self {
        self.interest_policy = policy;
        self
    }

    /// parse and validate a JSON configuration; missing fields take `standard()` values
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig =
            serde_json::from_str(json).map_err(|e| LedgerError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.increment.is_zero() {
            return Err(LedgerError::InvalidConfiguration {
                message: "increment must be positive".to_string(),
            });
        }
        if self.max_id_attempts == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "max_id_attempts must be at least 1".to_string(),
            });
        }
        if self.namespace.trim().is_empty() {
            return Err(LedgerError::InvalidConfiguration {
                message: "namespace must not be empty".to_string(),
            });
        }
        self.reputation.validate()
    }
}
