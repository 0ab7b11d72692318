use thiserror::Error;

use crate::entities::{EntityKey, EntityKind};
use crate::money::Money;

/// business rule violations; nothing is persisted when one is raised
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("amount {amount} is not a multiple of {increment}")]
    NotAnIncrement {
        amount: Money,
        increment: Money,
    },

    #[error("Insufficient Balance in your account: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Money,
        requested: Money,
    },

    #[error("Your amount exceeds the remaining loan amount of borrower: {remaining}")]
    ExceedsRemaining {
        remaining: Money,
        requested: Money,
    },

    #[error("repayment exceeds what {lender_id} is owed: owed {owed}, requested {requested}")]
    ExceedsOwed {
        lender_id: String,
        owed: Money,
        requested: Money,
    },

    #[error("loan request {request_id} is already fully funded")]
    AlreadyFunded {
        request_id: String,
    },

    #[error("loan request {request_id} is already repaid")]
    AlreadyRepaid {
        request_id: String,
    },

    #[error("loan request {request_id} is not fully funded yet")]
    NotFunded {
        request_id: String,
    },

    #[error("loan duration must be at least one month")]
    InvalidDuration,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} not found: {id}")]
    NotFound {
        kind: EntityKind,
        id: String,
    },

    #[error("lender {lender_id} has not funded loan {loan_id}")]
    LenderDetailNotFound {
        loan_id: String,
        lender_id: String,
    },

    #[error("concurrent modification of {key}: expected version {expected}, found {found}")]
    Conflict {
        key: EntityKey,
        expected: u64,
        found: u64,
    },

    #[error("duplicate key: {key}")]
    DuplicateKey {
        key: EntityKey,
    },

    #[error("entity {key} is stored as a {found}")]
    WrongEntityKind {
        key: EntityKey,
        found: EntityKind,
    },

    #[error("ledger invariant violated: {message}")]
    InvariantViolation {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl LedgerError {
    pub fn invariant(message: impl Into<String>) -> Self {
        LedgerError::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }

    /// entity or lender line absent
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::NotFound { .. } | LedgerError::LenderDetailNotFound { .. }
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
