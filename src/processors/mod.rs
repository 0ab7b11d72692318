//! Transition functions.
//!
//! Each processor takes owned snapshots of the entities a command touches,
//! validates the command, mutates the snapshots and returns the `Transition`
//! to commit. On any error the snapshots are dropped, so a rejected command
//! leaves nothing behind to persist.

pub mod credit;
pub mod deposit;
pub mod repay;
pub mod request;
pub mod validation;

use serde::{Deserialize, Serialize};

use crate::entities::{Borrower, BorrowerRequest, Lender, Loan, Record};
use crate::errors::{LedgerError, Result};
use crate::events::Event;
use crate::money::Money;
use crate::registry::Changeset;

pub use credit::credit_loan;
pub use deposit::deposit_funds;
pub use repay::repay_loan;
pub use request::{request_loan, NewLoanIds};

/// ask for a new loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLoan {
    pub amount_requested: Money,
    pub purpose: String,
    pub duration_months: u32,
    pub borrower_id: String,
}

/// a lender's contribution to a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLoan {
    pub loan_id: String,
    pub lender_id: String,
    pub amount: Money,
}

/// a borrower's repayment to one of the loan's lenders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepayLoan {
    pub loan_id: String,
    pub lender_id: String,
    pub amount: Money,
}

/// money a borrower adds to their own account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositFunds {
    pub borrower_id: String,
    pub amount: Money,
}

/// the four records a funding or repayment touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanSnapshot {
    pub loan: Loan,
    pub request: BorrowerRequest,
    pub borrower: Borrower,
    pub lender: Lender,
}

impl LoanSnapshot {
    /// the snapshot must describe `loan_id` and `lender_id` and be linked together
    pub(crate) fn check_links(&self, loan_id: &str, lender_id: &str) -> Result<()> {
        if self.loan.id != loan_id || self.lender.id != lender_id {
            return Err(LedgerError::invariant(format!(
                "snapshot for loan {} / lender {} used for loan {} / lender {}",
                self.loan.id, self.lender.id, loan_id, lender_id
            )));
        }
        if self.loan.request_id != self.request.id {
            return Err(LedgerError::invariant(format!(
                "loan {} references request {}, snapshot holds {}",
                self.loan.id, self.loan.request_id, self.request.id
            )));
        }
        if self.request.borrower_id != self.borrower.id {
            return Err(LedgerError::invariant(format!(
                "request {} belongs to borrower {}, snapshot holds {}",
                self.request.id, self.request.borrower_id, self.borrower.id
            )));
        }
        Ok(())
    }

    /// writes every record back, in the order lender, request, borrower, loan
    pub(crate) fn into_changes(self) -> Changeset {
        let mut changes = Changeset::new();
        changes
            .update(self.lender)
            .update(self.request)
            .update(self.borrower)
            .update(self.loan);
        changes
    }
}

/// computed outcome of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub changes: Changeset,
    pub events: Vec<Event>,
}

impl Transition {
    /// the record of type `T` written by this transition, as handed to the registry
    pub fn record<T: Record>(&self) -> Option<T> {
        self.changes
            .iter()
            .map(|change| change.entity())
            .find(|entity| entity.kind() == T::KIND)
            .and_then(|entity| T::try_from(entity.clone()).ok())
    }

    pub fn loan(&self) -> Option<Loan> {
        self.record()
    }

    pub fn request(&self) -> Option<BorrowerRequest> {
        self.record()
    }

    pub fn borrower(&self) -> Option<Borrower> {
        self.record()
    }

    pub fn lender(&self) -> Option<Lender> {
        self.record()
    }
}
