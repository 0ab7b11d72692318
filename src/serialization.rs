/// serializable views over ledger records
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{BorrowerRequest, Loan};
use crate::errors::{LedgerError, Result};
use crate::money::Money;

/// a loan joined with its request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanView {
    pub loan_id: String,
    pub request_id: String,
    pub borrower_id: String,
    pub purpose: String,
    pub interest: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub funding: FundingView,
    pub repayment: RepaymentView,
    pub lenders: Vec<LenderLineView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingView {
    pub amount_requested: Money,
    pub amount_fulfilled: Money,
    pub remaining: Money,
    pub is_done: bool,
    pub duration_months: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentView {
    pub total_owed: Money,
    pub amount_repaid: Money,
    pub outstanding: Money,
    pub is_repaid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LenderLineView {
    pub lender_id: String,
    pub amount: Money,
    pub repaid: Money,
    pub outstanding: Money,
}

impl LoanView {
    pub fn new(loan: &Loan, request: &BorrowerRequest) -> Result<Self> {
        if loan.request_id != request.id {
            return Err(LedgerError::invariant(format!(
                "loan {} references request {}, not {}",
                loan.id, loan.request_id, request.id
            )));
        }
        let total_owed = loan.total_owed()?;

        Ok(LoanView {
            loan_id: loan.id.clone(),
            request_id: request.id.clone(),
            borrower_id: request.borrower_id.clone(),
            purpose: request.purpose.clone(),
            interest: loan.interest,
            start_date: loan.start_date,
            end_date: loan.end_date,
            funding: FundingView {
                amount_requested: request.amount_requested,
                amount_fulfilled: request.amount_fulfilled,
                remaining: request.remaining(),
                is_done: request.is_done,
                duration_months: request.duration_months,
            },
            repayment: RepaymentView {
                total_owed,
                amount_repaid: request.amount_repaid,
                outstanding: total_owed.saturating_sub(request.amount_repaid),
                is_repaid: request.is_repaid,
            },
            lenders: loan
                .lenders
                .iter()
                .map(|line| LenderLineView {
                    lender_id: line.lender_id.clone(),
                    amount: line.amount,
                    repaid: line.repaid,
                    outstanding: line.outstanding(),
                })
                .collect(),
        })
    }

    /// convert to pretty-printed json string
    pub fn json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
