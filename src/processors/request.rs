use hourglass_rs::SafeTimeProvider;

use crate::config::LedgerConfig;
use crate::entities::{Borrower, BorrowerRequest, Loan};
use crate::errors::{Result, ValidationError};
use crate::events::Event;
use crate::interest::ReputationCalculator;
use crate::processors::{RequestLoan, Transition};
use crate::registry::Changeset;

/// identifiers reserved for one loan request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoanIds {
    pub request_id: String,
    pub loan_id: String,
}

/// Opens a request and its loan, priced from the borrower's reputation.
///
/// Both records are inserts, so a colliding id surfaces as `DuplicateKey`
/// at commit time and the caller can retry with fresh ids.
pub fn request_loan(
    cmd: &RequestLoan,
    borrower: &Borrower,
    ids: &NewLoanIds,
    config: &LedgerConfig,
    time_provider: &SafeTimeProvider,
) -> Result<Transition> {
    if !cmd.amount_requested.is_positive() {
        return Err(ValidationError::NonPositiveAmount.into());
    }
    if cmd.duration_months == 0 {
        return Err(ValidationError::InvalidDuration.into());
    }

    let now = time_provider.now();
    let interest = ReputationCalculator::new(&config.reputation).rate(borrower);

    let request = BorrowerRequest::new(
        ids.request_id.clone(),
        borrower.id.clone(),
        cmd.amount_requested,
        cmd.duration_months,
        cmd.purpose.clone(),
    );
    let loan = Loan::new(ids.loan_id.clone(), ids.request_id.clone(), interest, now);

    let event = Event::LoanRequested {
        request_id: request.id.clone(),
        loan_id: loan.id.clone(),
        borrower_id: borrower.id.clone(),
        amount: cmd.amount_requested,
        interest,
        timestamp: now,
    };

    let mut changes = Changeset::new();
    changes.insert(request).insert(loan);
    Ok(Transition {
        changes,
        events: vec![event],
    })
}
