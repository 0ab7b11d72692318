use hourglass_rs::SafeTimeProvider;

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, Result, ValidationError};
use crate::events::Event;
use crate::processors::validation::{self, add_months, check_balance, check_increment, debit};
use crate::processors::{CreditLoan, LoanSnapshot, Transition};

/// Applies a lender's contribution to a loan.
///
/// Preconditions, in order: the request is still open, the amount is a
/// positive multiple of the increment, the lender can cover it, and it does
/// not exceed what is left to fund. Completing the request marks it done,
/// sets the borrower's balance to the funded amount, bumps the borrower's
/// loan count and moves the loan's end date to `now + duration`.
pub fn credit_loan(
    cmd: &CreditLoan,
    snapshot: LoanSnapshot,
    config: &LedgerConfig,
    time_provider: &SafeTimeProvider,
) -> Result<Transition> {
    snapshot.check_links(&cmd.loan_id, &cmd.lender_id)?;
    let LoanSnapshot {
        mut loan,
        mut request,
        mut borrower,
        mut lender,
    } = snapshot;

    if request.is_done {
        return Err(ValidationError::AlreadyFunded {
            request_id: request.id,
        }
        .into());
    }
    check_increment(cmd.amount, config.increment)?;
    check_balance(lender.account_balance, cmd.amount)?;
    let remaining = request.remaining();
    if cmd.amount > remaining {
        return Err(ValidationError::ExceedsRemaining {
            remaining,
            requested: cmd.amount,
        }
        .into());
    }

    let tracked_amount = config
        .interest_policy
        .tracked_amount(cmd.amount, loan.interest)?;
    let now = time_provider.now();
    let mut events = Vec::new();

    lender.account_balance = debit(lender.account_balance, cmd.amount, "lender balance")?;
    request.amount_fulfilled =
        validation::credit(request.amount_fulfilled, cmd.amount, "amount fulfilled")?;
    loan.lenders
        .credit(&lender.id, tracked_amount)
        .ok_or_else(|| LedgerError::invariant(format!("lender line {} overflows", lender.id)))?;

    if request.amount_fulfilled > request.amount_requested {
        return Err(LedgerError::invariant(format!(
            "request {} funded {} of {}",
            request.id, request.amount_fulfilled, request.amount_requested
        )));
    }

    events.push(Event::LoanCredited {
        loan_id: loan.id.clone(),
        lender_id: lender.id.clone(),
        amount: cmd.amount,
        tracked_amount,
        remaining: request.remaining(),
        timestamp: now,
    });

    if request.amount_fulfilled == request.amount_requested {
        request.is_done = true;
        // replaces, does not add
        borrower.account_balance = request.amount_fulfilled;
        borrower.total = validation::increment_counter(borrower.total, "borrower total")?;
        loan.end_date = add_months(now, request.duration_months)?;

        events.push(Event::LoanFunded {
            loan_id: loan.id.clone(),
            borrower_id: borrower.id.clone(),
            amount: request.amount_fulfilled,
            end_date: loan.end_date,
            timestamp: now,
        });
    }

    let snapshot = LoanSnapshot {
        loan,
        request,
        borrower,
        lender,
    };
    Ok(Transition {
        changes: snapshot.into_changes(),
        events,
    })
}
