use hourglass_rs::SafeTimeProvider;

use crate::entities::Borrower;
use crate::errors::{LedgerError, Result, ValidationError};
use crate::events::Event;
use crate::processors::validation;
use crate::processors::{DepositFunds, Transition};
use crate::registry::Changeset;

/// Adds funds to a borrower's account.
///
/// Funding only ever sets the balance to the principal, so this is how a
/// borrower covers the interest owed on priced lender lines. Any positive
/// amount is accepted; the increment only governs funding and repayment.
pub fn deposit_funds(
    cmd: &DepositFunds,
    mut borrower: Borrower,
    time_provider: &SafeTimeProvider,
) -> Result<Transition> {
    if borrower.id != cmd.borrower_id {
        return Err(LedgerError::invariant(format!(
            "deposit for borrower {} applied to {}",
            cmd.borrower_id, borrower.id
        )));
    }
    if !cmd.amount.is_positive() {
        return Err(ValidationError::NonPositiveAmount.into());
    }

    borrower.account_balance =
        validation::credit(borrower.account_balance, cmd.amount, "borrower balance")?;

    let event = Event::FundsDeposited {
        borrower_id: borrower.id.clone(),
        amount: cmd.amount,
        account_balance: borrower.account_balance,
        timestamp: time_provider.now(),
    };

    let mut changes = Changeset::new();
    changes.update(borrower);
    Ok(Transition {
        changes,
        events: vec![event],
    })
}
