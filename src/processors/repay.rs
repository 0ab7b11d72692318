use hourglass_rs::SafeTimeProvider;

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, Result, ValidationError};
use crate::events::{Event, RepaymentOutcome};
use crate::processors::validation::{self, check_balance, check_increment, debit};
use crate::processors::{LoanSnapshot, RepayLoan, Transition};

/// Applies a borrower's repayment to one lender's line.
///
/// Amounts follow the funding increment, except for the payment that clears
/// a line exactly, which covers interest that is not a whole increment.
/// Once everything owed across all lines is repaid the request is closed and
/// the borrower's reputation counters record whether that happened by the
/// loan's end date.
pub fn repay_loan(
    cmd: &RepayLoan,
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

    if request.is_repaid {
        return Err(ValidationError::AlreadyRepaid {
            request_id: request.id,
        }
        .into());
    }
    if !request.is_done {
        return Err(ValidationError::NotFunded {
            request_id: request.id,
        }
        .into());
    }
    // a payment that exactly settles a lender line is exempt from the increment
    let settles_line = loan
        .lenders
        .get(&cmd.lender_id)
        .is_some_and(|line| line.outstanding() == cmd.amount);
    if !settles_line || cmd.amount.is_zero() {
        check_increment(cmd.amount, config.increment)?;
    }
    check_balance(borrower.account_balance, cmd.amount)?;

    let line = loan
        .lenders
        .get_mut(&cmd.lender_id)
        .ok_or_else(|| LedgerError::LenderDetailNotFound {
            loan_id: cmd.loan_id.clone(),
            lender_id: cmd.lender_id.clone(),
        })?;
    let owed = line.outstanding();
    if cmd.amount > owed {
        return Err(ValidationError::ExceedsOwed {
            lender_id: cmd.lender_id.clone(),
            owed,
            requested: cmd.amount,
        }
        .into());
    }
    line.repaid = validation::credit(line.repaid, cmd.amount, "lender line repaid")?;

    let now = time_provider.now();
    let mut events = Vec::new();

    lender.account_balance =
        validation::credit(lender.account_balance, cmd.amount, "lender balance")?;
    borrower.account_balance = debit(borrower.account_balance, cmd.amount, "borrower balance")?;
    request.amount_repaid = validation::credit(request.amount_repaid, cmd.amount, "amount repaid")?;

    let total_owed = loan.total_owed()?;
    let outstanding = debit(total_owed, request.amount_repaid, "loan outstanding")?;

    events.push(Event::RepaymentReceived {
        loan_id: loan.id.clone(),
        lender_id: lender.id.clone(),
        amount: cmd.amount,
        outstanding,
        timestamp: now,
    });

    if outstanding.is_zero() {
        request.is_repaid = true;
        let outcome = if now > loan.end_date {
            borrower.fail = validation::increment_counter(borrower.fail, "borrower fail")?;
            RepaymentOutcome::Late
        } else {
            borrower.success = validation::increment_counter(borrower.success, "borrower success")?;
            RepaymentOutcome::OnTime
        };

        events.push(Event::LoanRepaid {
            loan_id: loan.id.clone(),
            borrower_id: borrower.id.clone(),
            outcome,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::processors::fixtures::{snapshot, start, test_time};
    use crate::processors::validation::add_months;
    use chrono::Duration;
    use hourglass_rs::{SafeTimeProvider, TimeSource};

    fn repay(lender_id: &str, amount: u64) -> RepayLoan {
        RepayLoan {
            loan_id: "loan1".to_string(),
            lender_id: lender_id.to_string(),
            amount: Money::new(amount),
        }
    }

    /// fully funded by l1 (600) and l2 (400), borrower holding the 1000
    fn funded() -> LoanSnapshot {
        let mut snap = snapshot();
        snap.request.amount_fulfilled = Money::new(1000);
        snap.request.is_done = true;
        snap.loan.lenders.credit("l1", Money::new(600));
        snap.loan.lenders.credit("l2", Money::new(400));
        snap.loan.end_date = add_months(start(), 3).unwrap();
        snap.borrower.account_balance = Money::new(1000);
        snap.borrower.total = 1;
        snap.lender.account_balance = Money::new(9_400);
        snap
    }

    #[test]
    fn test_partial_repayment() {
        let time = test_time();
        let transition =
            repay_loan(&repay("l1", 300), funded(), &LedgerConfig::standard(), &time).unwrap();

        let lender = transition.lender().unwrap();
        let borrower = transition.borrower().unwrap();
        let request = transition.request().unwrap();
        let loan = transition.loan().unwrap();

        assert_eq!(lender.account_balance, Money::new(9_700));
        assert_eq!(borrower.account_balance, Money::new(700));
        assert_eq!(request.amount_repaid, Money::new(300));
        assert_eq!(loan.lenders.get("l1").unwrap().repaid, Money::new(300));
        assert!(!request.is_repaid);
        assert_eq!(
            transition.events,
            vec![Event::RepaymentReceived {
                loan_id: "loan1".to_string(),
                lender_id: "l1".to_string(),
                amount: Money::new(300),
                outstanding: Money::new(700),
                timestamp: start(),
            }]
        );
    }

    #[test]
    fn test_final_repayment_on_time() {
        let time = test_time();
        let mut snap = funded();
        snap.request.amount_repaid = Money::new(400);
        snap.loan.lenders.get_mut("l2").unwrap().repaid = Money::new(400);

        let transition =
            repay_loan(&repay("l1", 600), snap, &LedgerConfig::standard(), &time).unwrap();

        let request = transition.request().unwrap();
        let borrower = transition.borrower().unwrap();
        assert!(request.is_repaid);
        assert_eq!(borrower.success, 1);
        assert_eq!(borrower.fail, 0);
        assert_eq!(borrower.account_balance, Money::new(400));
        assert!(matches!(
            transition.events.last(),
            Some(Event::LoanRepaid { outcome: RepaymentOutcome::OnTime, .. })
        ));
    }

    #[test]
    fn test_repayment_exactly_at_end_date_counts_as_success() {
        let mut snap = funded();
        snap.request.amount_repaid = Money::new(400);
        snap.loan.lenders.get_mut("l2").unwrap().repaid = Money::new(400);
        let time = SafeTimeProvider::new(TimeSource::Test(snap.loan.end_date));

        let transition =
            repay_loan(&repay("l1", 600), snap, &LedgerConfig::standard(), &time).unwrap();
        assert_eq!(transition.borrower().unwrap().success, 1);
    }

    #[test]
    fn test_late_repayment_counts_as_failure() {
        let time = test_time();
        let control = time.test_control().unwrap();
        control.advance(Duration::days(120));

        let mut snap = funded();
        snap.request.amount_repaid = Money::new(400);
        snap.loan.lenders.get_mut("l2").unwrap().repaid = Money::new(400);

        let transition =
            repay_loan(&repay("l1", 600), snap, &LedgerConfig::standard(), &time).unwrap();
        let borrower = transition.borrower().unwrap();
        assert_eq!(borrower.fail, 1);
        assert_eq!(borrower.success, 0);
        assert!(matches!(
            transition.events.last(),
            Some(Event::LoanRepaid { outcome: RepaymentOutcome::Late, .. })
        ));
    }

    #[test]
    fn test_unknown_lender_line() {
        let time = test_time();
        let mut snap = funded();
        snap.lender = crate::entities::Lender::new("l9", Money::ZERO);

        let err =
            repay_loan(&repay("l9", 100), snap, &LedgerConfig::standard(), &time).unwrap_err();
        assert_eq!(
            err,
            LedgerError::LenderDetailNotFound {
                loan_id: "loan1".to_string(),
                lender_id: "l9".to_string(),
            }
        );
    }

    #[test]
    fn test_cannot_repay_more_than_owed_to_a_lender() {
        let time = test_time();
        let err =
            repay_loan(&repay("l1", 700), funded(), &LedgerConfig::standard(), &time).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::ExceedsOwed { owed, .. })
                if owed == Money::new(600)
        ));
    }

    #[test]
    fn test_rejections() {
        let time = test_time();
        let config = LedgerConfig::standard();

        let mut repaid = funded();
        repaid.request.is_repaid = true;
        let err = repay_loan(&repay("l1", 100), repaid, &config, &time).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::AlreadyRepaid { .. })
        ));

        let err = repay_loan(&repay("l1", 100), snapshot(), &config, &time).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(ValidationError::NotFunded { .. })));

        let err = repay_loan(&repay("l1", 50), funded(), &config, &time).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::NotAnIncrement { .. })
        ));

        let mut broke = funded();
        broke.borrower.account_balance = Money::new(200);
        let err = repay_loan(&repay("l1", 300), broke, &config, &time).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::InsufficientBalance { .. })
        ));
    }

    /// wholesale lines: l1 and l2 each funded 500, tracked as 550
    fn priced() -> LoanSnapshot {
        let mut snap = snapshot();
        snap.request.amount_fulfilled = Money::new(1000);
        snap.request.is_done = true;
        snap.loan.lenders.credit("l1", Money::new(550));
        snap.loan.lenders.credit("l2", Money::new(550));
        snap.loan.end_date = add_months(start(), 3).unwrap();
        snap.borrower.account_balance = Money::new(1100);
        snap
    }

    #[test]
    fn test_settling_payment_may_break_the_increment() {
        let time = test_time();
        let config = LedgerConfig::wholesale();

        let transition = repay_loan(&repay("l1", 550), priced(), &config, &time).unwrap();
        assert!(transition.loan().unwrap().lenders.get("l1").unwrap().is_settled());
        assert_eq!(transition.borrower().unwrap().account_balance, Money::new(550));

        let mut snap = priced();
        snap.loan.lenders.get_mut("l1").unwrap().repaid = Money::new(500);
        let transition = repay_loan(&repay("l1", 50), snap, &config, &time).unwrap();
        assert_eq!(transition.request().unwrap().amount_repaid, Money::new(50));
    }

    #[test]
    fn test_partial_interest_payment_still_needs_the_increment() {
        let time = test_time();
        let err = repay_loan(&repay("l1", 50), priced(), &LedgerConfig::wholesale(), &time)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::NotAnIncrement { .. })
        ));
    }

    #[test]
    fn test_priced_loan_closes_when_every_line_is_settled() {
        let time = test_time();
        let config = LedgerConfig::wholesale();
        let mut snap = priced();
        snap.request.amount_repaid = Money::new(550);
        snap.loan.lenders.get_mut("l2").unwrap().repaid = Money::new(550);
        snap.borrower.account_balance = Money::new(550);

        let transition = repay_loan(&repay("l1", 550), snap, &config, &time).unwrap();
        let request = transition.request().unwrap();
        assert!(request.is_repaid);
        assert_eq!(request.amount_repaid, Money::new(1100));
        assert_eq!(transition.borrower().unwrap().success, 1);
    }
}
