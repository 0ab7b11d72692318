/// quick start - request a loan, fund it, repay it
use std::sync::Arc;

use lending_ledger_rs::{
    CreditLoan, InMemoryRegistry, Ledger, LedgerConfig, Money, RepayLoan, RequestLoan,
    SafeTimeProvider, TimeSource,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = Arc::new(SafeTimeProvider::new(TimeSource::System));
    let ledger = Ledger::new(
        LedgerConfig::standard(),
        Box::new(InMemoryRegistry::new()),
        time,
    )?;

    // demo participants, their demo loan stays open
    ledger.setup_demo().await?;
    ledger.onboard_lender("l2", Money::new(5_000)).await?;

    // borrower asks for 1000 over three months
    let ids = ledger
        .request_loan(RequestLoan {
            amount_requested: Money::new(1000),
            purpose: "inventory".to_string(),
            duration_months: 3,
            borrower_id: "b1".to_string(),
        })
        .await?;

    // two lenders fund it
    for (lender_id, amount) in [("l1", 600), ("l2", 400)] {
        ledger
            .credit_loan(CreditLoan {
                loan_id: ids.loan_id.clone(),
                lender_id: lender_id.to_string(),
                amount: Money::new(amount),
            })
            .await?;
    }

    // pay back the first lender
    ledger
        .repay_loan(RepayLoan {
            loan_id: ids.loan_id.clone(),
            lender_id: "l1".to_string(),
            amount: Money::new(600),
        })
        .await?;

    println!("{}", ledger.loan_view(&ids.loan_id).await?.json()?);

    Ok(())
}
