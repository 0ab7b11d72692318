/// demo setup - seeded participants, reputation and time control
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use lending_ledger_rs::{
    CreditLoan, InMemoryRegistry, Ledger, LedgerConfig, RepayLoan, SafeTimeProvider, TimeSource,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== demo setup ===\n");

    let time = Arc::new(SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )));
    let controller = time.test_control().unwrap();

    let config = LedgerConfig::from_json(r#"{ "increment": 100, "max_id_attempts": 4 }"#)?;
    let ledger = Ledger::new(config, Box::new(InMemoryRegistry::new()), Arc::clone(&time))?;

    let demo = ledger.setup_demo().await?;
    let (borrower, lender, ids) = (demo.borrower, demo.lender, demo.loan);
    println!("borrower {} wants {}", borrower.id, borrower.amount_requested);
    println!("lender {} holds {}", lender.id, lender.account_balance);
    println!("demo loan {} opened for request {}", ids.loan_id, ids.request_id);

    let report = ledger.reputation(&borrower.id).await?;
    println!("new borrower rate: {}%", report.rate);

    ledger
        .credit_loan(CreditLoan {
            loan_id: ids.loan_id.clone(),
            lender_id: lender.id.clone(),
            amount: borrower.amount_requested,
        })
        .await?;
    let loan = ledger.loan(&ids.loan_id).await?;
    println!("funded, due {}", loan.end_date.format("%Y-%m-%d"));

    // miss the end date
    controller.advance(Duration::days(400));
    println!("repaying on {}", time.now().format("%Y-%m-%d"));
    ledger
        .repay_loan(RepayLoan {
            loan_id: ids.loan_id.clone(),
            lender_id: lender.id.clone(),
            amount: borrower.amount_requested,
        })
        .await?;

    let report = ledger.reputation(&borrower.id).await?;
    println!("after a late repayment: score {:?}, rate {}%", report.score, report.rate);

    println!("\nevents:");
    for event in ledger.take_events().await {
        println!("  {:?}", event);
    }

    Ok(())
}
