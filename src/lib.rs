pub mod config;
pub mod entities;
pub mod errors;
pub mod events;
pub mod ids;
pub mod interest;
pub mod ledger;
pub mod lenders;
pub mod locks;
pub mod money;
pub mod processors;
pub mod registry;
pub mod serialization;

// re-export key types
pub use config::LedgerConfig;
pub use entities::{
    Borrower, BorrowerRequest, Entity, EntityKey, EntityKind, Lender, Loan, Record,
};
pub use errors::{LedgerError, Result, ValidationError};
pub use events::{Event, EventStore, RepaymentOutcome};
pub use ids::{IdGenerator, IdGeneratorBox, UuidIdGenerator};
pub use interest::{
    InterestPolicy, RateBracket, ReputationCalculator, ReputationConfig, ReputationReport,
};
pub use ledger::{DemoSetup, Ledger};
pub use lenders::{LenderBook, LenderDetail};
pub use money::Money;
pub use processors::{
    CreditLoan, DepositFunds, LoanSnapshot, NewLoanIds, RepayLoan, RequestLoan, Transition,
};
pub use registry::{Change, Changeset, InMemoryRegistry, Registry, RegistryBox};
pub use serialization::LoanView;

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
