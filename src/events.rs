use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::EntityKey;
use crate::money::Money;

/// how a fully repaid loan counts toward the borrower's reputation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentOutcome {
    /// repaid at or before the end date
    OnTime,
    /// repaid after the end date
    Late,
}

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ParticipantOnboarded {
        key: EntityKey,
        account_balance: Money,
    },
    LoanRequested {
        request_id: String,
        loan_id: String,
        borrower_id: String,
        amount: Money,
        interest: u32,
        timestamp: DateTime<Utc>,
    },
    LoanCredited {
        loan_id: String,
        lender_id: String,
        amount: Money,
        tracked_amount: Money,
        remaining: Money,
        timestamp: DateTime<Utc>,
    },
    LoanFunded {
        loan_id: String,
        borrower_id: String,
        amount: Money,
        end_date: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    FundsDeposited {
        borrower_id: String,
        amount: Money,
        account_balance: Money,
        timestamp: DateTime<Utc>,
    },
    RepaymentReceived {
        loan_id: String,
        lender_id: String,
        amount: Money,
        outstanding: Money,
        timestamp: DateTime<Utc>,
    },
    LoanRepaid {
        loan_id: String,
        borrower_id: String,
        outcome: RepaymentOutcome,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
