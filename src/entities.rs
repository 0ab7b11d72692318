use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LedgerError, Result};
use crate::lenders::LenderBook;
use crate::money::Money;

/// registry entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Borrower,
    Lender,
    BorrowerRequest,
    Loan,
}

impl EntityKind {
    /// prefix used for generated identifiers
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EntityKind::Borrower => "borrower",
            EntityKind::Lender => "lender",
            EntityKind::BorrowerRequest => "request",
            EntityKind::Loan => "loan",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Borrower => "Borrower",
            EntityKind::Lender => "Lender",
            EntityKind::BorrowerRequest => "BorrowerRequest",
            EntityKind::Loan => "Loan",
        };
        f.write_str(name)
    }
}

/// registry key: kind plus identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn borrower(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Borrower, id)
    }

    pub fn lender(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Lender, id)
    }

    pub fn request(id: impl Into<String>) -> Self {
        Self::new(EntityKind::BorrowerRequest, id)
    }

    pub fn loan(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Loan, id)
    }

    /// fully qualified resource name, e.g. `org.acme.loan.Loan#loan1`
    pub fn qualified(&self, namespace: &str) -> String {
        format!("{}.{}", namespace, self)
    }

    pub fn not_found(&self) -> LedgerError {
        LedgerError::NotFound {
            kind: self.kind,
            id: self.id.clone(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// party requesting funds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: String,
    /// informational, set at onboarding
    pub amount_requested: Money,
    /// loans fully funded
    pub total: u32,
    pub success: u32,
    pub fail: u32,
    pub account_balance: Money,
    #[serde(default)]
    pub version: u64,
}

impl Borrower {
    pub fn new(id: impl Into<String>, amount_requested: Money, account_balance: Money) -> Self {
        Self {
            id: id.into(),
            amount_requested,
            total: 0,
            success: 0,
            fail: 0,
            account_balance,
            version: 0,
        }
    }
}

/// party supplying funds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lender {
    pub id: String,
    pub account_balance: Money,
    #[serde(default)]
    pub version: u64,
}

impl Lender {
    pub fn new(id: impl Into<String>, account_balance: Money) -> Self {
        Self {
            id: id.into(),
            account_balance,
            version: 0,
        }
    }
}

/// demand side of a loan: how much was asked, funded and paid back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowerRequest {
    pub id: String,
    pub borrower_id: String,
    pub amount_requested: Money,
    pub amount_fulfilled: Money,
    pub amount_repaid: Money,
    pub duration_months: u32,
    pub purpose: String,
    /// fully funded
    pub is_done: bool,
    /// fully repaid
    pub is_repaid: bool,
    #[serde(default)]
    pub version: u64,
}

impl BorrowerRequest {
    pub fn new(
        id: impl Into<String>,
        borrower_id: impl Into<String>,
        amount_requested: Money,
        duration_months: u32,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            borrower_id: borrower_id.into(),
            amount_requested,
            amount_fulfilled: Money::ZERO,
            amount_repaid: Money::ZERO,
            duration_months,
            purpose: purpose.into(),
            is_done: false,
            is_repaid: false,
            version: 0,
        }
    }

    /// amount still open for funding
    pub fn remaining(&self) -> Money {
        self.amount_requested.saturating_sub(self.amount_fulfilled)
    }
}

/// supply side of a loan: every lender funding one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub request_id: String,
    pub lenders: LenderBook,
    /// percent, fixed when the loan is requested
    pub interest: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Loan {
    pub fn new(
        id: impl Into<String>,
        request_id: impl Into<String>,
        interest: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            request_id: request_id.into(),
            lenders: LenderBook::new(),
            interest,
            start_date: now,
            end_date: now,
            version: 0,
        }
    }

    /// total owed across all lender lines
    pub fn total_owed(&self) -> Result<Money> {
        self.lenders
            .total_owed()
            .ok_or_else(|| LedgerError::invariant(format!("loan {} owed total overflows", self.id)))
    }
}

/// anything the registry stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Entity {
    Borrower(Borrower),
    Lender(Lender),
    BorrowerRequest(BorrowerRequest),
    Loan(Loan),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Borrower(_) => EntityKind::Borrower,
            Entity::Lender(_) => EntityKind::Lender,
            Entity::BorrowerRequest(_) => EntityKind::BorrowerRequest,
            Entity::Loan(_) => EntityKind::Loan,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Borrower(b) => &b.id,
            Entity::Lender(l) => &l.id,
            Entity::BorrowerRequest(r) => &r.id,
            Entity::Loan(l) => &l.id,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.kind(), self.id())
    }

    pub fn version(&self) -> u64 {
        match self {
            Entity::Borrower(b) => b.version,
            Entity::Lender(l) => l.version,
            Entity::BorrowerRequest(r) => r.version,
            Entity::Loan(l) => l.version,
        }
    }

    pub fn set_version(&mut self, version: u64) {
        match self {
            Entity::Borrower(b) => b.version = version,
            Entity::Lender(l) => l.version = version,
            Entity::BorrowerRequest(r) => r.version = version,
            Entity::Loan(l) => l.version = version,
        }
    }
}

/// typed view over one `Entity` variant
pub trait Record: Clone + Into<Entity> + TryFrom<Entity, Error = LedgerError> {
    const KIND: EntityKind;

    fn key_for(id: &str) -> EntityKey {
        EntityKey::new(Self::KIND, id)
    }
}

macro_rules! record {
    ($ty:ident) => {
        impl From<$ty> for Entity {
            fn from(record: $ty) -> Self {
                Entity::$ty(record)
            }
        }

        impl TryFrom<Entity> for $ty {
            type Error = LedgerError;

            fn try_from(entity: Entity) -> Result<Self> {
                match entity {
                    Entity::$ty(record) => Ok(record),
                    other => Err(LedgerError::WrongEntityKind {
                        key: EntityKey::new(EntityKind::$ty, other.id()),
                        found: other.kind(),
                    }),
                }
            }
        }

        impl Record for $ty {
            const KIND: EntityKind = EntityKind::$ty;
        }
    };
}

record!(Borrower);
record!(Lender);
record!(BorrowerRequest);
record!(Loan);
