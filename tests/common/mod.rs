#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use lending_ledger_rs::{
    Changeset, CreditLoan, Entity, EntityKey, EntityKind, IdGenerator, InMemoryRegistry, Ledger,
    LedgerConfig, LedgerError, Money, Registry, RepayLoan, RequestLoan, Result, SafeTimeProvider,
    TimeSource,
};

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
}

pub fn test_time() -> Arc<SafeTimeProvider> {
    Arc::new(SafeTimeProvider::new(TimeSource::Test(start())))
}

pub fn ledger_over(registry: impl Registry + 'static, time: &Arc<SafeTimeProvider>) -> Ledger {
    Ledger::new(LedgerConfig::standard(), Box::new(registry), Arc::clone(time)).unwrap()
}

pub fn ask(borrower_id: &str, amount: u64, months: u32) -> RequestLoan {
    RequestLoan {
        amount_requested: Money::new(amount),
        purpose: "working capital".to_string(),
        duration_months: months,
        borrower_id: borrower_id.to_string(),
    }
}

pub fn credit(loan_id: &str, lender_id: &str, amount: u64) -> CreditLoan {
    CreditLoan {
        loan_id: loan_id.to_string(),
        lender_id: lender_id.to_string(),
        amount: Money::new(amount),
    }
}

pub fn repay(loan_id: &str, lender_id: &str, amount: u64) -> RepayLoan {
    RepayLoan {
        loan_id: loan_id.to_string(),
        lender_id: lender_id.to_string(),
        amount: Money::new(amount),
    }
}

/// yields to the scheduler before every call so joined futures interleave
#[derive(Clone, Default)]
pub struct YieldingRegistry {
    pub inner: InMemoryRegistry,
}

#[async_trait]
impl Registry for YieldingRegistry {
    async fn get(&self, key: &EntityKey) -> Result<Entity> {
        tokio::task::yield_now().await;
        self.inner.get(key).await
    }

    async fn add(&self, entity: Entity) -> Result<()> {
        tokio::task::yield_now().await;
        self.inner.add(entity).await
    }

    async fn update(&self, entity: Entity) -> Result<()> {
        tokio::task::yield_now().await;
        self.inner.update(entity).await
    }

    async fn commit(&self, changes: Changeset) -> Result<()> {
        tokio::task::yield_now().await;
        self.inner.commit(changes).await
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        tokio::task::yield_now().await;
        self.inner.list(kind).await
    }
}

/// fails every commit while `failing` is set
#[derive(Clone, Default)]
pub struct FailingRegistry {
    pub inner: InMemoryRegistry,
    pub failing: Arc<AtomicBool>,
}

#[async_trait]
impl Registry for FailingRegistry {
    async fn get(&self, key: &EntityKey) -> Result<Entity> {
        self.inner.get(key).await
    }

    async fn add(&self, entity: Entity) -> Result<()> {
        self.inner.add(entity).await
    }

    async fn update(&self, entity: Entity) -> Result<()> {
        self.inner.update(entity).await
    }

    async fn commit(&self, changes: Changeset) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::invariant("storage offline"));
        }
        self.inner.commit(changes).await
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        self.inner.list(kind).await
    }
}

/// replays a fixed list of ids, then numbers the rest
pub struct SequenceIds {
    script: Vec<String>,
    next: AtomicUsize,
}

impl SequenceIds {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: script.iter().map(|id| id.to_string()).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl IdGenerator for SequenceIds {
    fn generate(&self, kind: EntityKind) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        self.script
            .get(n)
            .cloned()
            .unwrap_or_else(|| format!("{}-{}", kind.id_prefix(), n))
    }
}
