use hourglass_rs::SafeTimeProvider;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::LedgerConfig;
use crate::entities::{
    Borrower, BorrowerRequest, Entity, EntityKey, EntityKind, Lender, Loan, Record,
};
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::ids::{IdGeneratorBox, UuidIdGenerator};
use crate::interest::{ReputationCalculator, ReputationReport};
use crate::locks::{EntityLocks, LockGuard};
use crate::money::Money;
use crate::processors::{
    self, CreditLoan, DepositFunds, LoanSnapshot, NewLoanIds, RepayLoan, RequestLoan, Transition,
};
use crate::registry::RegistryBox;
use crate::serialization::LoanView;

/// Peer-to-peer lending ledger.
///
/// Every command runs under entity locks against freshly read records, is
/// validated and computed by a processor, and lands in the registry as one
/// atomic commit. Rejected commands persist nothing.
pub struct Ledger {
    registry: RegistryBox,
    ids: IdGeneratorBox,
    config: LedgerConfig,
    time: Arc<SafeTimeProvider>,
    locks: EntityLocks,
    events: Mutex<EventStore>,
}

/// participants and loan seeded by [`Ledger::setup_demo`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSetup {
    pub borrower: Borrower,
    pub lender: Lender,
    pub loan: NewLoanIds,
}

/// locks held for one funding or repayment
struct LoanTransaction {
    _loan: LockGuard,
    _participants: LockGuard,
    snapshot: LoanSnapshot,
}

impl Ledger {
    /// create a ledger over `registry`, generating uuid identifiers
    pub fn new(
        config: LedgerConfig,
        registry: RegistryBox,
        time: Arc<SafeTimeProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            ids: Box::new(UuidIdGenerator),
            config,
            time,
            locks: EntityLocks::new(),
            events: Mutex::new(EventStore::new()),
        })
    }

    /// replace the identifier source
    pub fn with_id_generator(mut self, ids: IdGeneratorBox) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn time_provider(&self) -> &SafeTimeProvider {
        &self.time
    }

    /// `key` qualified with the configured namespace
    pub fn resource_name(&self, key: &EntityKey) -> String {
        key.qualified(&self.config.namespace)
    }

    /// add a borrower, `DuplicateKey` if the id is taken
    pub async fn onboard_borrower(
        &self,
        id: impl Into<String>,
        amount_requested: Money,
        account_balance: Money,
    ) -> Result<Borrower> {
        let borrower = Borrower::new(id, amount_requested, account_balance);
        self.onboard(borrower.clone(), account_balance).await?;
        Ok(borrower)
    }

    /// add a lender, `DuplicateKey` if the id is taken
    pub async fn onboard_lender(
        &self,
        id: impl Into<String>,
        account_balance: Money,
    ) -> Result<Lender> {
        let lender = Lender::new(id, account_balance);
        self.onboard(lender.clone(), account_balance).await?;
        Ok(lender)
    }

    /// Seeds borrower `b1` asking for 1000, lender `l1` holding 10000 and an
    /// open loan for b1's 1000 that l1 can fund.
    pub async fn setup_demo(&self) -> Result<DemoSetup> {
        let borrower = self
            .onboard_borrower("b1", Money::new(1000), Money::ZERO)
            .await?;
        let lender = self.onboard_lender("l1", Money::new(10_000)).await?;
        let loan = self
            .request_loan(RequestLoan {
                amount_requested: borrower.amount_requested,
                purpose: "demo".to_string(),
                duration_months: 12,
                borrower_id: borrower.id.clone(),
            })
            .await?;
        Ok(DemoSetup {
            borrower,
            lender,
            loan,
        })
    }

    async fn onboard<T: Record>(&self, record: T, account_balance: Money) -> Result<()> {
        let entity: Entity = record.into();
        let key = entity.key();
        let resource = self.resource_name(&key);
        if let Err(err) = self.registry.add(entity).await {
            tracing::warn!(%resource, error = %err, "onboarding rejected");
            return Err(err);
        }
        tracing::info!(%resource, balance = %account_balance, "participant onboarded");
        self.events.lock().await.emit(Event::ParticipantOnboarded {
            key,
            account_balance,
        });
        Ok(())
    }

    /// Opens a loan request for an existing borrower.
    ///
    /// The interest rate is fixed now from the borrower's reputation. Fresh
    /// ids are drawn for the request and the loan; a collision with a stored
    /// record draws again, up to `max_id_attempts` times.
    pub async fn request_loan(&self, cmd: RequestLoan) -> Result<NewLoanIds> {
        let _guard = self
            .locks
            .acquire(&[EntityKey::borrower(&cmd.borrower_id)])
            .await;
        let borrower: Borrower = self
            .fetch(&cmd.borrower_id)
            .await
            .map_err(|err| rejected("request_loan", err))?;

        let mut attempt = 1;
        loop {
            let ids = NewLoanIds {
                request_id: self.ids.generate(EntityKind::BorrowerRequest),
                loan_id: self.ids.generate(EntityKind::Loan),
            };
            let Transition { changes, events } =
                processors::request_loan(&cmd, &borrower, &ids, &self.config, &self.time)
                    .map_err(|err| rejected("request_loan", err))?;

            match self.registry.commit(changes).await {
                Ok(()) => {
                    tracing::info!(
                        resource = %self.resource_name(&EntityKey::loan(&ids.loan_id)),
                        borrower_id = %cmd.borrower_id,
                        request_id = %ids.request_id,
                        amount = %cmd.amount_requested,
                        "loan requested"
                    );
                    self.events.lock().await.extend(events);
                    return Ok(ids);
                }
                Err(LedgerError::DuplicateKey { key })
                    if attempt < self.config.max_id_attempts =>
                {
                    tracing::debug!(
                        resource = %self.resource_name(&key),
                        attempt,
                        "generated id already taken"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(rejected("request_loan", err)),
            }
        }
    }

    /// Records a lender's contribution to a loan; see [`processors::credit_loan`].
    pub async fn credit_loan(&self, cmd: CreditLoan) -> Result<Vec<Event>> {
        let tx = self
            .begin(&cmd.loan_id, &cmd.lender_id)
            .await
            .map_err(|err| rejected("credit_loan", err))?;
        let transition = processors::credit_loan(&cmd, tx.snapshot, &self.config, &self.time)
            .map_err(|err| rejected("credit_loan", err))?;

        let events = self
            .commit(transition)
            .await
            .map_err(|err| rejected("credit_loan", err))?;
        tracing::info!(
            resource = %self.resource_name(&EntityKey::loan(&cmd.loan_id)),
            lender_id = %cmd.lender_id,
            amount = %cmd.amount,
            "loan credited"
        );
        Ok(events)
    }

    /// Records a borrower's repayment to one lender; see [`processors::repay_loan`].
    pub async fn repay_loan(&self, cmd: RepayLoan) -> Result<Vec<Event>> {
        let tx = self
            .begin(&cmd.loan_id, &cmd.lender_id)
            .await
            .map_err(|err| rejected("repay_loan", err))?;
        let transition = processors::repay_loan(&cmd, tx.snapshot, &self.config, &self.time)
            .map_err(|err| rejected("repay_loan", err))?;

        let events = self
            .commit(transition)
            .await
            .map_err(|err| rejected("repay_loan", err))?;
        tracing::info!(
            resource = %self.resource_name(&EntityKey::loan(&cmd.loan_id)),
            lender_id = %cmd.lender_id,
            amount = %cmd.amount,
            "repayment recorded"
        );
        Ok(events)
    }

    /// Adds funds to a borrower's account; see [`processors::deposit_funds`].
    pub async fn deposit_funds(&self, cmd: DepositFunds) -> Result<Vec<Event>> {
        let _guard = self
            .locks
            .acquire(&[EntityKey::borrower(&cmd.borrower_id)])
            .await;
        let borrower: Borrower = self
            .fetch(&cmd.borrower_id)
            .await
            .map_err(|err| rejected("deposit_funds", err))?;
        let transition = processors::deposit_funds(&cmd, borrower, &self.time)
            .map_err(|err| rejected("deposit_funds", err))?;

        let events = self
            .commit(transition)
            .await
            .map_err(|err| rejected("deposit_funds", err))?;
        tracing::info!(
            resource = %self.resource_name(&EntityKey::borrower(&cmd.borrower_id)),
            amount = %cmd.amount,
            "funds deposited"
        );
        Ok(events)
    }

    /// Locks and reads everything a funding or repayment touches.
    ///
    /// The loan lock comes first; the request, borrower and lender locks are
    /// then taken together in key order. The request is read under the loan
    /// lock alone, which is safe because only loan-lock holders modify it.
    async fn begin(&self, loan_id: &str, lender_id: &str) -> Result<LoanTransaction> {
        let loan_guard = self.locks.acquire(&[EntityKey::loan(loan_id)]).await;
        let loan: Loan = self.fetch(loan_id).await?;
        let request: BorrowerRequest = self.fetch(&loan.request_id).await?;

        let participants = self
            .locks
            .acquire(&[
                EntityKey::request(&request.id),
                EntityKey::borrower(&request.borrower_id),
                EntityKey::lender(lender_id),
            ])
            .await;
        let borrower: Borrower = self.fetch(&request.borrower_id).await?;
        let lender: Lender = self.fetch(lender_id).await?;

        Ok(LoanTransaction {
            _loan: loan_guard,
            _participants: participants,
            snapshot: LoanSnapshot {
                loan,
                request,
                borrower,
                lender,
            },
        })
    }

    async fn commit(&self, transition: Transition) -> Result<Vec<Event>> {
        let Transition { changes, events } = transition;
        tracing::debug!(keys = ?changes.keys(), "committing changes");
        self.registry.commit(changes).await?;
        self.events.lock().await.extend(events.clone());
        Ok(events)
    }

    async fn fetch<T: Record>(&self, id: &str) -> Result<T> {
        let entity = self.registry.get(&T::key_for(id)).await?;
        T::try_from(entity)
    }

    pub async fn borrower(&self, id: &str) -> Result<Borrower> {
        self.fetch(id).await
    }

    pub async fn lender(&self, id: &str) -> Result<Lender> {
        self.fetch(id).await
    }

    pub async fn loan(&self, id: &str) -> Result<Loan> {
        self.fetch(id).await
    }

    pub async fn request(&self, id: &str) -> Result<BorrowerRequest> {
        self.fetch(id).await
    }

    /// the borrower's current reputation and the rate a new request would get
    pub async fn reputation(&self, borrower_id: &str) -> Result<ReputationReport> {
        let borrower: Borrower = self.fetch(borrower_id).await?;
        Ok(ReputationCalculator::new(&self.config.reputation).report(&borrower))
    }

    pub async fn loan_view(&self, loan_id: &str) -> Result<LoanView> {
        let loan: Loan = self.fetch(loan_id).await?;
        let request: BorrowerRequest = self.fetch(&loan.request_id).await?;
        LoanView::new(&loan, &request)
    }

    /// drain events recorded since the last call
    pub async fn take_events(&self) -> Vec<Event> {
        self.events.lock().await.take_events()
    }
}

fn rejected(operation: &'static str, err: LedgerError) -> LedgerError {
    tracing::warn!(operation, error = %err, "transaction rejected");
    err
}
