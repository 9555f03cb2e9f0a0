//! Transactional storage seam.
//!
//! A [`LoanStore`] persists loan aggregates and hands out non-blocking exclusive leases
//! on individual loans. Mutating operations follow the same shape:
//!
//! ```text
//! try_lease(loan)  -> Conflict if someone else holds it, never waits
//! load(loan)       -> consistent snapshot
//! <pure transition>
//! commit(effects)  -> all rows or none, lease released afterwards
//! ```
//!
//! [`LeaseGuard`] releases the lease on drop, so every early return rolls back.

pub mod memory;

use tracing::debug;
use uuid::Uuid;

use crate::effects::Effect;
use crate::errors::Result;
use crate::loan::{Loan, LoanAggregate};
use crate::types::{LoanId, UserId};

pub use memory::InMemoryLoanStore;

/// proof of an exclusive claim on one loan
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseToken {
    loan_id: LoanId,
    token: Uuid,
}

impl LeaseToken {
    pub fn new(loan_id: LoanId) -> Self {
        Self {
            loan_id,
            token: Uuid::new_v4(),
        }
    }

    pub fn loan_id(&self) -> LoanId {
        self.loan_id
    }

    pub fn token(&self) -> Uuid {
        self.token
    }
}

/// storage backend for loan aggregates
pub trait LoanStore: Send + Sync {
    /// persist a new loan application
    fn insert(&self, loan: &Loan) -> Result<()>;

    /// read a consistent snapshot of a loan and its installments
    fn load(&self, loan_id: LoanId) -> Result<LoanAggregate>;

    fn loans_for_customer(&self, customer_id: UserId) -> Result<Vec<Loan>>;

    fn pending_loans(&self) -> Result<Vec<Loan>>;

    /// Claims the loan without waiting.
    ///
    /// Fails with `Conflict` when the lease is held elsewhere and `LoanNotFound` when
    /// the loan does not exist.
    fn try_lease(&self, loan_id: LoanId) -> Result<LeaseToken>;

    /// apply all effects atomically; the lease must still be held
    fn commit(&self, lease: &LeaseToken, effects: &[Effect]) -> Result<()>;

    /// give the lease back; unknown or stale tokens are ignored
    fn release(&self, lease: &LeaseToken);
}

/// holds a lease for the duration of one operation
pub struct LeaseGuard<'a, S: LoanStore + ?Sized> {
    store: &'a S,
    lease: Option<LeaseToken>,
}

impl<'a, S: LoanStore + ?Sized> LeaseGuard<'a, S> {
    pub fn acquire(store: &'a S, loan_id: LoanId) -> Result<Self> {
        let lease = store.try_lease(loan_id)?;
        Ok(Self {
            store,
            lease: Some(lease),
        })
    }

    pub fn loan_id(&self) -> Option<LoanId> {
        self.lease.as_ref().map(LeaseToken::loan_id)
    }

    /// commit `effects` and release the lease whatever the outcome
    pub fn commit(mut self, effects: &[Effect]) -> Result<()> {
        match self.lease.take() {
            Some(lease) => {
                let result = self.store.commit(&lease, effects);
                self.store.release(&lease);
                result
            }
            None => Ok(()),
        }
    }
}

impl<S: LoanStore + ?Sized> Drop for LeaseGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(lease) = self.lease.take() {
            debug!(loan_id = %lease.loan_id(), "lease released without commit");
            self.store.release(&lease);
        }
    }
}
