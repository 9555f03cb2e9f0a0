use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use tracing::debug;
use uuid::Uuid;

use super::{LeaseToken, LoanStore};
use crate::effects::Effect;
use crate::errors::{LoanError, Result};
use crate::loan::{Loan, LoanAggregate};
use crate::types::{ApprovalStatus, LoanId, UserId};

/// In-memory loan store.
///
/// Leases behave like `SELECT ... FOR UPDATE NOWAIT`: a second claim on the same loan
/// fails straight away instead of queueing.
#[derive(Debug, Default)]
pub struct InMemoryLoanStore {
    aggregates: RwLock<HashMap<LoanId, LoanAggregate>>,
    leases: Mutex<HashMap<LoanId, Uuid>>,
}

fn poisoned() -> LoanError {
    LoanError::Store {
        message: "lock poisoned".to_string(),
    }
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of loans currently leased
    pub fn active_leases(&self) -> usize {
        self.leases.lock().map(|l| l.len()).unwrap_or(0)
    }

    fn holds(&self, lease: &LeaseToken) -> Result<bool> {
        let leases = self.leases.lock().map_err(|_| poisoned())?;
        Ok(leases.get(&lease.loan_id()) == Some(&lease.token()))
    }
}

/// apply one effect to a working copy of the aggregate
fn apply_effect(aggregate: &mut LoanAggregate, effect: &Effect) -> Result<()> {
    let loan_id = aggregate.id();

    match effect {
        Effect::UpdateLoan(loan) => {
            if loan.id != loan_id {
                return Err(LoanError::invariant(format!(
                    "effect for loan {} committed under lease for {}",
                    loan.id, loan_id
                )));
            }
            aggregate.loan = loan.clone();
        }
        Effect::InsertInstallments(rows) => {
            for row in rows {
                if row.loan_id != loan_id {
                    return Err(LoanError::invariant(format!(
                        "installment {} belongs to loan {}, not {}",
                        row.id, row.loan_id, loan_id
                    )));
                }
                if aggregate.installments.iter().any(|i| i.id == row.id) {
                    return Err(LoanError::invariant(format!(
                        "installment {} already exists",
                        row.id
                    )));
                }
                aggregate.installments.push(row.clone());
            }
        }
        Effect::UpdateInstallments(rows) => {
            for row in rows {
                let existing = aggregate
                    .installments
                    .iter_mut()
                    .find(|i| i.id == row.id && i.loan_id == loan_id)
                    .ok_or(LoanError::InstallmentNotFound { id: row.id })?;
                *existing = row.clone();
            }
        }
    }

    Ok(())
}

impl LoanStore for InMemoryLoanStore {
    fn insert(&self, loan: &Loan) -> Result<()> {
        let mut aggregates = self.aggregates.write().map_err(|_| poisoned())?;
        if aggregates.contains_key(&loan.id) {
            return Err(LoanError::Store {
                message: format!("loan {} already exists", loan.id),
            });
        }
        aggregates.insert(loan.id, LoanAggregate::new(loan.clone(), Vec::new()));
        Ok(())
    }

    fn load(&self, loan_id: LoanId) -> Result<LoanAggregate> {
        let aggregates = self.aggregates.read().map_err(|_| poisoned())?;
        aggregates
            .get(&loan_id)
            .cloned()
            .ok_or(LoanError::LoanNotFound { id: loan_id })
    }

    fn loans_for_customer(&self, customer_id: UserId) -> Result<Vec<Loan>> {
        let aggregates = self.aggregates.read().map_err(|_| poisoned())?;
        let mut loans: Vec<Loan> = aggregates
            .values()
            .filter(|a| a.loan.customer_id == customer_id)
            .map(|a| a.loan.clone())
            .collect();

        // disbursed loans first by disbursement date, the rest by creation time
        loans.sort_by_key(|l| (l.disbursement_date.is_none(), l.disbursement_date, l.created_at));
        Ok(loans)
    }

    fn pending_loans(&self) -> Result<Vec<Loan>> {
        let aggregates = self.aggregates.read().map_err(|_| poisoned())?;
        let mut loans: Vec<Loan> = aggregates
            .values()
            .filter(|a| a.loan.approval_status == ApprovalStatus::Pending)
            .map(|a| a.loan.clone())
            .collect();
        loans.sort_by_key(|l| l.created_at);
        Ok(loans)
    }

    fn try_lease(&self, loan_id: LoanId) -> Result<LeaseToken> {
        {
            let aggregates = self.aggregates.read().map_err(|_| poisoned())?;
            if !aggregates.contains_key(&loan_id) {
                return Err(LoanError::LoanNotFound { id: loan_id });
            }
        }

        let mut leases = self.leases.lock().map_err(|_| poisoned())?;
        if leases.contains_key(&loan_id) {
            debug!(loan_id = %loan_id, "lease contended");
            return Err(LoanError::Conflict { id: loan_id });
        }

        let lease = LeaseToken::new(loan_id);
        leases.insert(loan_id, lease.token());
        Ok(lease)
    }

    fn commit(&self, lease: &LeaseToken, effects: &[Effect]) -> Result<()> {
        let loan_id = lease.loan_id();
        if !self.holds(lease)? {
            return Err(LoanError::Conflict { id: loan_id });
        }

        let mut aggregates = self.aggregates.write().map_err(|_| poisoned())?;
        let current = aggregates
            .get(&loan_id)
            .ok_or(LoanError::LoanNotFound { id: loan_id })?;

        // work on a copy so a bad effect leaves the stored aggregate untouched
        let mut next = current.clone();
        for effect in effects {
            apply_effect(&mut next, effect)?;
        }
        next.reorder();

        aggregates.insert(loan_id, next);
        debug!(loan_id = %loan_id, effects = effects.len(), "committed");
        Ok(())
    }

    fn release(&self, lease: &LeaseToken) {
        if let Ok(mut leases) = self.leases.lock() {
            if leases.get(&lease.loan_id()) == Some(&lease.token()) {
                leases.remove(&lease.loan_id());
            }
        }
    }
}
