use tracing::{info, instrument, warn};

use crate::clock::Clock;
use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::directory::Directory;
use crate::errors::{LoanError, Result};
use crate::evaluation::EvaluationStateMachine;
use crate::ledger::LoanLedger;
use crate::loan::{Installment, Loan};
use crate::payments::ScheduleGenerator;
use crate::store::{LeaseGuard, LoanStore};
use crate::types::{Decision, LoanId, UserId};

/// Entry point for every loan operation.
///
/// Mutations take the per-loan lease, load a snapshot, run the pure transition and
/// commit its effects in one unit. A held lease fails fast with `Conflict`; nothing
/// here retries.
pub struct LoanService<S, D, C> {
    config: LedgerConfig,
    generator: ScheduleGenerator,
    store: S,
    directory: D,
    clock: C,
}

impl<S, D, C> LoanService<S, D, C>
where
    S: LoanStore,
    D: Directory,
    C: Clock,
{
    pub fn new(config: LedgerConfig, store: S, directory: D, clock: C) -> Result<Self> {
        config.validate()?;
        let generator = ScheduleGenerator::new(&config);
        Ok(Self {
            config,
            generator,
            store,
            directory,
            clock,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// open a pending application for `customer_id`
    #[instrument(skip(self))]
    pub fn submit_application(
        &self,
        customer_id: UserId,
        principal: Money,
        term: u16,
    ) -> Result<Loan> {
        let customer = self.directory.lookup(customer_id)?;
        if !customer.can_apply() {
            warn!(customer = %customer_id, "banned user tried to apply");
            return Err(LoanError::PermissionDenied {
                user: customer_id,
                action: "apply for a loan".to_string(),
            });
        }

        let loan = Loan::apply(customer_id, principal, term, &self.config, self.clock.now())?;
        self.store.insert(&loan)?;

        info!(loan_id = %loan.id, term, "application submitted");
        Ok(loan)
    }

    /// approve or reject a pending application; staff only
    #[instrument(skip(self))]
    pub fn evaluate(
        &self,
        loan_id: LoanId,
        evaluator_id: UserId,
        decision: Decision,
    ) -> Result<Loan> {
        let evaluator = self.directory.lookup(evaluator_id)?;
        if !evaluator.can_manage_loans() {
            return Err(LoanError::PermissionDenied {
                user: evaluator_id,
                action: "evaluate loans".to_string(),
            });
        }

        let guard = LeaseGuard::acquire(&self.store, loan_id)?;
        let aggregate = self.store.load(loan_id)?;

        let transition = EvaluationStateMachine::new(&self.generator).evaluate(
            &aggregate,
            evaluator_id,
            decision,
            self.clock.now(),
        )?;
        guard.commit(&transition.effects)?;

        Ok(transition.aggregate.loan)
    }

    /// apply a repayment made by `payer_id` and return the updated loan
    #[instrument(skip(self))]
    pub fn apply_repayment(
        &self,
        loan_id: LoanId,
        payer_id: UserId,
        amount: Money,
    ) -> Result<Loan> {
        let guard = LeaseGuard::acquire(&self.store, loan_id)?;
        let aggregate = self.store.load(loan_id)?;

        // other customers' loans do not exist as far as the payer is concerned
        if aggregate.loan.customer_id != payer_id {
            return Err(LoanError::LoanNotFound { id: loan_id });
        }

        let transition = LoanLedger::apply_repayment(&aggregate, amount, self.clock.now())?;
        guard.commit(&transition.effects)?;

        Ok(transition.aggregate.loan)
    }

    /// installments in due order, prepaid ones left out
    pub fn get_schedule(&self, loan_id: LoanId) -> Result<Vec<Installment>> {
        Ok(self.store.load(loan_id)?.schedule())
    }

    pub fn get_loan(&self, loan_id: LoanId, customer_id: UserId) -> Result<Loan> {
        let aggregate = self.store.load(loan_id)?;
        if aggregate.loan.customer_id != customer_id {
            return Err(LoanError::LoanNotFound { id: loan_id });
        }
        Ok(aggregate.loan)
    }

    pub fn list_customer_loans(&self, customer_id: UserId) -> Result<Vec<Loan>> {
        self.store.loans_for_customer(customer_id)
    }

    /// applications awaiting a decision, oldest first; staff only
    pub fn list_pending_loans(&self, evaluator_id: UserId) -> Result<Vec<Loan>> {
        let evaluator = self.directory.lookup(evaluator_id)?;
        if !evaluator.can_manage_loans() {
            return Err(LoanError::PermissionDenied {
                user: evaluator_id,
                action: "review pending loans".to_string(),
            });
        }
        self.store.pending_loans()
    }
}
