use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{
    ApprovalStatus, Currency, InstallmentId, InstallmentStatus, LoanId, RepaymentFrequency,
    UserId,
};

/// loan record, the aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub customer_id: UserId,
    /// staff member who approved or rejected the application
    pub evaluated_by: Option<UserId>,

    pub principal: Money,
    /// what is left to be repaid; zero until approval
    pub amount_due: Money,
    pub currency: Currency,

    pub term: u16,
    pub repayment_frequency: RepaymentFrequency,

    // lifecycle checkpoints
    pub created_at: DateTime<Utc>,
    pub evaluation_date: Option<DateTime<Utc>>,
    pub disbursement_date: Option<DateTime<Utc>>,
    pub closure_date: Option<DateTime<Utc>>,

    pub approval_status: ApprovalStatus,
}

impl Loan {
    /// create a pending application after checking the requested terms
    pub fn apply(
        customer_id: UserId,
        principal: Money,
        term: u16,
        config: &LedgerConfig,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        config.validate_terms(principal, term)?;

        Ok(Self {
            id: Uuid::new_v4(),
            customer_id,
            evaluated_by: None,
            principal,
            amount_due: Money::ZERO,
            currency: config.currency,
            term,
            repayment_frequency: config.default_frequency,
            created_at: now,
            evaluation_date: None,
            disbursement_date: None,
            closure_date: None,
            approval_status: ApprovalStatus::Pending,
        })
    }

    pub fn has_been_paid_back(&self) -> bool {
        self.amount_due.is_zero()
    }

    pub fn is_closed(&self) -> bool {
        self.closure_date.is_some()
    }
}

/// scheduled repayment belonging to a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    /// creation order within the schedule, breaks due date ties
    pub sequence: u32,
    pub amount: Money,
    pub due_date: DateTime<Utc>,
    pub repayment_date: Option<DateTime<Utc>>,
    pub status: InstallmentStatus,
    /// external payment request raised to collect this installment
    pub payment_request_id: Option<String>,
}

impl Installment {
    pub fn new(loan_id: LoanId, sequence: u32, amount: Money, due_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            sequence,
            amount,
            due_date,
            repayment_date: None,
            status: InstallmentStatus::Pending,
            payment_request_id: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == InstallmentStatus::Pending
    }

    /// settle this installment, recording what was actually collected
    pub fn mark_paid(&mut self, amount: Money, now: DateTime<Utc>) {
        self.amount = amount;
        self.status = InstallmentStatus::Paid;
        self.repayment_date = Some(now);
    }
}

/// Snapshot of a loan together with every installment it owns.
///
/// Installments are kept ordered by due date, then sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAggregate {
    pub loan: Loan,
    pub installments: Vec<Installment>,
}

impl LoanAggregate {
    pub fn new(loan: Loan, mut installments: Vec<Installment>) -> Self {
        sort_installments(&mut installments);
        Self { loan, installments }
    }

    pub fn id(&self) -> LoanId {
        self.loan.id
    }

    /// earliest pending installment, none once the loan is paid back
    pub fn upcoming_installment(&self) -> Option<&Installment> {
        if self.loan.has_been_paid_back() {
            return None;
        }
        self.installments.iter().find(|i| i.is_pending())
    }

    pub fn pending_installments(&self) -> impl Iterator<Item = &Installment> {
        self.installments.iter().filter(|i| i.is_pending())
    }

    pub fn pending_total(&self) -> Money {
        self.pending_installments().map(|i| i.amount).sum()
    }

    /// repayment schedule as shown to customers, prepaid entries hidden
    pub fn schedule(&self) -> Vec<Installment> {
        self.installments
            .iter()
            .filter(|i| i.status != InstallmentStatus::Prepaid)
            .cloned()
            .collect()
    }

    /// restore installment order after edits
    pub fn reorder(&mut self) {
        sort_installments(&mut self.installments);
    }

    /// Checks the balance invariant for the loan's current status.
    ///
    /// Pending and rejected loans owe nothing. Approved loans owe exactly the sum of
    /// their pending installments, and are closed exactly when that sum is zero.
    pub fn check_balance_invariant(&self) -> Result<()> {
        let loan = &self.loan;
        match loan.approval_status {
            ApprovalStatus::Pending | ApprovalStatus::Rejected => {
                if !loan.amount_due.is_zero() || !self.installments.is_empty() {
                    return Err(LoanError::invariant(format!(
                        "loan {} is {:?} but owes {} across {} installments",
                        loan.id,
                        loan.approval_status,
                        loan.amount_due,
                        self.installments.len()
                    )));
                }
            }
            ApprovalStatus::Approved => {
                let pending = self.pending_total();
                if pending != loan.amount_due {
                    return Err(LoanError::invariant(format!(
                        "loan {} amount due {} does not match pending installments {}",
                        loan.id, loan.amount_due, pending
                    )));
                }
                if loan.amount_due.is_negative() {
                    return Err(LoanError::invariant(format!(
                        "loan {} amount due is negative: {}",
                        loan.id, loan.amount_due
                    )));
                }
                if loan.amount_due.is_zero() != loan.is_closed() {
                    return Err(LoanError::invariant(format!(
                        "loan {} amount due {} disagrees with closure date {:?}",
                        loan.id, loan.amount_due, loan.closure_date
                    )));
                }
            }
        }
        Ok(())
    }
}

fn sort_installments(installments: &mut [Installment]) {
    installments.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.sequence.cmp(&b.sequence))
    });
}
