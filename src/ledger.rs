use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::decimal::Money;
use crate::effects::{Effect, Transition};
use crate::errors::{LoanError, Result};
use crate::loan::LoanAggregate;
use crate::payments::{RebalanceEngine, RepaymentContext, RepaymentKind};
use crate::types::{ApprovalStatus, InstallmentStatus};

/// applies repayments to a loan snapshot
pub struct LoanLedger;

impl LoanLedger {
    /// Applies `amount` against the upcoming installment of `aggregate`.
    ///
    /// The snapshot passed in is never modified; on success the returned transition holds
    /// the new snapshot and the rows to persist. An exact payment settles the upcoming
    /// installment. A larger payment settles it at the amount collected and spreads the
    /// remaining balance over the pending installments, or marks them prepaid when the
    /// balance is cleared. The loan closes when nothing is left due.
    pub fn apply_repayment(
        aggregate: &LoanAggregate,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        let loan = &aggregate.loan;

        if loan.approval_status != ApprovalStatus::Approved {
            return Err(LoanError::InvalidState {
                current: loan.approval_status,
                expected: ApprovalStatus::Approved,
            });
        }

        if loan.has_been_paid_back() {
            return Err(LoanError::LoanClosed);
        }

        // an open balance always has a pending installment behind it
        let upcoming = aggregate.upcoming_installment().ok_or_else(|| {
            LoanError::invariant(format!(
                "loan {} owes {} but has no pending installment",
                loan.id, loan.amount_due
            ))
        })?;

        let context = RepaymentContext {
            amount_due: loan.amount_due,
            upcoming_amount: upcoming.amount,
        };
        let kind = context.validate_payment(amount)?;
        let upcoming_id = upcoming.id;

        let mut next = aggregate.clone();
        let position = next
            .installments
            .iter()
            .position(|i| i.id == upcoming_id)
            .ok_or(LoanError::InstallmentNotFound { id: upcoming_id })?;

        next.installments[position].mark_paid(amount, now);
        next.loan.amount_due -= amount;
        let mut updated = vec![next.installments[position].clone()];

        match kind {
            RepaymentKind::Exact => {}
            RepaymentKind::Over if next.loan.amount_due.is_zero() => {
                for installment in next.installments.iter_mut().filter(|i| i.is_pending()) {
                    installment.status = InstallmentStatus::Prepaid;
                    installment.repayment_date = Some(now);
                    updated.push(installment.clone());
                }
                debug!(loan_id = %loan.id, prepaid = updated.len() - 1, "early payoff");
            }
            RepaymentKind::Over => {
                let result =
                    RebalanceEngine::rebalance(next.loan.amount_due, &mut next.installments)?;
                updated.extend(result.updated);
            }
        }

        if next.loan.amount_due.is_zero() {
            next.loan.closure_date = Some(now);
            info!(loan_id = %loan.id, "loan fully repaid");
        }

        next.check_balance_invariant()?;

        info!(
            loan_id = %loan.id,
            amount = %amount,
            amount_due = %next.loan.amount_due,
            kind = ?kind,
            "repayment applied"
        );

        let mut transition = Transition::new(next);
        transition.push(Effect::UpdateLoan(transition.aggregate.loan.clone()));
        transition.push(Effect::UpdateInstallments(updated));
        Ok(transition)
    }
}
