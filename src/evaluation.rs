use chrono::{DateTime, Utc};
use tracing::info;

use crate::effects::{Effect, Transition};
use crate::errors::{LoanError, Result};
use crate::loan::LoanAggregate;
use crate::payments::ScheduleGenerator;
use crate::types::{ApprovalStatus, Decision, UserId};

/// moves a pending application to approved or rejected
pub struct EvaluationStateMachine<'a> {
    generator: &'a ScheduleGenerator,
}

impl<'a> EvaluationStateMachine<'a> {
    pub fn new(generator: &'a ScheduleGenerator) -> Self {
        Self { generator }
    }

    /// Records `decision` on a pending loan.
    ///
    /// Approval disburses immediately: the whole principal becomes due and the
    /// repayment schedule is generated in the same transition.
    pub fn evaluate(
        &self,
        aggregate: &LoanAggregate,
        evaluator: UserId,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        let loan = &aggregate.loan;

        if loan.approval_status != ApprovalStatus::Pending {
            return Err(LoanError::InvalidState {
                current: loan.approval_status,
                expected: ApprovalStatus::Pending,
            });
        }

        if evaluator == loan.customer_id {
            return Err(LoanError::SelfEvaluation { evaluator });
        }

        let mut next = aggregate.clone();
        next.loan.evaluated_by = Some(evaluator);
        next.loan.evaluation_date = Some(now);
        next.loan.approval_status = decision.resulting_status();

        let mut schedule = None;
        if decision == Decision::Approve {
            // disbursal happens on approval for now
            next.loan.disbursement_date = Some(now);
            next.loan.amount_due = next.loan.principal;

            let installments = self.generator.generate(&next.loan)?;
            next.installments = installments.clone();
            next.reorder();
            schedule = Some(installments);
        }

        next.check_balance_invariant()?;

        info!(
            loan_id = %loan.id,
            evaluator = %evaluator,
            decision = ?decision,
            "loan evaluated"
        );

        let mut transition = Transition::new(next);
        transition.push(Effect::UpdateLoan(transition.aggregate.loan.clone()));
        if let Some(installments) = schedule {
            transition.push(Effect::InsertInstallments(installments));
        }
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::decimal::Money;
    use crate::loan::Loan;
    use crate::types::{InstallmentStatus, RepaymentFrequency};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn pending(config: &LedgerConfig) -> LoanAggregate {
        let loan = Loan::apply(Uuid::new_v4(), Money::from_major(100), 5, config, now()).unwrap();
        LoanAggregate::new(loan, Vec::new())
    }

    #[test]
    fn test_approve_generates_schedule() {
        let config = LedgerConfig::default();
        let generator = ScheduleGenerator::new(&config);
        let aggregate = pending(&config);
        let evaluator = Uuid::new_v4();

        let transition = EvaluationStateMachine::new(&generator)
            .evaluate(&aggregate, evaluator, Decision::Approve, now())
            .unwrap();
        let loan = &transition.aggregate.loan;

        assert_eq!(loan.approval_status, ApprovalStatus::Approved);
        assert_eq!(loan.amount_due, loan.principal);
        assert_eq!(loan.evaluated_by, Some(evaluator));
        assert_eq!(loan.evaluation_date, Some(now()));
        assert_eq!(loan.disbursement_date, loan.evaluation_date);
        assert_eq!(transition.aggregate.installments.len(), 5);
        assert!(transition
            .aggregate
            .installments
            .iter()
            .all(|i| i.status == InstallmentStatus::Pending && i.amount == Money::from_major(20)));
        assert_eq!(transition.effects.len(), 2);
        assert!(matches!(
            transition.effects[1],
            Effect::InsertInstallments(ref rows) if rows.len() == 5
        ));
    }

    #[test]
    fn test_reject_leaves_nothing_due() {
        let config = LedgerConfig::default();
        let generator = ScheduleGenerator::new(&config);
        let aggregate = pending(&config);

        let transition = EvaluationStateMachine::new(&generator)
            .evaluate(&aggregate, Uuid::new_v4(), Decision::Reject, now())
            .unwrap();
        let loan = &transition.aggregate.loan;

        assert_eq!(loan.approval_status, ApprovalStatus::Rejected);
        assert_eq!(loan.amount_due, Money::ZERO);
        assert!(loan.disbursement_date.is_none());
        assert!(transition.aggregate.installments.is_empty());
        assert_eq!(transition.effects.len(), 1);
    }

    #[test]
    fn test_cannot_evaluate_twice() {
        let config = LedgerConfig::default();
        let generator = ScheduleGenerator::new(&config);
        let machine = EvaluationStateMachine::new(&generator);
        let aggregate = pending(&config);

        let approved = machine
            .evaluate(&aggregate, Uuid::new_v4(), Decision::Approve, now())
            .unwrap()
            .aggregate;

        let err = machine
            .evaluate(&approved, Uuid::new_v4(), Decision::Reject, now())
            .unwrap_err();
        assert_eq!(
            err,
            LoanError::InvalidState {
                current: ApprovalStatus::Approved,
                expected: ApprovalStatus::Pending,
            }
        );
    }

    #[test]
    fn test_self_evaluation_rejected() {
        let config = LedgerConfig::default();
        let generator = ScheduleGenerator::new(&config);
        let aggregate = pending(&config);
        let customer = aggregate.loan.customer_id;

        let err = EvaluationStateMachine::new(&generator)
            .evaluate(&aggregate, customer, Decision::Approve, now())
            .unwrap_err();
        assert_eq!(err, LoanError::SelfEvaluation { evaluator: customer });
    }

    #[test]
    fn test_unsupported_frequency_fails_approval() {
        let config = LedgerConfig::default();
        let generator = ScheduleGenerator::new(&config);
        let mut aggregate = pending(&config);
        aggregate.loan.repayment_frequency = RepaymentFrequency::Fortnightly;

        let err = EvaluationStateMachine::new(&generator)
            .evaluate(&aggregate, Uuid::new_v4(), Decision::Approve, now())
            .unwrap_err();
        assert!(matches!(err, LoanError::InvalidConfiguration { .. }));
        assert_eq!(aggregate.loan.approval_status, ApprovalStatus::Pending);
    }
}
