use tracing::debug;

use crate::config::LedgerConfig;
use crate::errors::{LoanError, Result};
use crate::loan::{Installment, Loan};
use crate::types::{ApprovalStatus, RepaymentFrequency};

/// builds the repayment schedule of a freshly approved loan
#[derive(Debug, Clone)]
pub struct ScheduleGenerator {
    enabled_frequencies: Vec<RepaymentFrequency>,
}

impl ScheduleGenerator {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            enabled_frequencies: config.enabled_frequencies.clone(),
        }
    }

    /// Splits the principal into `term` pending installments.
    ///
    /// Each installment is `principal / term` truncated to cents; the last one carries
    /// the remainder so the schedule adds up to the principal exactly. Due dates start
    /// one interval after disbursement.
    pub fn generate(&self, loan: &Loan) -> Result<Vec<Installment>> {
        if loan.approval_status != ApprovalStatus::Approved {
            return Err(LoanError::invariant(format!(
                "schedule requested for loan {} in status {:?}",
                loan.id, loan.approval_status
            )));
        }

        let start = loan.disbursement_date.ok_or_else(|| {
            LoanError::invariant(format!("loan {} has no disbursement date", loan.id))
        })?;

        if !self.enabled_frequencies.contains(&loan.repayment_frequency) {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "unsupported repayment frequency {:?}",
                    loan.repayment_frequency
                ),
            });
        }

        let term = u32::from(loan.term);
        let (installment, last) = loan.principal.split_evenly(term).ok_or_else(|| {
            LoanError::Validation {
                message: format!("loan {} has a term of 0", loan.id),
            }
        })?;

        let mut installments = Vec::with_capacity(term as usize);
        for n in 1..=term {
            let due_date = loan.repayment_frequency.due_date(start, n)?;
            let amount = if n == term { last } else { installment };
            installments.push(Installment::new(loan.id, n, amount, due_date));
        }

        debug!(
            loan_id = %loan.id,
            term,
            installment = %installment,
            last = %last,
            "generated repayment schedule"
        );

        Ok(installments)
    }
}
