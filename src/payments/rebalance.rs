use tracing::debug;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::loan::Installment;

/// outcome of redistributing the balance over pending installments
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceResult {
    pub pending_count: u32,
    /// amount now carried by every pending installment but the last
    pub installment_amount: Money,
    pub last_amount: Money,
    /// pending installments after the rewrite, in schedule order
    pub updated: Vec<Installment>,
}

/// recomputes pending installment amounts after an irregular payment
pub struct RebalanceEngine;

impl RebalanceEngine {
    /// Spreads `amount_due` over the pending installments in `installments`.
    ///
    /// `installments` must already be in schedule order. Every pending installment gets
    /// `amount_due / n` truncated to cents, the last pending one takes the remainder.
    /// Only installment amounts change; statuses and dates are left alone.
    pub fn rebalance(
        amount_due: Money,
        installments: &mut [Installment],
    ) -> Result<RebalanceResult> {
        if !amount_due.is_positive() {
            return Err(LoanError::invariant(format!(
                "rebalance requested with nothing due ({})",
                amount_due
            )));
        }

        let pending = installments.iter().filter(|i| i.is_pending()).count();
        let pending_count = u32::try_from(pending)
            .map_err(|_| LoanError::invariant(format!("{} pending installments", pending)))?;

        let (installment_amount, last_amount) =
            amount_due.split_evenly(pending_count).ok_or_else(|| {
                LoanError::invariant(format!(
                    "rebalance requested for {} due with no pending installments",
                    amount_due
                ))
            })?;

        if installment_amount.is_negative() || last_amount.is_negative() {
            return Err(LoanError::invariant(format!(
                "rebalance of {} over {} installments produced negative amounts",
                amount_due, pending_count
            )));
        }

        let mut updated = Vec::with_capacity(pending);
        for (idx, installment) in installments
            .iter_mut()
            .filter(|i| i.is_pending())
            .enumerate()
        {
            installment.amount = if idx + 1 == pending {
                last_amount
            } else {
                installment_amount
            };
            updated.push(installment.clone());
        }

        debug!(
            pending_count,
            installment_amount = %installment_amount,
            last_amount = %last_amount,
            "rebalanced pending installments"
        );

        Ok(RebalanceResult {
            pending_count,
            installment_amount,
            last_amount,
            updated,
        })
    }
}
