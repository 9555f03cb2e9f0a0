pub mod rebalance;
pub mod schedule;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};

pub use rebalance::{RebalanceEngine, RebalanceResult};
pub use schedule::ScheduleGenerator;

/// how an accepted repayment relates to the upcoming installment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaymentKind {
    /// exactly the upcoming installment
    Exact,
    /// more than the upcoming installment, remaining schedule must be redistributed
    Over,
}

/// balances a repayment is checked against
#[derive(Debug, Clone, Copy)]
pub struct RepaymentContext {
    pub amount_due: Money,
    /// amount of the earliest pending installment
    pub upcoming_amount: Money,
}

impl RepaymentContext {
    /// Validates `amount` in order: positive, within the balance, at least the upcoming
    /// installment.
    pub fn validate_payment(&self, amount: Money) -> Result<RepaymentKind> {
        if !amount.is_positive() {
            return Err(LoanError::InvalidPaymentAmount { amount });
        }

        if amount > self.amount_due {
            return Err(LoanError::ExcessPayment {
                amount_due: self.amount_due,
                provided: amount,
            });
        }

        if amount < self.upcoming_amount {
            return Err(LoanError::PaymentBelowMinimum {
                minimum: self.upcoming_amount,
                provided: amount,
            });
        }

        if amount == self.upcoming_amount {
            Ok(RepaymentKind::Exact)
        } else {
            Ok(RepaymentKind::Over)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RepaymentContext {
        RepaymentContext {
            amount_due: Money::from_major(100),
            upcoming_amount: Money::from_major(20),
        }
    }

    #[test]
    fn test_repayment_validation() {
        let context = context();

        assert!(matches!(
            context.validate_payment(Money::ZERO),
            Err(LoanError::InvalidPaymentAmount { .. })
        ));
        assert!(matches!(
            context.validate_payment(Money::from_major(-5)),
            Err(LoanError::InvalidPaymentAmount { .. })
        ));
        assert!(matches!(
            context.validate_payment(Money::from_major(10)),
            Err(LoanError::PaymentBelowMinimum { .. })
        ));
        assert!(matches!(
            context.validate_payment(Money::from_minor(10_001)),
            Err(LoanError::ExcessPayment { .. })
        ));

        assert_eq!(context.validate_payment(Money::from_major(20)).unwrap(), RepaymentKind::Exact);
        assert_eq!(context.validate_payment(Money::from_major(35)).unwrap(), RepaymentKind::Over);
        assert_eq!(context.validate_payment(Money::from_major(100)).unwrap(), RepaymentKind::Over);
    }

    #[test]
    fn test_excess_checked_before_minimum() {
        let context = RepaymentContext {
            amount_due: Money::from_major(5),
            upcoming_amount: Money::from_major(20),
        };
        assert!(matches!(
            context.validate_payment(Money::from_major(10)),
            Err(LoanError::ExcessPayment { .. })
        ));
    }
}
