use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{ApprovalStatus, LoanId, UserId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("user not found: {id}")]
    UserNotFound {
        id: UserId,
    },

    #[error("loan {id} is being modified by another request, retry later")]
    Conflict {
        id: LoanId,
    },

    #[error("invalid state: current {current:?}, expected {expected:?}")]
    InvalidState {
        current: ApprovalStatus,
        expected: ApprovalStatus,
    },

    #[error("trying to pay for an already closed loan")]
    LoanClosed,

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("trying to pay more than the due amount: due {amount_due}, provided {provided}")]
    ExcessPayment {
        amount_due: Money,
        provided: Money,
    },

    #[error("minimum acceptable amount is {minimum}")]
    PaymentBelowMinimum {
        minimum: Money,
        provided: Money,
    },

    #[error("user {evaluator} not permitted to evaluate their own loan")]
    SelfEvaluation {
        evaluator: UserId,
    },

    #[error("user {user} not permitted to {action}")]
    PermissionDenied {
        user: UserId,
        action: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invariant violated: {message}")]
    InvariantViolation {
        message: String,
    },

    #[error("unknown installment: {id}")]
    InstallmentNotFound {
        id: Uuid,
    },

    #[error("store failure: {message}")]
    Store {
        message: String,
    },
}

/// coarse classification of [`LoanError`] for callers mapping errors to responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// malformed or missing input
    Validation,
    /// unknown loan or identity
    NotFound,
    /// lease contention, safe to retry
    Conflict,
    /// operation not valid for the current lifecycle state
    State,
    /// request violates a lending rule
    BusinessRule,
    /// caller classification forbids the operation
    Permission,
    /// deployment configuration does not support the request
    Configuration,
    /// internal defect
    Invariant,
    /// backend failure
    Store,
}

impl LoanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanError::Validation { .. } | LoanError::InvalidPaymentAmount { .. } => {
                ErrorKind::Validation
            }
            LoanError::LoanNotFound { .. } | LoanError::UserNotFound { .. } => ErrorKind::NotFound,
            LoanError::Conflict { .. } => ErrorKind::Conflict,
            LoanError::InvalidState { .. } | LoanError::LoanClosed => ErrorKind::State,
            LoanError::ExcessPayment { .. }
            | LoanError::PaymentBelowMinimum { .. }
            | LoanError::SelfEvaluation { .. } => ErrorKind::BusinessRule,
            LoanError::PermissionDenied { .. } => ErrorKind::Permission,
            LoanError::InvalidConfiguration { .. } => ErrorKind::Configuration,
            LoanError::InvariantViolation { .. } | LoanError::InstallmentNotFound { .. } => {
                ErrorKind::Invariant
            }
            LoanError::Store { .. } => ErrorKind::Store,
        }
    }

    /// only lease contention is worth retrying; the core never retries on its own
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        LoanError::InvariantViolation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_stable() {
        let err = LoanError::PaymentBelowMinimum {
            minimum: Money::from_major(20),
            provided: Money::from_major(10),
        };
        assert_eq!(err.to_string(), "minimum acceptable amount is 20.00");
        assert_eq!(err.kind(), ErrorKind::BusinessRule);

        assert_eq!(
            LoanError::LoanClosed.to_string(),
            "trying to pay for an already closed loan"
        );
    }

    #[test]
    fn test_only_conflict_is_retryable() {
        let id = Uuid::new_v4();
        assert!(LoanError::Conflict { id }.is_retryable());
        assert!(!LoanError::LoanNotFound { id }.is_retryable());
        assert!(!LoanError::invariant("boom").is_retryable());
        assert_eq!(LoanError::invariant("boom").kind(), ErrorKind::Invariant);
    }
}
