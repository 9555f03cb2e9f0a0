use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::{LoanError, Result};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for an installment
pub type InstallmentId = Uuid;

/// unique identifier for a customer or staff member
pub type UserId = Uuid;

/// loan approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// application submitted, waiting for evaluation
    Pending,
    /// approved, disbursed and under repayment (or closed)
    Approved,
    /// rejected, never disbursed
    Rejected,
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Cancelled,
    /// settled ahead of time by an early payoff
    Prepaid,
}

/// evaluation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// status a loan ends up in after this decision
    pub fn resulting_status(self) -> ApprovalStatus {
        match self {
            Decision::Approve => ApprovalStatus::Approved,
            Decision::Reject => ApprovalStatus::Rejected,
        }
    }
}

impl TryFrom<ApprovalStatus> for Decision {
    type Error = LoanError;

    fn try_from(status: ApprovalStatus) -> Result<Self> {
        match status {
            ApprovalStatus::Approved => Ok(Decision::Approve),
            ApprovalStatus::Rejected => Ok(Decision::Reject),
            ApprovalStatus::Pending => Err(LoanError::Validation {
                message: "evaluation decision must be APPROVED or REJECTED".to_string(),
            }),
        }
    }
}

/// loan currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "INR")]
    Inr,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Inr => write!(f, "INR"),
        }
    }
}

/// Repayment frequency, stored as its interval code in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum RepaymentFrequency {
    /// every 7 days
    Weekly,
    /// every 14 days
    Fortnightly,
    /// same day of every calendar month (clamped to month end)
    Monthly,
}

impl RepaymentFrequency {
    pub fn code(self) -> u16 {
        match self {
            RepaymentFrequency::Weekly => 7,
            RepaymentFrequency::Fortnightly => 14,
            RepaymentFrequency::Monthly => 30,
        }
    }

    /// Due date of the `n`th installment counted from `start`.
    ///
    /// Fixed intervals are equivalent to chaining `start + interval` n times. Monthly
    /// dates are derived from `start` directly so a 31st does not drift to the 28th.
    pub fn due_date(self, start: DateTime<Utc>, n: u32) -> Result<DateTime<Utc>> {
        let due = match self {
            RepaymentFrequency::Weekly => {
                start.checked_add_signed(Duration::days(7 * i64::from(n)))
            }
            RepaymentFrequency::Fortnightly => {
                start.checked_add_signed(Duration::days(14 * i64::from(n)))
            }
            RepaymentFrequency::Monthly => start.checked_add_months(Months::new(n)),
        };
        due.ok_or_else(|| LoanError::InvalidConfiguration {
            message: format!("installment {} of a {:?} schedule is out of range", n, self),
        })
    }
}

impl TryFrom<u16> for RepaymentFrequency {
    type Error = LoanError;

    fn try_from(code: u16) -> Result<Self> {
        match code {
            7 => Ok(RepaymentFrequency::Weekly),
            14 => Ok(RepaymentFrequency::Fortnightly),
            30 => Ok(RepaymentFrequency::Monthly),
            other => Err(LoanError::InvalidConfiguration {
                message: format!("invalid recurrence frequency: {}", other),
            }),
        }
    }
}

impl From<RepaymentFrequency> for u16 {
    fn from(frequency: RepaymentFrequency) -> Self {
        frequency.code()
    }
}
