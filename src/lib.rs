pub mod clock;
pub mod config;
pub mod decimal;
pub mod directory;
pub mod effects;
pub mod errors;
pub mod evaluation;
pub mod ledger;
pub mod loan;
pub mod payments;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod types;

// re-export key types
pub use clock::Clock;
pub use config::LedgerConfig;
pub use decimal::Money;
pub use directory::{Directory, InMemoryDirectory, UserLevel, UserProfile};
pub use effects::{Effect, Transition};
pub use errors::{ErrorKind, LoanError, Result};
pub use evaluation::EvaluationStateMachine;
pub use ledger::LoanLedger;
pub use loan::{Installment, Loan, LoanAggregate};
pub use payments::{RebalanceEngine, RebalanceResult, RepaymentKind, ScheduleGenerator};
pub use service::LoanService;
pub use store::{InMemoryLoanStore, LeaseGuard, LeaseToken, LoanStore};
pub use types::{
    ApprovalStatus, Currency, Decision, InstallmentId, InstallmentStatus, LoanId,
    RepaymentFrequency, UserId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
