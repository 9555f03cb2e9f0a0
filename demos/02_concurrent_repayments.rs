/// concurrent repayments - racing requests on one loan, the losers get a conflict
use std::thread;

use chrono::{DateTime, Utc};
use installment_ledger_rs::{
    telemetry, Clock, Decision, InMemoryDirectory, InMemoryLoanStore, LedgerConfig, LoanError,
    LoanService, LoanStore, Money, UserLevel, UserProfile, Uuid,
};

/// wall clock that can be shared between threads
struct WallClock;

impl Clock for WallClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();
    println!("=== concurrent repayments ===\n");

    let customer = Uuid::new_v4();
    let underwriter = Uuid::new_v4();
    let directory = InMemoryDirectory::new();
    directory.register(UserProfile::new(customer, "borrower", UserLevel::Regular))?;
    directory.register(UserProfile::new(underwriter, "underwriter", UserLevel::Admin))?;

    let service = LoanService::new(
        LedgerConfig::default(),
        InMemoryLoanStore::new(),
        directory,
        WallClock,
    )?;

    let loan = service.submit_application(customer, Money::from_major(1_000), 10)?;
    service.evaluate(loan.id, underwriter, Decision::Approve)?;

    // eight clients try to pay the same installment at once
    let outcomes: Vec<Result<Money, LoanError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = &service;
                scope.spawn(move || {
                    service
                        .apply_repayment(loan.id, customer, Money::from_major(100))
                        .map(|l| l.amount_due)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join().unwrap_or_else(|_| {
                    Err(LoanError::Store {
                        message: "worker panicked".to_string(),
                    })
                })
            })
            .collect()
    });

    for (n, outcome) in outcomes.iter().enumerate() {
        match outcome {
            Ok(due) => println!("client {}: accepted, due {}", n, due),
            Err(e) if e.is_retryable() => println!("client {}: {}", n, e),
            Err(e) => println!("client {}: failed: {}", n, e),
        }
    }

    // whatever the interleaving, the balance matches the pending installments
    let aggregate = service.store().load(loan.id)?;
    println!(
        "\namount due {} == pending total {}",
        aggregate.loan.amount_due,
        aggregate.pending_total()
    );

    Ok(())
}
