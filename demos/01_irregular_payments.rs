/// irregular payments - over payments rebalance the rest of the schedule
use chrono::{Duration, TimeZone, Utc};
use installment_ledger_rs::{
    telemetry, Decision, InMemoryDirectory, InMemoryLoanStore, LedgerConfig, LoanError,
    LoanService, Money, SafeTimeProvider, TimeSource, UserLevel, UserProfile, Uuid,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();
    println!("=== irregular payments ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let customer = Uuid::new_v4();
    let underwriter = Uuid::new_v4();
    let directory = InMemoryDirectory::new();
    directory.register(UserProfile::new(customer, "borrower", UserLevel::Regular))?;
    directory.register(UserProfile::new(underwriter, "underwriter", UserLevel::Admin))?;

    let service = LoanService::new(
        LedgerConfig::default(),
        InMemoryLoanStore::new(),
        directory,
        &time,
    )?;

    let loan = service.submit_application(customer, Money::from_major(100), 5)?;
    service.evaluate(loan.id, underwriter, Decision::Approve)?;
    println!("approved on {}", time.now().format("%Y-%m-%d"));
    print_schedule(&service, loan.id)?;

    // week one: pay 35 instead of 20
    controller.advance(Duration::days(7));
    let updated = service.apply_repayment(loan.id, customer, Money::from_decimal(dec!(35)))?;
    println!("\npaid 35.00 on {}, due {}", time.now().format("%Y-%m-%d"), updated.amount_due);
    print_schedule(&service, loan.id)?;

    // too little is turned away without touching the loan
    controller.advance(Duration::days(7));
    match service.apply_repayment(loan.id, customer, Money::from_decimal(dec!(10))) {
        Err(LoanError::PaymentBelowMinimum { minimum, .. }) => {
            println!("\nrejected 10.00, minimum is {}", minimum)
        }
        other => println!("\nunexpected: {:?}", other),
    }

    // clear the rest in one go
    let updated = service.apply_repayment(loan.id, customer, Money::from_decimal(dec!(65)))?;
    println!(
        "\npaid 65.00 on {}, due {}, closed {}",
        time.now().format("%Y-%m-%d"),
        updated.amount_due,
        updated.is_closed()
    );
    print_schedule(&service, loan.id)?;

    Ok(())
}

fn print_schedule(
    service: &LoanService<InMemoryLoanStore, InMemoryDirectory, &SafeTimeProvider>,
    loan_id: Uuid,
) -> Result<(), Box<dyn std::error::Error>> {
    for installment in service.get_schedule(loan_id)? {
        println!(
            "  #{} {} {:>8} {:?}",
            installment.sequence,
            installment.due_date.format("%Y-%m-%d"),
            installment.amount.to_string(),
            installment.status
        );
    }
    Ok(())
}
