/// quick start - apply, approve and repay a weekly loan
use installment_ledger_rs::{
    telemetry, Decision, InMemoryDirectory, InMemoryLoanStore, LedgerConfig, LoanService, Money,
    SafeTimeProvider, TimeSource, UserLevel, UserProfile, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    // one borrower and one underwriter
    let customer = Uuid::new_v4();
    let underwriter = Uuid::new_v4();
    let directory = InMemoryDirectory::new();
    directory.register(UserProfile::new(customer, "borrower", UserLevel::Regular))?;
    directory.register(UserProfile::new(underwriter, "underwriter", UserLevel::Admin))?;

    let service = LoanService::new(
        LedgerConfig::default(),
        InMemoryLoanStore::new(),
        directory,
        SafeTimeProvider::new(TimeSource::System),
    )?;

    // 100.00 over 7 weekly installments
    let loan = service.submit_application(customer, Money::from_major(100), 7)?;
    service.evaluate(loan.id, underwriter, Decision::Approve)?;

    for installment in service.get_schedule(loan.id)? {
        println!(
            "#{} due {} amount {}",
            installment.sequence,
            installment.due_date.format("%Y-%m-%d"),
            installment.amount
        );
    }

    // pay the first installment
    let loan = service.apply_repayment(loan.id, customer, "14.28".parse()?)?;
    println!("\namount due after first payment: {}", loan.amount_due);

    Ok(())
}
