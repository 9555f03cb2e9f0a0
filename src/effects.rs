use serde::{Deserialize, Serialize};

use crate::loan::{Installment, Loan, LoanAggregate};

/// persistence operation produced by a domain transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// overwrite the loan record
    UpdateLoan(Loan),
    /// bulk insert of a freshly generated schedule
    InsertInstallments(Vec<Installment>),
    /// bulk update of existing installments
    UpdateInstallments(Vec<Installment>),
}

/// outcome of a pure domain operation: the new snapshot plus what to persist
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub aggregate: LoanAggregate,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn new(aggregate: LoanAggregate) -> Self {
        Self {
            aggregate,
            effects: Vec::new(),
        }
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// number of installment rows touched by this transition
    pub fn installments_touched(&self) -> usize {
        self.effects
            .iter()
            .map(|e| match e {
                Effect::UpdateLoan(_) => 0,
                Effect::InsertInstallments(rows) | Effect::UpdateInstallments(rows) => rows.len(),
            })
            .sum()
    }
}
