pub mod affordability;
pub mod amortization;
pub mod apr;
pub mod auto_loan;
pub mod closing_costs;
pub mod heloc;
pub mod lease;
pub mod mortgage;
pub mod personal_loan;
pub mod refinance;
pub mod student_loan;
