pub mod college;
pub mod dividend;
pub mod growth;
pub mod hsa;
pub mod ira;
pub mod retirement;
pub mod retirement_401k;
pub mod savings_goal;
