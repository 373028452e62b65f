mod error;
mod growth;
mod loan;
mod types;

pub use error::CalcError;
pub use growth::{project_growth, project_growth_with_contributions};
pub use loan::{amortization_schedule, loan_payment};
pub use types::{AmortizationResult, AmortizationRow, Compounding, GrowthBreakdown, GrowthResult};
