use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: &'static str,
    },

    #[error(
        "schedule did not converge after {payments_made} payments; \
         {remaining_balance:.2} still outstanding (payment does not cover interest)"
    )]
    NonConvergence {
        payments_made: u32,
        remaining_balance: f64,
    },
}

impl CalcError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        CalcError::InvalidInput { field, reason }
    }
}
