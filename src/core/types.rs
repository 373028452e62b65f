use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Compounding {
    /// Interest credited `n` times per year.
    Periodic(u32),
    Continuous,
}

impl Compounding {
    pub fn periods_per_year(self) -> Option<u32> {
        match self {
            Compounding::Periodic(n) => Some(n),
            Compounding::Continuous => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthBreakdown {
    pub final_amount: f64,
    pub total_interest: f64,
    pub total_contributions: f64,
}

/// Outcome of a growth projection. `Overflow` is a valid answer, not a
/// fault: the requested horizon pushes the future value past what an `f64`
/// can represent, and the caller is expected to render it as "too large".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "breakdown", rename_all = "camelCase")]
pub enum GrowthResult {
    Ok(GrowthBreakdown),
    Overflow,
}

impl GrowthResult {
    pub fn is_overflow(&self) -> bool {
        matches!(self, GrowthResult::Overflow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    /// 1-based payment number.
    pub payment_index: u32,
    pub starting_balance: f64,
    pub payment: f64,
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationResult {
    pub rows: Vec<AmortizationRow>,
    pub regular_payment: f64,
    pub total_paid: f64,
    pub total_interest_paid: f64,
    pub payment_count: u32,
}
