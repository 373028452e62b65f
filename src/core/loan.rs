use super::error::CalcError;
use super::types::{AmortizationResult, AmortizationRow};

// Balances below a cent are treated as paid off.
const BALANCE_EPSILON: f64 = 0.01;

/// Fixed periodic payment that fully amortizes `principal` over
/// `years * payments_per_year` payments. A non-positive principal means no
/// loan and short-circuits to a zero payment.
pub fn loan_payment(
    principal: f64,
    annual_rate: f64,
    years: f64,
    payments_per_year: u32,
) -> Result<f64, CalcError> {
    if !principal.is_finite() {
        return Err(CalcError::invalid("principal", "must be a finite number"));
    }
    if principal <= 0.0 {
        return Ok(0.0);
    }
    if !annual_rate.is_finite() || annual_rate < 0.0 {
        return Err(CalcError::invalid("annual rate", "cannot be negative"));
    }
    if !years.is_finite() || years <= 0.0 {
        return Err(CalcError::invalid("loan term", "must be positive"));
    }
    if payments_per_year == 0 {
        return Err(CalcError::invalid("payments per year", "must be positive"));
    }

    let num_payments = years * payments_per_year as f64;
    let periodic_rate = annual_rate / payments_per_year as f64;
    // A periodic rate below f64 resolution amortizes as straight-line.
    if periodic_rate == 0.0 || 1.0 + periodic_rate == 1.0 {
        return Ok(principal / num_payments);
    }

    Ok(principal * periodic_rate / (1.0 - (1.0 + periodic_rate).powf(-num_payments)))
}

/// Period-by-period payoff ledger for a loan, with an optional constant
/// extra payment on top of the regular one.
///
/// The schedule runs until the balance is paid down, capped at twice the
/// scheduled payment count. Exhausting the cap without reaching zero means
/// the payment does not cover accruing interest and is reported as
/// `CalcError::NonConvergence` rather than a truncated ledger.
pub fn amortization_schedule(
    principal: f64,
    annual_rate: f64,
    years: f64,
    payments_per_year: u32,
    extra_payment: f64,
) -> Result<AmortizationResult, CalcError> {
    if !extra_payment.is_finite() || extra_payment < 0.0 {
        return Err(CalcError::invalid("extra payment", "cannot be negative"));
    }
    if !principal.is_finite() {
        return Err(CalcError::invalid("principal", "must be a finite number"));
    }
    if principal <= 0.0 {
        return Ok(AmortizationResult {
            rows: Vec::new(),
            regular_payment: 0.0,
            total_paid: 0.0,
            total_interest_paid: 0.0,
            payment_count: 0,
        });
    }

    let mut regular_payment = loan_payment(principal, annual_rate, years, payments_per_year)?;
    if regular_payment == 0.0 {
        regular_payment = principal / (years * payments_per_year as f64);
    }

    let periodic_rate = annual_rate / payments_per_year as f64;
    let cap = (2.0 * years * payments_per_year as f64).ceil() as u32;

    let mut rows: Vec<AmortizationRow> = Vec::new();
    let mut balance = principal;
    let mut total_paid = 0.0;
    let mut total_interest_paid = 0.0;

    while balance > BALANCE_EPSILON && (rows.len() as u32) < cap {
        let interest_portion = balance * periodic_rate;
        let mut payment = regular_payment + extra_payment;
        let mut principal_portion = payment - interest_portion;

        // The last payment shrinks to whatever is left.
        if principal_portion > balance {
            principal_portion = balance;
            payment = principal_portion + interest_portion;
        }

        balance -= principal_portion;
        // Fold sub-cent residue (either sign) into the final principal
        // portion so the ledger closes at exactly zero.
        if balance.abs() <= BALANCE_EPSILON {
            principal_portion += balance;
            balance = 0.0;
        }

        rows.push(AmortizationRow {
            payment_index: rows.len() as u32 + 1,
            starting_balance: balance + principal_portion,
            payment,
            principal_portion,
            interest_portion,
            ending_balance: balance,
        });

        total_paid += payment;
        total_interest_paid += interest_portion;
    }

    if balance > BALANCE_EPSILON {
        return Err(CalcError::NonConvergence {
            payments_made: rows.len() as u32,
            remaining_balance: balance,
        });
    }

    Ok(AmortizationResult {
        payment_count: rows.len() as u32,
        regular_payment,
        total_paid,
        total_interest_paid,
        rows,
    })
}
