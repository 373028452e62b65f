use super::error::CalcError;
use super::types::{Compounding, GrowthBreakdown, GrowthResult};

// ln(f64::MAX) is about 709.78; the cutoff stays a little short of it so
// summing the principal and annuity terms cannot round past the finite range.
const MAX_RESULT_LN: f64 = 700.0;

/// Future value of a lump sum under periodic or continuous compounding.
pub fn project_growth(
    principal: f64,
    rate: f64,
    years: f64,
    compounding: Compounding,
) -> Result<GrowthResult, CalcError> {
    validate_growth_inputs(principal, rate, years, compounding)?;

    let Some(final_amount) = principal_future_value(principal, rate, years, compounding) else {
        return Ok(GrowthResult::Overflow);
    };

    Ok(GrowthResult::Ok(GrowthBreakdown {
        final_amount,
        total_interest: (final_amount - principal).max(0.0),
        total_contributions: 0.0,
    }))
}

/// Future value of a lump sum plus a stream of periodic contributions.
///
/// `contribution_frequency` is how many times per year the contribution is
/// made and may differ from the compounding frequency; under periodic
/// compounding the annual contribution total is spread evenly across
/// compounding periods before the ordinary-annuity formula is applied.
pub fn project_growth_with_contributions(
    principal: f64,
    rate: f64,
    years: f64,
    compounding: Compounding,
    contribution_amount: f64,
    contribution_frequency: u32,
) -> Result<GrowthResult, CalcError> {
    validate_growth_inputs(principal, rate, years, compounding)?;
    require_non_negative("contribution amount", contribution_amount)?;

    let Some(principal_term) = principal_future_value(principal, rate, years, compounding) else {
        return Ok(GrowthResult::Overflow);
    };
    let Some(annuity_term) =
        contribution_future_value(rate, years, compounding, contribution_amount, contribution_frequency)
    else {
        return Ok(GrowthResult::Overflow);
    };

    let final_amount = principal_term + annuity_term;
    if !final_amount.is_finite() {
        return Ok(GrowthResult::Overflow);
    }

    // Totals are stated in the caller's original frequency, not the
    // per-compounding-period amount the annuity formula works in.
    let total_contributions = contribution_amount * contribution_frequency as f64 * years;
    Ok(GrowthResult::Ok(GrowthBreakdown {
        final_amount,
        total_interest: (final_amount - principal - total_contributions).max(0.0),
        total_contributions,
    }))
}

fn validate_growth_inputs(
    principal: f64,
    rate: f64,
    years: f64,
    compounding: Compounding,
) -> Result<(), CalcError> {
    require_non_negative("principal", principal)?;
    require_non_negative("annual rate", rate)?;
    require_non_negative("years", years)?;
    if compounding == Compounding::Periodic(0) {
        return Err(CalcError::invalid(
            "compounding",
            "periods per year must be positive",
        ));
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), CalcError> {
    if !value.is_finite() {
        return Err(CalcError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(CalcError::invalid(field, "cannot be negative"));
    }
    Ok(())
}

// None means the result would exceed the finite f64 range.
fn principal_future_value(
    principal: f64,
    rate: f64,
    years: f64,
    compounding: Compounding,
) -> Option<f64> {
    if principal == 0.0 {
        return Some(0.0);
    }
    if rate == 0.0 || years == 0.0 {
        return Some(principal);
    }

    match compounding {
        Compounding::Continuous => {
            let rt = rate * years;
            if principal.ln() + rt > MAX_RESULT_LN {
                return None;
            }
            Some(principal * rt.exp())
        }
        Compounding::Periodic(n) => {
            let base = 1.0 + rate / n as f64;
            // A periodic rate below f64 resolution behaves as zero.
            if base == 1.0 {
                return Some(principal);
            }
            let exponent = n as f64 * years;
            if principal.ln() + exponent * base.ln() > MAX_RESULT_LN {
                return None;
            }
            Some(principal * base.powf(exponent))
        }
    }
}

fn contribution_future_value(
    rate: f64,
    years: f64,
    compounding: Compounding,
    amount: f64,
    frequency: u32,
) -> Option<f64> {
    if amount == 0.0 || frequency == 0 || years == 0.0 {
        return Some(0.0);
    }

    let annual = amount * frequency as f64;
    match compounding {
        Compounding::Continuous => {
            if rate == 0.0 {
                return Some(annual * years);
            }
            let rt = rate * years;
            if (annual / rate).ln() + rt > MAX_RESULT_LN {
                return None;
            }
            Some(annual * (rt.exp() - 1.0) / rate)
        }
        Compounding::Periodic(n) => {
            let per_period = annual / n as f64;
            let periods = n as f64 * years;
            let periodic_rate = rate / n as f64;
            let base = 1.0 + periodic_rate;
            // A periodic rate below f64 resolution behaves as zero.
            if periodic_rate == 0.0 || base == 1.0 {
                return Some(per_period * periods);
            }
            if (per_period / periodic_rate).ln() + periods * base.ln() > MAX_RESULT_LN {
                return None;
            }
            Some(per_period * (base.powf(periods) - 1.0) / periodic_rate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn breakdown(result: GrowthResult) -> GrowthBreakdown {
        match result {
            GrowthResult::Ok(b) => b,
            GrowthResult::Overflow => panic!("unexpected overflow"),
        }
    }

    #[test]
    fn monthly_compounding_matches_reference_value() {
        let result = project_growth(1000.0, 0.05, 10.0, Compounding::Periodic(12)).unwrap();
        let b = breakdown(result);
        assert_close(b.final_amount, 1647.01, 0.01);
        assert_close(b.total_interest, 647.01, 0.01);
        assert_close(b.total_contributions, 0.0, 1e-12);
    }

    #[test]
    fn continuous_compounding_matches_reference_value() {
        let result = project_growth(1000.0, 0.05, 10.0, Compounding::Continuous).unwrap();
        assert_close(breakdown(result).final_amount, 1648.72, 0.01);
    }

    #[test]
    fn periodic_compounding_approaches_continuous_as_n_grows() {
        let continuous = breakdown(
            project_growth(1000.0, 0.05, 10.0, Compounding::Continuous).unwrap(),
        );
        let coarse = breakdown(
            project_growth(1000.0, 0.05, 10.0, Compounding::Periodic(12)).unwrap(),
        );
        let fine = breakdown(
            project_growth(1000.0, 0.05, 10.0, Compounding::Periodic(100_000)).unwrap(),
        );

        let coarse_gap = (coarse.final_amount - continuous.final_amount).abs();
        let fine_gap = (fine.final_amount - continuous.final_amount).abs();
        assert!(fine_gap < coarse_gap);
        assert_close(fine.final_amount, continuous.final_amount, 0.01);
    }

    #[test]
    fn zero_rate_earns_exactly_zero_interest() {
        let b = breakdown(project_growth(5000.0, 0.0, 25.0, Compounding::Periodic(12)).unwrap());
        assert_close(b.final_amount, 5000.0, 1e-12);
        assert_eq!(b.total_interest, 0.0);
    }

    #[test]
    fn zero_rate_with_contributions_earns_exactly_zero_interest() {
        let b = breakdown(
            project_growth_with_contributions(1000.0, 0.0, 10.0, Compounding::Periodic(12), 100.0, 12)
                .unwrap(),
        );
        assert_close(b.final_amount, 1000.0 + 100.0 * 12.0 * 10.0, 1e-9);
        assert_eq!(b.total_interest, 0.0);
        assert_close(b.total_contributions, 12_000.0, 1e-9);
    }

    #[test]
    fn monthly_contributions_match_ordinary_annuity_value() {
        // 100/month at 5% over 10 years, monthly compounding:
        // 100 * ((1 + 0.05/12)^120 - 1) / (0.05/12) = 15_528.23
        let b = breakdown(
            project_growth_with_contributions(1000.0, 0.05, 10.0, Compounding::Periodic(12), 100.0, 12)
                .unwrap(),
        );
        assert_close(b.final_amount, 1647.01 + 15_528.23, 0.02);
        assert_close(b.total_contributions, 12_000.0, 1e-9);
        assert_close(b.total_interest, b.final_amount - 1000.0 - 12_000.0, 1e-9);
    }

    #[test]
    fn mismatched_contribution_frequency_spreads_evenly() {
        // 1200 once a year is folded into 100 per monthly compounding period,
        // so the future value matches the 100/month case above.
        let annual = breakdown(
            project_growth_with_contributions(1000.0, 0.05, 10.0, Compounding::Periodic(12), 1200.0, 1)
                .unwrap(),
        );
        let monthly = breakdown(
            project_growth_with_contributions(1000.0, 0.05, 10.0, Compounding::Periodic(12), 100.0, 12)
                .unwrap(),
        );
        assert_close(annual.final_amount, monthly.final_amount, 1e-6);
        assert_close(annual.total_contributions, monthly.total_contributions, 1e-6);
    }

    #[test]
    fn continuous_contributions_use_continuous_annuity_formula() {
        // 1200/year continuous: 1200 * (e^0.5 - 1) / 0.05 = 15_569.3
        let b = breakdown(
            project_growth_with_contributions(0.0, 0.05, 10.0, Compounding::Continuous, 100.0, 12)
                .unwrap(),
        );
        assert_close(b.final_amount, 1200.0 * (0.5f64.exp() - 1.0) / 0.05, 0.01);
    }

    #[test]
    fn zero_contribution_amount_reduces_to_lump_sum() {
        let with = breakdown(
            project_growth_with_contributions(1000.0, 0.05, 10.0, Compounding::Periodic(12), 0.0, 12)
                .unwrap(),
        );
        let without = breakdown(project_growth(1000.0, 0.05, 10.0, Compounding::Periodic(12)).unwrap());
        assert_close(with.final_amount, without.final_amount, 1e-12);
        assert_eq!(with.total_contributions, 0.0);
    }

    #[test]
    fn enormous_inputs_overflow_instead_of_faulting() {
        let result = project_growth(1e300, 1.0, 1000.0, Compounding::Periodic(1)).unwrap();
        assert!(result.is_overflow());

        let continuous = project_growth(1e300, 1.0, 1000.0, Compounding::Continuous).unwrap();
        assert!(continuous.is_overflow());
    }

    #[test]
    fn overflowing_annuity_term_collapses_whole_result() {
        let result = project_growth_with_contributions(
            0.0,
            1.0,
            1000.0,
            Compounding::Periodic(12),
            1e300,
            12,
        )
        .unwrap();
        assert!(result.is_overflow());
    }

    #[test]
    fn negative_and_non_finite_inputs_are_rejected() {
        assert!(matches!(
            project_growth(-1.0, 0.05, 10.0, Compounding::Periodic(12)),
            Err(CalcError::InvalidInput { field: "principal", .. })
        ));
        assert!(matches!(
            project_growth(1000.0, -0.05, 10.0, Compounding::Periodic(12)),
            Err(CalcError::InvalidInput { field: "annual rate", .. })
        ));
        assert!(matches!(
            project_growth(1000.0, 0.05, f64::NAN, Compounding::Periodic(12)),
            Err(CalcError::InvalidInput { field: "years", .. })
        ));
        assert!(matches!(
            project_growth(1000.0, 0.05, 10.0, Compounding::Periodic(0)),
            Err(CalcError::InvalidInput { field: "compounding", .. })
        ));
        assert!(matches!(
            project_growth_with_contributions(
                1000.0,
                0.05,
                10.0,
                Compounding::Periodic(12),
                -100.0,
                12
            ),
            Err(CalcError::InvalidInput { field: "contribution amount", .. })
        ));
    }

    proptest! {
        #[test]
        fn lump_sum_never_shrinks(
            principal in 0.0..1e9f64,
            rate in 0.0..0.5f64,
            years in 0.0..50.0f64,
            n in 1u32..366,
        ) {
            let result = project_growth(principal, rate, years, Compounding::Periodic(n)).unwrap();
            if let GrowthResult::Ok(b) = result {
                prop_assert!(b.final_amount >= principal * (1.0 - 1e-12));
                prop_assert!(b.total_interest >= 0.0);
            }
        }

        // Rates below a tenth of a basis point and horizons under one
        // compounding period are excluded: there the ordinary-annuity
        // identity degenerates and only the clamp keeps interest at zero.
        #[test]
        fn final_amount_covers_principal_and_contributions(
            principal in 0.0..1e6f64,
            rate in 0.001..0.3f64,
            years in 1.0..40.0f64,
            amount in 0.0..10_000.0f64,
            frequency in 0u32..53,
        ) {
            let result = project_growth_with_contributions(
                principal,
                rate,
                years,
                Compounding::Periodic(12),
                amount,
                frequency,
            )
            .unwrap();
            if let GrowthResult::Ok(b) = result {
                let invested = principal + b.total_contributions;
                prop_assert!(
                    b.final_amount >= invested - (1e-9 * invested + 1e-6),
                    "final {} < invested {}",
                    b.final_amount,
                    invested
                );
            }
        }
    }
}
