//! Discounting: net present value and benefit/cost ratio
//!
//! Both metrics discount period `t` by `(1 + rate)^t`, with period 0
//! undiscounted.

use crate::error::AppraisalError;

/// Reject rates for which `(1 + rate)^t` is zero, negative or undefined
pub fn validate_rate(rate: f64) -> Result<f64, AppraisalError> {
    if rate.is_finite() && rate > -1.0 {
        Ok(rate)
    } else {
        Err(AppraisalError::InvalidRate { rate })
    }
}

/// Discount factor for period `t` at the given per-period rate
pub fn discount_factor(rate: f64, period: usize) -> f64 {
    1.0 / (1.0 + rate).powi(period as i32)
}

/// Net present value of `flows` at a per-period `rate`.
///
/// Does not check the rate; use [`checked_npv`] or [`validate_rate`] for
/// values that did not come from a validated source.
pub fn npv(rate: f64, flows: &[f64]) -> f64 {
    flows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// NPV with the rate validated first
pub fn checked_npv(rate: f64, flows: &[f64]) -> Result<f64, AppraisalError> {
    validate_rate(rate).map(|rate| npv(rate, flows))
}

/// Present values of the benefit (positive) and cost (non-positive) flows
pub fn benefit_cost_pv(flows: &[f64], rate: f64) -> (f64, f64) {
    let mut benefits_pv = 0.0;
    let mut costs_pv = 0.0;

    for (t, &cf) in flows.iter().enumerate() {
        let discount = (1.0 + rate).powi(t as i32);
        if cf > 0.0 {
            benefits_pv += cf / discount;
        } else {
            costs_pv += cf.abs() / discount;
        }
    }

    (benefits_pv, costs_pv)
}

/// Benefit/cost ratio: discounted positive flows over discounted costs.
///
/// Returns `f64::INFINITY` when there is no discounted cost basis. Callers
/// must test for it with [`is_unbounded_ratio`] before treating the value as
/// an ordinary ratio.
pub fn bc_ratio(flows: &[f64], rate: f64) -> f64 {
    let (benefits_pv, costs_pv) = benefit_cost_pv(flows, rate);

    if costs_pv == 0.0 {
        return f64::INFINITY;
    }

    benefits_pv / costs_pv
}

/// True for the "no cost basis" sentinel returned by [`bc_ratio`]
pub fn is_unbounded_ratio(ratio: f64) -> bool {
    ratio == f64::INFINITY
}
