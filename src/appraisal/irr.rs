//! Internal Rate of Return (IRR) calculation
//!
//! Single-bracket bisection on NPV(rate). The bracket is never expanded, so
//! series whose NPV has the same sign at both ends of the bracket report no
//! solution even when roots exist inside it (e.g. flows with two sign changes).

use log::debug;
use serde::{Deserialize, Serialize};

use super::discount::npv;
use crate::error::AppraisalError;

/// Default lower bound of the IRR bracket (-99% per period)
pub const DEFAULT_IRR_LOWER_BOUND: f64 = -0.99;
/// Default upper bound of the IRR bracket (1000% per period)
pub const DEFAULT_IRR_UPPER_BOUND: f64 = 10.0;
pub const DEFAULT_IRR_MAX_ITERATIONS: u32 = 1000;
/// |NPV| below which a trial rate is accepted as the root
pub const DEFAULT_IRR_TOLERANCE: f64 = 0.0001;

/// Bisection tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrConfig {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl Default for IrrConfig {
    fn default() -> Self {
        Self {
            lower_bound: DEFAULT_IRR_LOWER_BOUND,
            upper_bound: DEFAULT_IRR_UPPER_BOUND,
            max_iterations: DEFAULT_IRR_MAX_ITERATIONS,
            tolerance: DEFAULT_IRR_TOLERANCE,
        }
    }
}

impl IrrConfig {
    pub fn validate(&self) -> Result<(), AppraisalError> {
        if !(self.lower_bound.is_finite() && self.lower_bound > -1.0) {
            return Err(AppraisalError::InvalidConfig(format!(
                "IRR lower bound must be greater than -1, got {}",
                self.lower_bound
            )));
        }
        if !(self.upper_bound.is_finite() && self.upper_bound > self.lower_bound) {
            return Err(AppraisalError::InvalidConfig(format!(
                "IRR upper bound {} must exceed lower bound {}",
                self.upper_bound, self.lower_bound
            )));
        }
        if self.max_iterations == 0 {
            return Err(AppraisalError::InvalidConfig(
                "IRR iteration cap must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(AppraisalError::InvalidConfig(format!(
                "IRR tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Result of the bisection search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IrrOutcome {
    /// |NPV(rate)| fell below the tolerance
    Converged { rate: f64, iterations: u32 },
    /// Iteration cap reached; `rate` is the midpoint of the final bracket
    Approximate { rate: f64 },
    /// NPV has the same sign at both bracket ends
    NoSolution,
}

impl IrrOutcome {
    /// Rate estimate, if any (converged or best-effort)
    pub fn rate(&self) -> Option<f64> {
        match *self {
            IrrOutcome::Converged { rate, .. } | IrrOutcome::Approximate { rate } => Some(rate),
            IrrOutcome::NoSolution => None,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, IrrOutcome::Converged { .. })
    }
}

/// Run the bisection and report how it terminated.
///
/// The NPV stored for each bracket end is the value computed when that end
/// was last moved; it is not recomputed from the new bounds.
pub fn solve_irr(flows: &[f64], config: &IrrConfig) -> IrrOutcome {
    let mut rate_low = config.lower_bound;
    let mut rate_high = config.upper_bound;

    let mut npv_low = npv(rate_low, flows);
    let mut npv_high = npv(rate_high, flows);

    if npv_low * npv_high > 0.0 {
        debug!(
            "IRR: no sign change in [{}, {}] (npv {:.4} / {:.4})",
            rate_low, rate_high, npv_low, npv_high
        );
        return IrrOutcome::NoSolution;
    }

    for iteration in 1..=config.max_iterations {
        let rate_mid = (rate_low + rate_high) / 2.0;
        let npv_mid = npv(rate_mid, flows);

        if npv_mid.abs() < config.tolerance {
            return IrrOutcome::Converged {
                rate: rate_mid,
                iterations: iteration,
            };
        }

        if npv_low * npv_mid < 0.0 {
            rate_high = rate_mid;
            npv_high = npv_mid;
        } else {
            rate_low = rate_mid;
            npv_low = npv_mid;
        }
    }

    debug!(
        "IRR: {} iterations exhausted, bracket [{}, {}], npv_high {:.6}",
        config.max_iterations, rate_low, rate_high, npv_high
    );
    IrrOutcome::Approximate {
        rate: (rate_low + rate_high) / 2.0,
    }
}

/// Per-period IRR of `flows`, or `None` when the bracket holds no sign change.
///
/// An exhausted iteration budget still yields the final bracket midpoint;
/// use [`solve_irr`] to tell the two apart.
pub fn irr(flows: &[f64], config: &IrrConfig) -> Option<f64> {
    solve_irr(flows, config).rate()
}
