//! Cash-flow construction and investment appraisal (NPV, IRR, B/C, payback)

mod cashflows;
mod discount;
mod engine;
mod irr;
mod payback;

pub use cashflows::{build_cash_flows, CashFlowSeries, FinancialInputs, MONTHS_PER_YEAR};
pub use discount::{
    bc_ratio, benefit_cost_pv, checked_npv, discount_factor, is_unbounded_ratio, npv,
    validate_rate,
};
pub use engine::{
    AppraisalConfig, AppraisalEngine, AppraisalResult, Diagnostic, Evaluation,
    DEFAULT_HORIZON_YEARS, MAX_HORIZON_YEARS,
};
pub use irr::{
    irr, solve_irr, IrrConfig, IrrOutcome, DEFAULT_IRR_LOWER_BOUND, DEFAULT_IRR_MAX_ITERATIONS,
    DEFAULT_IRR_TOLERANCE, DEFAULT_IRR_UPPER_BOUND,
};
pub use payback::payback_period;
