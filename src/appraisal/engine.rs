//! Appraisal engine: builds the cash-flow series and derives every metric

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use super::cashflows::{build_cash_flows, CashFlowSeries, FinancialInputs};
use super::discount::{bc_ratio, is_unbounded_ratio, npv, validate_rate};
use super::irr::{solve_irr, IrrConfig, IrrOutcome};
use super::payback::payback_period;
use crate::error::AppraisalError;
use crate::project::ProjectId;

/// Default projection horizon in years
pub const DEFAULT_HORIZON_YEARS: usize = 7;

/// Longest projection horizon a configuration may request
pub const MAX_HORIZON_YEARS: usize = 100;

/// Configuration for an appraisal run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppraisalConfig {
    /// Number of projection years after period 0
    pub horizon_years: usize,

    /// IRR bisection tunables
    pub irr: IrrConfig,
}

impl Default for AppraisalConfig {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            irr: IrrConfig::default(),
        }
    }
}

impl AppraisalConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_path(path: &Path) -> Result<Self, AppraisalError> {
        let file = File::open(path)?;
        let config: AppraisalConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppraisalError> {
        if self.horizon_years == 0 {
            return Err(AppraisalError::InvalidConfig(
                "horizon must be at least one year".to_string(),
            ));
        }
        if self.horizon_years > MAX_HORIZON_YEARS {
            return Err(AppraisalError::InvalidConfig(format!(
                "horizon of {} years exceeds the maximum of {}",
                self.horizon_years, MAX_HORIZON_YEARS
            )));
        }
        self.irr.validate()
    }
}

/// Condition worth surfacing next to the numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnostic {
    /// NPV has the same sign at both ends of the IRR bracket
    NoRootInBracket,
    /// IRR is the bracket midpoint after the iteration cap, not a verified root
    IrrNotConverged,
    /// Accumulated flows never cover the initial outlay within the horizon
    PaybackNeverReached,
    /// No discounted cost basis; `bc_ratio` holds the infinity sentinel
    UnboundedBenefitCost,
}

/// Appraisal metrics for one project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppraisalResult {
    pub project_id: ProjectId,

    /// Net present value at the project's discount rate
    pub npv: f64,

    /// Per-period IRR as a decimal; `None` when no root is bracketed
    pub irr: Option<f64>,

    /// Benefit/cost ratio; `f64::INFINITY` when there is no cost basis
    /// (serialized as `null`)
    pub bc_ratio: f64,

    /// Periods to recover the outlay; `None` when never recovered
    pub payback_period: Option<f64>,

    pub cash_flows: CashFlowSeries,

    /// Investment plus costs, expenses, payroll over the horizon and materials
    pub total_investment: f64,

    /// NPV as a percentage of the initial investment (0 without investment)
    pub return_on_investment_pct: f64,

    pub diagnostics: Vec<Diagnostic>,
}

impl AppraisalResult {
    /// Result with every metric zeroed, keeping only the cash flows
    pub fn zeroed(project_id: ProjectId, cash_flows: CashFlowSeries) -> Self {
        Self {
            project_id,
            npv: 0.0,
            irr: Some(0.0),
            bc_ratio: 0.0,
            payback_period: Some(0.0),
            cash_flows,
            total_investment: 0.0,
            return_on_investment_pct: 0.0,
            diagnostics: Vec::new(),
        }
    }

    /// IRR expressed as a percentage
    pub fn irr_pct(&self) -> Option<f64> {
        self.irr.map(|rate| rate * 100.0)
    }

    /// B/C ratio, or `None` for the "no cost basis" sentinel
    pub fn bounded_bc_ratio(&self) -> Option<f64> {
        if is_unbounded_ratio(self.bc_ratio) {
            None
        } else {
            Some(self.bc_ratio)
        }
    }

    pub fn has_diagnostic(&self, diagnostic: Diagnostic) -> bool {
        self.diagnostics.contains(&diagnostic)
    }
}

/// Outcome of an evaluation.
///
/// Both variants carry a renderable result. A degraded evaluation zeroes every
/// metric except the cash flows and carries the fault that caused it.
#[must_use]
#[derive(Debug)]
pub enum Evaluation {
    Complete(AppraisalResult),
    Degraded {
        result: AppraisalResult,
        error: AppraisalError,
    },
}

impl Evaluation {
    /// The result to display, whether complete or degraded
    pub fn result(&self) -> &AppraisalResult {
        match self {
            Evaluation::Complete(result) | Evaluation::Degraded { result, .. } => result,
        }
    }

    pub fn into_result(self) -> AppraisalResult {
        match self {
            Evaluation::Complete(result) | Evaluation::Degraded { result, .. } => result,
        }
    }

    pub fn error(&self) -> Option<&AppraisalError> {
        match self {
            Evaluation::Complete(_) => None,
            Evaluation::Degraded { error, .. } => Some(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Evaluation::Degraded { .. })
    }

    /// Convert into a plain `Result`, dropping the zeroed fallback
    pub fn into_complete(self) -> Result<AppraisalResult, AppraisalError> {
        match self {
            Evaluation::Complete(result) => Ok(result),
            Evaluation::Degraded { error, .. } => Err(error),
        }
    }
}

/// Stateless appraisal engine
#[derive(Debug, Clone, Default)]
pub struct AppraisalEngine {
    config: AppraisalConfig,
}

impl AppraisalEngine {
    pub fn new(config: AppraisalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppraisalConfig {
        &self.config
    }

    /// Cash-flow series for the configured horizon.
    ///
    /// A horizon beyond [`MAX_HORIZON_YEARS`] yields only the initial flow.
    pub fn cash_flows(&self, inputs: &FinancialInputs) -> CashFlowSeries {
        let horizon = match self.config.horizon_years {
            h if h <= MAX_HORIZON_YEARS => h,
            _ => 0,
        };
        build_cash_flows(inputs, horizon)
    }

    /// Evaluate a project snapshot. Never fails: faults produce
    /// [`Evaluation::Degraded`] with the cash flows still populated.
    pub fn evaluate(&self, inputs: &FinancialInputs) -> Evaluation {
        let cash_flows = self.cash_flows(inputs);

        match self.compute_metrics(inputs, &cash_flows) {
            Ok(result) => {
                debug!(
                    "Project {}: npv={:.2} irr={:?} bc={:.4} pri={:?}",
                    inputs.project_id, result.npv, result.irr, result.bc_ratio, result.payback_period
                );
                Evaluation::Complete(result)
            }
            Err(error) => {
                warn!("Project {}: evaluation degraded: {}", inputs.project_id, error);
                Evaluation::Degraded {
                    result: AppraisalResult::zeroed(inputs.project_id, cash_flows),
                    error,
                }
            }
        }
    }

    fn compute_metrics(
        &self,
        inputs: &FinancialInputs,
        cash_flows: &CashFlowSeries,
    ) -> Result<AppraisalResult, AppraisalError> {
        self.config.validate()?;
        let rate = validate_rate(inputs.discount_rate)?;

        if let Some((field, value)) = inputs.first_non_finite() {
            return Err(AppraisalError::ArithmeticFault {
                stage: "inputs",
                detail: format!("{} is not finite ({})", field, value),
            });
        }
        if let Some(period) = cash_flows.iter().position(|cf| !cf.is_finite()) {
            return Err(AppraisalError::ArithmeticFault {
                stage: "cash flows",
                detail: format!("flow for period {} is not finite", period),
            });
        }

        let mut diagnostics = Vec::new();

        let npv = finite("npv", npv(rate, cash_flows))?;

        let irr_outcome = solve_irr(cash_flows, &self.config.irr);
        match irr_outcome {
            IrrOutcome::NoSolution => diagnostics.push(Diagnostic::NoRootInBracket),
            IrrOutcome::Approximate { .. } => diagnostics.push(Diagnostic::IrrNotConverged),
            IrrOutcome::Converged { .. } => {}
        }
        let irr = irr_outcome.rate().map(|rate| finite("irr", rate)).transpose()?;

        let bc_ratio = bc_ratio(cash_flows, rate);
        if is_unbounded_ratio(bc_ratio) {
            diagnostics.push(Diagnostic::UnboundedBenefitCost);
        } else {
            finite("bc_ratio", bc_ratio)?;
        }

        let payback_period = payback_period(cash_flows);
        if payback_period.is_none() {
            diagnostics.push(Diagnostic::PaybackNeverReached);
        }
        let payback_period = payback_period.map(|pri| finite("payback_period", pri)).transpose()?;

        let horizon = self.config.horizon_years as f64;
        let total_investment = finite(
            "total_investment",
            inputs.initial_investment
                + inputs.periodic_costs
                + inputs.periodic_expenses
                + inputs.monthly_salaries * super::cashflows::MONTHS_PER_YEAR * horizon
                + inputs.materials_total,
        )?;

        let return_on_investment_pct = if inputs.initial_investment > 0.0 {
            finite("return_on_investment", npv / inputs.initial_investment * 100.0)?
        } else {
            0.0
        };

        Ok(AppraisalResult {
            project_id: inputs.project_id,
            npv,
            irr,
            bc_ratio,
            payback_period,
            cash_flows: cash_flows.clone(),
            total_investment,
            return_on_investment_pct,
            diagnostics,
        })
    }
}

fn finite(stage: &'static str, value: f64) -> Result<f64, AppraisalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AppraisalError::ArithmeticFault {
            stage,
            detail: format!("result is not finite ({})", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn level_inputs() -> FinancialInputs {
        // Produces [-1000, 300, 300, 300, 300, 300] over a 5-year horizon
        FinancialInputs {
            project_id: ProjectId(3),
            discount_rate: 0.10,
            initial_investment: 1_000.0,
            periodic_costs: 500.0,
            periodic_expenses: 0.0,
            monthly_salaries: 0.0,
            materials_total: 250.0,
            unit_price: 4.0,
            yearly_units_sold: Some(vec![100; 5]),
        }
    }

    fn five_year_engine() -> AppraisalEngine {
        AppraisalEngine::new(AppraisalConfig {
            horizon_years: 5,
            ..Default::default()
        })
    }

    #[test]
    fn test_level_project_metrics() {
        let evaluation = five_year_engine().evaluate(&level_inputs());
        assert!(!evaluation.is_degraded());

        let result = evaluation.result();
        assert_eq!(&result.cash_flows[..], &[-1000.0, 300.0, 300.0, 300.0, 300.0, 300.0]);
        assert_abs_diff_eq!(result.npv, 137.24, epsilon = 0.01);
        assert_abs_diff_eq!(result.irr.unwrap(), 0.1524, epsilon = 1e-3);
        assert_abs_diff_eq!(result.payback_period.unwrap(), 3.3333, epsilon = 1e-4);
        assert!(result.bc_ratio > 1.0);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_total_investment_and_roi() {
        let result = five_year_engine().evaluate(&level_inputs()).into_result();

        assert_abs_diff_eq!(result.total_investment, 1_000.0 + 500.0 + 250.0);
        assert_abs_diff_eq!(result.return_on_investment_pct, result.npv / 1_000.0 * 100.0);
    }

    #[test]
    fn test_total_investment_counts_payroll_over_horizon() {
        let inputs = FinancialInputs {
            monthly_salaries: 10.0,
            ..level_inputs()
        };
        let result = AppraisalEngine::default().evaluate(&inputs).into_result();

        assert_abs_diff_eq!(result.total_investment, 1_000.0 + 500.0 + 10.0 * 12.0 * 7.0 + 250.0);
    }

    #[test]
    fn test_no_investment() {
        let inputs = FinancialInputs {
            initial_investment: 0.0,
            ..level_inputs()
        };
        let result = five_year_engine().evaluate(&inputs).into_result();

        assert_eq!(result.payback_period, Some(0.0));
        assert_abs_diff_eq!(result.return_on_investment_pct, 0.0);
        assert!(result.bounded_bc_ratio().is_none());
        assert!(result.has_diagnostic(Diagnostic::UnboundedBenefitCost));
        assert!(result.has_diagnostic(Diagnostic::NoRootInBracket));
        assert_eq!(result.irr, None);
    }

    #[test]
    fn test_unrecovered_project_flags_payback() {
        let inputs = FinancialInputs {
            unit_price: 0.0,
            ..level_inputs()
        };
        let result = five_year_engine().evaluate(&inputs).into_result();

        assert_eq!(result.payback_period, None);
        assert!(result.has_diagnostic(Diagnostic::PaybackNeverReached));
        assert!(result.npv < 0.0);
    }

    #[test]
    fn test_invalid_rate_degrades() {
        let inputs = FinancialInputs {
            discount_rate: -1.0,
            ..level_inputs()
        };
        let evaluation = five_year_engine().evaluate(&inputs);

        assert!(evaluation.is_degraded());
        assert!(matches!(evaluation.error(), Some(AppraisalError::InvalidRate { .. })));

        let result = evaluation.result();
        assert_eq!(result.cash_flows.len(), 6);
        assert_abs_diff_eq!(result.cash_flows[0], -1000.0);
        assert_abs_diff_eq!(result.npv, 0.0);
        assert_eq!(result.irr, Some(0.0));
        assert_abs_diff_eq!(result.bc_ratio, 0.0);
        assert_eq!(result.payback_period, Some(0.0));
        assert_abs_diff_eq!(result.total_investment, 0.0);
        assert_abs_diff_eq!(result.return_on_investment_pct, 0.0);
    }

    #[test]
    fn test_non_finite_input_degrades() {
        let inputs = FinancialInputs {
            unit_price: f64::INFINITY,
            ..level_inputs()
        };
        let evaluation = five_year_engine().evaluate(&inputs);

        assert!(matches!(
            evaluation.error(),
            Some(AppraisalError::ArithmeticFault { stage: "inputs", .. })
        ));
        assert!(evaluation.into_complete().is_err());
    }

    #[test]
    fn test_huge_rate_discounts_future_flows_to_zero() {
        // (1 + rate)^t overflows to infinity for t >= 1, leaving only period 0
        let inputs = FinancialInputs {
            discount_rate: f64::MAX,
            ..level_inputs()
        };
        let evaluation = five_year_engine().evaluate(&inputs);
        assert!(!evaluation.is_degraded());
        assert_abs_diff_eq!(evaluation.result().npv, -1000.0);
    }

    #[test]
    fn test_invalid_config_degrades() {
        let engine = AppraisalEngine::new(AppraisalConfig {
            horizon_years: 0,
            ..Default::default()
        });
        let evaluation = engine.evaluate(&level_inputs());

        assert!(matches!(evaluation.error(), Some(AppraisalError::InvalidConfig(_))));
        assert_eq!(evaluation.result().cash_flows.len(), 1);
    }

    #[test]
    fn test_oversized_horizon_degrades() {
        for horizon_years in [MAX_HORIZON_YEARS + 1, 1_000_000_000_000, usize::MAX] {
            let config = AppraisalConfig {
                horizon_years,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(AppraisalError::InvalidConfig(_))));

            let evaluation = AppraisalEngine::new(config).evaluate(&FinancialInputs::empty(ProjectId(1)));
            assert!(matches!(evaluation.error(), Some(AppraisalError::InvalidConfig(_))));
            assert_eq!(&evaluation.result().cash_flows[..], &[0.0]);
        }
    }

    #[test]
    fn test_max_horizon_is_accepted() {
        let engine = AppraisalEngine::new(AppraisalConfig {
            horizon_years: MAX_HORIZON_YEARS,
            ..Default::default()
        });
        let evaluation = engine.evaluate(&level_inputs());

        assert!(!evaluation.is_degraded());
        assert_eq!(evaluation.result().cash_flows.len(), MAX_HORIZON_YEARS + 1);
    }

    #[test]
    fn test_cash_flows_then_npv_matches_evaluation() {
        let engine = AppraisalEngine::default();
        let inputs = FinancialInputs {
            yearly_units_sold: Some(vec![90, 110, 120, 130, 140, 150, 160]),
            ..level_inputs()
        };

        let flows = engine.cash_flows(&inputs);
        let direct = npv(inputs.discount_rate, &flows);
        let first = engine.evaluate(&inputs).into_result();
        let second = engine.evaluate(&inputs).into_result();

        assert_eq!(direct, first.npv);
        assert_eq!(first, second);
    }

    #[test]
    fn test_config_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appraisal.json");
        std::fs::write(&path, r#"{"horizon_years": 5, "irr": {"tolerance": 0.001}}"#).unwrap();

        let config = AppraisalConfig::from_json_path(&path).unwrap();
        assert_eq!(config.horizon_years, 5);
        assert_abs_diff_eq!(config.irr.tolerance, 0.001);
        assert_eq!(config.irr.max_iterations, 1000);
        assert_abs_diff_eq!(config.irr.lower_bound, -0.99);
    }

    #[test]
    fn test_config_from_json_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appraisal.json");
        std::fs::write(&path, r#"{"horizon_years": 0}"#).unwrap();

        assert!(matches!(
            AppraisalConfig::from_json_path(&path),
            Err(AppraisalError::InvalidConfig(_))
        ));
    }
}
