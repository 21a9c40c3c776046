//! Scenario runner for batch appraisals
//!
//! Each evaluation is a pure function of its inputs, so batches and
//! discount-rate sweeps run in parallel without coordination.

use rayon::prelude::*;
use serde::Serialize;

use crate::appraisal::{AppraisalConfig, AppraisalEngine, Evaluation, FinancialInputs};
use crate::error::AppraisalError;
use crate::project::{ProjectId, ProjectStore};

/// One point of a discount-rate sensitivity sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatePoint {
    pub discount_rate: f64,
    pub npv: f64,
    /// `None` for the "no cost basis" sentinel
    pub bc_ratio: Option<f64>,
    /// Set when the evaluation at this rate degraded
    pub error: Option<String>,
}

/// Runs the appraisal engine over many inputs
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new();
/// let inputs = store.financial_inputs(project_id)?;
///
/// for point in runner.rate_sweep(&inputs, &[0.05, 0.10, 0.15]) {
///     println!("{:.2}: {:.2}", point.discount_rate, point.npv);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    engine: AppraisalEngine,
}

impl ScenarioRunner {
    /// Runner with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AppraisalConfig) -> Self {
        Self {
            engine: AppraisalEngine::new(config),
        }
    }

    pub fn engine(&self) -> &AppraisalEngine {
        &self.engine
    }

    /// Evaluate a single project snapshot
    pub fn run(&self, inputs: &FinancialInputs) -> Evaluation {
        self.engine.evaluate(inputs)
    }

    /// Evaluate many snapshots in parallel; output order matches input order
    pub fn run_batch(&self, inputs: &[FinancialInputs]) -> Vec<Evaluation> {
        inputs.par_iter().map(|i| self.engine.evaluate(i)).collect()
    }

    /// Evaluate every project in the store, ordered by project id
    pub fn run_store(
        &self,
        store: &ProjectStore,
    ) -> Result<Vec<(ProjectId, Evaluation)>, AppraisalError> {
        let snapshots = store
            .projects()
            .map(|project| store.financial_inputs(project.id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(snapshots
            .par_iter()
            .map(|inputs| (inputs.project_id, self.engine.evaluate(inputs)))
            .collect())
    }

    /// Re-evaluate one project at each discount rate
    pub fn rate_sweep(&self, inputs: &FinancialInputs, rates: &[f64]) -> Vec<RatePoint> {
        rates
            .par_iter()
            .map(|&rate| {
                let scenario = FinancialInputs {
                    discount_rate: rate,
                    ..inputs.clone()
                };
                let evaluation = self.engine.evaluate(&scenario);
                let result = evaluation.result();

                RatePoint {
                    discount_rate: rate,
                    npv: result.npv,
                    bc_ratio: result.bounded_bc_ratio(),
                    error: evaluation.error().map(|e| e.to_string()),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{LineItemDetails, LineItemKind, ProjectDetails, SalesPeriod};

    fn sample_inputs(project_id: u32, unit_price: f64) -> FinancialInputs {
        FinancialInputs {
            project_id: ProjectId(project_id),
            discount_rate: 0.08,
            initial_investment: 2_000.0,
            periodic_costs: 1_400.0,
            periodic_expenses: 700.0,
            monthly_salaries: 0.0,
            materials_total: 0.0,
            unit_price,
            yearly_units_sold: Some(vec![100; 7]),
        }
    }

    #[test]
    fn test_batch_preserves_order() {
        let runner = ScenarioRunner::new();
        let inputs: Vec<_> = (1..=20).map(|i| sample_inputs(i, i as f64)).collect();

        let evaluations = runner.run_batch(&inputs);
        assert_eq!(evaluations.len(), 20);
        for (i, evaluation) in evaluations.iter().enumerate() {
            assert_eq!(evaluation.result().project_id, ProjectId(i as u32 + 1));
        }

        // Higher price means higher NPV
        assert!(evaluations[19].result().npv > evaluations[0].result().npv);
    }

    #[test]
    fn test_rate_sweep_is_monotonic_for_conventional_flows() {
        let runner = ScenarioRunner::new();
        let points = runner.rate_sweep(&sample_inputs(1, 10.0), &[0.0, 0.05, 0.10, 0.20]);

        assert_eq!(points.len(), 4);
        for pair in points.windows(2) {
            assert!(pair[0].npv > pair[1].npv);
        }
        assert!(points.iter().all(|p| p.error.is_none()));
    }

    #[test]
    fn test_rate_sweep_reports_invalid_rate() {
        let runner = ScenarioRunner::new();
        let points = runner.rate_sweep(&sample_inputs(1, 10.0), &[-1.0, 0.1]);

        assert!(points[0].error.is_some());
        assert_eq!(points[0].npv, 0.0);
        assert!(points[1].error.is_none());
    }

    #[test]
    fn test_run_store() {
        let mut store = ProjectStore::new();
        let a = store
            .create_project(ProjectDetails {
                product_price: 5.0,
                ..ProjectDetails::new("A")
            })
            .unwrap();
        let b = store.create_project(ProjectDetails::new("B")).unwrap();
        store.add_line_item(b, LineItemKind::Cost, LineItemDetails::new("Rent", 70.0)).unwrap();
        store.save_sales(a, SalesPeriod::Yearly, vec![10; 7]).unwrap();

        let results = ScenarioRunner::new().run_store(&store).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, a);
        assert_eq!(results[1].0, b);
        assert!(results[0].1.result().npv > 0.0);
        assert!(results[1].1.result().npv < 0.0);
    }
}
