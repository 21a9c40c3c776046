//! Cash-flow inputs and the yearly cash-flow constructor

use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::project::ProjectId;

/// Months per year used to annualize the monthly payroll
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Flat record of financial inputs for one project.
///
/// Assembled by the project store from persisted records; the engine treats
/// it as an immutable snapshot for the duration of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialInputs {
    /// Project the inputs were resolved for
    pub project_id: ProjectId,

    /// Per-period discount rate (decimal, e.g. 0.10 for 10%)
    pub discount_rate: f64,

    /// Outlay at period 0; zero when the project declares no investment
    pub initial_investment: f64,

    /// Cumulative cost total, spread evenly across the horizon
    pub periodic_costs: f64,

    /// Cumulative expense total, spread evenly across the horizon
    pub periodic_expenses: f64,

    /// Monthly payroll total
    pub monthly_salaries: f64,

    /// Equipment and materials total (only affects total investment)
    pub materials_total: f64,

    /// Revenue per unit sold
    pub unit_price: f64,

    /// Units sold per projection year; `None` when no sales were recorded
    pub yearly_units_sold: Option<Vec<u32>>,
}

impl FinancialInputs {
    /// Inputs with every amount zeroed and the default discount rate
    pub fn empty(project_id: ProjectId) -> Self {
        Self {
            project_id,
            discount_rate: crate::project::DEFAULT_DISCOUNT_RATE,
            initial_investment: 0.0,
            periodic_costs: 0.0,
            periodic_expenses: 0.0,
            monthly_salaries: 0.0,
            materials_total: 0.0,
            unit_price: 0.0,
            yearly_units_sold: None,
        }
    }

    /// Yearly payroll cost (0 when no salaries are recorded)
    pub fn annual_salaries(&self) -> f64 {
        if self.monthly_salaries > 0.0 {
            self.monthly_salaries * MONTHS_PER_YEAR
        } else {
            0.0
        }
    }

    /// Name and value of the first amount that is NaN or infinite
    pub(crate) fn first_non_finite(&self) -> Option<(&'static str, f64)> {
        [
            ("discount_rate", self.discount_rate),
            ("initial_investment", self.initial_investment),
            ("periodic_costs", self.periodic_costs),
            ("periodic_expenses", self.periodic_expenses),
            ("monthly_salaries", self.monthly_salaries),
            ("materials_total", self.materials_total),
            ("unit_price", self.unit_price),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
    }
}

/// Cash-flow series: index 0 is the initial outlay, 1..=horizon are net flows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CashFlowSeries(Vec<f64>);

impl CashFlowSeries {
    pub fn new(flows: Vec<f64>) -> Self {
        Self(flows)
    }

    /// Number of projection periods after period 0
    pub fn horizon(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Flow at period 0 (0.0 for an empty series)
    pub fn initial_flow(&self) -> f64 {
        self.0.first().copied().unwrap_or(0.0)
    }

    /// Running total of the flows, period by period
    pub fn cumulative(&self) -> Vec<f64> {
        self.0
            .iter()
            .scan(0.0, |acc, &cf| {
                *acc += cf;
                Some(*acc)
            })
            .collect()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for CashFlowSeries {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for CashFlowSeries {
    fn from(flows: Vec<f64>) -> Self {
        Self(flows)
    }
}

/// Build the cash-flow series for `horizon` projection years.
///
/// Costs and expenses are cumulative totals spread evenly across the horizon,
/// salaries are annualized, and revenue is units sold times unit price. A
/// missing sales record (or a missing year) contributes no revenue.
pub fn build_cash_flows(inputs: &FinancialInputs, horizon: usize) -> CashFlowSeries {
    let mut flows = Vec::with_capacity(horizon + 1);
    flows.push(-inputs.initial_investment);

    let periods = horizon as f64;
    let allocated_cost = if inputs.periodic_costs > 0.0 {
        inputs.periodic_costs / periods
    } else {
        0.0
    };
    let allocated_expense = if inputs.periodic_expenses > 0.0 {
        inputs.periodic_expenses / periods
    } else {
        0.0
    };
    let annual_salary = inputs.annual_salaries();

    for year in 1..=horizon {
        let units = inputs
            .yearly_units_sold
            .as_ref()
            .and_then(|sales| sales.get(year - 1))
            .copied()
            .unwrap_or(0);
        let revenue = units as f64 * inputs.unit_price;

        flows.push(revenue - allocated_cost - allocated_expense - annual_salary);
    }

    CashFlowSeries(flows)
}
