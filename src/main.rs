//! Project Appraisal CLI
//!
//! Loads a project workbook, evaluates one project and prints its cash flows
//! and appraisal metrics.

use anyhow::{bail, Context, Result};
use clap::Parser;
use project_appraisal::appraisal::{discount_factor, AppraisalConfig, AppraisalEngine};
use project_appraisal::project::{load_workbook, ProjectId, SalesPeriod};
use project_appraisal::Evaluation;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "appraisal", version, about = "Evaluate a business-plan project: NPV, IRR, B/C and payback")]
struct Cli {
    /// Workbook directory containing projects.csv (plus optional line_items.csv, sales.csv)
    workbook: PathBuf,

    /// Project id to evaluate (defaults to the most recently created project)
    #[arg(short, long)]
    project: Option<u32>,

    /// JSON engine configuration file
    #[arg(long, env = "APPRAISAL_CONFIG")]
    config: Option<PathBuf>,

    /// Projection horizon in years
    #[arg(long, env = "APPRAISAL_HORIZON")]
    horizon: Option<usize>,

    /// IRR tolerance on |NPV|
    #[arg(long, env = "APPRAISAL_IRR_TOLERANCE")]
    irr_tolerance: Option<f64>,

    /// IRR bisection iteration cap
    #[arg(long, env = "APPRAISAL_IRR_MAX_ITERATIONS")]
    irr_max_iterations: Option<u32>,

    /// Print the result as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Also write the cash-flow table to this CSV file
    #[arg(long)]
    cashflows_csv: Option<PathBuf>,
}

impl Cli {
    fn appraisal_config(&self) -> Result<AppraisalConfig> {
        let mut config = match &self.config {
            Some(path) => AppraisalConfig::from_json_path(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AppraisalConfig::default(),
        };

        if let Some(horizon) = self.horizon {
            config.horizon_years = horizon;
        }
        if let Some(tolerance) = self.irr_tolerance {
            config.irr.tolerance = tolerance;
        }
        if let Some(max_iterations) = self.irr_max_iterations {
            config.irr.max_iterations = max_iterations;
        }

        config.validate().context("Invalid appraisal configuration")?;
        Ok(config)
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    project: &'a str,
    result: &'a project_appraisal::AppraisalResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct CashflowCsvRow {
    period: usize,
    cash_flow: f64,
    cumulative: f64,
    discount_factor: f64,
    present_value: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.appraisal_config()?;

    let store = load_workbook(&cli.workbook)
        .with_context(|| format!("Failed to load workbook {}", cli.workbook.display()))?;

    // Resolve the active project once; everything below uses the explicit id
    let project_id = match cli.project {
        Some(id) => ProjectId(id),
        None => match store.latest_project_id() {
            Some(id) => id,
            None => bail!("Workbook {} contains no projects", cli.workbook.display()),
        },
    };

    let overview = store.overview(project_id)?;
    let inputs = store.financial_inputs(project_id)?;

    let engine = AppraisalEngine::new(config);
    let evaluation = engine.evaluate(&inputs);
    let result = evaluation.result();

    if let Some(path) = &cli.cashflows_csv {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Unable to create {}", path.display()))?;
        let cumulative = result.cash_flows.cumulative();
        for (period, &cash_flow) in result.cash_flows.iter().enumerate() {
            let factor = discount_factor(inputs.discount_rate, period);
            writer.serialize(CashflowCsvRow {
                period,
                cash_flow,
                cumulative: cumulative[period],
                discount_factor: factor,
                present_value: cash_flow * factor,
            })?;
        }
        writer.flush()?;
    }

    if cli.json {
        let output = JsonOutput {
            project: &overview.project.details.name,
            result,
            error: evaluation.error().map(|e| e.to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let details = &overview.project.details;
    println!("Project {} - {}", project_id, details.name);
    println!("======================\n");
    if let Some(activity) = &details.activity_type {
        println!("  Activity: {}", activity);
    }
    if let Some(product) = &details.product_name {
        println!("  Product: {} @ ${:.2}", product, details.product_price);
    }
    println!("  Initial investment: ${:.2}", overview.project.initial_investment());
    println!("  Discount rate: {:.4}%", details.discount_rate * 100.0);
    println!();

    println!("Totals:");
    println!("  Costs:              ${:.2}", overview.totals.costs);
    println!("  Expenses:           ${:.2}", overview.totals.expenses);
    println!("  Salaries (monthly): ${:.2}", overview.totals.salaries);
    println!("  Materials:          ${:.2}", overview.totals.materials);
    println!();

    for period in [
        SalesPeriod::Daily,
        SalesPeriod::Weekly,
        SalesPeriod::Monthly,
        SalesPeriod::Yearly,
    ] {
        if let Some(units) = overview.sales.get(period) {
            let cells: Vec<String> = period
                .labels()
                .iter()
                .zip(units)
                .map(|(label, u)| format!("{}={}", label, u))
                .collect();
            println!("  {:?} sales: {}", period, cells.join(" "));
        }
    }
    if overview.sales.yearly.is_none() {
        println!("  No yearly sales recorded: revenue is zero in every year");
    }
    println!();

    println!("{:>6} {:>14} {:>14} {:>10} {:>14}", "Year", "Cash flow", "Cumulative", "Factor", "PV");
    println!("{}", "-".repeat(62));
    let cumulative = result.cash_flows.cumulative();
    for (period, &cash_flow) in result.cash_flows.iter().enumerate() {
        let factor = discount_factor(inputs.discount_rate, period);
        println!(
            "{:>6} {:>14.2} {:>14.2} {:>10.6} {:>14.2}",
            period,
            cash_flow,
            cumulative[period],
            factor,
            cash_flow * factor
        );
    }
    println!();

    if let Evaluation::Degraded { error, .. } = &evaluation {
        println!("Calculation error: {}", error);
        println!("Metrics below are zeroed.\n");
    }

    println!("Metrics:");
    println!("  NPV:              ${:.2}", result.npv);
    match result.irr_pct() {
        Some(irr) => println!("  IRR:              {:.2}%", irr),
        None => println!("  IRR:              n/a (no sign change in bracket)"),
    }
    match result.bounded_bc_ratio() {
        Some(bc) => println!("  B/C:              {:.4}", bc),
        None => println!("  B/C:              unbounded (no discounted costs)"),
    }
    match result.payback_period {
        Some(pri) => println!("  Payback:          {:.2} years", pri),
        None => println!("  Payback:          not reached within {} years", result.cash_flows.horizon()),
    }
    println!("  Total investment: ${:.2}", result.total_investment);
    println!("  Return on inv.:   {:.2}%", result.return_on_investment_pct);

    if !result.diagnostics.is_empty() {
        println!("\nNotes: {:?}", result.diagnostics);
    }

    Ok(())
}
