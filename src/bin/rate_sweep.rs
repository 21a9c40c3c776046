//! Discount-rate sensitivity sweep for one project
//!
//! Evaluates the project at a range of discount rates and prints NPV and B/C
//! for each. `--json` prints the sweep as JSON.

use anyhow::{ensure, Context, Result};
use clap::Parser;
use project_appraisal::appraisal::{solve_irr, AppraisalConfig, IrrOutcome};
use project_appraisal::project::{load_workbook, ProjectId};
use project_appraisal::scenario::ScenarioRunner;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "rate_sweep", about = "NPV and B/C across a range of discount rates")]
struct Cli {
    /// Workbook directory containing projects.csv
    workbook: PathBuf,

    /// Project id (defaults to the most recently created project)
    #[arg(short, long)]
    project: Option<u32>,

    /// First rate of the sweep (decimal)
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Last rate of the sweep (decimal)
    #[arg(long, default_value_t = 0.30)]
    to: f64,

    /// Number of rates in the sweep
    #[arg(long, default_value_t = 13)]
    steps: usize,

    /// Projection horizon in years
    #[arg(long, env = "APPRAISAL_HORIZON")]
    horizon: Option<usize>,

    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    ensure!(cli.steps >= 2, "--steps must be at least 2");
    ensure!(cli.to > cli.from, "--to must be greater than --from");

    let mut config = AppraisalConfig::default();
    if let Some(horizon) = cli.horizon {
        config.horizon_years = horizon;
    }
    config.validate()?;

    let start = Instant::now();
    let store = load_workbook(&cli.workbook)
        .with_context(|| format!("Failed to load workbook {}", cli.workbook.display()))?;

    let project_id = cli
        .project
        .map(ProjectId)
        .or_else(|| store.latest_project_id())
        .context("Workbook contains no projects")?;
    let inputs = store.financial_inputs(project_id)?;

    let step = (cli.to - cli.from) / (cli.steps - 1) as f64;
    let rates: Vec<f64> = (0..cli.steps).map(|i| cli.from + step * i as f64).collect();

    let runner = ScenarioRunner::with_config(config);
    let points = runner.rate_sweep(&inputs, &rates);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    println!("Discount-rate sweep for project {}", project_id);
    println!("{:>10} {:>16} {:>12}", "Rate", "NPV", "B/C");
    println!("{}", "-".repeat(40));
    for point in &points {
        let bc = match point.bc_ratio {
            Some(bc) => format!("{:.4}", bc),
            None => "unbounded".to_string(),
        };
        match &point.error {
            Some(error) => println!("{:>9.2}% {:>16} {:>12}  ({})", point.discount_rate * 100.0, "-", "-", error),
            None => println!("{:>9.2}% {:>16.2} {:>12}", point.discount_rate * 100.0, point.npv, bc),
        }
    }

    // The sweep crosses zero NPV at the IRR, when one is bracketed
    let flows = runner.engine().cash_flows(&inputs);
    match solve_irr(&flows, &runner.engine().config().irr) {
        IrrOutcome::Converged { rate, iterations } => {
            println!("\nIRR: {:.4}% ({} iterations)", rate * 100.0, iterations)
        }
        IrrOutcome::Approximate { rate } => {
            println!("\nIRR: ~{:.4}% (iteration cap reached)", rate * 100.0)
        }
        IrrOutcome::NoSolution => println!("\nIRR: no sign change in bracket"),
    }

    println!("Total time: {:?}", start.elapsed());
    Ok(())
}
