//! Project Appraisal - cash-flow projection and investment appraisal for business plans
//!
//! This library provides:
//! - Yearly cash-flow construction from project costs, expenses, payroll and sales
//! - Appraisal metrics: NPV, IRR (bisection), benefit/cost ratio, payback period
//! - A fail-soft orchestrator that always returns a renderable result
//! - An in-memory project store and CSV workbook loader feeding the engine
//! - Batch and discount-rate sensitivity runs

pub mod appraisal;
pub mod error;
pub mod project;
pub mod scenario;

// Re-export commonly used types
pub use appraisal::{
    AppraisalConfig, AppraisalEngine, AppraisalResult, CashFlowSeries, Diagnostic, Evaluation,
    FinancialInputs,
};
pub use error::AppraisalError;
pub use project::{ProjectId, ProjectStore};
pub use scenario::ScenarioRunner;
