//! Load a project workbook (projects, line items, sales) from CSV files
//!
//! A workbook directory holds:
//! - `projects.csv`: `id,name,activity_type,has_investment,investment_amount,discount_rate,product_name,product_price`
//! - `line_items.csv`: `project_id,kind,name,profile,value`
//! - `sales.csv`: `project_id,period,units` with `units` as a `;`-separated list
//!
//! `line_items.csv` and `sales.csv` are optional.

use chrono::Utc;
use csv::Reader;
use std::io::Read;
use std::path::Path;

use super::data::{
    LineItemDetails, LineItemKind, Project, ProjectDetails, ProjectId, SalesPeriod,
    DEFAULT_DISCOUNT_RATE,
};
use super::store::ProjectStore;
use crate::error::AppraisalError;

pub const PROJECTS_FILE: &str = "projects.csv";
pub const LINE_ITEMS_FILE: &str = "line_items.csv";
pub const SALES_FILE: &str = "sales.csv";

#[derive(Debug, serde::Deserialize)]
struct ProjectRow {
    id: u32,
    name: String,
    activity_type: Option<String>,
    has_investment: String,
    investment_amount: Option<f64>,
    discount_rate: Option<f64>,
    product_name: Option<String>,
    product_price: Option<f64>,
}

impl ProjectRow {
    fn to_project(self) -> Result<Project, AppraisalError> {
        let has_investment = match self.has_investment.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" | "si" => true,
            "no" | "false" | "0" | "" => false,
            other => {
                return Err(AppraisalError::Validation(format!(
                    "Unknown has_investment value for project {}: {}",
                    self.id, other
                )))
            }
        };

        Ok(Project {
            id: ProjectId(self.id),
            details: ProjectDetails {
                name: self.name,
                activity_type: self.activity_type,
                has_investment,
                investment_amount: self.investment_amount.unwrap_or(0.0),
                discount_rate: self.discount_rate.unwrap_or(DEFAULT_DISCOUNT_RATE),
                product_name: self.product_name,
                product_price: self.product_price.unwrap_or(0.0),
            },
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, serde::Deserialize)]
struct LineItemRow {
    project_id: u32,
    kind: String,
    name: String,
    profile: Option<String>,
    value: f64,
}

#[derive(Debug, serde::Deserialize)]
struct SalesRow {
    project_id: u32,
    period: String,
    units: String,
}

impl SalesRow {
    fn parse_units(&self) -> Result<Vec<u32>, AppraisalError> {
        self.units
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u32>().map_err(|e| {
                    AppraisalError::Validation(format!(
                        "Invalid unit count '{}' for project {}: {}",
                        s, self.project_id, e
                    ))
                })
            })
            .collect()
    }
}

/// Add every project in `reader` to the store
pub fn load_projects_from_reader<R: Read>(
    store: &mut ProjectStore,
    reader: R,
) -> Result<usize, AppraisalError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut count = 0;

    for result in csv_reader.deserialize() {
        let row: ProjectRow = result?;
        store.insert_project(row.to_project()?)?;
        count += 1;
    }

    Ok(count)
}

/// Add every line item in `reader` to the store; projects must already exist
pub fn load_line_items_from_reader<R: Read>(
    store: &mut ProjectStore,
    reader: R,
) -> Result<usize, AppraisalError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut count = 0;

    for result in csv_reader.deserialize() {
        let row: LineItemRow = result?;
        let kind = LineItemKind::parse(&row.kind).ok_or_else(|| {
            AppraisalError::Validation(format!("Unknown line item kind: {}", row.kind))
        })?;

        store.add_line_item(
            ProjectId(row.project_id),
            kind,
            LineItemDetails {
                name: row.name,
                profile: row.profile,
                value: row.value,
            },
        )?;
        count += 1;
    }

    Ok(count)
}

/// Save every sales schedule in `reader`; projects must already exist
pub fn load_sales_from_reader<R: Read>(
    store: &mut ProjectStore,
    reader: R,
) -> Result<usize, AppraisalError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut count = 0;

    for result in csv_reader.deserialize() {
        let row: SalesRow = result?;
        let period = SalesPeriod::parse(&row.period).ok_or_else(|| {
            AppraisalError::Validation(format!("Unknown sales period: {}", row.period))
        })?;
        let units = row.parse_units()?;

        store.save_sales(ProjectId(row.project_id), period, units)?;
        count += 1;
    }

    Ok(count)
}

/// Load a workbook directory into a new store
pub fn load_workbook<P: AsRef<Path>>(dir: P) -> Result<ProjectStore, AppraisalError> {
    let dir = dir.as_ref();
    let mut store = ProjectStore::new();

    let projects = load_projects_from_reader(&mut store, std::fs::File::open(dir.join(PROJECTS_FILE))?)?;

    let line_items_path = dir.join(LINE_ITEMS_FILE);
    let line_items = if line_items_path.exists() {
        load_line_items_from_reader(&mut store, std::fs::File::open(line_items_path)?)?
    } else {
        0
    };

    let sales_path = dir.join(SALES_FILE);
    let sales = if sales_path.exists() {
        load_sales_from_reader(&mut store, std::fs::File::open(sales_path)?)?
    } else {
        0
    };

    log::info!(
        "Loaded workbook {}: {} projects, {} line items, {} sales schedules",
        dir.display(),
        projects,
        line_items,
        sales
    );
    Ok(store)
}
