//! In-memory keyed record store for projects, line items and sales
//!
//! The store owns field validation and assembles the `FinancialInputs`
//! snapshot the appraisal engine consumes. Every lookup takes an explicit
//! `ProjectId`; `latest_project_id` is how a caller resolves the active
//! project once before threading the id through.

use chrono::Utc;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

use super::data::{
    LineItem, LineItemDetails, LineItemId, LineItemKind, LineItemTotals, Project, ProjectDetails,
    ProjectId, ProjectSales, SalesPeriod,
};
use crate::appraisal::{validate_rate, FinancialInputs};
use crate::error::AppraisalError;

/// Everything the cash-flow overview shows for one project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectOverview {
    pub project: Project,
    pub totals: LineItemTotals,
    pub sales: ProjectSales,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
    projects: BTreeMap<ProjectId, Project>,
    line_items: BTreeMap<LineItemId, LineItem>,
    sales: BTreeMap<ProjectId, ProjectSales>,
    next_project_id: u32,
    next_line_item_id: u32,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Projects ----

    /// Create a project and return its id
    pub fn create_project(&mut self, details: ProjectDetails) -> Result<ProjectId, AppraisalError> {
        validate_project(&details)?;

        self.next_project_id = next_id(self.next_project_id, "project")?;
        let id = ProjectId(self.next_project_id);
        info!("Created project {} ({})", id, details.name);

        self.projects.insert(
            id,
            Project {
                id,
                details,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    /// Insert a fully formed project, keeping its id (used by the workbook loader)
    pub fn insert_project(&mut self, project: Project) -> Result<(), AppraisalError> {
        validate_project(&project.details)?;
        if self.projects.contains_key(&project.id) {
            return Err(AppraisalError::Validation(format!(
                "duplicate project id {}",
                project.id
            )));
        }

        self.next_project_id = self.next_project_id.max(project.id.0);
        self.projects.insert(project.id, project);
        Ok(())
    }

    pub fn update_project(
        &mut self,
        id: ProjectId,
        details: ProjectDetails,
    ) -> Result<(), AppraisalError> {
        validate_project(&details)?;
        let project = self
            .projects
            .get_mut(&id)
            .ok_or(AppraisalError::ProjectNotFound(id))?;

        project.details = details;
        info!("Updated project {}", id);
        Ok(())
    }

    pub fn project(&self, id: ProjectId) -> Result<&Project, AppraisalError> {
        self.projects.get(&id).ok_or(AppraisalError::ProjectNotFound(id))
    }

    /// Most recently created project, if any
    pub fn latest_project_id(&self) -> Option<ProjectId> {
        self.projects.keys().next_back().copied()
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    // ---- Line items ----

    pub fn add_line_item(
        &mut self,
        project_id: ProjectId,
        kind: LineItemKind,
        details: LineItemDetails,
    ) -> Result<LineItemId, AppraisalError> {
        self.project(project_id)?;
        validate_line_item(kind, &details)?;

        self.next_line_item_id = next_id(self.next_line_item_id, "line item")?;
        let id = LineItemId(self.next_line_item_id);
        info!("Added {} \"{}\" to project {}", kind, details.name, project_id);

        self.line_items.insert(
            id,
            LineItem {
                id,
                project_id,
                kind,
                details,
            },
        );
        Ok(id)
    }

    pub fn update_line_item(
        &mut self,
        id: LineItemId,
        details: LineItemDetails,
    ) -> Result<(), AppraisalError> {
        let item = self
            .line_items
            .get_mut(&id)
            .ok_or(AppraisalError::LineItemNotFound { kind: "Line item", id })?;
        validate_line_item(item.kind, &details)?;

        item.details = details;
        info!("Updated {} {}", item.kind, id);
        Ok(())
    }

    /// Remove a line item, returning it
    pub fn remove_line_item(&mut self, id: LineItemId) -> Result<LineItem, AppraisalError> {
        let item = self
            .line_items
            .remove(&id)
            .ok_or(AppraisalError::LineItemNotFound { kind: "Line item", id })?;

        info!("Removed {} \"{}\"", item.kind, item.details.name);
        Ok(item)
    }

    pub fn line_item(&self, id: LineItemId) -> Result<&LineItem, AppraisalError> {
        self.line_items
            .get(&id)
            .ok_or(AppraisalError::LineItemNotFound { kind: "Line item", id })
    }

    /// Line items of one kind for a project, in insertion order
    pub fn line_items(&self, project_id: ProjectId, kind: LineItemKind) -> Vec<&LineItem> {
        self.line_items
            .values()
            .filter(|item| item.project_id == project_id && item.kind == kind)
            .collect()
    }

    pub fn totals(&self, project_id: ProjectId) -> Result<LineItemTotals, AppraisalError> {
        self.project(project_id)?;

        let mut totals = LineItemTotals::default();
        for item in self.line_items.values().filter(|item| item.project_id == project_id) {
            totals.add(item.kind, item.details.value);
        }
        Ok(totals)
    }

    // ---- Sales ----

    /// Create or replace one sales schedule
    pub fn save_sales(
        &mut self,
        project_id: ProjectId,
        period: SalesPeriod,
        units: Vec<u32>,
    ) -> Result<(), AppraisalError> {
        self.project(project_id)?;
        if units.len() != period.slots() {
            return Err(AppraisalError::Validation(format!(
                "{:?} sales need {} values, got {}",
                period,
                period.slots(),
                units.len()
            )));
        }

        self.sales.entry(project_id).or_default().set(period, units);
        info!("Saved {:?} sales for project {}", period, project_id);
        Ok(())
    }

    pub fn sales(&self, project_id: ProjectId) -> Result<ProjectSales, AppraisalError> {
        self.project(project_id)?;
        Ok(self.sales.get(&project_id).cloned().unwrap_or_default())
    }

    // ---- Aggregates ----

    pub fn overview(&self, project_id: ProjectId) -> Result<ProjectOverview, AppraisalError> {
        Ok(ProjectOverview {
            project: self.project(project_id)?.clone(),
            totals: self.totals(project_id)?,
            sales: self.sales(project_id)?,
        })
    }

    /// Remove every line item and sales schedule of a project, keeping the project
    pub fn clear_data(&mut self, project_id: ProjectId) -> Result<(), AppraisalError> {
        self.project(project_id)?;

        let before = self.line_items.len();
        self.line_items.retain(|_, item| item.project_id != project_id);
        self.sales.remove(&project_id);

        info!(
            "Cleared {} line items and sales for project {}",
            before - self.line_items.len(),
            project_id
        );
        Ok(())
    }

    /// Snapshot of the inputs the appraisal engine needs for one project
    pub fn financial_inputs(&self, project_id: ProjectId) -> Result<FinancialInputs, AppraisalError> {
        let project = self.project(project_id)?;
        let totals = self.totals(project_id)?;
        let yearly_units_sold = self
            .sales
            .get(&project_id)
            .and_then(|sales| sales.yearly.clone());

        Ok(FinancialInputs {
            project_id,
            discount_rate: project.details.discount_rate,
            initial_investment: project.initial_investment(),
            periodic_costs: totals.costs,
            periodic_expenses: totals.expenses,
            monthly_salaries: totals.salaries,
            materials_total: totals.materials,
            unit_price: project.details.product_price,
            yearly_units_sold,
        })
    }
}

fn next_id(current: u32, what: &str) -> Result<u32, AppraisalError> {
    current
        .checked_add(1)
        .ok_or_else(|| AppraisalError::Validation(format!("{} ids exhausted", what)))
}

fn validate_project(details: &ProjectDetails) -> Result<(), AppraisalError> {
    if details.name.trim().is_empty() {
        return Err(AppraisalError::Validation("project name is required".to_string()));
    }
    validate_rate(details.discount_rate)?;
    non_negative("investment amount", details.investment_amount)?;
    non_negative("product price", details.product_price)
}

fn validate_line_item(kind: LineItemKind, details: &LineItemDetails) -> Result<(), AppraisalError> {
    if details.name.trim().is_empty() {
        return Err(AppraisalError::Validation(format!("{} name is required", kind)));
    }
    non_negative(kind.as_str(), details.value)
}

fn non_negative(field: &str, value: f64) -> Result<(), AppraisalError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AppraisalError::Validation(format!(
            "{} must be a non-negative amount, got {}",
            field, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_project() -> (ProjectStore, ProjectId) {
        let mut store = ProjectStore::new();
        let id = store
            .create_project(ProjectDetails {
                has_investment: true,
                investment_amount: 10_000.0,
                discount_rate: 0.12,
                product_price: 3.0,
                ..ProjectDetails::new("Coffee cart")
            })
            .unwrap();
        (store, id)
    }

    #[test]
    fn test_latest_project() {
        let (mut store, first) = store_with_project();
        assert_eq!(store.latest_project_id(), Some(first));

        let second = store.create_project(ProjectDetails::new("Juice bar")).unwrap();
        assert_eq!(store.latest_project_id(), Some(second));
        assert!(ProjectStore::new().latest_project_id().is_none());
    }

    #[test]
    fn test_totals_per_kind_and_project() {
        let (mut store, id) = store_with_project();
        let other = store.create_project(ProjectDetails::new("Other")).unwrap();

        store.add_line_item(id, LineItemKind::Cost, LineItemDetails::new("Permits", 700.0)).unwrap();
        store.add_line_item(id, LineItemKind::Cost, LineItemDetails::new("Fit-out", 1_400.0)).unwrap();
        store.add_line_item(id, LineItemKind::Expense, LineItemDetails::new("Utilities", 350.0)).unwrap();
        store
            .add_line_item(
                id,
                LineItemKind::Personnel,
                LineItemDetails::new("Ana", 900.0).with_profile("Barista"),
            )
            .unwrap();
        store.add_line_item(id, LineItemKind::Material, LineItemDetails::new("Grinder", 600.0)).unwrap();
        store.add_line_item(other, LineItemKind::Cost, LineItemDetails::new("Unrelated", 5.0)).unwrap();

        let totals = store.totals(id).unwrap();
        assert_eq!(totals.costs, 2_100.0);
        assert_eq!(totals.expenses, 350.0);
        assert_eq!(totals.salaries, 900.0);
        assert_eq!(totals.materials, 600.0);
        assert_eq!(store.line_items(id, LineItemKind::Cost).len(), 2);
    }

    #[test]
    fn test_update_and_remove_line_item() {
        let (mut store, id) = store_with_project();
        let item = store.add_line_item(id, LineItemKind::Expense, LineItemDetails::new("Rent", 100.0)).unwrap();

        store.update_line_item(item, LineItemDetails::new("Rent", 250.0)).unwrap();
        assert_eq!(store.totals(id).unwrap().expenses, 250.0);

        let removed = store.remove_line_item(item).unwrap();
        assert_eq!(removed.details.name, "Rent");
        assert_eq!(store.totals(id).unwrap().expenses, 0.0);
        assert!(matches!(
            store.remove_line_item(item),
            Err(AppraisalError::LineItemNotFound { .. })
        ));
    }

    #[test]
    fn test_validation() {
        let (mut store, id) = store_with_project();

        assert!(store.add_line_item(id, LineItemKind::Cost, LineItemDetails::new("", 1.0)).is_err());
        assert!(store.add_line_item(id, LineItemKind::Cost, LineItemDetails::new("Bad", -1.0)).is_err());
        assert!(store
            .add_line_item(ProjectId(99), LineItemKind::Cost, LineItemDetails::new("Orphan", 1.0))
            .is_err());

        let bad_rate = ProjectDetails {
            discount_rate: -1.0,
            ..ProjectDetails::new("Bad rate")
        };
        assert!(matches!(
            store.create_project(bad_rate),
            Err(AppraisalError::InvalidRate { .. })
        ));
        assert!(store.update_project(ProjectId(42), ProjectDetails::new("Ghost")).is_err());
    }

    #[test]
    fn test_sales_schedules() {
        let (mut store, id) = store_with_project();

        assert!(store.save_sales(id, SalesPeriod::Weekly, vec![1, 2, 3]).is_err());
        store.save_sales(id, SalesPeriod::Weekly, vec![5, 6, 7, 8]).unwrap();
        store.save_sales(id, SalesPeriod::Yearly, vec![100; 7]).unwrap();
        store.save_sales(id, SalesPeriod::Yearly, vec![200; 7]).unwrap();

        let sales = store.sales(id).unwrap();
        assert_eq!(sales.weekly.as_deref(), Some(&[5, 6, 7, 8][..]));
        assert_eq!(sales.total_units(SalesPeriod::Yearly), 1_400);
        assert!(sales.daily.is_none());
    }

    #[test]
    fn test_clear_data_keeps_project() {
        let (mut store, id) = store_with_project();
        store.add_line_item(id, LineItemKind::Cost, LineItemDetails::new("Permits", 700.0)).unwrap();
        store.save_sales(id, SalesPeriod::Yearly, vec![10; 7]).unwrap();

        store.clear_data(id).unwrap();

        assert!(store.project(id).is_ok());
        assert_eq!(store.totals(id).unwrap(), LineItemTotals::default());
        assert_eq!(store.sales(id).unwrap(), ProjectSales::default());
    }

    #[test]
    fn test_financial_inputs() {
        let (mut store, id) = store_with_project();
        store.add_line_item(id, LineItemKind::Cost, LineItemDetails::new("Permits", 700.0)).unwrap();
        store.add_line_item(id, LineItemKind::Personnel, LineItemDetails::new("Ana", 900.0)).unwrap();
        store.add_line_item(id, LineItemKind::Material, LineItemDetails::new("Cart", 2_000.0)).unwrap();

        let inputs = store.financial_inputs(id).unwrap();
        assert_eq!(inputs.project_id, id);
        assert_eq!(inputs.discount_rate, 0.12);
        assert_eq!(inputs.initial_investment, 10_000.0);
        assert_eq!(inputs.periodic_costs, 700.0);
        assert_eq!(inputs.monthly_salaries, 900.0);
        assert_eq!(inputs.materials_total, 2_000.0);
        assert_eq!(inputs.unit_price, 3.0);
        assert_eq!(inputs.yearly_units_sold, None);

        store.save_sales(id, SalesPeriod::Yearly, vec![1, 2, 3, 4, 5, 6, 7]).unwrap();
        let inputs = store.financial_inputs(id).unwrap();
        assert_eq!(inputs.yearly_units_sold, Some(vec![1, 2, 3, 4, 5, 6, 7]));
    }

    #[test]
    fn test_insert_project_keeps_id() {
        let mut store = ProjectStore::new();
        let project = Project {
            id: ProjectId(7),
            details: ProjectDetails::new("Imported"),
            created_at: Utc::now(),
        };
        store.insert_project(project.clone()).unwrap();
        assert!(store.insert_project(project).is_err());

        let next = store.create_project(ProjectDetails::new("Fresh")).unwrap();
        assert_eq!(next, ProjectId(8));
    }

    #[test]
    fn test_exhausted_ids_are_rejected() {
        let mut store = ProjectStore::new();
        store
            .insert_project(Project {
                id: ProjectId(u32::MAX),
                details: ProjectDetails::new("Imported"),
                created_at: Utc::now(),
            })
            .unwrap();

        assert!(matches!(
            store.create_project(ProjectDetails::new("Fresh")),
            Err(AppraisalError::Validation(_))
        ));
        assert_eq!(store.projects().count(), 1);

        store.next_line_item_id = u32::MAX;
        assert!(matches!(
            store.add_line_item(ProjectId(u32::MAX), LineItemKind::Cost, LineItemDetails::new("Rent", 10.0)),
            Err(AppraisalError::Validation(_))
        ));
        assert!(store.line_items(ProjectId(u32::MAX), LineItemKind::Cost).is_empty());
    }
}
