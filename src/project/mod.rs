//! Project records and the store that turns them into appraisal inputs

mod data;
pub mod loader;
mod store;

pub use data::{
    LineItem, LineItemDetails, LineItemId, LineItemKind, LineItemTotals, Project, ProjectDetails,
    ProjectId, ProjectSales, SalesPeriod, DEFAULT_DISCOUNT_RATE,
};
pub use loader::load_workbook;
pub use store::{ProjectOverview, ProjectStore};
