//! Project records: the project itself, its line items and sales schedules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discount rate assigned to projects that do not specify one
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.001;

/// Identifier of a project in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u32);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a cost, expense, personnel or material entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub u32);

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Editable project fields (everything except identity and creation time)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub name: String,
    pub activity_type: Option<String>,

    /// Whether the project declares an initial investment at all
    pub has_investment: bool,
    pub investment_amount: f64,

    /// Per-period discount rate (decimal)
    pub discount_rate: f64,

    pub product_name: Option<String>,

    /// Sale price of one unit of the product
    pub product_price: f64,
}

impl ProjectDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activity_type: None,
            has_investment: false,
            investment_amount: 0.0,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            product_name: None,
            product_price: 0.0,
        }
    }
}

/// A stored project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    #[serde(flatten)]
    pub details: ProjectDetails,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Period-0 outlay: the investment amount, or 0 when none is declared
    pub fn initial_investment(&self) -> f64 {
        if self.details.has_investment {
            self.details.investment_amount
        } else {
            0.0
        }
    }
}

/// Category of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemKind {
    /// Technical-feasibility costs, spread over the horizon
    Cost,
    /// Technical-feasibility expenses, spread over the horizon
    Expense,
    /// Staff member; the value is a monthly salary
    Personnel,
    /// Equipment and machinery
    Material,
}

impl LineItemKind {
    pub const ALL: [LineItemKind; 4] = [
        LineItemKind::Cost,
        LineItemKind::Expense,
        LineItemKind::Personnel,
        LineItemKind::Material,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemKind::Cost => "cost",
            LineItemKind::Expense => "expense",
            LineItemKind::Personnel => "personnel",
            LineItemKind::Material => "material",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "cost" => Some(LineItemKind::Cost),
            "expense" => Some(LineItemKind::Expense),
            "personnel" => Some(LineItemKind::Personnel),
            "material" => Some(LineItemKind::Material),
            _ => None,
        }
    }
}

impl fmt::Display for LineItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable line-item fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemDetails {
    pub name: String,

    /// Job profile, only meaningful for personnel
    pub profile: Option<String>,

    /// Amount; monthly salary for personnel
    pub value: f64,
}

impl LineItemDetails {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            profile: None,
            value,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// A stored line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub project_id: ProjectId,
    pub kind: LineItemKind,
    #[serde(flatten)]
    pub details: LineItemDetails,
}

/// Sum of line-item values per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemTotals {
    pub costs: f64,
    pub expenses: f64,
    /// Monthly payroll
    pub salaries: f64,
    pub materials: f64,
}

impl LineItemTotals {
    pub fn add(&mut self, kind: LineItemKind, value: f64) {
        match kind {
            LineItemKind::Cost => self.costs += value,
            LineItemKind::Expense => self.expenses += value,
            LineItemKind::Personnel => self.salaries += value,
            LineItemKind::Material => self.materials += value,
        }
    }
}

/// Granularity of a sales schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesPeriod {
    /// Monday through Sunday
    Daily,
    /// Weeks 1-4
    Weekly,
    /// First seven months of the year
    Monthly,
    /// Projection years 1-7; the only schedule that drives cash flows
    Yearly,
}

impl SalesPeriod {
    /// Number of slots in a schedule of this granularity
    pub fn slots(&self) -> usize {
        match self {
            SalesPeriod::Daily => 7,
            SalesPeriod::Weekly => 4,
            SalesPeriod::Monthly => 7,
            SalesPeriod::Yearly => 7,
        }
    }

    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            SalesPeriod::Daily => &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
            SalesPeriod::Weekly => &["Week 1", "Week 2", "Week 3", "Week 4"],
            SalesPeriod::Monthly => &["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul"],
            SalesPeriod::Yearly => &["Y1", "Y2", "Y3", "Y4", "Y5", "Y6", "Y7"],
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(SalesPeriod::Daily),
            "weekly" => Some(SalesPeriod::Weekly),
            "monthly" => Some(SalesPeriod::Monthly),
            "yearly" => Some(SalesPeriod::Yearly),
            _ => None,
        }
    }
}

/// Units sold per slot for each recorded granularity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSales {
    pub daily: Option<Vec<u32>>,
    pub weekly: Option<Vec<u32>>,
    pub monthly: Option<Vec<u32>>,
    pub yearly: Option<Vec<u32>>,
}

impl ProjectSales {
    pub fn get(&self, period: SalesPeriod) -> Option<&[u32]> {
        match period {
            SalesPeriod::Daily => self.daily.as_deref(),
            SalesPeriod::Weekly => self.weekly.as_deref(),
            SalesPeriod::Monthly => self.monthly.as_deref(),
            SalesPeriod::Yearly => self.yearly.as_deref(),
        }
    }

    pub(crate) fn set(&mut self, period: SalesPeriod, units: Vec<u32>) {
        let slot = match period {
            SalesPeriod::Daily => &mut self.daily,
            SalesPeriod::Weekly => &mut self.weekly,
            SalesPeriod::Monthly => &mut self.monthly,
            SalesPeriod::Yearly => &mut self.yearly,
        };
        *slot = Some(units);
    }

    /// Total units recorded for one granularity (0 when not recorded)
    pub fn total_units(&self, period: SalesPeriod) -> u64 {
        self.get(period)
            .map(|units| units.iter().map(|&u| u as u64).sum())
            .unwrap_or(0)
    }
}
