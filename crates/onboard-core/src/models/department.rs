use std::fmt;

use serde::{Deserialize, Serialize};

/// Departments an employee can belong to. Serialized as the backend's
/// SCREAMING_SNAKE_CASE names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Department {
    Finance,
    HumanResources,
    Marketing,
    ResearchAndDevelopment,
    #[default]
    #[serde(rename = "IT")]
    It,
    CustomerService,
    OperationsManagement,
    Administration,
    Purchasing,
    Production,
    Sales,
    Accounting,
    MaintenanceDepartment,
    Design,
    QualityManagement,
    BusinessDevelopment,
    Law,
    ProductDevelopment,
    HumanResourceDevelopment,
    Distribution,
    DispatchDepartment,
    StoreDepartment,
    Management,
}

impl Department {
    pub const ALL: [Department; 23] = [
        Department::Finance,
        Department::HumanResources,
        Department::Marketing,
        Department::ResearchAndDevelopment,
        Department::It,
        Department::CustomerService,
        Department::OperationsManagement,
        Department::Administration,
        Department::Purchasing,
        Department::Production,
        Department::Sales,
        Department::Accounting,
        Department::MaintenanceDepartment,
        Department::Design,
        Department::QualityManagement,
        Department::BusinessDevelopment,
        Department::Law,
        Department::ProductDevelopment,
        Department::HumanResourceDevelopment,
        Department::Distribution,
        Department::DispatchDepartment,
        Department::StoreDepartment,
        Department::Management,
    ];

    /// Backend code, e.g. `RESEARCH_AND_DEVELOPMENT`.
    pub fn code(&self) -> &'static str {
        match self {
            Department::Finance => "FINANCE",
            Department::HumanResources => "HUMAN_RESOURCES",
            Department::Marketing => "MARKETING",
            Department::ResearchAndDevelopment => "RESEARCH_AND_DEVELOPMENT",
            Department::It => "IT",
            Department::CustomerService => "CUSTOMER_SERVICE",
            Department::OperationsManagement => "OPERATIONS_MANAGEMENT",
            Department::Administration => "ADMINISTRATION",
            Department::Purchasing => "PURCHASING",
            Department::Production => "PRODUCTION",
            Department::Sales => "SALES",
            Department::Accounting => "ACCOUNTING",
            Department::MaintenanceDepartment => "MAINTENANCE_DEPARTMENT",
            Department::Design => "DESIGN",
            Department::QualityManagement => "QUALITY_MANAGEMENT",
            Department::BusinessDevelopment => "BUSINESS_DEVELOPMENT",
            Department::Law => "LAW",
            Department::ProductDevelopment => "PRODUCT_DEVELOPMENT",
            Department::HumanResourceDevelopment => "HUMAN_RESOURCE_DEVELOPMENT",
            Department::Distribution => "DISTRIBUTION",
            Department::DispatchDepartment => "DISPATCH_DEPARTMENT",
            Department::StoreDepartment => "STORE_DEPARTMENT",
            Department::Management => "MANAGEMENT",
        }
    }

    /// Human readable name: the code with underscores as spaces.
    pub fn display_name(&self) -> String {
        self.code().replace('_', " ")
    }

    /// Parse a backend code or display name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().replace(' ', "_").to_uppercase();
        Self::ALL.iter().copied().find(|d| d.code() == normalized)
    }

    /// Departments whose display name contains `query`, ignoring case.
    /// An empty query matches everything.
    pub fn search(query: &str) -> Vec<Department> {
        let query = query.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .filter(|d| d.display_name().to_lowercase().contains(&query))
            .collect()
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}
