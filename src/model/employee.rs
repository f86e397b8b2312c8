use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Employee as the backend lists it. The month snapshot sends a reduced
/// shape (`department` instead of `department_name`), so everything past the
/// identity is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": "EMP-001",
        "name": "John Doe",
        "email": "john.doe@company.com",
        "department": "Engineering",
        "position": "Developer",
        "is_active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    /// Human-facing employee code.
    #[serde(default, rename = "employee_id")]
    #[schema(example = "EMP-001", nullable = true)]
    pub code: Option<String>,

    #[schema(example = "John Doe")]
    pub name: String,

    #[serde(default)]
    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub department_id: Option<u64>,

    #[serde(default, alias = "department_name")]
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[serde(default)]
    pub position: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Search box and department dropdown of the overview.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmployeeFilter {
    /// Case-insensitive match on name or email
    pub search: Option<String>,
    /// Exact department name
    pub department: Option<String>,
}

impl EmployeeFilter {
    pub fn matches(&self, employee: &Employee) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                employee.name.to_lowercase().contains(&term)
                    || employee.email.to_lowercase().contains(&term)
            }
        };

        let matches_department = match self.department.as_deref() {
            None | Some("") => true,
            Some(dept) => employee.department.as_deref() == Some(dept),
        };

        matches_search && matches_department
    }

    pub fn apply<'a>(&self, employees: &'a [Employee]) -> Vec<&'a Employee> {
        employees.iter().filter(|e| self.matches(e)).collect()
    }
}
