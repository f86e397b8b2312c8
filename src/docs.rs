use crate::api::attendance::MarkAttendance;
use crate::api::employee::EmployeeListResponse;
use crate::api::leave_request::LeaveDecision;
use crate::api::session::InstallToken;
use crate::client::{ExportFormat, ServerValidation};
use crate::model::attendance::{AttendanceStats, AttendanceStatus};
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::holiday::{Holiday, NewHoliday};
use crate::model::leave_request::{LeaveAction, LeaveRequest};
use crate::model::validation::{MissingSlot, ValidationSnapshot};
use crate::state::completion::Confirmation;
use crate::state::holidays::{HolidaySource, MigrationReport, MigrationStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Dashboard API",
        version = "0.1.0",
        description = r#"
## HRM Dashboard

Local API behind the HR administration dashboard. It keeps the attendance
grid of the displayed month, the holiday calendar and the completion banner,
and forwards every change to the HR backend.

### 🔹 Key Features
- **Attendance grid**
  - Month overview, mark and unmark cells, clear a month
- **Holidays**
  - Add and remove holidays; marks on a new holiday are cleared
  - Keeps working from a local copy while the backend is down
- **Validation & export**
  - Completion percentage and missing slots
  - Excel/PDF export, with a confirmation step for incomplete months
- **Employees, departments, leaves**

### 🔐 Session
Install the backend's access token with `POST /api/session`. Every other
endpoint answers `401` with `"redirect": "/login"` while no live token is
installed or after the backend rejected it.

---
Built with **Rust**, **Actix Web**, **reqwest**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::session::install_token,
        crate::api::session::session_status,
        crate::api::session::logout,

        crate::api::attendance::overview,
        crate::api::attendance::mark,
        crate::api::attendance::unmark,
        crate::api::attendance::clear_month,
        crate::api::attendance::stats,
        crate::api::attendance::validate,
        crate::api::attendance::validate_on_server,
        crate::api::attendance::export,

        crate::api::holiday::list_holidays,
        crate::api::holiday::add_holiday,
        crate::api::holiday::delete_holiday,
        crate::api::holiday::refresh_holidays,
        crate::api::holiday::migration_status,
        crate::api::holiday::migrate_holidays,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::refresh_employees,
        crate::api::employee::list_departments,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::decide_leave
    ),
    components(
        schemas(
            InstallToken,
            MarkAttendance,
            AttendanceStatus,
            AttendanceStats,
            ValidationSnapshot,
            MissingSlot,
            ServerValidation,
            ExportFormat,
            Confirmation,
            Holiday,
            NewHoliday,
            HolidaySource,
            MigrationStatus,
            MigrationReport,
            Employee,
            EmployeeListResponse,
            Department,
            LeaveRequest,
            LeaveAction,
            LeaveDecision
        )
    ),
    tags(
        (name = "Session", description = "Backend token handling"),
        (name = "Attendance", description = "Attendance grid, validation and export"),
        (name = "Holiday", description = "Holiday calendar"),
        (name = "Employee", description = "Employees and departments"),
        (name = "Leave", description = "Leave and overtime requests"),
    )
)]
pub struct ApiDoc;
