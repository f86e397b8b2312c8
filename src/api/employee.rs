use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::dashboard::Dashboard;
use crate::model::employee::{Employee, EmployeeFilter};

#[derive(serde::Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Case-insensitive name or email search
    pub search: Option<String>,
    /// Department name
    pub department: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 10)]
    pub total: usize,
}

/// List employees from the directory cache
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employees", body = EmployeeListResponse),
        (status = 401, description = "No session"),
        (status = 502, description = "Backend unreachable")
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    dashboard: web::Data<Dashboard>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let query = query.into_inner();
    let filter = EmployeeFilter {
        search: query.search,
        department: query.department,
    };

    let data = dashboard.directory.filtered(&filter).await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        total: data.len(),
        data,
    }))
}

/// Get a single employee
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee 42 not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    dashboard: web::Data<Dashboard>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee = dashboard.directory.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Drop the cached employee list and fetch it again
#[utoipa::path(
    post,
    path = "/api/employees/refresh",
    responses(
        (status = 200, description = "Directory refreshed", body = Object, example = json!({
            "message": "Employee directory refreshed",
            "total": 10
        }))
    ),
    tag = "Employee"
)]
pub async fn refresh_employees(dashboard: web::Data<Dashboard>) -> actix_web::Result<impl Responder> {
    let employees = dashboard.directory.refresh().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee directory refreshed",
        "total": employees.len()
    })))
}

/// Departments for the overview filter
#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Departments", body = [crate::model::department::Department])
    ),
    tag = "Employee"
)]
pub async fn list_departments(dashboard: web::Data<Dashboard>) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(dashboard.departments().await?))
}
