use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::MonthQuery;
use crate::client::ExportFormat;
use crate::dashboard::{Dashboard, ExportResult};
use crate::model::attendance::AttendanceStatus;
use crate::model::employee::EmployeeFilter;
use crate::model::month::MonthKey;
use crate::state::completion::Confirmation;

#[derive(Debug, Deserialize, IntoParams)]
pub struct OverviewQuery {
    #[param(value_type = Option<String>, example = "2024-01")]
    pub month: Option<MonthKey>,
    /// Case-insensitive name or email search
    pub search: Option<String>,
    /// Department name
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "2024-01-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ClearQuery {
    /// Must be `true`; clearing a month cannot be undone
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportQuery {
    #[param(value_type = Option<String>, example = "2024-01")]
    pub month: Option<MonthKey>,
    #[param(value_type = Option<String>, example = "excel")]
    pub format: Option<ExportFormat>,
    /// Answer to the incomplete-month prompt
    #[param(value_type = Option<String>, example = "confirm")]
    pub answer: Option<Confirmation>,
}

/// Month grid with holidays and the completion banner
#[utoipa::path(
    get,
    path = "/api/attendance/overview",
    params(OverviewQuery),
    responses(
        (status = 200, description = "Month view", body = Object, example = json!({
            "month": "2024-01",
            "label": "January 2024",
            "days": [{"date": "2024-01-01", "day": 1, "weekday": "Mon", "is_weekend": false, "holiday": "New Year Day"}],
            "rows": [{"employee": {"id": 1, "name": "John Doe"}, "cells": {"2024-01-02": "present"},
                      "stats": {"present": 1, "half_day": 0, "absent": 0, "leave": 0, "overtime": 0}}],
            "holidays_degraded": false,
            "completion": {"completion_percentage": 2, "missing_count": 43, "is_complete": false}
        })),
        (status = 401, description = "No session"),
        (status = 502, description = "Backend unreachable")
    ),
    tag = "Attendance"
)]
pub async fn overview(
    dashboard: web::Data<Dashboard>,
    query: web::Query<OverviewQuery>,
) -> actix_web::Result<impl Responder> {
    let query = query.into_inner();
    let month = MonthQuery { month: query.month }.resolve(&dashboard);
    let filter = EmployeeFilter {
        search: query.search,
        department: query.department,
    };

    let view = dashboard.open_overview(month, &filter).await?;

    Ok(HttpResponse::Ok().json(view))
}

/// Mark one cell
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body(content = MarkAttendance, content_type = "application/json"),
    responses(
        (status = 200, description = "Cell marked", body = Object, example = json!({
            "employee_id": 1, "date": "2024-01-02", "status": "present", "previous": null,
            "stats": {"present": 1, "half_day": 0, "absent": 0, "leave": 0, "overtime": 0},
            "completion_percentage": 2
        })),
        (status = 400, description = "Weekend, holiday, other month or unknown employee", body = Object, example = json!({
            "error": "2024-01-01 is a holiday (New Year Day)"
        })),
        (status = 502, description = "Saved locally, backend did not confirm")
    ),
    tag = "Attendance"
)]
pub async fn mark(
    dashboard: web::Data<Dashboard>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    let MarkAttendance {
        employee_id,
        date,
        status,
    } = payload.into_inner();

    let update = dashboard.mark(employee_id, date, status).await?;

    Ok(HttpResponse::Ok().json(update))
}

/// Remove the mark of one cell
#[utoipa::path(
    delete,
    path = "/api/attendance/{employee_id}/{date}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        ("date" = String, Path, description = "YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Cell cleared", body = Object),
        (status = 400, description = "Date outside the displayed month")
    ),
    tag = "Attendance"
)]
pub async fn unmark(
    dashboard: web::Data<Dashboard>,
    path: web::Path<(u64, NaiveDate)>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, date) = path.into_inner();

    let update = dashboard.unmark(employee_id, date).await?;

    Ok(HttpResponse::Ok().json(update))
}

/// Remove every mark of a month
#[utoipa::path(
    delete,
    path = "/api/attendance/month/{month}",
    params(
        ("month" = String, Path, description = "YYYY-MM or YYYY-MM-01"),
        ClearQuery
    ),
    responses(
        (status = 200, description = "Month cleared", body = Object, example = json!({
            "message": "Attendance cleared for January 2024",
            "removed": 42
        })),
        (status = 400, description = "Missing confirmation")
    ),
    tag = "Attendance"
)]
pub async fn clear_month(
    dashboard: web::Data<Dashboard>,
    path: web::Path<MonthKey>,
    query: web::Query<ClearQuery>,
) -> actix_web::Result<impl Responder> {
    let month = path.into_inner();

    let removed = dashboard.clear_month(month, query.confirm).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Attendance cleared for {}", month.label()),
        "removed": removed
    })))
}

/// Per-status counts of one employee
#[utoipa::path(
    get,
    path = "/api/attendance/stats/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee id"), MonthQuery),
    responses(
        (status = 200, description = "Counts", body = crate::model::attendance::AttendanceStats)
    ),
    tag = "Attendance"
)]
pub async fn stats(
    dashboard: web::Data<Dashboard>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let month = query.resolve(&dashboard);

    Ok(HttpResponse::Ok().json(dashboard.grid.stats_for(path.into_inner(), month)))
}

/// Completion of the month from the dashboard's own state
#[utoipa::path(
    get,
    path = "/api/attendance/validate",
    params(MonthQuery),
    responses(
        (status = 200, description = "Validation snapshot", body = crate::model::validation::ValidationSnapshot)
    ),
    tag = "Attendance"
)]
pub async fn validate(
    dashboard: web::Data<Dashboard>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let month = query.resolve(&dashboard);

    Ok(HttpResponse::Ok().json(dashboard.validate(month)))
}

/// Completion as the backend counts it
#[utoipa::path(
    get,
    path = "/api/attendance/validate/server",
    params(MonthQuery),
    responses(
        (status = 200, description = "Backend validation", body = crate::client::ServerValidation),
        (status = 502, description = "Backend unreachable")
    ),
    tag = "Attendance"
)]
pub async fn validate_on_server(
    dashboard: web::Data<Dashboard>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let month = query.resolve(&dashboard);

    Ok(HttpResponse::Ok().json(dashboard.server_validation(month).await?))
}

/// Download the month report
///
/// An incomplete month answers 409 with the completion figures until the
/// request carries `answer=confirm` or `answer=cancel`.
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "Report file"),
        (status = 409, description = "Month incomplete, confirmation needed", body = Object, example = json!({
            "outcome": "awaiting_confirmation",
            "missing_count": 39,
            "completion_percentage": 43
        }))
    ),
    tag = "Attendance"
)]
pub async fn export(
    dashboard: web::Data<Dashboard>,
    query: web::Query<ExportQuery>,
) -> actix_web::Result<impl Responder> {
    let month = MonthQuery { month: query.month }.resolve(&dashboard);
    let format = query.format.unwrap_or(ExportFormat::Excel);

    let response = match dashboard.export(month, format, query.answer).await? {
        ExportResult::File(file) => HttpResponse::Ok()
            .content_type(file.content_type)
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(file.file_name)],
            })
            .body(file.body),
        ExportResult::NeedsConfirmation(prompt) => HttpResponse::Conflict().json(prompt),
        ExportResult::Cancelled => HttpResponse::Ok().json(json!({ "message": "Export cancelled" })),
    };

    Ok(response)
}
