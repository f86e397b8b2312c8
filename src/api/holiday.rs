use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

use crate::api::MonthQuery;
use crate::dashboard::Dashboard;
use crate::model::holiday::{HolidayId, NewHoliday};

/// List holidays, optionally for one month
#[utoipa::path(
    get,
    path = "/api/holidays",
    params(MonthQuery),
    responses(
        (status = 200, description = "Holidays sorted by date", body = [crate::model::holiday::Holiday])
    ),
    tag = "Holiday"
)]
pub async fn list_holidays(
    dashboard: web::Data<Dashboard>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let holidays = match query.month {
        Some(month) => dashboard.holidays.in_month(month),
        None => dashboard.holidays.list(),
    };

    Ok(HttpResponse::Ok().json(holidays))
}

/// Add a holiday and clear attendance on its date
#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body(content = NewHoliday, content_type = "application/json"),
    responses(
        (status = 201, description = "Holiday added", body = Object, example = json!({
            "holiday": {"id": 12, "name": "Independence Day", "date": "2024-03-26"},
            "cleared_marks": 3,
            "marks_cleared_on_backend": true,
            "stored_locally": false
        })),
        (status = 400, description = "Empty name or a holiday already exists on that date", body = Object, example = json!({
            "error": "A holiday \"New Year Day\" already exists on 2024-01-01"
        }))
    ),
    tag = "Holiday"
)]
pub async fn add_holiday(
    dashboard: web::Data<Dashboard>,
    payload: web::Json<NewHoliday>,
) -> actix_web::Result<impl Responder> {
    let added = dashboard
        .holidays
        .add(payload.into_inner(), &dashboard.grid)
        .await?;

    Ok(HttpResponse::Created().json(added))
}

/// Delete a holiday; attendance cleared on that date stays cleared
#[utoipa::path(
    delete,
    path = "/api/holidays/{id}",
    params(("id" = String, Path, description = "Backend id or local uuid")),
    responses(
        (status = 200, description = "Holiday removed", body = Object, example = json!({
            "message": "Holiday \"New Year Day\" removed"
        })),
        (status = 404, description = "No such holiday")
    ),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    dashboard: web::Data<Dashboard>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let id: HolidayId = path
        .parse()
        .map_err(actix_web::error::ErrorBadRequest)?;

    let removed = dashboard.holidays.remove(id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Holiday \"{}\" removed", removed.name)
    })))
}

/// Reload holidays from the backend
#[utoipa::path(
    post,
    path = "/api/holidays/refresh",
    responses(
        (status = 200, description = "Where the holidays now come from", body = Object, example = json!({
            "source": "backend",
            "count": 11
        }))
    ),
    tag = "Holiday"
)]
pub async fn refresh_holidays(dashboard: web::Data<Dashboard>) -> actix_web::Result<impl Responder> {
    let source = dashboard.holidays.refresh().await?;

    Ok(HttpResponse::Ok().json(json!({
        "source": source,
        "count": dashboard.holidays.list().len()
    })))
}

/// Whether locally stored holidays wait for migration
#[utoipa::path(
    get,
    path = "/api/holidays/migration",
    responses(
        (status = 200, description = "Migration status", body = crate::state::holidays::MigrationStatus)
    ),
    tag = "Holiday"
)]
pub async fn migration_status(dashboard: web::Data<Dashboard>) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(dashboard.holidays.migration_status()))
}

/// Post locally stored holidays to the backend
#[utoipa::path(
    post,
    path = "/api/holidays/migration",
    responses(
        (status = 200, description = "Migration report", body = crate::state::holidays::MigrationReport),
        (status = 502, description = "Backend still unreachable")
    ),
    tag = "Holiday"
)]
pub async fn migrate_holidays(dashboard: web::Data<Dashboard>) -> actix_web::Result<impl Responder> {
    let report = dashboard.holidays.migrate_to_backend().await?;

    Ok(HttpResponse::Ok().json(report))
}
