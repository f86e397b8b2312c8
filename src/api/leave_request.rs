use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::dashboard::Dashboard;
use crate::model::leave_request::LeaveAction;

#[derive(Deserialize, IntoParams)]
pub struct LeaveFilter {
    /// Filter by leave status
    #[param(example = "pending")]
    pub status: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LeaveDecision {
    pub action: LeaveAction,
}

/// List leave and overtime requests
#[utoipa::path(
    get,
    path = "/api/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests", body = [crate::model::leave_request::LeaveRequest])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    dashboard: web::Data<Dashboard>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let leaves = dashboard.leaves(query.status.as_deref()).await?;

    Ok(HttpResponse::Ok().json(leaves))
}

/// Approve or reject a leave request
#[utoipa::path(
    put,
    path = "/api/leaves/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body(content = LeaveDecision, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave decided", body = Object, example = json!({
            "message": "Leave approve done"
        })),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn decide_leave(
    dashboard: web::Data<Dashboard>,
    path: web::Path<u64>,
    payload: web::Json<LeaveDecision>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let action = payload.action;

    dashboard.decide_leave(leave_id, action).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Leave decision failed");
        e
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave {} done", action)
    })))
}

#[cfg(test)]
mod tests {
    use crate::client::fake::FakeBackend;
    use crate::model::leave_request::LeaveRequest;
    use crate::routes;
    use crate::test_support::{dashboard_over, date};
    use actix_web::{App, http::StatusCode, test, web::Data};
    use serde_json::{Value, json};
    use std::sync::Arc;

    #[actix_web::test]
    async fn reject_then_list_by_status() {
        let backend = Arc::new(FakeBackend::with_employees(&["John Doe"]));
        backend.leaves.lock().unwrap().push(LeaveRequest {
            id: 3,
            employee_id: 1,
            employee_name: Some("John Doe".into()),
            leave_type: "sick".into(),
            start_date: date(2024, 1, 15),
            end_date: date(2024, 1, 15),
            days_count: Some(1),
            reason: Some("flu".into()),
            status: "pending".into(),
        });
        let dashboard = Data::new(dashboard_over(backend.clone()));
        let app = test::init_service(
            App::new()
                .app_data(dashboard.clone())
                .configure(|cfg| routes::configure(cfg, "/api")),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/leaves/3/approve")
            .set_json(json!({ "action": "reject" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Leave reject done");

        let req = test::TestRequest::get()
            .uri("/api/leaves?status=rejected")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["id"], 3);

        let req = test::TestRequest::put()
            .uri("/api/leaves/99/approve")
            .set_json(json!({ "action": "approve" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
